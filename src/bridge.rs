/* Copyright (C) 2021 by Jacob Alexander
 *
 * This file is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

// ----- Modules -----

use crate::config::Config;
use crate::device;
use crate::device::evdev::{EvdevDevice, ReportSource, Readiness};
use crate::module;
use crate::module::vhid::uinput::UInputSink;
use crate::module::vhid::{EventSink, VirtualKeyboard};
use crate::protocol::report::{hex_dump, Decoder};
use crate::Error;
use crate::RUNNING;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ----- Enumerations -----

/// Why the event loop stopped
#[derive(Debug)]
pub enum LoopExit {
    /// The running flag was cleared (signal)
    Cancelled,
    /// The input stream returned end-of-file (device removed)
    EndOfStream,
    /// Waiting on or reading the input stream failed
    StreamError(Error),
}

// ----- Structs -----

/// Event loop counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub reports: u64,
    pub emitted: u64,
    pub timeouts: u64,
    pub truncated: u64,
}

impl fmt::Display for LoopStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} reports read, {} keys emitted, {} timeouts, {} truncated",
            self.reports, self.emitted, self.timeouts, self.truncated
        )
    }
}

#[derive(Debug)]
pub struct Summary {
    pub exit: LoopExit,
    pub stats: LoopStats,
}

/// Report to key event bridge
///
/// Owns both the physical input stream and the virtual keyboard, both are released when run()
/// returns regardless of why the loop ended.
pub struct Bridge<R: ReportSource, S: EventSink> {
    source: R,
    keyboard: VirtualKeyboard<S>,
    decoder: Decoder,
    poll_timeout: Duration,
    running: Arc<AtomicBool>,
}

impl<R: ReportSource, S: EventSink> Bridge<R, S> {
    pub fn new(
        source: R,
        keyboard: VirtualKeyboard<S>,
        config: &Config,
        running: Arc<AtomicBool>,
    ) -> Bridge<R, S> {
        Bridge {
            source,
            keyboard,
            decoder: Decoder::new(config.layout, config.table.clone()),
            poll_timeout: config.poll_timeout,
            running,
        }
    }

    /// Run until cancelled or the input stream fails
    pub fn run(self) -> Summary {
        let Bridge {
            mut source,
            mut keyboard,
            decoder,
            poll_timeout,
            running,
        } = self;

        let mut stats = LoopStats::default();
        let mut buf = vec![0u8; decoder.layout().buffer_size];

        info!("Waiting for reports...");
        let exit = loop {
            if !running.load(Ordering::SeqCst) {
                break LoopExit::Cancelled;
            }

            // Idle
            match source.wait(poll_timeout) {
                Ok(Readiness::Ready) => {}
                Ok(Readiness::Timeout) => {
                    debug!("timeout");
                    stats.timeouts += 1;
                    continue;
                }
                // Signal delivery, re-check the running flag
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => break LoopExit::StreamError(Error::ReadError(err)),
            }

            // Reading
            let len = match source.read(&mut buf) {
                Ok(0) => break LoopExit::EndOfStream,
                Ok(len) => len,
                Err(err)
                    if err.kind() == std::io::ErrorKind::WouldBlock
                        || err.kind() == std::io::ErrorKind::Interrupted =>
                {
                    continue;
                }
                Err(err) => break LoopExit::StreamError(Error::ReadError(err)),
            };
            stats.reports += 1;
            trace!("total bytes read {}/{}\n{}", len, buf.len(), hex_dump(&buf[..len]));

            // Dispatching
            match decoder.decode(&buf[..len]) {
                Ok(Some(key)) => match keyboard.emit(key) {
                    Ok(()) => stats.emitted += 1,
                    Err(err) => warn!("{}", err),
                },
                Ok(None) => {}
                Err(err) => {
                    stats.truncated += 1;
                    warn!("{}", err);
                }
            }

            buf[..len].fill(0);
        };

        // Shutdown, always release both handles
        match &exit {
            LoopExit::Cancelled => info!("Cancelled, shutting down"),
            LoopExit::EndOfStream => info!("Input stream closed, shutting down"),
            LoopExit::StreamError(err) => error!("{}", err),
        }
        keyboard.destroy();
        drop(source);

        info!("{}", stats);
        Summary { exit, stats }
    }
}

// ----- Functions -----

/// Builds a bridge in order: lookup, virtual device, input stream
///
/// Nothing is created once a step fails. A virtual device created before the input stream fails
/// to open is destroyed on the way out.
pub fn start<R, S, L, C, O>(
    config: &Config,
    running: Arc<AtomicBool>,
    locate: L,
    create: C,
    open: O,
) -> Result<Bridge<R, S>, Error>
where
    R: ReportSource,
    S: EventSink,
    L: FnOnce(&Config) -> Result<PathBuf, Error>,
    C: FnOnce(&Config) -> Result<VirtualKeyboard<S>, Error>,
    O: FnOnce(&Path) -> Result<R, Error>,
{
    let path = locate(config)?;
    let keyboard = create(config)?;
    let source = open(&path)?;
    Ok(Bridge::new(source, keyboard, config, running))
}

/// Sets up the bridge, then detaches from the terminal if configured to
///
/// Setup runs first so lookup and device failures still reach the caller's exit status. If
/// detaching fails the bridge is dropped, which releases both devices.
pub fn launch<R, S, B, D>(config: &Config, build: B, detach: D) -> Result<Bridge<R, S>, Error>
where
    R: ReportSource,
    S: EventSink,
    B: FnOnce(&Config) -> Result<Bridge<R, S>, Error>,
    D: FnOnce() -> Result<(), Error>,
{
    let bridge = build(config)?;
    if config.daemonize {
        info!("Detaching...");
        detach()?;
    }
    Ok(bridge)
}

/// Builds the bridge against the real devices
pub fn open(config: &Config) -> Result<Bridge<EvdevDevice, UInputSink>, Error> {
    start(
        config,
        RUNNING.clone(),
        device::find_input_device,
        module::initialize,
        |path: &Path| EvdevDevice::open(path),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::logging::setup_logging_lite;
    use crate::module::vhid::test::{recording_keyboard, RecordingSink, SinkLog};
    use crate::module::vhid::SyntheticEvent;
    use crate::protocol::report::{KEY_ID_OFFSET, VALID_FLAG_OFFSET};
    use crate::protocol::KeyCode;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    enum Step {
        Timeout,
        Interrupted,
        WouldBlock,
        Report(Vec<u8>),
        ReadError,
        WaitError,
        End,
    }

    /// Replays a fixed script, clears the running flag once exhausted
    struct ScriptedSource {
        steps: VecDeque<Step>,
        current: Option<Step>,
        running: Arc<AtomicBool>,
        dropped: Rc<RefCell<usize>>,
    }

    impl ReportSource for ScriptedSource {
        fn wait(&mut self, _timeout: Duration) -> std::io::Result<Readiness> {
            match self.steps.pop_front() {
                None => {
                    self.running.store(false, Ordering::SeqCst);
                    Ok(Readiness::Timeout)
                }
                Some(Step::Timeout) => Ok(Readiness::Timeout),
                Some(Step::Interrupted) => Err(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "EINTR",
                )),
                Some(Step::WaitError) => Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "poll failed",
                )),
                Some(step) => {
                    self.current = Some(step);
                    Ok(Readiness::Ready)
                }
            }
        }

        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.current.take() {
                Some(Step::Report(data)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                Some(Step::WouldBlock) => Err(std::io::Error::new(
                    std::io::ErrorKind::WouldBlock,
                    "EAGAIN",
                )),
                Some(Step::ReadError) => Err(std::io::Error::from_raw_os_error(libc::ENODEV)),
                Some(Step::End) => Ok(0),
                _ => panic!("read without readiness"),
            }
        }
    }

    impl Drop for ScriptedSource {
        fn drop(&mut self) {
            *self.dropped.borrow_mut() += 1;
        }
    }

    fn report(flag: u8, id: u8) -> Step {
        let mut data = vec![0u8; 48];
        data[VALID_FLAG_OFFSET] = flag;
        data[KEY_ID_OFFSET] = id;
        Step::Report(data)
    }

    struct Harness {
        log: Rc<RefCell<SinkLog>>,
        dropped: Rc<RefCell<usize>>,
        summary: Summary,
    }

    fn run_script(steps: Vec<Step>) -> Harness {
        setup_logging_lite().ok();
        let running = Arc::new(AtomicBool::new(true));
        let dropped = Rc::new(RefCell::new(0));
        let source = ScriptedSource {
            steps: steps.into_iter().collect(),
            current: None,
            running: running.clone(),
            dropped: dropped.clone(),
        };
        let (keyboard, log) = recording_keyboard(Duration::from_millis(10));
        let config = Config::default();
        let summary = Bridge::new(source, keyboard, &config, running).run();
        Harness {
            log,
            dropped,
            summary,
        }
    }

    fn pressed(log: &Rc<RefCell<SinkLog>>) -> Vec<KeyCode> {
        log.borrow()
            .events
            .iter()
            .filter_map(|(event, _)| match event {
                SyntheticEvent::Key { key, pressed: true } => Some(*key),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn timeout_only_then_cancel() {
        let harness = run_script(vec![Step::Timeout, Step::Timeout, Step::Interrupted]);
        assert!(matches!(harness.summary.exit, LoopExit::Cancelled));
        // Two scripted timeouts plus the one that cancels
        assert_eq!(harness.summary.stats.timeouts, 3);
        assert_eq!(harness.log.borrow().destroyed, 1);
        assert_eq!(*harness.dropped.borrow(), 1);
        assert!(harness.log.borrow().events.is_empty());
    }

    #[test]
    fn volume_up_once() {
        let harness = run_script(vec![report(0x01, 0xA5)]);
        assert_eq!(pressed(&harness.log), vec![KeyCode::VolumeUp]);
        assert_eq!(harness.log.borrow().events.len(), 4);
        assert_eq!(harness.summary.stats.emitted, 1);
    }

    #[test]
    fn zero_flag_never_emits() {
        let mut noise = vec![0xFFu8; 4096];
        noise[VALID_FLAG_OFFSET] = 0x00;
        let harness = run_script(vec![
            report(0x00, 0xA5),
            report(0x00, 0xA0),
            Step::Report(noise),
        ]);
        assert!(harness.log.borrow().events.is_empty());
        assert_eq!(harness.summary.stats.reports, 3);
        assert_eq!(harness.summary.stats.emitted, 0);
    }

    #[test]
    fn back_to_back_reports_keep_order() {
        let harness = run_script(vec![
            report(0x01, 0xA1),
            report(0x01, 0xA2),
            report(0x01, 0xA7),
            report(0x01, 0xAA),
        ]);
        assert_eq!(
            pressed(&harness.log),
            vec![KeyCode::Next, KeyCode::Previous, KeyCode::Homepage]
        );
    }

    #[test]
    fn read_error_shuts_down() {
        let harness = run_script(vec![report(0x01, 0xA4), Step::ReadError, report(0x01, 0xA5)]);
        assert!(matches!(
            harness.summary.exit,
            LoopExit::StreamError(Error::ReadError(_))
        ));
        // The report after the error is never read
        assert_eq!(pressed(&harness.log), vec![KeyCode::Mute]);
        assert_eq!(harness.log.borrow().destroyed, 1);
        assert_eq!(*harness.dropped.borrow(), 1);
    }

    #[test]
    fn wait_error_shuts_down() {
        let harness = run_script(vec![Step::WaitError]);
        assert!(matches!(harness.summary.exit, LoopExit::StreamError(_)));
        assert_eq!(harness.log.borrow().destroyed, 1);
    }

    #[test]
    fn end_of_stream_shuts_down() {
        let harness = run_script(vec![Step::Timeout, Step::End]);
        assert!(matches!(harness.summary.exit, LoopExit::EndOfStream));
        assert_eq!(harness.log.borrow().destroyed, 1);
        assert_eq!(*harness.dropped.borrow(), 1);
    }

    #[test]
    fn would_block_and_truncated_continue() {
        let harness = run_script(vec![
            Step::WouldBlock,
            Step::Report(vec![0x01; 24]),
            report(0x01, 0xA3),
        ]);
        assert!(matches!(harness.summary.exit, LoopExit::Cancelled));
        assert_eq!(harness.summary.stats.truncated, 1);
        assert_eq!(pressed(&harness.log), vec![KeyCode::Stop]);
        assert_eq!(
            harness.summary.stats.to_string(),
            "2 reports read, 1 keys emitted, 1 timeouts, 1 truncated"
        );
    }

    #[test]
    fn emit_failure_is_not_fatal() {
        setup_logging_lite().ok();
        let running = Arc::new(AtomicBool::new(true));
        let dropped = Rc::new(RefCell::new(0));
        let source = ScriptedSource {
            steps: vec![report(0x01, 0xA0), report(0x01, 0xA0)]
                .into_iter()
                .collect(),
            current: None,
            running: running.clone(),
            dropped,
        };
        let (keyboard, log) = recording_keyboard(Duration::from_millis(0));
        log.borrow_mut().fail_writes = true;
        let summary = Bridge::new(source, keyboard, &Config::default(), running).run();
        assert!(matches!(summary.exit, LoopExit::Cancelled));
        assert_eq!(summary.stats.reports, 2);
        assert_eq!(summary.stats.emitted, 0);
        assert_eq!(log.borrow().destroyed, 1);
    }

    #[test]
    fn not_found_creates_nothing() {
        let created = RefCell::new(false);
        let result = start(
            &Config::default(),
            Arc::new(AtomicBool::new(true)),
            |config: &Config| {
                Err(Error::NotFound {
                    name: config.device_name_match.clone(),
                })
            },
            |_: &Config| {
                *created.borrow_mut() = true;
                Ok(recording_keyboard(Duration::from_millis(0)).0)
            },
            |_: &Path| -> Result<ScriptedSource, Error> { panic!("opened input") },
        );
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert!(!*created.borrow());
    }

    #[test]
    fn open_failure_destroys_virtual_device() {
        let (keyboard, log) = recording_keyboard(Duration::from_millis(0));
        let result = start(
            &Config::default(),
            Arc::new(AtomicBool::new(true)),
            |_: &Config| Ok(PathBuf::from("/dev/input/event42")),
            move |_: &Config| Ok(keyboard),
            |path: &Path| -> Result<ScriptedSource, Error> {
                Err(Error::OpenFailed {
                    path: path.to_path_buf(),
                    source: std::io::Error::from_raw_os_error(libc::EACCES),
                })
            },
        );
        assert!(matches!(result, Err(Error::OpenFailed { .. })));
        assert_eq!(log.borrow().destroyed, 1);
    }

    fn idle_bridge(
        running: Arc<AtomicBool>,
    ) -> (Bridge<ScriptedSource, RecordingSink>, Rc<RefCell<SinkLog>>) {
        let source = ScriptedSource {
            steps: VecDeque::new(),
            current: None,
            running: running.clone(),
            dropped: Rc::new(RefCell::new(0)),
        };
        let (keyboard, log) = recording_keyboard(Duration::from_millis(0));
        (
            Bridge::new(source, keyboard, &Config::default(), running),
            log,
        )
    }

    #[test]
    fn setup_failure_reported_before_detach() {
        setup_logging_lite().ok();
        let config = Config {
            daemonize: true,
            ..Default::default()
        };
        let detached = RefCell::new(false);
        let result = launch(
            &config,
            |config: &Config| -> Result<Bridge<ScriptedSource, RecordingSink>, Error> {
                Err(Error::NotFound {
                    name: config.device_name_match.clone(),
                })
            },
            || {
                *detached.borrow_mut() = true;
                Ok(())
            },
        );
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert!(!*detached.borrow());
    }

    #[test]
    fn detach_after_setup() {
        setup_logging_lite().ok();
        let config = Config {
            daemonize: true,
            ..Default::default()
        };
        let order = RefCell::new(vec![]);
        let running = Arc::new(AtomicBool::new(true));
        let (bridge, log) = idle_bridge(running.clone());
        let bridge = launch(
            &config,
            |_: &Config| {
                order.borrow_mut().push("setup");
                Ok(bridge)
            },
            || {
                order.borrow_mut().push("detach");
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(*order.borrow(), vec!["setup", "detach"]);

        // Still usable after detaching
        let summary = bridge.run();
        assert!(matches!(summary.exit, LoopExit::Cancelled));
        assert_eq!(log.borrow().destroyed, 1);
    }

    #[test]
    fn foreground_never_detaches() {
        setup_logging_lite().ok();
        let (bridge, _log) = idle_bridge(Arc::new(AtomicBool::new(true)));
        let result = launch(
            &Config::default(),
            |_: &Config| Ok(bridge),
            || -> Result<(), Error> { panic!("detached in the foreground") },
        );
        assert!(result.is_ok());
    }

    #[test]
    fn detach_failure_releases_devices() {
        setup_logging_lite().ok();
        let config = Config {
            daemonize: true,
            ..Default::default()
        };
        let (bridge, log) = idle_bridge(Arc::new(AtomicBool::new(true)));
        let result = launch(
            &config,
            |_: &Config| Ok(bridge),
            || Err(Error::Daemonize(std::io::Error::from_raw_os_error(libc::EAGAIN))),
        );
        assert!(matches!(result, Err(Error::Daemonize(_))));
        assert_eq!(log.borrow().destroyed, 1);
    }
}
