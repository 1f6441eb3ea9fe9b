/* Copyright (C) 2020-2021 by Jacob Alexander
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

use crate::Error;
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ----- Enumerations -----

/// Outcome of waiting on a report source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// Data (or an error condition) is waiting to be read
    Ready,
    /// The wait timed out
    Timeout,
}

// ----- Traits -----

/// Stream of raw reports
///
/// Errors are plain io errors, ErrorKind::Interrupted and ErrorKind::WouldBlock are expected and
/// handled by the caller.
pub trait ReportSource {
    /// Wait until the source is readable or the timeout expires
    fn wait(&mut self, timeout: Duration) -> std::io::Result<Readiness>;

    /// Read at most buf.len() bytes, 0 means the stream has ended
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
}

// ----- Structs -----

/// Event stream of the physical keyboard, read as raw bytes
///
/// The stream is not grabbed, regular keyboard traffic continues to reach the rest of the
/// system.
pub struct EvdevDevice {
    file: File,
    fd_path: PathBuf,
}

impl EvdevDevice {
    /// Open the event stream read-only and non-blocking
    pub fn open<P: AsRef<Path>>(fd_path: P) -> Result<EvdevDevice, Error> {
        let fd_path = fd_path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&fd_path)
            .map_err(|source| Error::OpenFailed {
                path: fd_path.clone(),
                source,
            })?;

        match device_name(&fd_path) {
            Ok(name) => info!("Connection event {} {}", fd_path.display(), name),
            Err(err) => debug!("Could not query {}: {}", fd_path.display(), err),
        }

        Ok(EvdevDevice { file, fd_path })
    }
}

impl ReportSource for EvdevDevice {
    fn wait(&mut self, timeout: Duration) -> std::io::Result<Readiness> {
        let mut fds = [libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        }];
        let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

        let result = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        if result < 0 {
            return Err(std::io::Error::last_os_error());
        }
        if result == 0 {
            return Ok(Readiness::Timeout);
        }

        // POLLERR/POLLHUP (e.g. unplugged) also count, the following read reports the error
        if fds[0].revents != 0 {
            Ok(Readiness::Ready)
        } else {
            Ok(Readiness::Timeout)
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

impl Drop for EvdevDevice {
    fn drop(&mut self) {
        debug!("Closing {}", self.fd_path.display());
    }
}

// ----- Functions -----

/// Build a unique device name string
fn device_name(fd_path: &Path) -> std::io::Result<String> {
    // Initialize new evdev handle
    let mut device = match evdev_rs::Device::new() {
        Some(device) => device,
        None => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "Could not create evdev device",
            ));
        }
    };

    // Apply file descriptor to evdev handle
    let file = File::open(fd_path)?;
    device.set_fd(file)?;

    Ok(format!(
        "[{:04x}:{:04x}-{:?}] {} {}",
        device.vendor_id(),
        device.product_id(),
        evdev_rs::enums::int_to_bus_type(device.bustype() as u32),
        device.name().unwrap_or(""),
        device.phys().unwrap_or(""),
    ))
}
