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

pub mod uinput;

use crate::protocol::KeyCode;
use crate::Error;
use std::time::Duration;

// ----- Enumerations -----

/// Events written to a virtual device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntheticEvent {
    /// EV_KEY, value 1 on press and 0 on release
    Key { key: KeyCode, pressed: bool },
    /// EV_SYN SYN_REPORT
    Sync,
}

// ----- Traits -----

/// Destination of synthetic events
pub trait EventSink {
    fn write_event(&mut self, event: SyntheticEvent) -> std::io::Result<()>;

    /// Unregister the device, called exactly once
    fn destroy(&mut self);
}

// ----- Structs -----

/// Virtual multimedia keyboard
///
/// Owns the sink until destroy() (or drop), emitting after that fails with EmitFailed.
pub struct VirtualKeyboard<S: EventSink> {
    sink: Option<S>,
    debounce: Duration,
}

impl<S: EventSink> VirtualKeyboard<S> {
    pub fn new(sink: S, debounce: Duration) -> VirtualKeyboard<S> {
        VirtualKeyboard {
            sink: Some(sink),
            debounce,
        }
    }

    /// Press and release a key
    ///
    /// Each transition must be followed by a SYN_REPORT or listeners miss it. The trailing sleep
    /// keeps consecutive clicks from being coalesced downstream.
    pub fn emit(&mut self, key: KeyCode) -> Result<(), Error> {
        let sink = match self.sink.as_mut() {
            Some(sink) => sink,
            None => {
                return Err(Error::EmitFailed(std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "Virtual device already destroyed",
                )));
            }
        };

        for event in [
            SyntheticEvent::Key { key, pressed: true },
            SyntheticEvent::Sync,
            SyntheticEvent::Key {
                key,
                pressed: false,
            },
            SyntheticEvent::Sync,
        ] {
            sink.write_event(event).map_err(Error::EmitFailed)?;
        }
        debug!("Clicked {}", key);

        std::thread::sleep(self.debounce);
        Ok(())
    }

    /// Unregister the virtual device
    /// Safe to call more than once, only the first call reaches the sink
    pub fn destroy(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.destroy();
        }
    }
}

impl<S: EventSink> Drop for VirtualKeyboard<S> {
    fn drop(&mut self) {
        self.destroy();
    }
}
