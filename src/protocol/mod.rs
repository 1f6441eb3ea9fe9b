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

/// Vendor multimedia report decoding
pub mod report;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

// ----- Enumerations -----

/// Multimedia functions the bridge can emit
///
/// # Remarks
/// Discriminants are the Linux input event codes (linux/input-event-codes.h)
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum KeyCode {
    PlayPause = 164,  // KEY_PLAYPAUSE
    Next = 407,       // KEY_NEXT
    Previous = 412,   // KEY_PREVIOUS
    Stop = 128,       // KEY_STOP
    Mute = 113,       // KEY_MUTE
    VolumeUp = 115,   // KEY_VOLUMEUP
    VolumeDown = 114, // KEY_VOLUMEDOWN
    Calculator = 140, // KEY_CALC
    Homepage = 172,   // KEY_HOMEPAGE
}

impl KeyCode {
    /// Every supported key
    pub const ALL: [KeyCode; 9] = [
        KeyCode::PlayPause,
        KeyCode::Next,
        KeyCode::Previous,
        KeyCode::Stop,
        KeyCode::Mute,
        KeyCode::VolumeUp,
        KeyCode::VolumeDown,
        KeyCode::Calculator,
        KeyCode::Homepage,
    ];

    /// Linux input event code
    pub fn code(self) -> u16 {
        self.into()
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            KeyCode::PlayPause => "KEY_PLAYPAUSE",
            KeyCode::Next => "KEY_NEXT",
            KeyCode::Previous => "KEY_PREVIOUS",
            KeyCode::Stop => "KEY_STOP",
            KeyCode::Mute => "KEY_MUTE",
            KeyCode::VolumeUp => "KEY_VOLUMEUP",
            KeyCode::VolumeDown => "KEY_VOLUMEDOWN",
            KeyCode::Calculator => "KEY_CALC",
            KeyCode::Homepage => "KEY_HOMEPAGE",
        };
        write!(f, "{name}")
    }
}
