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

use crate::device::{DeviceLocator, InputDeviceInfo};
use crate::Error;
use std::path::{Path, PathBuf};

// ----- Consts -----

pub const PROC_INPUT_DEVICES: &str = "/proc/bus/input/devices";
pub const DEV_INPUT_DIR: &str = "/dev/input";

// ----- Structs -----

/// Device lookup by parsing the kernel's text listing of input devices
///
/// Each entry looks like
/// ```text
/// I: Bus=0003 Vendor=258a Product=0013 Version=0110
/// N: Name="SINOWEALTH Game Mouse Keyboard"
/// P: Phys=usb-0000:00:14.0-2/input1
/// S: Sysfs=/devices/pci0000:00/0000:00:14.0/usb1/1-2/1-2:1.1/0003:258A:0013.0002/input/input5
/// U: Uniq=
/// H: Handlers=sysrq kbd leds event5
/// B: PROP=0
/// ```
/// and entries are separated by blank lines.
#[derive(Clone, Debug)]
pub struct ProcLocator {
    listing: PathBuf,
    dev_dir: PathBuf,
}

impl Default for ProcLocator {
    fn default() -> ProcLocator {
        ProcLocator::new(PROC_INPUT_DEVICES, DEV_INPUT_DIR)
    }
}

impl ProcLocator {
    pub fn new<P: AsRef<Path>, D: AsRef<Path>>(listing: P, dev_dir: D) -> ProcLocator {
        ProcLocator {
            listing: listing.as_ref().to_path_buf(),
            dev_dir: dev_dir.as_ref().to_path_buf(),
        }
    }
}

impl DeviceLocator for ProcLocator {
    fn list(&self) -> Result<Vec<InputDeviceInfo>, Error> {
        let listing = std::fs::read_to_string(&self.listing).map_err(Error::LookupFailed)?;
        Ok(parse_devices(&listing, &self.dev_dir))
    }
}

// ----- Functions -----

/// Parses the text listing
/// Entries without a name or without an event handler are skipped
pub fn parse_devices(listing: &str, dev_dir: &Path) -> Vec<InputDeviceInfo> {
    let mut devices = vec![];
    let mut name: Option<String> = None;
    let mut handler: Option<String> = None;

    let mut flush = |name: &mut Option<String>, handler: &mut Option<String>| {
        if let (Some(name), Some(handler)) = (name.take(), handler.take()) {
            devices.push(InputDeviceInfo {
                name,
                path: dev_dir.join(handler),
            });
        }
    };

    for line in listing.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("I:") {
            flush(&mut name, &mut handler);
            continue;
        }

        if let Some(value) = line.strip_prefix("N: Name=") {
            name = Some(value.trim_matches('"').to_string());
        } else if let Some(value) = line.strip_prefix("H: Handlers=") {
            handler = value
                .split_whitespace()
                .find(|token| is_event_handler(token))
                .map(|token| token.to_string());
        }
    }
    flush(&mut name, &mut handler);

    devices
}

/// eventN handler tokens
fn is_event_handler(token: &str) -> bool {
    match token.strip_prefix("event") {
        Some(num) => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
