#![cfg(feature = "dev-capture")]
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

use crate::device::{DeviceLocator, InputDeviceInfo};
use crate::Error;
use std::path::PathBuf;

// ----- Structs -----

/// Device lookup using udev enumeration of the input subsystem
///
/// Event nodes (eventN) carry no name themselves, the name attribute lives on the parent inputN
/// device.
pub struct UdevLocator;

impl DeviceLocator for UdevLocator {
    fn list(&self) -> Result<Vec<InputDeviceInfo>, Error> {
        let mut enumerator = udev::Enumerator::new().map_err(Error::LookupFailed)?;
        enumerator
            .match_subsystem("input")
            .map_err(Error::LookupFailed)?;

        let mut devices = vec![];
        for device in enumerator.scan_devices().map_err(Error::LookupFailed)? {
            let sysname = device.sysname().to_string_lossy().into_owned();
            if !sysname.starts_with("event") {
                continue;
            }

            let name = match device.parent().and_then(|parent| {
                parent
                    .attribute_value("name")
                    .map(|name| name.to_string_lossy().into_owned())
            }) {
                Some(name) => name,
                None => {
                    trace!("Skipping {} (no name)", sysname);
                    continue;
                }
            };

            // devnode is only missing if udev hasn't finished with the device
            let path = match device.devnode() {
                Some(path) => path.to_path_buf(),
                None => PathBuf::from(format!("/dev/input/{sysname}")),
            };

            devices.push(InputDeviceInfo { name, path });
        }

        Ok(devices)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::logging::setup_logging_lite;

    #[test]
    #[ignore]
    fn udev_lists_event_nodes() {
        setup_logging_lite().ok();
        let devices = UdevLocator.list().unwrap();
        for device in &devices {
            info!("{}", device);
            assert!(device
                .path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("event"));
        }
    }
}
