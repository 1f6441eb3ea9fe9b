/* Copyright (C) 2017-2021 by Jacob Alexander
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

pub mod evdev;
pub mod procfs;
pub mod udevinput;

use crate::config::{Config, LocatorKind};
use crate::Error;
use std::fmt;
use std::path::PathBuf;

// ----- Structs -----

/// An input device exposing an event stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputDeviceInfo {
    /// Name declared by the kernel driver
    pub name: String,
    /// Event stream node (e.g. /dev/input/event5)
    pub path: PathBuf,
}

impl fmt::Display for InputDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.name, self.path.display())
    }
}

// ----- Traits -----

/// Lookup of physical input devices by name
pub trait DeviceLocator {
    /// Every input device with an event stream, in listing order
    fn list(&self) -> Result<Vec<InputDeviceInfo>, Error>;

    /// Event stream of the first device whose name contains `name`
    ///
    /// # Remarks
    /// When several devices match, the first listed wins. Listing order is not guaranteed to be
    /// stable across kernel versions.
    fn locate(&self, name: &str) -> Result<PathBuf, Error> {
        let devices = self.list()?;
        debug!("{} input devices listed", devices.len());
        match devices.into_iter().find(|device| device.name.contains(name)) {
            Some(device) => {
                info!("Found {}", device);
                Ok(device.path)
            }
            None => Err(Error::NotFound {
                name: name.to_string(),
            }),
        }
    }
}

// ----- Functions -----

/// Builds the locator selected in the configuration
pub fn locator(kind: LocatorKind) -> Result<Box<dyn DeviceLocator>, Error> {
    match kind {
        LocatorKind::Proc => Ok(Box::new(procfs::ProcLocator::default())),
        #[cfg(feature = "dev-capture")]
        LocatorKind::Udev => Ok(Box::new(udevinput::UdevLocator)),
        #[cfg(not(feature = "dev-capture"))]
        LocatorKind::Udev => Err(Error::InvalidConfig(
            "udev locator requires the dev-capture feature".to_string(),
        )),
    }
}

/// Event stream path of the physical keyboard
/// An explicit device path skips the lookup
pub fn find_input_device(config: &Config) -> Result<PathBuf, Error> {
    if let Some(path) = &config.device_path {
        info!("Using input device {}", path.display());
        return Ok(path.clone());
    }

    info!(
        "Looking up {:?} ({:?} locator)...",
        config.device_name_match, config.locator
    );
    locator(config.locator)?.locate(&config.device_name_match)
}
