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

/// Runtime options
/// Defaults describe the SINOWEALTH Game Mouse Keyboard, everything can be overridden from the
/// command line (there is no configuration file)
// ----- Modules -----
use crate::protocol::report::{DecoderTable, ReportLayout};
use crate::Error;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ----- Consts -----

pub const DEFAULT_DEVICE_NAME: &str = "SINOWEALTH Game Mouse Keyboard";

/// Identity of the virtual device
/// Sample VID:PID pair, the device is never matched on by anything
pub const DEFAULT_VENDOR_ID: u16 = 0x1234;
pub const DEFAULT_PRODUCT_ID: u16 = 0x5678;
pub const DEFAULT_VIRTUAL_NAME: &str = "Xenon Multimedia Keys";

pub const DEFAULT_DEBOUNCE_MS: u64 = 10;
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 5000;

/// linux/input.h BUS_USB
pub const BUS_USB: u16 = 0x03;

// ----- Enumerations -----

/// Strategy used to find the physical input device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocatorKind {
    /// Parse /proc/bus/input/devices
    Proc,
    /// Enumerate the input subsystem with udev
    Udev,
}

impl Default for LocatorKind {
    #[cfg(feature = "dev-capture")]
    fn default() -> LocatorKind {
        LocatorKind::Udev
    }

    #[cfg(not(feature = "dev-capture"))]
    fn default() -> LocatorKind {
        LocatorKind::Proc
    }
}

impl LocatorKind {
    /// Command-line spelling
    pub fn as_str(self) -> &'static str {
        match self {
            LocatorKind::Proc => "proc",
            LocatorKind::Udev => "udev",
        }
    }
}

impl FromStr for LocatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<LocatorKind, Error> {
        match s {
            "proc" => Ok(LocatorKind::Proc),
            "udev" => Ok(LocatorKind::Udev),
            _ => Err(Error::InvalidConfig(format!("Unknown locator: {s}"))),
        }
    }
}

// ----- Structs -----

/// Identity the virtual device is registered with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub bustype: u16,
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: String,
}

impl Default for DeviceIdentity {
    fn default() -> DeviceIdentity {
        DeviceIdentity {
            bustype: BUS_USB,
            vendor_id: DEFAULT_VENDOR_ID,
            product_id: DEFAULT_PRODUCT_ID,
            name: DEFAULT_VIRTUAL_NAME.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Substring matched against input device names
    pub device_name_match: String,
    /// Skips the lookup when set
    pub device_path: Option<PathBuf>,
    pub locator: LocatorKind,
    pub identity: DeviceIdentity,
    pub layout: ReportLayout,
    pub table: DecoderTable,
    pub debounce: Duration,
    pub poll_timeout: Duration,
    pub daemonize: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            device_name_match: DEFAULT_DEVICE_NAME.to_string(),
            device_path: None,
            locator: LocatorKind::default(),
            identity: DeviceIdentity::default(),
            layout: ReportLayout::default(),
            table: DecoderTable::default(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            poll_timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            daemonize: false,
        }
    }
}

impl Config {
    /// Reject option combinations the event loop cannot run with
    pub fn validate(&self) -> Result<(), Error> {
        if self.device_name_match.is_empty() && self.device_path.is_none() {
            return Err(Error::InvalidConfig(
                "A device name or device path is required".to_string(),
            ));
        }
        if self.layout.buffer_size < self.layout.min_len() {
            return Err(Error::InvalidConfig(format!(
                "Report buffer of {} bytes cannot hold offset {}",
                self.layout.buffer_size,
                self.layout.min_len() - 1
            )));
        }
        if self.poll_timeout.as_millis() == 0 {
            return Err(Error::InvalidConfig(
                "Poll timeout must be at least 1 ms".to_string(),
            ));
        }
        if self.poll_timeout.as_millis() > libc::c_int::MAX as u128 {
            return Err(Error::InvalidConfig(format!(
                "Poll timeout too large: {:?}",
                self.poll_timeout
            )));
        }
        if self.table.keys().is_empty() {
            return Err(Error::InvalidConfig("Decoder table is empty".to_string()));
        }
        if cfg!(not(feature = "dev-capture")) && self.locator == LocatorKind::Udev {
            return Err(Error::InvalidConfig(
                "udev locator requires the dev-capture feature".to_string(),
            ));
        }
        Ok(())
    }
}

// ----- Functions -----

/// Parse a u16 given in decimal or 0x prefixed hex
pub fn parse_u16(value: &str) -> Result<u16, Error> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse::<u16>(),
    };
    parsed.map_err(|e| Error::InvalidConfig(format!("{value}: {e}")))
}
