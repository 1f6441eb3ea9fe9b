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

use crate::config::DeviceIdentity;
use crate::module::vhid::{EventSink, SyntheticEvent};
use crate::protocol::KeyCode;
use crate::Error;
use evdev_rs::enums::{EventCode, EventType, EV_KEY, EV_SYN};
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

// ----- Consts -----

pub const UINPUT_PATH: &str = "/dev/uinput";

// ----- Structs -----

/// uinput device being set up
///
/// open() -> register_keys() -> create()
pub struct UInputBuilder {
    device: evdev_rs::Device,
    name: String,
}

impl UInputBuilder {
    /// Prepares a device with the given identity
    ///
    /// Only a permission check is done on /dev/uinput here, the handle used to register the device
    /// is opened by libevdev in create().
    pub fn open(identity: &DeviceIdentity) -> Result<UInputBuilder, Error> {
        check_writable(Path::new(UINPUT_PATH))?;

        let device = match evdev_rs::Device::new() {
            Some(device) => device,
            None => {
                return Err(Error::DeviceUnavailable(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "Could not create evdev device",
                )));
            }
        };
        device.set_name(&identity.name);
        device.set_bustype(identity.bustype);
        device.set_vendor_id(identity.vendor_id);
        device.set_product_id(identity.product_id);

        Ok(UInputBuilder {
            device,
            name: identity.name.clone(),
        })
    }

    /// Declare every key the device may send
    pub fn register_keys(&mut self, keys: &[KeyCode]) -> Result<(), Error> {
        self.device
            .enable(&EventType::EV_KEY)
            .map_err(Error::RegistrationFailed)?;
        for key in keys {
            trace!("Registering {}", key);
            self.device
                .enable(&EventCode::EV_KEY(ev_key(*key)))
                .map_err(Error::RegistrationFailed)?;
        }
        Ok(())
    }

    /// Make the device visible to the rest of the system
    pub fn create(self) -> Result<UInputSink, Error> {
        let uinput =
            evdev_rs::UInputDevice::create_from_device(&self.device).map_err(Error::CreationFailed)?;
        info!(
            "Created virtual device {:?} {}",
            self.name,
            uinput.devnode().unwrap_or("")
        );
        Ok(UInputSink {
            uinput: Some(uinput),
            name: self.name,
        })
    }
}

/// Registered uinput device
pub struct UInputSink {
    uinput: Option<evdev_rs::UInputDevice>,
    name: String,
}

impl EventSink for UInputSink {
    fn write_event(&mut self, event: SyntheticEvent) -> std::io::Result<()> {
        let uinput = match self.uinput.as_ref() {
            Some(uinput) => uinput,
            None => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "uinput device destroyed",
                ));
            }
        };

        // Timestamps are filled in by the kernel
        let time = evdev_rs::TimeVal::new(0, 0);
        let event = match event {
            SyntheticEvent::Key { key, pressed } => {
                evdev_rs::InputEvent::new(&time, &EventCode::EV_KEY(ev_key(key)), pressed as i32)
            }
            SyntheticEvent::Sync => {
                evdev_rs::InputEvent::new(&time, &EventCode::EV_SYN(EV_SYN::SYN_REPORT), 0)
            }
        };
        uinput.write_event(&event)
    }

    fn destroy(&mut self) {
        // libevdev destroys the uinput device when the handle is dropped
        if self.uinput.take().is_some() {
            info!("Destroyed virtual device {:?}", self.name);
        }
    }
}

// ----- Functions -----

/// Write-only, non-blocking open that is closed again straight away
fn check_writable(path: &Path) -> Result<(), Error> {
    OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
        .map(drop)
        .map_err(Error::DeviceUnavailable)
}

/// evdev key for a multimedia key
pub fn ev_key(key: KeyCode) -> EV_KEY {
    match key {
        KeyCode::PlayPause => EV_KEY::KEY_PLAYPAUSE,
        KeyCode::Next => EV_KEY::KEY_NEXT,
        KeyCode::Previous => EV_KEY::KEY_PREVIOUS,
        KeyCode::Stop => EV_KEY::KEY_STOP,
        KeyCode::Mute => EV_KEY::KEY_MUTE,
        KeyCode::VolumeUp => EV_KEY::KEY_VOLUMEUP,
        KeyCode::VolumeDown => EV_KEY::KEY_VOLUMEDOWN,
        KeyCode::Calculator => EV_KEY::KEY_CALC,
        KeyCode::Homepage => EV_KEY::KEY_HOMEPAGE,
    }
}

/// open, register and create in one go
pub fn create_virtual_device(
    identity: &DeviceIdentity,
    keys: &[KeyCode],
) -> Result<UInputSink, Error> {
    let mut builder = UInputBuilder::open(identity)?;
    builder.register_keys(keys)?;
    builder.create()
}
