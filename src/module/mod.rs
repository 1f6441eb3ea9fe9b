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

/// Virtual input devices
pub mod vhid;

use crate::config::Config;
use crate::Error;
use vhid::uinput::UInputSink;
use vhid::VirtualKeyboard;

/// Virtual keyboard initialization
///
/// Registers every key the decoder table can produce.
pub fn initialize(config: &Config) -> Result<VirtualKeyboard<UInputSink>, Error> {
    info!("Initializing vhid/uinput...");

    let keys = config.table.keys();
    let sink = vhid::uinput::create_virtual_device(&config.identity, &keys)?;
    Ok(VirtualKeyboard::new(sink, config.debounce))
}
