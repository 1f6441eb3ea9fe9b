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

// ----- Crates -----

#[macro_use]
extern crate log;

// ----- Modules -----

/// command-line interface
pub mod args;

/// report to key event translation loop
pub mod bridge;

/// runtime options and hardware constants
pub mod config;

/// detach from the controlling terminal
pub mod daemon;

/// physical input devices (lookup and report stream)
pub mod device;

/// crate wide error type
pub mod error;

/// logging setup
pub mod logging;

/// virtual output devices
pub mod module;

/// vendor report decoding
pub mod protocol;

/// Compile time information
pub mod built_info {
    // This file is generated at build time using build.rs
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use error::Error;

// ----- Functions -----

use lazy_static::lazy_static;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

lazy_static! {
    /// Any thread can set this to false to signal shutdown
    pub static ref RUNNING: Arc<AtomicBool> = Arc::new(AtomicBool::new(true));
}
