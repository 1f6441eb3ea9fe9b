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

use std::fmt;
use std::path::PathBuf;

// ----- Enumerations -----

/// Errors raised while bridging reports to key events
///
/// # Remarks
/// Every variant is local to the component that detects it. None are retried.
#[derive(Debug)]
pub enum Error {
    /// No registered input device matched the requested name
    NotFound { name: String },
    /// The input device listing could not be produced
    LookupFailed(std::io::Error),
    /// The injection facility (uinput) could not be opened
    DeviceUnavailable(std::io::Error),
    /// A key capability was rejected
    RegistrationFailed(std::io::Error),
    /// The virtual device could not be finalized
    CreationFailed(std::io::Error),
    /// The physical input stream could not be opened
    OpenFailed { path: PathBuf, source: std::io::Error },
    /// Reading or waiting on the physical input stream failed
    ReadError(std::io::Error),
    /// Writing a synthetic event failed
    EmitFailed(std::io::Error),
    /// Fewer bytes were read than the report layout requires
    TruncatedReport { len: usize, needed: usize },
    /// Detaching from the terminal failed
    Daemonize(std::io::Error),
    /// Rejected runtime options
    InvalidConfig(String),
}

// ----- Implementations -----

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound { name } => write!(f, "No input device named {name:?}"),
            Error::LookupFailed(err) => write!(f, "Could not list input devices: {err}"),
            Error::DeviceUnavailable(err) => write!(f, "Could not open uinput: {err}"),
            Error::RegistrationFailed(err) => write!(f, "Could not register key: {err}"),
            Error::CreationFailed(err) => write!(f, "Could not create virtual device: {err}"),
            Error::OpenFailed { path, source } => {
                write!(f, "Unable to open {} for reading: {source}", path.display())
            }
            Error::ReadError(err) => write!(f, "Input stream read failed: {err}"),
            Error::EmitFailed(err) => write!(f, "Could not write event: {err}"),
            Error::TruncatedReport { len, needed } => {
                write!(f, "Truncated report: {len} bytes read, {needed} needed")
            }
            Error::Daemonize(err) => write!(f, "Could not daemonize: {err}"),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::LookupFailed(err)
            | Error::DeviceUnavailable(err)
            | Error::RegistrationFailed(err)
            | Error::CreationFailed(err)
            | Error::OpenFailed { source: err, .. }
            | Error::ReadError(err)
            | Error::EmitFailed(err)
            | Error::Daemonize(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_messages() {
        let err = Error::NotFound {
            name: "SINOWEALTH".to_string(),
        };
        assert_eq!(err.to_string(), "No input device named \"SINOWEALTH\"");

        let err = Error::TruncatedReport { len: 24, needed: 45 };
        assert_eq!(err.to_string(), "Truncated report: 24 bytes read, 45 needed");
    }

    #[test]
    fn io_source_is_kept() {
        use std::error::Error as _;
        let err = Error::ReadError(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "gone",
        ));
        assert!(err.source().is_some());
        assert!(Error::InvalidConfig("x".to_string()).source().is_none());
    }
}
