/* Copyright (C) 2020-2022 by Jacob Alexander
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

/// Logging functions
/// Handles general logging setup and verbosity selection
use flexi_logger::{FileSpec, Logger};
use std::env;

/// Maps the number of -v flags onto a log specification
/// RUST_LOG still takes precedence when set
pub fn verbosity_spec(verbosity: u64) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Logging setup
/// Logs to stderr and to a rotating file in the temp directory
/// (the only sink left once daemonized)
pub fn setup_logging(verbosity: u64) -> Result<(), std::io::Error> {
    let logger = Logger::try_with_env_or_str(verbosity_spec(verbosity)).map_err(|msg| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid log specification {msg}"),
        )
    })?;
    match logger
        .log_to_file(
            FileSpec::default()
                .directory(env::temp_dir())
                .basename(crate::built_info::PKG_NAME),
        )
        .format(flexi_logger::colored_default_format)
        .format_for_files(flexi_logger::detailed_format)
        .rotate(
            flexi_logger::Criterion::Size(1_000_000),
            flexi_logger::Naming::Numbers,
            flexi_logger::Cleanup::KeepLogFiles(5),
        )
        // No helper threads, the process may fork after this
        .cleanup_in_background_thread(false)
        .duplicate_to_stderr(flexi_logger::Duplicate::All)
        .start()
    {
        Err(msg) => Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Could not start logger {msg}"),
        )),
        Ok(handle) => {
            // The handle flushes on drop, keep the logger alive for the process lifetime
            std::mem::forget(handle);
            info!("---------------------- Xenon multimedia keys starting! ----------------------");
            info!("Log location -> {:?}", env::temp_dir());
            Ok(())
        }
    }
}

/// Lite logging setup
pub fn setup_logging_lite() -> Result<(), std::io::Error> {
    let logger = Logger::try_with_env_or_str("").map_err(|msg| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid log specification {msg}"),
        )
    })?;
    match logger
        .format(flexi_logger::colored_default_format)
        .duplicate_to_stderr(flexi_logger::Duplicate::All)
        .start()
    {
        Err(msg) => Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Could not start logger {msg}"),
        )),
        Ok(handle) => {
            std::mem::forget(handle);
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity_spec(0), "info");
        assert_eq!(verbosity_spec(1), "debug");
        assert_eq!(verbosity_spec(2), "trace");
        assert_eq!(verbosity_spec(9), "trace");
    }
}
