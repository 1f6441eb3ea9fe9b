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

use crate::built_info;
use crate::config::{self, Config, LocatorKind};
use crate::Error;
use clap::{App, Arg, ArgMatches};
use std::path::PathBuf;
use std::time::Duration;

// ----- Structs -----

/// Parsed command line
#[derive(Debug)]
pub struct Args {
    pub config: Config,
    pub verbosity: u64,
    /// Print the visible input devices and exit
    pub list: bool,
}

// ----- Functions -----

/// Version string including git and build profile
pub fn version_info() -> String {
    format!(
        "{}{} - {}",
        built_info::PKG_VERSION,
        built_info::GIT_VERSION.map_or_else(|| "".to_owned(), |v| format!(" (git {})", v)),
        built_info::PROFILE,
    )
}

/// Compiler and target information
pub fn build_info() -> String {
    format!(
        "{} ({}) -> {} ({})",
        built_info::RUSTC_VERSION,
        built_info::HOST,
        built_info::TARGET,
        built_info::BUILT_TIME_UTC,
    )
}

/// Command-line interface
/// Most of the information is generated from Cargo.toml using built crate (build.rs)
pub fn app<'a>(version: &'a str, after_help: &'a str) -> App<'a, 'a> {
    App::new(built_info::PKG_NAME)
        .version(version)
        .author(built_info::PKG_AUTHORS)
        .about(built_info::PKG_DESCRIPTION)
        .after_help(after_help)
        .arg(
            Arg::with_name("device-name")
                .long("device-name")
                .value_name("NAME")
                .takes_value(true)
                .default_value(config::DEFAULT_DEVICE_NAME)
                .help("Input device name (substring) to read reports from"),
        )
        .arg(
            Arg::with_name("device")
                .long("device")
                .value_name("PATH")
                .takes_value(true)
                .help("Event stream to read from, skips the device lookup"),
        )
        .arg(
            Arg::with_name("locator")
                .long("locator")
                .takes_value(true)
                .possible_values(&["proc", "udev"])
                .default_value(LocatorKind::default().as_str())
                .help("Device lookup strategy"),
        )
        .arg(
            Arg::with_name("vendor-id")
                .long("vendor-id")
                .value_name("VID")
                .takes_value(true)
                .help("Vendor id of the virtual device (decimal or 0x hex)"),
        )
        .arg(
            Arg::with_name("product-id")
                .long("product-id")
                .value_name("PID")
                .takes_value(true)
                .help("Product id of the virtual device (decimal or 0x hex)"),
        )
        .arg(
            Arg::with_name("debounce-ms")
                .long("debounce-ms")
                .value_name("MS")
                .takes_value(true)
                .help("Delay after each synthetic key click [default: 10]"),
        )
        .arg(
            Arg::with_name("poll-timeout-ms")
                .long("poll-timeout-ms")
                .value_name("MS")
                .takes_value(true)
                .help("Maximum wait for a report before waking up [default: 5000]"),
        )
        .arg(
            Arg::with_name("daemon")
                .short("d")
                .long("daemon")
                .help("Detach from the terminal and run in the background"),
        )
        .arg(
            Arg::with_name("list")
                .long("list")
                .help("List input devices visible to the locator and exit"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
}

fn parse_ms(matches: &ArgMatches, name: &str, default: u64) -> Result<Duration, Error> {
    match matches.value_of(name) {
        Some(value) => value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| Error::InvalidConfig(format!("--{name} {value}: {e}"))),
        None => Ok(Duration::from_millis(default)),
    }
}

/// Builds the runtime options from parsed arguments
pub fn from_matches(matches: &ArgMatches) -> Result<Args, Error> {
    let mut config = Config::default();

    if let Some(name) = matches.value_of("device-name") {
        config.device_name_match = name.to_string();
    }
    config.device_path = matches.value_of("device").map(PathBuf::from);
    if let Some(locator) = matches.value_of("locator") {
        config.locator = locator.parse::<LocatorKind>()?;
    }
    if let Some(vid) = matches.value_of("vendor-id") {
        config.identity.vendor_id = config::parse_u16(vid)?;
    }
    if let Some(pid) = matches.value_of("product-id") {
        config.identity.product_id = config::parse_u16(pid)?;
    }
    config.debounce = parse_ms(matches, "debounce-ms", config::DEFAULT_DEBOUNCE_MS)?;
    config.poll_timeout = parse_ms(matches, "poll-timeout-ms", config::DEFAULT_POLL_TIMEOUT_MS)?;
    config.daemonize = matches.is_present("daemon");
    config.validate()?;

    Ok(Args {
        config,
        verbosity: matches.occurrences_of("verbose"),
        list: matches.is_present("list"),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, Error> {
        let matches = app("test", "")
            .get_matches_from_safe(argv)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        from_matches(&matches)
    }

    #[test]
    fn defaults() {
        let args = parse(&["xenon-multimedia-keys"]).unwrap();
        assert_eq!(args.verbosity, 0);
        assert!(!args.list);
        assert!(!args.config.daemonize);
        assert_eq!(args.config.device_name_match, config::DEFAULT_DEVICE_NAME);
        assert_eq!(args.config.device_path, None);
        assert_eq!(args.config.debounce, Duration::from_millis(10));
        assert_eq!(args.config.poll_timeout, Duration::from_millis(5000));
        assert_eq!(args.config.locator, LocatorKind::default());
    }

    #[test]
    fn help_shows_build_default_locator() {
        let mut help = Vec::new();
        app("0.0.0", "").write_help(&mut help).unwrap();
        let help = String::from_utf8(help).unwrap();
        assert!(help.contains(&format!(
            "[default: {}]",
            LocatorKind::default().as_str()
        )));
    }

    #[test]
    fn overrides() {
        let args = parse(&[
            "xenon-multimedia-keys",
            "--device-name",
            "Other Keyboard",
            "--device",
            "/dev/input/event7",
            "--locator",
            "proc",
            "--vendor-id",
            "0x308f",
            "--product-id",
            "48",
            "--debounce-ms",
            "25",
            "--poll-timeout-ms",
            "250",
            "-d",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.verbosity, 2);
        assert!(args.config.daemonize);
        assert_eq!(args.config.device_name_match, "Other Keyboard");
        assert_eq!(
            args.config.device_path,
            Some(PathBuf::from("/dev/input/event7"))
        );
        assert_eq!(args.config.locator, LocatorKind::Proc);
        assert_eq!(args.config.identity.vendor_id, 0x308f);
        assert_eq!(args.config.identity.product_id, 48);
        assert_eq!(args.config.debounce, Duration::from_millis(25));
        assert_eq!(args.config.poll_timeout, Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(&["xenon-multimedia-keys", "--poll-timeout-ms", "0"]).is_err());
        assert!(parse(&["xenon-multimedia-keys", "--debounce-ms", "-1"]).is_err());
        assert!(parse(&["xenon-multimedia-keys", "--vendor-id", "0x1ffff"]).is_err());
        assert!(parse(&["xenon-multimedia-keys", "--locator", "sysfs"]).is_err());
    }
}
