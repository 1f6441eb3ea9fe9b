/* Copyright (C) 2019-2021 by Jacob Alexander
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

#[macro_use]
extern crate log;

use std::sync::atomic::Ordering;
use xenon_multimedia_keys::bridge::{self, LoopExit};
use xenon_multimedia_keys::{args, daemon, device, logging, RUNNING};

fn main() {
    std::process::exit(start());
}

/// Main entry point
fn start() -> i32 {
    let version_info = args::version_info();
    let after_info = args::build_info();

    // Process command-line arguments
    let matches = args::app(&version_info, &after_info).get_matches();
    let args = match args::from_matches(&matches) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    if let Err(e) = logging::setup_logging(args.verbosity) {
        eprintln!("{}", e);
        return 1;
    }
    info!("Version: {}", version_info);
    info!("Build: {}", after_info);

    if args.list {
        return match device::locator(args.config.locator).and_then(|locator| locator.list()) {
            Ok(devices) => {
                for device in devices {
                    println!("{}", device);
                }
                0
            }
            Err(e) => {
                error!("{}", e);
                1
            }
        };
    }

    // Devices are set up in the foreground, the fork happens before the signal handler thread
    info!("Initializing multimedia key bridge...");
    debug!("{:?}", args.config);
    let bridge = match bridge::launch(&args.config, bridge::open, daemon::daemonize) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    // Setup signal handler
    let r = RUNNING.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        error!("Error setting signal handler: {}", e);
        return 1;
    }

    let summary = bridge.run();
    if let LoopExit::StreamError(e) = summary.exit {
        warn!("Stopped on input error: {}", e);
    }

    info!("---------------------- Xenon multimedia keys exiting! ----------------------");
    0
}
