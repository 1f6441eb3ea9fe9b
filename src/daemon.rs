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

/// Background service support
/// Detaching is kept away from event handling, the bridge runs the same either way
// ----- Modules -----
use crate::Error;
use std::ffi::CString;

// ----- Functions -----

fn check(result: libc::c_int) -> Result<libc::c_int, Error> {
    if result < 0 {
        Err(Error::Daemonize(std::io::Error::last_os_error()))
    } else {
        Ok(result)
    }
}

/// Detach from the controlling terminal
///
/// Must be called before any threads are spawned (signal handler, background logger cleanup),
/// only the calling thread survives fork(). Open devices are inherited by the child. The parent
/// process exits with status 0.
pub fn daemonize() -> Result<(), Error> {
    // Fork, the parent is done
    let pid = check(unsafe { libc::fork() })?;
    if pid > 0 {
        std::process::exit(0);
    }

    // New session, no controlling terminal
    check(unsafe { libc::setsid() })?;

    unsafe {
        libc::umask(0);
    }
    std::env::set_current_dir("/").map_err(Error::Daemonize)?;

    redirect_std_streams()
}

/// Point stdin, stdout and stderr at /dev/null
fn redirect_std_streams() -> Result<(), Error> {
    let dev_null = CString::new("/dev/null").map_err(|e| {
        Error::Daemonize(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })?;
    let fd = check(unsafe { libc::open(dev_null.as_ptr(), libc::O_RDWR) })?;
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        check(unsafe { libc::dup2(fd, target) })?;
    }
    if fd > libc::STDERR_FILENO {
        unsafe {
            libc::close(fd);
        }
    }
    Ok(())
}
