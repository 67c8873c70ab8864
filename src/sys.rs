//! Raw inotify bindings.
//!
//! Constants mirror `<sys/inotify.h>`. The packed record layout is described by
//! [`EVENT_HEADER_SIZE`] and decoded field-by-field in [`decode`](crate::decode) rather than by
//! casting the buffer to a struct.
#![allow(non_upper_case_globals, clippy::unreadable_literal)]

use std::ffi::CString;
use std::io;
use std::os::raw::{c_int, c_uint};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use std::time::Duration;

use log::debug;

pub type InotifyEventMask = c_uint;

pub const IN_ACCESS: InotifyEventMask = 0x00000001;
pub const IN_MODIFY: InotifyEventMask = 0x00000002;
pub const IN_ATTRIB: InotifyEventMask = 0x00000004;
pub const IN_CLOSE_WRITE: InotifyEventMask = 0x00000008;
pub const IN_CLOSE_NOWRITE: InotifyEventMask = 0x00000010;
pub const IN_OPEN: InotifyEventMask = 0x00000020;
pub const IN_MOVED_FROM: InotifyEventMask = 0x00000040;
pub const IN_MOVED_TO: InotifyEventMask = 0x00000080;
pub const IN_CREATE: InotifyEventMask = 0x00000100;
pub const IN_DELETE: InotifyEventMask = 0x00000200;
pub const IN_DELETE_SELF: InotifyEventMask = 0x00000400;
pub const IN_MOVE_SELF: InotifyEventMask = 0x00000800;

pub const IN_UNMOUNT: InotifyEventMask = 0x00002000;
pub const IN_Q_OVERFLOW: InotifyEventMask = 0x00004000;
pub const IN_IGNORED: InotifyEventMask = 0x00008000;

pub const IN_ONLYDIR: InotifyEventMask = 0x01000000;
pub const IN_DONT_FOLLOW: InotifyEventMask = 0x02000000;
pub const IN_EXCL_UNLINK: InotifyEventMask = 0x04000000;
pub const IN_MASK_ADD: InotifyEventMask = 0x20000000;
pub const IN_ISDIR: InotifyEventMask = 0x40000000;
pub const IN_ONESHOT: InotifyEventMask = 0x80000000;

pub const IN_ALL_EVENTS: InotifyEventMask = IN_ACCESS
    | IN_MODIFY
    | IN_ATTRIB
    | IN_CLOSE_WRITE
    | IN_CLOSE_NOWRITE
    | IN_OPEN
    | IN_MOVED_FROM
    | IN_MOVED_TO
    | IN_CREATE
    | IN_DELETE
    | IN_DELETE_SELF
    | IN_MOVE_SELF;

/// Size of the fixed part of `struct inotify_event`: `wd`, `mask`, `cookie` and `len`.
pub const EVENT_HEADER_SIZE: usize = 16;

/// A watch descriptor returned by `inotify_add_watch`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WatchDescriptor(pub c_int);

/// An owned inotify instance.
///
/// The instance is opened with `IN_NONBLOCK | IN_CLOEXEC` and closed on drop.
#[derive(Debug)]
pub struct Inotify {
    fd: RawFd,
}

impl Inotify {
    /// Open a new inotify instance.
    ///
    /// # Errors
    /// Return the OS error from `inotify_init1`, e.g. when the per-user instance limit is hit.
    pub fn init() -> io::Result<Self> {
        let fd = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        debug!("Opened inotify instance on fd {}", fd);
        Ok(Self { fd })
    }

    /// Start watching `path` for the events in `mask`.
    ///
    /// # Errors
    /// Return error when the path contains a NUL byte, does not exist, is not readable, or the
    /// watch limit is exhausted.
    pub fn add_watch(&mut self, path: &Path, mask: InotifyEventMask) -> io::Result<WatchDescriptor> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let wd = unsafe { libc::inotify_add_watch(self.fd, c_path.as_ptr(), mask) };
        if wd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(WatchDescriptor(wd))
    }

    /// Stop watching the path behind `wd`.
    ///
    /// # Errors
    /// `EINVAL` when the kernel already dropped the watch.
    pub fn rm_watch(&mut self, wd: WatchDescriptor) -> io::Result<()> {
        if unsafe { libc::inotify_rm_watch(self.fd, wd.0) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Number of bytes that can be read right now without blocking.
    ///
    /// # Errors
    /// Return the OS error from `ioctl(FIONREAD)`.
    pub fn bytes_available(&self) -> io::Result<usize> {
        let mut available: c_int = 0;
        if unsafe { libc::ioctl(self.fd, libc::FIONREAD, &mut available as *mut c_int) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(usize::try_from(available).unwrap_or(0))
    }

    /// Read pending records into `buffer`. Returns the number of bytes written.
    ///
    /// # Errors
    /// `WouldBlock` when nothing is pending, or the OS error from `read`.
    pub fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(self.fd, buffer.as_mut_ptr().cast(), buffer.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n.unsigned_abs())
    }

    /// Block until the instance is readable or `timeout` elapses.
    ///
    /// Returns `Ok(false)` on timeout and when a signal interrupted the wait.
    ///
    /// # Errors
    /// Return the OS error from `poll`, except `EINTR`.
    pub fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let mut pollfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
        let ready = unsafe { libc::poll(&mut pollfd, 1, timeout) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err);
        }
        Ok(ready > 0 && pollfd.revents & libc::POLLIN != 0)
    }

    /// Close the instance, reporting any error from `close`.
    ///
    /// # Errors
    /// Return the OS error from `close`.
    pub fn close(mut self) -> io::Result<()> {
        let fd = std::mem::replace(&mut self.fd, -1);
        if unsafe { libc::close(fd) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl AsRawFd for Inotify {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for Inotify {
    fn drop(&mut self) {
        if self.fd >= 0 {
            unsafe { libc::close(self.fd) };
        }
    }
}
