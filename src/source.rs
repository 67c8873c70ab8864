use std::io;
use std::path::Path;
use std::time::Duration;

use crate::flags::EventMask;
use crate::sys::{Inotify, WatchDescriptor};

/// The change-notification facility a [`Watcher`](crate::watcher::Watcher) pulls records from.
///
/// [`Inotify`] is the real implementation. Records returned by [`read`](EventSource::read) must
/// use the packed `struct inotify_event` layout.
pub trait EventSource {
    fn add_watch(&mut self, path: &Path, mask: EventMask) -> io::Result<WatchDescriptor>;

    fn remove_watch(&mut self, wd: WatchDescriptor) -> io::Result<()>;

    /// Bytes that a subsequent [`read`](EventSource::read) can return without blocking.
    fn bytes_available(&mut self) -> io::Result<usize>;

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// Park the caller until data may be available, at most for `timeout`.
    ///
    /// Sources that cannot block return immediately.
    fn wait(&mut self, timeout: Duration) -> io::Result<()> {
        let _ = timeout;
        Ok(())
    }
}

impl EventSource for Inotify {
    fn add_watch(&mut self, path: &Path, mask: EventMask) -> io::Result<WatchDescriptor> {
        Inotify::add_watch(self, path, mask.bits())
    }

    fn remove_watch(&mut self, wd: WatchDescriptor) -> io::Result<()> {
        self.rm_watch(wd)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Inotify::bytes_available(self)
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        Inotify::read(self, buffer)
    }

    fn wait(&mut self, timeout: Duration) -> io::Result<()> {
        self.wait_readable(timeout).map(drop)
    }
}
