use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use log::debug;

use crate::decode::Event;
use crate::error::{Error, Result};
use crate::flags::EventMask;
use crate::source::EventSource;
use crate::sys::WatchDescriptor;

/// The path being watched and, once registered, its watch descriptor.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct WatchedPath {
    root: PathBuf,
    handle: Option<WatchDescriptor>,
}

impl WatchedPath {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            handle: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn handle(&self) -> Option<WatchDescriptor> {
        self.handle
    }

    pub const fn is_registered(&self) -> bool {
        self.handle.is_some()
    }

    /// Ask `source` to start watching the root for `mask`.
    ///
    /// # Errors
    /// [`Error::WatchEstablish`] when the source rejects the path.
    pub fn register<S: EventSource + ?Sized>(&mut self, source: &mut S, mask: EventMask) -> Result<()> {
        let wd = source
            .add_watch(&self.root, mask)
            .map_err(|source| Error::WatchEstablish {
                path: self.root.clone(),
                source,
            })?;
        debug!("Watching {:?} as wd {}", self.root, wd.0);
        self.handle = Some(wd);
        Ok(())
    }

    /// Full path of the entry an event is about.
    ///
    /// Events without a name are about the root itself, which is returned unchanged. Otherwise
    /// the name is appended after exactly one `/`.
    pub fn resolve_name(&self, event: &Event) -> PathBuf {
        match &event.name {
            None => self.root.clone(),
            Some(name) => {
                let mut full = OsString::from(self.root.as_os_str());
                if !full.as_bytes().ends_with(b"/") {
                    full.push("/");
                }
                full.push(name);
                PathBuf::from(full)
            }
        }
    }

    /// Drop the watch from `source`. Calling it again is a no-op.
    ///
    /// The kernel removes the watch on its own after `IN_IGNORED`, so a failing removal is only
    /// logged.
    pub fn release<S: EventSource + ?Sized>(&mut self, source: &mut S) {
        if let Some(wd) = self.handle.take() {
            match source.remove_watch(wd) {
                Ok(()) => debug!("Released wd {} for {:?}", wd.0, self.root),
                Err(e) => debug!("wd {} for {:?} already gone: {}", wd.0, self.root, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::path::{Path, PathBuf};

    use crate::decode::decode_all;
    use crate::decode::tests::record;
    use crate::error::Error;
    use crate::flags::EventMask;
    use crate::source::EventSource;
    use crate::sys::{WatchDescriptor, IN_CREATE};

    use super::WatchedPath;

    #[derive(Default)]
    struct Registry {
        reject: bool,
        removed: RefCell<Vec<WatchDescriptor>>,
    }

    impl EventSource for Registry {
        fn add_watch(&mut self, _path: &Path, _mask: EventMask) -> io::Result<WatchDescriptor> {
            if self.reject {
                Err(io::Error::from_raw_os_error(libc::ENOENT))
            } else {
                Ok(WatchDescriptor(7))
            }
        }
        fn remove_watch(&mut self, wd: WatchDescriptor) -> io::Result<()> {
            self.removed.borrow_mut().push(wd);
            Ok(())
        }
        fn bytes_available(&mut self) -> io::Result<usize> {
            Ok(0)
        }
        fn read(&mut self, _buffer: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    fn resolve(root: &str, name: Option<&str>) -> PathBuf {
        let buffer = record(1, IN_CREATE, 0, name);
        let event = decode_all(&buffer).next().expect("to decode");
        WatchedPath::new(root).resolve_name(&event)
    }

    #[test]
    fn must_insert_exactly_one_separator() {
        assert_eq!(resolve("/tmp/watch", Some("file.txt")), Path::new("/tmp/watch/file.txt"));
        assert_eq!(resolve("/tmp/watch/", Some("file.txt")), Path::new("/tmp/watch/file.txt"));
        assert_eq!(resolve("relative", Some("x")), Path::new("relative/x"));
    }

    #[test]
    fn must_return_root_unchanged_without_name() {
        let path = WatchedPath::new("/tmp/watch/");
        let buffer = record(1, IN_CREATE, 0, None);
        let event = decode_all(&buffer).next().expect("to decode");
        for _ in 0..3 {
            assert_eq!(path.resolve_name(&event).as_os_str(), "/tmp/watch/");
        }
    }

    #[test]
    fn must_store_handle_on_register_and_clear_on_release() {
        let mut source = Registry::default();
        let mut path = WatchedPath::new("/tmp/watch");
        assert!(!path.is_registered());

        path.register(&mut source, EventMask::ALL_EVENTS).expect("to register");
        assert_eq!(path.handle(), Some(WatchDescriptor(7)));

        path.release(&mut source);
        path.release(&mut source);
        assert_eq!(path.handle(), None);
        assert_eq!(*source.removed.borrow(), vec![WatchDescriptor(7)]);
    }

    #[test]
    fn must_fail_with_watch_establish_error() {
        let mut source = Registry {
            reject: true,
            ..Registry::default()
        };
        let mut path = WatchedPath::new("/does/not/exist");
        match path.register(&mut source, EventMask::ALL_EVENTS) {
            Err(Error::WatchEstablish { path: rejected, source }) => {
                assert_eq!(rejected, Path::new("/does/not/exist"));
                assert_eq!(source.raw_os_error(), Some(libc::ENOENT));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!path.is_registered());
    }
}
