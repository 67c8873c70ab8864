//! The watch loop.
//!
//! ```text
//! Idle -> Registering -> Polling <-> Draining
//!                           |
//!                           v
//!                 ReleasingResources -> Stopped
//! ```
//!
//! The stop flag is checked once per pass through `Polling`. A batch that has been read is always
//! formatted completely before the loop looks at the flag again.

use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, warn};

use crate::decode::decode_all;
use crate::error::{Error, Result};
use crate::flags::EventMask;
use crate::format::format_line;
use crate::path::WatchedPath;
use crate::signal::StopFlag;
use crate::source::EventSource;
use crate::sys::Inotify;


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum State {
    Idle,
    Registering,
    Polling,
    /// Holds the byte count reported by the source.
    Draining(usize),
    ReleasingResources,
    Stopped,
}

/// What `Polling` does when no bytes are pending.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IdleStrategy {
    /// Re-poll immediately.
    Spin,
    /// Block on the source for at most this long. A caught signal cuts the wait short.
    Wait(Duration),
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub mask: EventMask,
    pub idle: IdleStrategy,
    /// Stop the loop on the first failed read instead of skipping the batch.
    pub fatal_read_errors: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            mask: EventMask::ALL_EVENTS,
            idle: IdleStrategy::Wait(Duration::from_millis(100)),
            fatal_read_errors: false,
        }
    }
}

/// Drives one [`WatchedPath`] against one [`EventSource`], writing a line per event to `out`.
pub struct Watcher<S, W> {
    source: S,
    path: WatchedPath,
    out: W,
    stop: StopFlag,
    options: WatchOptions,
    announce: bool,
    state: State,
}

impl<S: EventSource, W: Write> Watcher<S, W> {
    pub fn new(source: S, path: WatchedPath, out: W, stop: StopFlag) -> Self {
        Self {
            source,
            path,
            out,
            stop,
            options: WatchOptions::default(),
            announce: true,
            state: State::Idle,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: WatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Skip the banner in `Idle`, for callers that already printed it with [`announce`].
    #[must_use]
    pub fn without_banner(mut self) -> Self {
        self.announce = false;
        self
    }

    pub const fn state(&self) -> State {
        self.state
    }

    pub const fn path(&self) -> &WatchedPath {
        &self.path
    }

    /// Run until the stop flag is set.
    ///
    /// The watch is released on every way out, errors included.
    ///
    /// # Errors
    /// [`Error::WatchEstablish`] when registration fails, [`Error::Output`] when `out` can't be
    /// written, and [`Error::Read`] when reads fail with `fatal_read_errors` set.
    pub fn run(&mut self) -> Result<()> {
        while self.state != State::Stopped {
            match self.step() {
                Ok(next) => self.state = next,
                Err(e) => {
                    self.path.release(&mut self.source);
                    self.state = State::Stopped;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> (S, W) {
        (self.source, self.out)
    }

    fn step(&mut self) -> Result<State> {
        match self.state {
            State::Idle => {
                if self.announce {
                    announce(&mut self.out, self.path.root()).map_err(Error::Output)?;
                }
                Ok(State::Registering)
            }
            State::Registering => {
                self.path.register(&mut self.source, self.options.mask)?;
                Ok(State::Polling)
            }
            State::Polling => self.poll(),
            State::Draining(available) => {
                self.drain(available)?;
                Ok(State::Polling)
            }
            State::ReleasingResources => {
                self.path.release(&mut self.source);
                Ok(State::Stopped)
            }
            State::Stopped => Ok(State::Stopped),
        }
    }

    fn poll(&mut self) -> Result<State> {
        if self.stop.is_set() {
            debug!("Stop requested, releasing {:?}", self.path.root());
            return Ok(State::ReleasingResources);
        }

        let available = match self.source.bytes_available() {
            Ok(available) => available,
            Err(e) => {
                self.read_failed(e)?;
                0
            }
        };
        if available > 0 {
            return Ok(State::Draining(available));
        }

        if let IdleStrategy::Wait(timeout) = self.options.idle {
            if let Err(e) = self.source.wait(timeout) {
                warn!("Waiting for inotify events failed: {}", e);
            }
        }
        Ok(State::Polling)
    }

    fn drain(&mut self, available: usize) -> Result<()> {
        let mut buffer = vec![0_u8; available];
        let read = match self.source.read(&mut buffer) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) => return self.read_failed(e),
        };
        if read < available {
            debug!("Short read: {} of {} byte(s)", read, available);
        }

        for event in decode_all(&buffer[..read]) {
            debug!("{}", event);
            let line = format_line(&event, &self.path);
            if line.is_empty() {
                debug!("No known flags in raw mask {:#x}, nothing to print", event.raw_mask);
                continue;
            }
            self.out
                .write_all(&line)
                .and_then(|_| self.out.write_all(b"\n"))
                .map_err(Error::Output)?;
        }
        self.out.flush().map_err(Error::Output)
    }

    fn read_failed(&self, e: io::Error) -> Result<()> {
        if self.options.fatal_read_errors {
            error!("Reading inotify events failed: {}", e);
            Err(Error::Read(e))
        } else {
            warn!("Reading inotify events failed, skipping batch: {}", e);
            Ok(())
        }
    }
}

/// Write the `Watching path "…".` banner and flush it.
///
/// # Errors
/// Return error when `out` can't be written.
pub fn announce<W: Write>(out: &mut W, root: &Path) -> io::Result<()> {
    out.write_all(b"Watching path \"")?;
    out.write_all(root.as_os_str().as_bytes())?;
    out.write_all(b"\".\n")?;
    out.flush()
}

/// Watch `path` with a fresh inotify instance, printing events to stdout until `stop` is set.
///
/// The banner goes out before inotify is opened, so it is printed even when that fails.
///
/// # Errors
/// [`Error::WatchInit`] when inotify is unavailable, otherwise as [`Watcher::run`].
pub fn watch(path: impl Into<PathBuf>, stop: StopFlag, options: WatchOptions) -> Result<()> {
    watch_with(path.into(), stop, options, io::stdout(), Inotify::init)
}

fn watch_with<W: Write>(
    path: PathBuf,
    stop: StopFlag,
    options: WatchOptions,
    mut out: W,
    init: impl FnOnce() -> io::Result<Inotify>,
) -> Result<()> {
    announce(&mut out, &path).map_err(Error::Output)?;
    let inotify = init().map_err(Error::WatchInit)?;
    let mut watcher = Watcher::new(inotify, WatchedPath::new(path), out, stop)
        .with_options(options)
        .without_banner();
    let result = watcher.run();

    let (inotify, _) = watcher.into_inner();
    if let Err(e) = inotify.close() {
        warn!("Closing inotify instance failed: {}", e);
    }
    result
}
