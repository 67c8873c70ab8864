//! Stream-based inotify interface.
#![allow(clippy::module_name_repetitions)]

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::stream::{iter, StreamExt};
use log::{debug, error};
use tokio1::io::unix::AsyncFd;

use crate::decode::{decode_all, Event};
use crate::error::{Error, Result};
use crate::flags::EventMask;
use crate::path::WatchedPath;
use crate::source::EventSource;
use crate::sys::Inotify;

/// A stream of decoded event batches, one batch per read.
///
/// You may want a stream of [`Event`](Event) instead of a stream of batches of it.
/// Call [`EventStream::into_flatten`](EventStream::into_flatten) to get one.
///
/// The stream ends when the descriptor reports an error; the error is logged.
pub struct EventStream {
    inotify: AsyncFd<Inotify>,
    path: WatchedPath,
}

impl EventStream {
    /// Watch `path` for `mask`. Must be called within a tokio runtime.
    ///
    /// # Errors
    /// [`Error::WatchInit`] when inotify can't be opened or registered with the reactor,
    /// [`Error::WatchEstablish`] when the path is rejected.
    pub fn new(path: impl Into<PathBuf>, mask: EventMask) -> Result<Self> {
        let mut inotify = Inotify::init().map_err(Error::WatchInit)?;
        let mut path = WatchedPath::new(path);
        path.register(&mut inotify, mask)?;
        let inotify = AsyncFd::new(inotify).map_err(Error::WatchInit)?;
        Ok(Self { inotify, path })
    }

    pub const fn path(&self) -> &WatchedPath {
        &self.path
    }

    /// Flatten event batches and produce a stream of [`Event`](Event).
    pub fn into_flatten(self) -> impl Stream<Item = Event> {
        self.flat_map(iter)
    }

    /// Release the watch and close the descriptor.
    ///
    /// # Errors
    /// Return the OS error from `close`.
    pub fn close(self) -> io::Result<()> {
        let Self { inotify, mut path } = self;
        let mut inotify = inotify.into_inner();
        path.release(&mut inotify);
        inotify.close()
    }
}

impl Stream for EventStream {
    type Item = Vec<Event>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let mut guard = match this.inotify.poll_read_ready_mut(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => {
                    error!("Unable to poll inotify descriptor: {}", e);
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            };

            let available = match guard.get_inner().bytes_available() {
                Ok(0) => {
                    guard.clear_ready();
                    continue;
                }
                Ok(available) => available,
                Err(e) => {
                    error!("Unable to query pending inotify bytes: {}", e);
                    return Poll::Ready(None);
                }
            };

            let mut buffer = vec![0_u8; available];
            match guard.try_io(|inotify| EventSource::read(inotify.get_mut(), &mut buffer)) {
                Ok(Ok(read)) => {
                    let events: Vec<_> = decode_all(&buffer[..read]).collect();
                    debug!("Received {} event(s)", events.len());
                    return Poll::Ready(Some(events));
                }
                Ok(Err(e)) => {
                    error!("Unable to read inotify events: {}", e);
                    return Poll::Ready(None);
                }
                Err(_would_block) => continue,
            }
        }
    }
}
