//! Decoding of packed inotify records.
//!
//! A single `read` on an inotify descriptor returns any number of consecutive
//! `struct inotify_event` records, each followed by `len` bytes of NUL-padded name:
//!
//! ```text
//! | wd: i32 | mask: u32 | cookie: u32 | len: u32 | name: [u8; len] |
//! ```
//!
//! [`decode_all`] walks such a buffer with an explicit cursor, checking the remaining length
//! before it touches the header and again before it touches the name.

use std::ffi::{OsStr, OsString};
use std::fmt::{Display, Formatter};
use std::os::unix::ffi::OsStrExt;

use log::warn;

use crate::flags::EventMask;
use crate::sys::{WatchDescriptor, EVENT_HEADER_SIZE};


/// A decoded inotify event.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Event {
    pub wd: WatchDescriptor,
    /// Known flags of `raw_mask`. Bits this crate does not know about are dropped.
    pub mask: EventMask,
    pub raw_mask: u32,
    /// Pairs `MOVED_FROM` with the matching `MOVED_TO`.
    pub cookie: u32,
    /// Entry inside the watched directory. `None` when the event is about the watched path itself.
    pub name: Option<OsString>,
    /// Bytes this record occupied in the buffer, header included.
    pub record_len: usize,
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] name: {:?}, flags: {}({:x})",
            self.wd.0, self.name, self.mask, self.raw_mask
        )
    }
}

/// Iterator over the records of one read batch. Created by [`decode_all`].
#[derive(Debug, Clone)]
pub struct Events<'a> {
    buffer: &'a [u8],
    pos: usize,
    truncated: bool,
}

/// Decode every complete record in `buffer`, in delivery order.
///
/// `buffer` must be exactly the bytes returned by the read. A record that would extend past the
/// end ends the iteration without being yielded; see [`Events::is_truncated`].
pub fn decode_all(buffer: &[u8]) -> Events<'_> {
    Events {
        buffer,
        pos: 0,
        truncated: false,
    }
}

impl<'a> Events<'a> {
    /// Whether decoding stopped at a record that did not fit in the buffer.
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Bytes not consumed by the records yielded so far.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.pos
    }

    fn stop_truncated(&mut self, needed: usize) -> Option<Event> {
        warn!(
            "Dropping truncated inotify record at offset {}: needs {} byte(s), {} left",
            self.pos,
            needed,
            self.remaining()
        );
        self.truncated = true;
        self.pos = self.buffer.len();
        None
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0_u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_ne_bytes(word)
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    let mut word = [0_u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    i32::from_ne_bytes(word)
}

fn trim_name(raw: &[u8]) -> Option<OsString> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    if end == 0 {
        None
    } else {
        Some(OsStr::from_bytes(&raw[..end]).to_os_string())
    }
}

impl<'a> Iterator for Events<'a> {
    type Item = Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buffer.len() {
            return None;
        }
        if self.remaining() < EVENT_HEADER_SIZE {
            return self.stop_truncated(EVENT_HEADER_SIZE);
        }

        let header = &self.buffer[self.pos..self.pos + EVENT_HEADER_SIZE];
        let wd = read_i32(header, 0);
        let raw_mask = read_u32(header, 4);
        let cookie = read_u32(header, 8);
        let name_len = read_u32(header, 12) as usize;

        let record_len = match EVENT_HEADER_SIZE.checked_add(name_len) {
            Some(len) if len <= self.remaining() => len,
            _ => return self.stop_truncated(EVENT_HEADER_SIZE.saturating_add(name_len)),
        };

        let name_start = self.pos + EVENT_HEADER_SIZE;
        let name = trim_name(&self.buffer[name_start..name_start + name_len]);
        self.pos += record_len;

        Some(Event {
            wd: WatchDescriptor(wd),
            mask: EventMask::from_bits_truncate(raw_mask),
            raw_mask,
            cookie,
            name,
            record_len,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining() / EVENT_HEADER_SIZE))
    }
}

impl<'a> std::iter::FusedIterator for Events<'a> {}
