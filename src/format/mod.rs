//! Human-readable descriptions of decoded events.
//!
//! [`CLAUSES`] is the authoritative mapping from mask bit to description. It is evaluated top to
//! bottom: content and access events, then lifecycle events, then filesystem-level events, and the
//! directory qualifier last.

use std::iter;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use either::Either;

use crate::decode::Event;
use crate::flags::EventMask;
use crate::path::WatchedPath;


/// Reported instead of anything else when the kernel event queue overflowed.
pub const OVERFLOW_CLAUSE: &str = "EVENT QUEUE OVERFLOW!";

/// Names a clause can refer to.
///
/// Kept as paths so that names which are not UTF-8 are printed byte for byte.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Subject {
    /// Resolved path of the affected entry.
    pub name: PathBuf,
    /// The watched path.
    pub root: PathBuf,
}

impl Subject {
    pub fn of(event: &Event, ctx: &WatchedPath) -> Self {
        Self {
            name: ctx.resolve_name(event),
            root: ctx.root().to_path_buf(),
        }
    }
}

/// A piece of a clause.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Part {
    Text(&'static str),
    /// The resolved name of the affected entry.
    Name,
    /// The watched path.
    Root,
}

/// One row of the bit-to-description table.
#[derive(Debug, Copy, Clone)]
pub struct Clause {
    pub flag: EventMask,
    pub parts: &'static [Part],
}

impl Clause {
    pub fn render(&self, subject: &Subject) -> Vec<u8> {
        let mut rendered = Vec::new();
        for part in self.parts {
            let bytes = match part {
                Part::Text(text) => text.as_bytes(),
                Part::Name => subject.name.as_os_str().as_bytes(),
                Part::Root => subject.root.as_os_str().as_bytes(),
            };
            rendered.extend_from_slice(bytes);
        }
        rendered
    }
}

macro_rules! clause {
    ($flag: ident, $text: literal) => {
        Clause {
            flag: EventMask::$flag,
            parts: &[Part::Text("\""), Part::Name, Part::Text(concat!("\" ", $text))],
        }
    };
    ($flag: ident, $text: literal, root) => {
        Clause {
            flag: EventMask::$flag,
            parts: &[
                Part::Text("\""),
                Part::Name,
                Part::Text(concat!("\" ", $text, " \"")),
                Part::Root,
                Part::Text("\"."),
            ],
        }
    };
}

pub static CLAUSES: [Clause; 16] = [
    clause!(ACCESS, "was accessed."),
    clause!(MODIFY, "was modified."),
    clause!(ATTRIB, "has metadata changed."),
    clause!(CLOSE_WRITE, "was closed (read-only)."),
    clause!(CLOSE_NOWRITE, "was closed (writeable)."),
    clause!(OPEN, "was opened."),
    clause!(MOVED_FROM, "was moved from", root),
    clause!(MOVED_TO, "was moved to", root),
    clause!(CREATE, "was created."),
    clause!(DELETE, "was deleted."),
    clause!(DELETE_SELF, "(self) was deleted."),
    clause!(MOVE_SELF, "(self) was moved."),
    clause!(UNMOUNT, "filesystem was unmounted!"),
    Clause {
        flag: EventMask::Q_OVERFLOW,
        parts: &[Part::Text(OVERFLOW_CLAUSE)],
    },
    clause!(IGNORED, "was ignored."),
    clause!(ISDIR, "is directory."),
];

/// Describe every known bit set on `event`, in table order.
///
/// An overflow event yields only [`OVERFLOW_CLAUSE`]: no entry is implicated, so no name is
/// printed. Unknown bits are skipped.
pub fn clauses(event: &Event, ctx: &WatchedPath) -> impl Iterator<Item = Vec<u8>> {
    if event.mask.contains(EventMask::Q_OVERFLOW) {
        Either::Left(iter::once(OVERFLOW_CLAUSE.as_bytes().to_vec()))
    } else {
        let subject = Subject::of(event, ctx);
        let mask = event.mask;
        Either::Right(
            CLAUSES
                .iter()
                .filter(move |clause| mask.contains(clause.flag))
                .map(move |clause| clause.render(&subject)),
        )
    }
}

/// All clauses of `event` as one output line, separated by single spaces.
///
/// Empty when no known bit is set.
pub fn format_line(event: &Event, ctx: &WatchedPath) -> Vec<u8> {
    clauses(event, ctx).collect::<Vec<_>>().join(&b' ')
}
