use std::fmt::{Display, Formatter};

use crate::sys;

bitflags::bitflags! {
    /// Known inotify event flags.
    #[repr(C)]
    pub struct EventMask: u32 {
        const ACCESS = sys::IN_ACCESS;
        const MODIFY = sys::IN_MODIFY;
        const ATTRIB = sys::IN_ATTRIB;
        const CLOSE_WRITE = sys::IN_CLOSE_WRITE;
        const CLOSE_NOWRITE = sys::IN_CLOSE_NOWRITE;
        const OPEN = sys::IN_OPEN;
        const MOVED_FROM = sys::IN_MOVED_FROM;
        const MOVED_TO = sys::IN_MOVED_TO;
        const CREATE = sys::IN_CREATE;
        const DELETE = sys::IN_DELETE;
        const DELETE_SELF = sys::IN_DELETE_SELF;
        const MOVE_SELF = sys::IN_MOVE_SELF;
        const UNMOUNT = sys::IN_UNMOUNT;
        const Q_OVERFLOW = sys::IN_Q_OVERFLOW;
        const IGNORED = sys::IN_IGNORED;
        const ISDIR = sys::IN_ISDIR;

        /// Every event category a watch can subscribe to.
        const ALL_EVENTS = sys::IN_ALL_EVENTS;
    }
}

impl Display for EventMask {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        const NAMES: [(EventMask, &str); 16] = [
            (EventMask::ACCESS, "ACCESS"),
            (EventMask::MODIFY, "MODIFY"),
            (EventMask::ATTRIB, "ATTRIB"),
            (EventMask::CLOSE_WRITE, "CLOSE_WRITE"),
            (EventMask::CLOSE_NOWRITE, "CLOSE_NOWRITE"),
            (EventMask::OPEN, "OPEN"),
            (EventMask::MOVED_FROM, "MOVED_FROM"),
            (EventMask::MOVED_TO, "MOVED_TO"),
            (EventMask::CREATE, "CREATE"),
            (EventMask::DELETE, "DELETE"),
            (EventMask::DELETE_SELF, "DELETE_SELF"),
            (EventMask::MOVE_SELF, "MOVE_SELF"),
            (EventMask::UNMOUNT, "UNMOUNT"),
            (EventMask::Q_OVERFLOW, "Q_OVERFLOW"),
            (EventMask::IGNORED, "IGNORED"),
            (EventMask::ISDIR, "ISDIR"),
        ];
        for (flag, name) in NAMES {
            if self.contains(flag) {
                write!(f, "{} ", name)?;
            }
        }
        Ok(())
    }
}
