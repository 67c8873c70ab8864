use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can stop a watch from running.
#[derive(Debug)]
pub enum Error {
    /// Wrong number of command line arguments.
    Usage { program: String },
    /// The inotify instance could not be opened.
    WatchInit(io::Error),
    /// The kernel refused to watch the path.
    WatchEstablish { path: PathBuf, source: io::Error },
    /// Reading pending records failed.
    Read(io::Error),
    /// Writing event lines failed.
    Output(io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage { program } => write!(f, "USAGE {} PATH", program),
            Self::WatchInit(e) => write!(f, "inotify_init: {}", e),
            Self::WatchEstablish { path, source } => {
                write!(f, "inotify_add_watch: {}: {}", path.display(), source)
            }
            Self::Read(e) => write!(f, "read: {}", e),
            Self::Output(e) => write!(f, "write: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Usage { .. } => None,
            Self::WatchInit(e) | Self::Read(e) | Self::Output(e) => Some(e),
            Self::WatchEstablish { source, .. } => Some(source),
        }
    }
}
