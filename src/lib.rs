//! Watch a single path with [`inotify`](https://man7.org/linux/man-pages/man7/inotify.7.html)
//! and describe every event in plain words.
//!
//! ## Features
//!
//! - Decode the packed records returned by an inotify read without reinterpreting raw memory.
//! - Describe every set mask bit with a fixed, ordered table of clauses.
//! - Run a signal-aware watch loop, or consume events as an async stream (`tokio` feature).
//!
//! ## Example
//!
//! ```no_run
//! use inotify_watcher::signal::StopFlag;
//! use inotify_watcher::watcher::{watch, WatchOptions};
//!
//! let stop = StopFlag::install().expect("handlers to be installed");
//! watch("/tmp", stop, WatchOptions::default()).expect("watch to succeed");
//! ```
//!
//! Each event becomes one line on stdout:
//!
//! ```text
//! Watching path "/tmp".
//! "/tmp/a.txt" was created.
//! "/tmp/a.txt" was opened.
//! "/tmp/a.txt" was modified.
//! "/tmp/d" was created. "/tmp/d" is directory.
//! ```
//!
//! ## Runtime Support
//!
//! [`EventStream`](stream::EventStream) needs [`tokio`](https://github.com/tokio-rs/tokio) and is
//! enabled by the default `tokio` feature.
//!
//! ## License
//!
//! This project is licensed under MIT License.

#[cfg(not(target_os = "linux"))]
compile_error!("inotify-watcher only supports Linux.");

pub mod decode;
pub mod error;
pub mod flags;
pub mod format;
pub mod path;
pub mod signal;
pub mod source;
#[cfg(feature = "tokio")]
pub mod stream;
pub mod sys;
pub mod watcher;

pub use error::{Error, Result};
