//! Signal-driven stop flag.
//!
//! The flag is the only state shared with the signal handler. It is a single atomic word, so the
//! handler can store to it without locking and the watch loop sees the store on its next
//! iteration.

use std::io;
use std::os::raw::c_int;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;
use once_cell::sync::OnceCell;

/// Signals that ask the watcher to stop.
pub const SIGNALS_TO_CATCH: [c_int; 6] = [
    libc::SIGINT,
    libc::SIGTERM,
    libc::SIGABRT,
    libc::SIGSEGV,
    libc::SIGILL,
    libc::SIGQUIT,
];

static PROCESS_FLAG: OnceCell<StopFlag> = OnceCell::new();

/// A boolean that starts as "continue" and, once set, stays "stop".
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide flag, with handlers for [`SIGNALS_TO_CATCH`] installed.
    ///
    /// Every call returns a handle to the same flag. Each handler fires once: the first signal
    /// sets the flag and restores the default disposition, so a repeated signal terminates the
    /// process.
    ///
    /// # Errors
    /// Return the OS error from `sigaction`.
    pub fn install() -> io::Result<Self> {
        let flag = PROCESS_FLAG.get_or_init(Self::new).clone();
        for sig in SIGNALS_TO_CATCH {
            register(sig)?;
        }
        debug!("Installed stop handlers for {:?}", SIGNALS_TO_CATCH);
        Ok(flag)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

extern "C" fn on_signal(_sig: c_int) {
    if let Some(flag) = PROCESS_FLAG.get() {
        flag.set();
    }
}

fn register(sig: c_int) -> io::Result<()> {
    let handler: extern "C" fn(c_int) = on_signal;
    let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
    action.sa_sigaction = handler as libc::sighandler_t;
    // No SA_RESTART: a pending poll(2) returns EINTR and the loop checks the flag right away.
    action.sa_flags = libc::SA_RESETHAND;
    unsafe { libc::sigemptyset(&mut action.sa_mask) };
    if unsafe { libc::sigaction(sig, &action, std::ptr::null_mut()) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::StopFlag;

    /// Held by every test that installs handlers or delivers signals.
    pub(crate) static TEST_PARALLEL_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn must_stay_set() {
        let flag = StopFlag::new();
        let shared = flag.clone();
        assert!(!flag.is_set());
        shared.set();
        shared.set();
        assert!(flag.is_set());
    }

    #[test]
    fn must_hand_out_the_same_process_flag() {
        let _guard = TEST_PARALLEL_LOCK.lock().expect("to lock");
        let a = StopFlag::install().expect("to install");
        let b = StopFlag::install().expect("to install");
        a.set();
        assert!(b.is_set());
    }

    #[test]
    fn must_set_process_flag_on_signal() {
        let _guard = TEST_PARALLEL_LOCK.lock().expect("to lock");
        let flag = StopFlag::install().expect("to install");
        flag.clear();
        assert_eq!(unsafe { libc::raise(libc::SIGQUIT) }, 0);
        assert!(flag.is_set());
    }
}
