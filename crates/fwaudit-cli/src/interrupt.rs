//! Ctrl-C wiring for cooperative cancellation.
//!
//! The handler only flips a flag; the long analyzer passes poll it at
//! every outer iteration and abort with an interrupt error. The flag is
//! rearmed before each command so one Ctrl-C cancels one command.

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn on_sigint(_signal: i32) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Installs the SIGINT handler. Without one, Ctrl-C would kill the shell
/// instead of cancelling the running pass.
#[cfg(unix)]
#[allow(unsafe_code)]
pub fn install() {
    use nix::sys::signal::{signal, SigHandler, Signal};
    // SAFETY: the handler only touches an atomic flag.
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::Handler(on_sigint));
    }
}

#[cfg(not(unix))]
pub fn install() {}

/// True once the user pressed Ctrl-C since the last `rearm`.
pub fn observed() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

pub fn rearm() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}
