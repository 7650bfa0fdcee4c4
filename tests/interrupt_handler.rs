//! Runs in its own process: raising a signal flips the global interrupt flag.

#![cfg(unix)]

use boxing_bench::engine::{CancelToken, install_interrupt_handler, interrupted};

fn disposition(sig: libc::c_int) -> libc::sighandler_t {
    unsafe {
        let mut old: libc::sigaction = std::mem::zeroed();
        libc::sigaction(sig, std::ptr::null(), &mut old);
        old.sa_sigaction
    }
}

#[test]
fn first_interrupt_cancels_and_second_uses_default_action() {
    install_interrupt_handler();
    assert_ne!(disposition(libc::SIGINT), libc::SIG_DFL);
    assert!(!interrupted());

    unsafe {
        libc::raise(libc::SIGINT);
    }

    assert!(interrupted());
    assert!(CancelToken::new().is_cancelled());
    assert_eq!(disposition(libc::SIGINT), libc::SIG_DFL);
    // SIGTERM still has its handler until it is delivered once.
    assert_ne!(disposition(libc::SIGTERM), libc::SIG_DFL);
}
