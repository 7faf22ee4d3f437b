//! Operator start/stop button.
//!
//! The platform's button toggles the run intent on every press. Presses can
//! come from any thread (signal handler, console reader); they are latched
//! in an atomic flag and folded into the intent on the next
//! [`RunControl::poll_start_stop`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use standoff_common::hal::driver::RunControl;
use tracing::info;

/// Toggle-on-press run control.
#[derive(Debug, Default)]
pub struct LatchButton {
    pressed: Arc<AtomicBool>,
    running: bool,
}

/// Cloneable handle that presses a [`LatchButton`] from another thread.
#[derive(Debug, Clone)]
pub struct ButtonHandle {
    pressed: Arc<AtomicBool>,
}

impl ButtonHandle {
    pub fn press(&self) {
        self.pressed.store(true, Ordering::Release);
    }
}

impl LatchButton {
    /// Button with the given initial run intent.
    pub fn new(running: bool) -> Self {
        Self {
            pressed: Arc::new(AtomicBool::new(false)),
            running,
        }
    }

    pub fn handle(&self) -> ButtonHandle {
        ButtonHandle {
            pressed: Arc::clone(&self.pressed),
        }
    }

    /// Press from the owning thread.
    pub fn press(&self) {
        self.pressed.store(true, Ordering::Release);
    }
}

impl RunControl for LatchButton {
    fn poll_start_stop(&mut self) {
        // Several presses between two polls count as one.
        if self.pressed.swap(false, Ordering::AcqRel) {
            self.running = !self.running;
            info!(
                "Operator {}",
                if self.running { "start" } else { "stop" }
            );
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
