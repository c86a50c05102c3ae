//! Cross-thread event delivery into the UI thread.

use std::sync::mpsc;

use crate::resize::ResizeOutcome;
use crate::scheduler::Tick;

/// Destination for events produced on helper threads
///
/// `send` returns `false` once the receiving side is gone; producers treat
/// that as a signal to shut down.
pub trait EventSink<T>: Clone + Send + 'static {
    fn send(&self, event: T) -> bool;
}

impl<T: Send + 'static> EventSink<T> for mpsc::Sender<T> {
    fn send(&self, event: T) -> bool {
        mpsc::Sender::send(self, event).is_ok()
    }
}

/// Events posted to the winit event loop
#[derive(Debug)]
pub enum UserEvent {
    /// One beat from the scheduler
    Tick(Tick),

    /// A resize request finished (resized or fallback)
    ImageReady(ResizeOutcome),
}
