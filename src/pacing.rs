use std::time::Duration;

/// Waits between playback steps and retry attempts.
///
/// Pacing is a readability concern, never a correctness one: an
/// implementation may return immediately.
pub trait Pacer {
    fn pause(&mut self, duration: Duration);
}

/// Blocks the current thread for the requested duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Never waits. Used for headless replays.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn pause(&mut self, _duration: Duration) {}
}
