use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared redraw flag for overlay invalidation.
///
/// Contract:
/// - `mark` may be called from any thread (tile-load completion included)
///   and never blocks a draw call.
/// - The consumer calls `take` once per frame; `true` means at least one
///   mark happened since the previous take.
///
/// The engine only marks; it never polls.
#[derive(Debug, Clone, Default)]
pub struct RedrawSignal {
    flag: Arc<AtomicBool>,
}

impl RedrawSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_marked(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Consume the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::RedrawSignal;

    #[test]
    fn take_consumes_the_mark() {
        let signal = RedrawSignal::new();
        assert!(!signal.take());
        signal.mark();
        assert!(signal.is_marked());
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn clones_share_one_flag() {
        let signal = RedrawSignal::new();
        let other = signal.clone();
        other.mark();
        assert!(signal.take());
        assert!(!other.is_marked());
    }

    #[test]
    fn markable_from_another_thread() {
        let signal = RedrawSignal::new();
        let remote = signal.clone();
        std::thread::spawn(move || remote.mark())
            .join()
            .expect("join");
        assert!(signal.take());
    }
}
