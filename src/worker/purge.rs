//! Per-worker reclamation countdown.
//!
//! The counter is plain owned state: the worker loop passes it into each item
//! step and gets the next counter back.

/// Countdown of attempted items until the next reclamation, in `[1, frequency]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeCounter {
    remaining: u32,
    frequency: u32,
}

/// Result of counting one attempted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeStep {
    /// Countdown still positive; keep going.
    Running(PurgeCounter),
    /// Countdown hit zero. Reclaim now, then continue with the re-armed counter.
    Reclaiming(PurgeCounter),
}

impl PurgeCounter {
    /// A fresh counter. A frequency of 0 is treated as 1.
    pub fn new(frequency: u32) -> Self {
        let frequency = frequency.max(1);
        Self {
            remaining: frequency,
            frequency,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Count one attempted item, successful or not.
    pub fn record_attempt(self) -> PurgeStep {
        match self.remaining - 1 {
            0 => PurgeStep::Reclaiming(Self::new(self.frequency)),
            remaining => PurgeStep::Running(Self { remaining, ..self }),
        }
    }
}

impl PurgeStep {
    /// The counter to carry into the next item.
    pub fn counter(self) -> PurgeCounter {
        match self {
            Self::Running(counter) | Self::Reclaiming(counter) => counter,
        }
    }

    pub fn is_reclaiming(&self) -> bool {
        matches!(self, Self::Reclaiming(_))
    }
}
