//! Per-tick silence bookkeeping

/// Counts consecutive ticks without output.
///
/// [`observe`](Self::observe) reports `true` only on the tick where the silent
/// streak reaches the threshold, so one hang produces one report. Any activity
/// resets the streak and re-arms the counter.
#[derive(Debug, Clone)]
pub struct SilenceCounter {
    threshold: u32,
    silent: u32,
}

impl SilenceCounter {
    /// A threshold of zero is treated as one.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            silent: 0,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn silent_ticks(&self) -> u32 {
        self.silent
    }

    pub fn observe(&mut self, active: bool) -> bool {
        if active {
            self.silent = 0;
            return false;
        }
        self.silent = self.silent.saturating_add(1);
        self.silent == self.threshold
    }
}
