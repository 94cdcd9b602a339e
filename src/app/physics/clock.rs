use std::time::Duration;

const MAX_CATCH_UP_TICKS: u32 = 4;

/// Fixed-interval tick source driven by frame time.
///
/// Frames accumulate elapsed time; each whole interval becomes one tick. Long stalls are
/// capped so the layout never fast-forwards after the window was hidden.
#[derive(Clone, Debug)]
pub struct TickClock {
    interval: Duration,
    pending: Duration,
    running: bool,
}

impl TickClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            pending: Duration::ZERO,
            running: true,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stops ticking and discards partially elapsed time.
    pub fn stop(&mut self) {
        self.running = false;
        self.pending = Duration::ZERO;
    }

    /// Feeds frame time and returns how many ticks are due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if !self.running {
            return 0;
        }

        self.pending += elapsed;
        let mut due = 0;
        while self.pending >= self.interval && due < MAX_CATCH_UP_TICKS {
            self.pending -= self.interval;
            due += 1;
        }
        if due == MAX_CATCH_UP_TICKS {
            self.pending = self.pending.min(self.interval);
        }
        due
    }
}
