/// What the caller should do for one clock tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tick {
    /// Render the active composition at this time (milliseconds since the loop started).
    Render(f64),
    /// The loop ended; the clock has restarted at the tick time.
    Restart,
    /// The configured number of loops has been played.
    Finished,
}

/// Wall-clock driven playback of the active composition.
#[derive(Clone, Debug, PartialEq)]
pub struct Playback {
    start: f64,
    duration: f64,
    loops: u32,
    completed: u32,
}

impl Playback {
    /// `loops == 0` plays forever.
    pub fn new(start_ms: f64, duration: f64, loops: u32) -> Self {
        Self {
            start: start_ms,
            duration,
            loops,
            completed: 0,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    /// Loops played to the end so far.
    pub fn completed_loops(&self) -> u32 {
        self.completed
    }

    pub fn is_finished(&self) -> bool {
        self.loops != 0 && self.completed >= self.loops
    }

    pub fn tick(&mut self, now_ms: f64) -> Tick {
        if self.is_finished() {
            return Tick::Finished;
        }
        let current = now_ms - self.start;
        if current < self.duration {
            return Tick::Render(current);
        }

        self.completed = self.completed.saturating_add(1);
        if self.is_finished() {
            tracing::debug!(loops = self.completed, "playback finished");
            return Tick::Finished;
        }
        tracing::trace!(loop_index = self.completed, "playback restarted");
        self.start = now_ms;
        Tick::Restart
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/playback.rs"]
mod tests;
