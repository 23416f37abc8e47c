//! Progress reporting hooks.

/// Receives the number of jobs that finished on each tick.
pub trait Progress: Send {
    /// Called once per tick with the jobs that became terminal during it.
    fn update(&mut self, newly_finished: usize);

    /// Called once when the loop ends, finished or not.
    fn finish(&mut self) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&mut self, _newly_finished: usize) {}
}

/// Records every update; handy for tests and summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressLog {
    pub updates: Vec<usize>,
    pub finished: bool,
}

impl ProgressLog {
    pub fn total(&self) -> usize {
        self.updates.iter().sum()
    }
}

impl Progress for ProgressLog {
    fn update(&mut self, newly_finished: usize) {
        self.updates.push(newly_finished);
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}
