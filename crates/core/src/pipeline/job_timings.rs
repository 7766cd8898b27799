use std::time::{Duration, Instant};

use crate::resources::job_workspace::JobId;

/// Per-stage wall-clock timings for one job, reported as a single log line.
pub struct JobTimings {
    job: JobId,
    label: &'static str,
    started: Instant,
    stages: Vec<(&'static str, Duration)>,
}

impl JobTimings {
    pub fn new(job: JobId, label: &'static str) -> Self {
        Self {
            job,
            label,
            started: Instant::now(),
            stages: Vec::new(),
        }
    }

    /// Run `f` and record how long it took under `stage`, whether or not it succeeded.
    pub fn time<T>(&mut self, stage: &'static str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(stage, start.elapsed());
        out
    }

    pub fn record(&mut self, stage: &'static str, duration: Duration) {
        match self.stages.iter_mut().find(|(name, _)| *name == stage) {
            Some((_, total)) => *total += duration,
            None => self.stages.push((stage, duration)),
        }
    }

    pub fn stage(&self, stage: &str) -> Option<Duration> {
        self.stages
            .iter()
            .find(|(name, _)| *name == stage)
            .map(|(_, d)| *d)
    }

    pub fn summary_string(&self) -> String {
        let total_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let stages: Vec<String> = self
            .stages
            .iter()
            .map(|(name, d)| format!("{name} {:.0}ms", d.as_secs_f64() * 1000.0))
            .collect();
        if stages.is_empty() {
            format!("[job {}] {} finished in {total_ms:.0}ms", self.job, self.label)
        } else {
            format!(
                "[job {}] {} finished in {total_ms:.0}ms ({})",
                self.job,
                self.label,
                stages.join(", ")
            )
        }
    }

    pub fn log_summary(&self) {
        log::info!("{}", self.summary_string());
    }
}
