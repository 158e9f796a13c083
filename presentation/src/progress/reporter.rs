//! Progress reporting for dispatch runs

use chatlist_application::ports::progress::DispatchProgress;
use chatlist_domain::{ModelDefinition, OutcomeStatus, StagingOutcome};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// One progress bar advancing as each model finishes
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn mark(outcome: &StagingOutcome) -> String {
        match outcome.status {
            OutcomeStatus::Succeeded => format!("{} {}", "v".green(), outcome.model_name),
            OutcomeStatus::TimedOut => format!("{} {} (timed out)", "x".yellow(), outcome.model_name),
            _ => format!("{} {}", "x".red(), outcome.model_name),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchProgress for ProgressReporter {
    fn on_run_start(&self, models: &[ModelDefinition]) {
        let bar = ProgressBar::new(models.len() as u64);
        bar.set_style(Self::bar_style());
        bar.set_prefix("Asking models");
        bar.set_message("waiting for answers...");
        bar.enable_steady_tick(std::time::Duration::from_millis(120));

        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_lane_complete(&self, outcome: &StagingOutcome) {
        if let Ok(slot) = self.bar.lock()
            && let Some(bar) = slot.as_ref()
        {
            bar.set_message(Self::mark(outcome));
            bar.inc(1);
        }
    }

    fn on_run_complete(&self, cancelled: bool) {
        if let Ok(mut slot) = self.bar.lock()
            && let Some(bar) = slot.take()
        {
            if cancelled {
                bar.abandon_with_message(format!("{}", "cancelled".yellow()));
            } else {
                bar.finish_with_message(format!("{}", "done".green()));
            }
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl DispatchProgress for SimpleProgress {
    fn on_run_start(&self, models: &[ModelDefinition]) {
        eprintln!(
            "{} {} ({} models)",
            "->".cyan(),
            "Asking models".bold(),
            models.len()
        );
    }

    fn on_lane_complete(&self, outcome: &StagingOutcome) {
        eprintln!("  {}", ProgressReporter::mark(outcome));
    }

    fn on_run_complete(&self, cancelled: bool) {
        if cancelled {
            eprintln!("  {}", "cancelled".yellow());
        }
    }
}
