//! Progress notification port
//!
//! Defines the interface for reporting progress while a run is dispatched.

use chatlist_domain::{ModelDefinition, StagingOutcome};

/// Callback for progress updates during a run
///
/// Implementations live in the presentation layer.
pub trait DispatchProgress: Send + Sync {
    /// Called once before any lane starts
    fn on_run_start(&self, models: &[ModelDefinition]);

    /// Called when a lane reaches its terminal outcome
    fn on_lane_complete(&self, outcome: &StagingOutcome);

    /// Called when every lane is terminal or the run was cancelled
    fn on_run_complete(&self, cancelled: bool);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DispatchProgress for NoProgress {
    fn on_run_start(&self, _models: &[ModelDefinition]) {}
    fn on_lane_complete(&self, _outcome: &StagingOutcome) {}
    fn on_run_complete(&self, _cancelled: bool) {}
}
