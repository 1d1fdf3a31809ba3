//! Test lifecycle stages
//!
//! The lifecycle is strictly linear: setup, validate, teardown. Stages run
//! exactly once, in order, with no retries and no internal parallelism.
//! Individual stages can be skipped with `SKIP_<stage>` environment flags so
//! a deployed fixture can be re-validated without re-applying it.

use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;

use crate::options::StackOptions;
use crate::tofu;

/// The three lifecycle stage names.
pub const SETUP: &str = "setup";
pub const VALIDATE: &str = "validate";
pub const TEARDOWN: &str = "teardown";

/// Check whether a `SKIP_<stage>` environment flag requests skipping a stage.
#[must_use]
pub fn skip_requested(stage: &str) -> bool {
    match std::env::var(format!("SKIP_{stage}")) {
        Ok(value) => !matches!(value.as_str(), "" | "0" | "false"),
        Err(_) => false,
    }
}

/// Execute a named stage exactly once, honoring its skip flag.
pub fn run_stage(stage: &str, f: impl FnOnce() -> Result<()>) -> Result<()> {
    if skip_requested(stage) {
        tracing::info!(stage, "Stage skipped via SKIP flag");
        return Ok(());
    }

    tracing::info!(stage, "Stage starting");
    let result = f();
    match &result {
        Ok(()) => tracing::info!(stage, "Stage finished"),
        Err(err) => tracing::error!(stage, error = %err, "Stage failed"),
    }
    result
}

/// Async variant of [`run_stage`] for stages that await cloud reads.
pub async fn run_stage_async<F, Fut>(stage: &str, f: F) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if skip_requested(stage) {
        tracing::info!(stage, "Stage skipped via SKIP flag");
        return Ok(());
    }

    tracing::info!(stage, "Stage starting");
    let result = f().await;
    match &result {
        Ok(()) => tracing::info!(stage, "Stage finished"),
        Err(err) => tracing::error!(stage, error = %err, "Stage failed"),
    }
    result
}

/// Scoped teardown guard.
///
/// Created before setup runs; when dropped it reloads the persisted stack
/// options and destroys the stack, on every exit path including panics from
/// failed assertions. Destroy errors are logged, never panicked - panicking
/// in drop during an unwind would abort the process.
#[derive(Debug)]
pub struct Teardown {
    fixture_dir: PathBuf,
    armed: bool,
}

impl Teardown {
    /// Arm a teardown for the given fixture directory.
    pub fn new(fixture_dir: impl Into<PathBuf>) -> Self {
        Self {
            fixture_dir: fixture_dir.into(),
            armed: true,
        }
    }

    /// Keep the stack alive past the end of the run.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if skip_requested(TEARDOWN) {
            tracing::info!(stage = TEARDOWN, "Stage skipped via SKIP flag");
            return;
        }

        tracing::info!(stage = TEARDOWN, "Stage starting");
        let result =
            StackOptions::load(&self.fixture_dir).and_then(|options| tofu::destroy(&options));
        match result {
            Ok(()) => tracing::info!(stage = TEARDOWN, "Stage finished"),
            Err(err) => {
                tracing::error!(stage = TEARDOWN, error = %err, "Teardown failed; resources may be leaked");
            }
        }
    }
}
