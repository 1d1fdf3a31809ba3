//! Infratest Library - End-to-end infrastructure test harness
//!
//! Applies an OpenTofu/Terraform fixture, validates the provisioned Azure
//! resources through read-only REST calls, and guarantees teardown on every
//! exit path. Shared by the `infratest` CLI and the end-to-end test suites.

// Production-ready clippy configuration
#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::suspicious)]
// Allow documentation lints - internal code, not public API
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
// Allow some pedantic lints that are too strict for this codebase
#![allow(clippy::module_name_repetitions)]

pub mod azure;
pub mod checks;
pub mod cli;
pub mod options;
pub mod outputs;
pub mod stages;
pub mod tofu;

pub use checks::CheckError;
pub use options::StackOptions;
pub use outputs::{ServicePrincipalIds, StackOutputs};
pub use stages::{Teardown, run_stage};
