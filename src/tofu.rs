//! Provisioning tool wrapper
//!
//! Thin wrapper around the OpenTofu/Terraform binary. Every call is
//! synchronous and blocking; a non-zero exit surfaces the captured stderr in
//! the error. There is no retry logic - a failed invocation fails the stage.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::options::StackOptions;

/// Resolve the configured provisioning binary on PATH.
pub fn resolve_binary(options: &StackOptions) -> Result<PathBuf> {
    which::which(&options.binary)
        .with_context(|| format!("Provisioning binary '{}' not found on PATH", options.binary))
}

/// Initialize the fixture, wiring up the remote-state backend.
pub fn init(options: &StackOptions) -> Result<()> {
    let mut args = vec!["init".to_string(), "-input=false".to_string()];
    for (key, value) in &options.backend_config {
        args.push(format!("-backend-config={key}={value}"));
    }
    run(options, &args).map(|_| ())
}

/// Apply the fixture without prompting.
pub fn apply(options: &StackOptions) -> Result<()> {
    let mut args = vec![
        "apply".to_string(),
        "-input=false".to_string(),
        "-auto-approve".to_string(),
    ];
    push_vars(&mut args, &options.vars);
    run(options, &args).map(|_| ())
}

/// Initialize and apply in sequence - the setup stage entry point.
pub fn init_and_apply(options: &StackOptions) -> Result<()> {
    init(options)?;
    apply(options)
}

/// Destroy everything the fixture created.
pub fn destroy(options: &StackOptions) -> Result<()> {
    let mut args = vec![
        "destroy".to_string(),
        "-input=false".to_string(),
        "-auto-approve".to_string(),
    ];
    push_vars(&mut args, &options.vars);
    run(options, &args).map(|_| ())
}

/// Read a single string output from the applied stack.
pub fn output(options: &StackOptions, name: &str) -> Result<String> {
    let args = [
        "output".to_string(),
        "-no-color".to_string(),
        "-raw".to_string(),
        name.to_string(),
    ];
    let out = run(options, &args)?;
    let value = String::from_utf8(out.stdout)
        .with_context(|| format!("Output '{name}' is not valid UTF-8"))?;
    Ok(value.trim_end_matches(['\r', '\n']).to_string())
}

/// One entry of `output -json`.
#[derive(Debug, Deserialize)]
struct OutputEntry {
    value: serde_json::Value,
}

/// Read all string-typed outputs from the applied stack.
///
/// Non-string outputs are skipped; the harness only consumes strings.
pub fn output_map(options: &StackOptions) -> Result<BTreeMap<String, String>> {
    let args = [
        "output".to_string(),
        "-no-color".to_string(),
        "-json".to_string(),
    ];
    let out = run(options, &args)?;
    let entries: BTreeMap<String, OutputEntry> =
        serde_json::from_slice(&out.stdout).context("Failed to parse output -json")?;

    Ok(entries
        .into_iter()
        .filter_map(|(name, entry)| match entry.value {
            serde_json::Value::String(value) => Some((name, value)),
            _ => None,
        })
        .collect())
}

fn push_vars(args: &mut Vec<String>, vars: &BTreeMap<String, String>) {
    for (key, value) in vars {
        args.push("-var".to_string());
        args.push(format!("{key}={value}"));
    }
}

/// Run the binary in the fixture directory and capture its output.
fn run(options: &StackOptions, args: &[String]) -> Result<Output> {
    let binary = resolve_binary(options)?;
    tracing::info!(
        binary = %binary.display(),
        dir = %options.fixture_dir.display(),
        args = %args.join(" "),
        "Running provisioning command"
    );

    let output = Command::new(&binary)
        .args(args)
        .current_dir(&options.fixture_dir)
        .envs(&options.env)
        .output()
        .with_context(|| format!("Failed to spawn {}", binary.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "{} {} failed ({}): {}",
            options.binary,
            args.join(" "),
            output.status,
            stderr.trim()
        );
    }

    Ok(output)
}
