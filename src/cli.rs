//! Command-line driver for the harness
//!
//! Lets a developer run individual lifecycle stages against a fixture without
//! going through `cargo test`, e.g. to re-validate an already-deployed stack.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;

use crate::azure::AzureClient;
use crate::checks;
use crate::options::StackOptions;
use crate::outputs::StackOutputs;
use crate::stages::{self, Teardown, run_stage, run_stage_async};
use crate::tofu;

/// Infratest - end-to-end test harness for OpenTofu-provisioned Azure stacks
#[derive(Parser, Debug)]
#[command(name = "infratest")]
#[command(version)]
#[command(about = "Deploy an IaC fixture, validate the provisioned resources, tear it down", long_about = None)]
pub struct Cli {
    /// Fixture directory containing the IaC configuration to deploy
    #[arg(short, long, default_value = "fixtures/main", env = "INFRATEST_FIXTURE_DIR")]
    pub fixture: PathBuf,

    /// Provisioning binary to invoke
    #[arg(short, long, default_value = "tofu", env = "INFRATEST_BINARY")]
    pub binary: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy the fixture (init + apply) and persist the stack options
    Setup,
    /// Validate the deployed stack against the expected resource state
    Validate,
    /// Destroy the deployed stack using the persisted options
    Teardown,
    /// Full lifecycle: setup, validate, teardown guaranteed on every exit
    Run,
}

/// Build options for the setup stage: fixture, binary, backend from env.
pub fn build_options(cli: &Cli) -> StackOptions {
    StackOptions::new(&cli.fixture)
        .with_binary(cli.binary.clone())
        .backend_from_env()
}

/// Setup stage: persist options, then initialize and apply.
pub fn setup(cli: &Cli) -> Result<()> {
    let options = build_options(cli);
    options.save()?;
    tofu::init_and_apply(&options)?;
    println!("{} Stack deployed from {}", "✓".green(), cli.fixture.display());
    Ok(())
}

/// Validate stage: reload options, read outputs, run the resource checks.
pub async fn validate(cli: &Cli) -> Result<()> {
    let options = StackOptions::load(&cli.fixture)?;
    let outputs = StackOutputs::read(&options)?;
    let client = AzureClient::from_env()?;
    checks::validate_stack(&client, &outputs).await?;
    println!(
        "{} Stack in '{}' validated",
        "✓".green(),
        outputs.resource_group_name
    );
    Ok(())
}

/// Teardown stage: reload options and destroy.
pub fn teardown(cli: &Cli) -> Result<()> {
    let options = StackOptions::load(&cli.fixture)?;
    tofu::destroy(&options)?;
    println!("{} Stack destroyed", "✓".green());
    Ok(())
}

/// Full lifecycle with teardown guaranteed even when validation fails.
pub async fn run(cli: &Cli) -> Result<()> {
    let _teardown = Teardown::new(&cli.fixture);
    run_stage(stages::SETUP, || setup(cli))?;
    run_stage_async(stages::VALIDATE, || validate(cli)).await?;
    Ok(())
}
