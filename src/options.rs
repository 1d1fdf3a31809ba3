//! Stack options and their on-disk persistence
//!
//! Options are created once during the setup stage, saved under the fixture
//! directory, and reloaded unchanged by the validate and teardown stages.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Default provisioning binary name.
pub const DEFAULT_BINARY: &str = "tofu";

/// Directory under the fixture folder where stage data is persisted.
const TEST_DATA_DIR: &str = ".test-data";

/// Persistence key for the stack options themselves.
const OPTIONS_KEY: &str = "stack_options";

/// Backend parameters sourced from the environment during setup.
const BACKEND_ENV_VARS: &[(&str, &str)] = &[
    ("resource_group_name", "TF_VAR_resource_group_name"),
    ("storage_account_name", "TF_VAR_storage_account_name"),
    ("container_name", "TF_VAR_container_name"),
];

/// Configuration for one provisioned stack.
///
/// Immutable once created within a run: setup writes it, validate and
/// teardown read it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackOptions {
    /// Directory containing the IaC fixture to deploy
    pub fixture_dir: PathBuf,

    /// Provisioning binary name (e.g. "tofu" or "terraform")
    pub binary: String,

    /// Backend configuration passed to `init` as `-backend-config` flags
    pub backend_config: BTreeMap<String, String>,

    /// Input variables passed to `apply` and `destroy` as `-var` flags
    pub vars: BTreeMap<String, String>,

    /// Extra environment variables set on every invocation
    pub env: BTreeMap<String, String>,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            fixture_dir: PathBuf::from("."),
            binary: DEFAULT_BINARY.to_string(),
            backend_config: BTreeMap::new(),
            vars: BTreeMap::new(),
            env: BTreeMap::new(),
        }
    }
}

impl StackOptions {
    /// Create options for a fixture directory with the default binary.
    pub fn new(fixture_dir: impl Into<PathBuf>) -> Self {
        Self {
            fixture_dir: fixture_dir.into(),
            ..Self::default()
        }
    }

    /// Use a different provisioning binary (e.g. "terraform").
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Source the remote-state backend parameters from `TF_VAR_*`
    /// environment variables.
    ///
    /// Unset variables yield empty values, matching what the provisioning
    /// tool receives when the caller's environment is incomplete.
    #[must_use]
    pub fn backend_from_env(mut self) -> Self {
        for (key, var) in BACKEND_ENV_VARS {
            let value = std::env::var(var).unwrap_or_default();
            self.backend_config.insert((*key).to_string(), value);
        }
        self
    }

    /// Persist these options under the fixture directory so later stages
    /// can reload them.
    pub fn save(&self) -> Result<()> {
        save_test_data(&self.fixture_dir, OPTIONS_KEY, self)
    }

    /// Reload options previously saved for a fixture directory.
    pub fn load(fixture_dir: &Path) -> Result<Self> {
        load_test_data(fixture_dir, OPTIONS_KEY)
    }
}

/// Persist a named value under `<dir>/.test-data/<name>.json`.
pub fn save_test_data<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let data_dir = dir.join(TEST_DATA_DIR);
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let path = data_dir.join(format!("{name}.json"));
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Reload a named value saved by [`save_test_data`].
pub fn load_test_data<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let path = dir.join(TEST_DATA_DIR).join(format!("{name}.json"));
    let content = fs::read_to_string(&path)
        .with_context(|| format!("No saved test data at {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse saved test data at {}", path.display()))
}
