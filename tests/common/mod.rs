//! Shared test infrastructure: a stub provisioning binary
//!
//! The stub is a shell script that records every invocation to a log file and
//! answers `output` queries with canned values, so runner and stage behavior
//! can be verified without a real OpenTofu install or cloud credentials.

#![allow(dead_code)] // Not every test binary uses every helper

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

use infratest::StackOptions;

/// Canned output values the stub reports for an "applied" stack.
pub const RESOURCE_GROUP: &str = "rg-test-x7k2";
pub const KEY_VAULT: &str = "kv-test-x7k2";
pub const CONTAINER_REGISTRY: &str = "acrtestx7k2";
pub const RESOURCE_SUFFIX: &str = "x7k2";
pub const MAIN_PRINCIPAL: &str = "11111111-1111-1111-1111-111111111111";

/// Environment variable the stub honors to force one subcommand to fail.
pub const FAIL_ENV: &str = "STUB_FAIL_CMD";

/// An isolated fixture directory with a stub provisioning binary inside.
pub struct StubTofu {
    dir: TempDir,
    binary: PathBuf,
    log: PathBuf,
}

impl StubTofu {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create fixture dir");
        let binary = dir.path().join("stub-tofu");
        let log = dir.path().join("invocations.log");
        fs::write(&binary, stub_script(&log)).expect("write stub binary");

        let mut perms = fs::metadata(&binary).expect("stat stub binary").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&binary, perms).expect("chmod stub binary");

        Self { dir, binary, log }
    }

    /// Stack options pointing at this fixture and stub binary.
    pub fn options(&self) -> StackOptions {
        StackOptions::new(self.dir.path()).with_binary(self.binary.to_string_lossy())
    }

    /// Options where the stub fails the given subcommand.
    pub fn failing_options(&self, subcommand: &str) -> StackOptions {
        let mut options = self.options();
        options
            .env
            .insert(FAIL_ENV.to_string(), subcommand.to_string());
        options
    }

    pub fn fixture_dir(&self) -> &std::path::Path {
        self.dir.path()
    }

    pub fn binary_path(&self) -> &std::path::Path {
        &self.binary
    }

    /// Every invocation the stub has seen, one line of arguments each.
    pub fn invocations(&self) -> Vec<String> {
        match fs::read_to_string(&self.log) {
            Ok(content) => content.lines().map(ToString::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Count invocations of one subcommand.
    pub fn count(&self, subcommand: &str) -> usize {
        self.invocations()
            .iter()
            .filter(|line| line.starts_with(subcommand))
            .count()
    }
}

fn stub_script(log: &std::path::Path) -> String {
    format!(
        r#"#!/bin/sh
printf '%s\n' "$*" >> "{log}"
if [ -n "$STUB_FAIL_CMD" ] && [ "$1" = "$STUB_FAIL_CMD" ]; then
    echo "stub: forced $1 failure" >&2
    exit 1
fi
if [ "$1" = "output" ]; then
    shift
    mode=raw
    name=""
    for arg in "$@"; do
        case "$arg" in
            -json) mode=json ;;
            -raw|-no-color) ;;
            *) name="$arg" ;;
        esac
    done
    if [ "$mode" = "json" ]; then
        cat <<'EOF'
{{
  "resource_group_name": {{"sensitive": false, "type": "string", "value": "rg-test-x7k2"}},
  "key_vault_name": {{"sensitive": false, "type": "string", "value": "kv-test-x7k2"}},
  "container_registry_name": {{"sensitive": false, "type": "string", "value": "acrtestx7k2"}},
  "resource_suffix": {{"sensitive": false, "type": "string", "value": "x7k2"}},
  "main_service_principal_id": {{"sensitive": false, "type": "string", "value": "11111111-1111-1111-1111-111111111111"}},
  "replica_counts": {{"sensitive": false, "type": ["object", {{}}], "value": {{"web": 2}}}}
}}
EOF
    else
        case "$name" in
            resource_group_name) printf 'rg-test-x7k2\n' ;;
            key_vault_name) printf 'kv-test-x7k2\n' ;;
            container_registry_name) printf 'acrtestx7k2\n' ;;
            resource_suffix) printf 'x7k2\n' ;;
            main_service_principal_id) printf '11111111-1111-1111-1111-111111111111\n' ;;
            *) echo "stub: unknown output $name" >&2; exit 1 ;;
        esac
    fi
fi
exit 0
"#,
        log = log.display()
    )
}
