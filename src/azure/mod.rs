//! Read-only Azure query surface
//!
//! Just enough of the Azure REST APIs to validate a provisioned stack:
//! vault access policies, secret existence, container registry settings.
//! Nothing here mutates cloud state.

use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

pub mod keyvault;
pub mod registry;

pub use keyvault::{AccessPolicy, KeyVault, VaultPermissions};
pub use registry::ContainerRegistry;

const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";
const VAULT_RESOURCE: &str = "https://vault.azure.net";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

static SHARED_CLIENT: LazyLock<Client> = LazyLock::new(build_client);

/// Build the shared HTTP client.
///
/// # Panics
/// Panics if the client cannot be built, which only happens with a broken
/// TLS backend; the harness cannot do anything useful in that state.
#[allow(clippy::expect_used)]
fn build_client() -> Client {
    Client::builder()
        .user_agent("infratest")
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client - check TLS configuration")
}

/// Read-only Azure client scoped to one subscription.
#[derive(Debug, Clone)]
pub struct AzureClient {
    subscription_id: String,
    management_token: String,
    vault_token: String,
}

impl AzureClient {
    /// Build a client from the environment.
    ///
    /// `ARM_SUBSCRIPTION_ID` is required. Bearer tokens come from
    /// `ARM_ACCESS_TOKEN` / `ARM_KEYVAULT_ACCESS_TOKEN` when set, otherwise
    /// from `az account get-access-token`.
    pub fn from_env() -> Result<Self> {
        let subscription_id = std::env::var("ARM_SUBSCRIPTION_ID")
            .context("ARM_SUBSCRIPTION_ID must be set to query Azure")?;

        let management_token = match std::env::var("ARM_ACCESS_TOKEN") {
            Ok(token) if !token.is_empty() => token,
            _ => token_from_cli(MANAGEMENT_RESOURCE)?,
        };
        let vault_token = match std::env::var("ARM_KEYVAULT_ACCESS_TOKEN") {
            Ok(token) if !token.is_empty() => token,
            _ => token_from_cli(VAULT_RESOURCE)?,
        };

        Ok(Self {
            subscription_id,
            management_token,
            vault_token,
        })
    }

    /// GET a management-plane resource path under the subscription.
    pub(crate) async fn management_get(
        &self,
        resource_path: &str,
        api_version: &str,
    ) -> Result<Response> {
        let url = format!(
            "{MANAGEMENT_ENDPOINT}/subscriptions/{}/{resource_path}?api-version={api_version}",
            self.subscription_id
        );
        tracing::debug!(%url, "Azure management GET");
        SHARED_CLIENT
            .get(&url)
            .bearer_auth(&self.management_token)
            .send()
            .await
            .with_context(|| format!("Azure management request failed: {url}"))
    }

    /// GET a vault data-plane path.
    pub(crate) async fn vault_get(&self, vault_name: &str, path: &str) -> Result<Response> {
        let url = format!("https://{vault_name}.vault.azure.net/{path}?api-version=7.4");
        tracing::debug!(%url, "Azure vault GET");
        SHARED_CLIENT
            .get(&url)
            .bearer_auth(&self.vault_token)
            .send()
            .await
            .with_context(|| format!("Azure vault request failed: {url}"))
    }
}

/// Fail on any non-success status, carrying the response body.
pub(crate) async fn expect_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{what} failed with status {status}: {}", body.trim());
}

pub(crate) fn is_not_found(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND
}

/// Fetch a bearer token from the Azure CLI.
fn token_from_cli(resource: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct TokenResponse {
        #[serde(rename = "accessToken")]
        access_token: String,
    }

    let output = Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource",
            resource,
            "--output",
            "json",
        ])
        .output()
        .context("Failed to run az account get-access-token")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "az account get-access-token failed for {resource}: {}",
            stderr.trim()
        );
    }

    let token: TokenResponse = serde_json::from_slice(&output.stdout)
        .context("Failed to parse az access token response")?;
    Ok(token.access_token)
}
