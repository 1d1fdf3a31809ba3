//! Key Vault reads: access policies and secret existence

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{AzureClient, expect_success, is_not_found};

const VAULTS_API_VERSION: &str = "2023-07-01";

/// A secrets vault as returned by the management plane.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyVault {
    pub name: String,
    pub properties: VaultProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultProperties {
    #[serde(default)]
    pub access_policies: Vec<AccessPolicy>,
}

/// One access-policy entry granting a principal operations on the vault.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicy {
    pub object_id: String,
    #[serde(default)]
    pub permissions: VaultPermissions,
}

/// The four permission categories of an access policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VaultPermissions {
    pub keys: Vec<String>,
    pub secrets: Vec<String>,
    pub certificates: Vec<String>,
    pub storage: Vec<String>,
}

impl AzureClient {
    /// Fetch a vault with its access policies.
    pub async fn get_key_vault(&self, resource_group: &str, vault_name: &str) -> Result<KeyVault> {
        let path = format!(
            "resourceGroups/{resource_group}/providers/Microsoft.KeyVault/vaults/{vault_name}"
        );
        let response = self.management_get(&path, VAULTS_API_VERSION).await?;
        let response = expect_success(response, &format!("GET key vault '{vault_name}'")).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse key vault '{vault_name}'"))
    }

    /// Check whether a named secret exists in the vault.
    pub async fn secret_exists(&self, vault_name: &str, secret_name: &str) -> Result<bool> {
        let response = self
            .vault_get(vault_name, &format!("secrets/{secret_name}"))
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if is_not_found(status) {
            return Ok(false);
        }
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!(
            "GET secret '{secret_name}' in vault '{vault_name}' failed with status {status}: {}",
            body.trim()
        );
    }
}
