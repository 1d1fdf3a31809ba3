//! Container registry reads

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{AzureClient, expect_success, is_not_found};

const REGISTRIES_API_VERSION: &str = "2023-07-01";

/// A container registry as returned by the management plane.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerRegistry {
    pub name: String,
    pub properties: RegistryProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryProperties {
    #[serde(default)]
    pub admin_user_enabled: bool,
}

impl AzureClient {
    /// Fetch a container registry.
    pub async fn get_container_registry(
        &self,
        resource_group: &str,
        registry_name: &str,
    ) -> Result<ContainerRegistry> {
        let response = self.registry_response(resource_group, registry_name).await?;
        let response =
            expect_success(response, &format!("GET container registry '{registry_name}'")).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse container registry '{registry_name}'"))
    }

    /// Check whether a container registry exists in the resource group.
    pub async fn container_registry_exists(
        &self,
        resource_group: &str,
        registry_name: &str,
    ) -> Result<bool> {
        let response = self.registry_response(resource_group, registry_name).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if is_not_found(status) {
            return Ok(false);
        }
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!(
            "GET container registry '{registry_name}' failed with status {status}: {}",
            body.trim()
        );
    }

    async fn registry_response(
        &self,
        resource_group: &str,
        registry_name: &str,
    ) -> Result<reqwest::Response> {
        let path = format!(
            "resourceGroups/{resource_group}/providers/Microsoft.ContainerRegistry/registries/{registry_name}"
        );
        self.management_get(&path, REGISTRIES_API_VERSION).await
    }
}
