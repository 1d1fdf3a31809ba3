//! Resource assertions for the validate stage
//!
//! Each check fetches current state through the read-only Azure client and
//! compares it against the fixed expected values. Any mismatch fails
//! immediately with a descriptive error; there is no recovery or retry.

use anyhow::Result;
use thiserror::Error;

use crate::azure::{AzureClient, VaultPermissions};
use crate::outputs::{ServicePrincipalIds, StackOutputs};

/// A validation failure. Every variant is fatal to the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("{what} mismatch: expected {expected:?}, got {actual:?}")]
    Mismatch {
        what: &'static str,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("AccessPolicies list must contain roles")]
    NoAccessPolicies,

    #[error("No access policy found for principal {0}")]
    MissingPrincipal(String),

    #[error("Secret '{0}' is missing from the vault")]
    MissingSecret(String),

    #[error("Container registry '{0}' does not exist")]
    MissingRegistry(String),

    #[error("Admin user is not enabled on container registry '{0}'")]
    AdminUserDisabled(String),

    #[error("Resource group '{0}' does not look like a test resource group")]
    NotATestResourceGroup(String),
}

/// Operations the main service principal must hold, per category.
pub const EXPECTED_KEY_PERMISSIONS: &[&str] = &["Create", "Get", "List", "Recover", "Purge"];
pub const EXPECTED_SECRET_PERMISSIONS: &[&str] =
    &["Set", "Get", "Delete", "Purge", "Recover", "List"];
pub const EXPECTED_CERTIFICATE_PERMISSIONS: &[&str] =
    &["Create", "List", "Get", "Purge", "Recover"];
pub const EXPECTED_STORAGE_PERMISSIONS: &[&str] = &["Get"];

/// The fixed permission table for the main service principal.
#[must_use]
pub fn expected_main_principal_permissions() -> VaultPermissions {
    VaultPermissions {
        keys: to_owned(EXPECTED_KEY_PERMISSIONS),
        secrets: to_owned(EXPECTED_SECRET_PERMISSIONS),
        certificates: to_owned(EXPECTED_CERTIFICATE_PERMISSIONS),
        storage: to_owned(EXPECTED_STORAGE_PERMISSIONS),
    }
}

/// The eight secret names the stack must have created.
///
/// `KeyVault-Suffix` is fixed; the rest interpolate the per-run resource
/// suffix.
#[must_use]
pub fn expected_secret_names(resource_suffix: &str) -> Vec<String> {
    vec![
        format!("ml-container-registry-name-{resource_suffix}"),
        format!("AppInsights-ConnectionString-{resource_suffix}"),
        format!("AppInsights-ApplicationId-{resource_suffix}"),
        "KeyVault-Suffix".to_string(),
        format!("iotmngmt-iothub-primary-connection-string-{resource_suffix}"),
        format!("iotmngmt-iothub-eventhubendpoint-{resource_suffix}"),
        format!("iotmngmt-iothub-name-{resource_suffix}"),
        format!("iotmngmt-iothub-eventhub-compatible-endpoint-{resource_suffix}"),
    ]
}

/// Assert the vault exists and the main principal's access policy carries
/// exactly the expected permission table.
pub async fn check_key_vault_access_policies(
    client: &AzureClient,
    resource_group: &str,
    vault_name: &str,
    principals: &ServicePrincipalIds,
) -> Result<()> {
    let vault = client.get_key_vault(resource_group, vault_name).await?;
    let policies = &vault.properties.access_policies;
    if policies.is_empty() {
        return Err(CheckError::NoAccessPolicies.into());
    }

    let policy = policies
        .iter()
        .find(|policy| policy.object_id == principals.main_service_principal_id)
        .ok_or_else(|| {
            CheckError::MissingPrincipal(principals.main_service_principal_id.clone())
        })?;

    compare_permissions(&policy.permissions, &expected_main_principal_permissions())?;
    Ok(())
}

/// Assert all expected secrets exist in the vault.
pub async fn check_key_vault_secrets(
    client: &AzureClient,
    vault_name: &str,
    resource_suffix: &str,
) -> Result<()> {
    for name in expected_secret_names(resource_suffix) {
        if !client.secret_exists(vault_name, &name).await? {
            return Err(CheckError::MissingSecret(name).into());
        }
    }
    Ok(())
}

/// Assert the container registry exists with its admin user enabled.
pub async fn check_container_registry(
    client: &AzureClient,
    resource_group: &str,
    registry_name: &str,
) -> Result<()> {
    if !client
        .container_registry_exists(resource_group, registry_name)
        .await?
    {
        return Err(CheckError::MissingRegistry(registry_name.to_string()).into());
    }

    let registry = client
        .get_container_registry(resource_group, registry_name)
        .await?;
    if !registry.properties.admin_user_enabled {
        return Err(CheckError::AdminUserDisabled(registry_name.to_string()).into());
    }
    Ok(())
}

/// Run the full validation sequence against a set of stack outputs.
pub async fn validate_stack(client: &AzureClient, outputs: &StackOutputs) -> Result<()> {
    if !outputs.resource_group_name.contains("test") {
        return Err(CheckError::NotATestResourceGroup(outputs.resource_group_name.clone()).into());
    }

    let principals = outputs.principal_ids();
    check_key_vault_access_policies(
        client,
        &outputs.resource_group_name,
        &outputs.key_vault_name,
        &principals,
    )
    .await?;
    check_key_vault_secrets(client, &outputs.key_vault_name, &outputs.resource_suffix).await?;
    check_container_registry(
        client,
        &outputs.resource_group_name,
        &outputs.container_registry_name,
    )
    .await?;
    Ok(())
}

fn compare_permissions(
    actual: &VaultPermissions,
    expected: &VaultPermissions,
) -> Result<(), CheckError> {
    compare("KeyPermissions", &actual.keys, &expected.keys)?;
    compare("SecretPermissions", &actual.secrets, &expected.secrets)?;
    compare(
        "CertificatePermissions",
        &actual.certificates,
        &expected.certificates,
    )?;
    compare("StoragePermissions", &actual.storage, &expected.storage)?;
    Ok(())
}

fn compare(
    what: &'static str,
    actual: &[String],
    expected: &[String],
) -> Result<(), CheckError> {
    if actual == expected {
        return Ok(());
    }
    Err(CheckError::Mismatch {
        what,
        expected: expected.to_vec(),
        actual: actual.to_vec(),
    })
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
