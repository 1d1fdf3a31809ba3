//! Named stack outputs consumed by the validate stage

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::options::StackOptions;
use crate::tofu;

/// The outputs the validate stage reads from the applied stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutputs {
    /// Resource group holding the whole stack
    pub resource_group_name: String,
    /// Secrets vault name
    pub key_vault_name: String,
    /// Container registry name
    pub container_registry_name: String,
    /// Dynamic suffix appended to resource names for uniqueness
    pub resource_suffix: String,
    /// Object id of the main service principal
    pub main_service_principal_id: String,
}

impl StackOutputs {
    /// Read the named outputs from the provisioning tool's state.
    pub fn read(options: &StackOptions) -> Result<Self> {
        Ok(Self {
            resource_group_name: tofu::output(options, "resource_group_name")?,
            key_vault_name: tofu::output(options, "key_vault_name")?,
            container_registry_name: tofu::output(options, "container_registry_name")?,
            resource_suffix: tofu::output(options, "resource_suffix")?,
            main_service_principal_id: tofu::output(options, "main_service_principal_id")?,
        })
    }

    /// Principal identifiers passed into the assertion layer.
    pub fn principal_ids(&self) -> ServicePrincipalIds {
        ServicePrincipalIds {
            main_service_principal_id: self.main_service_principal_id.clone(),
        }
    }
}

/// Identities whose vault permissions get validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePrincipalIds {
    /// The main service principal granted vault access
    pub main_service_principal_id: String,
}
