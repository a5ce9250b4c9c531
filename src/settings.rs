//! Storage layout settings
//!
//! Every LocalStorage key the app touches, plus the tenant seeded on first run.

use serde::{Deserialize, Serialize};

/// Storage keys and first-run defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Key holding the JSON array of `{id, name}` tenants
    pub tenants_key: String,
    /// Key holding the active tenant id (raw string, not JSON)
    pub current_tenant_key: String,
    /// Per-tenant blob key is `namespace_prefix` + tenant id
    pub namespace_prefix: String,
    /// Blob key for the single-tenant variant
    pub single_tenant_key: String,

    // === First run ===
    /// Id of the tenant created when the registry is empty
    pub default_tenant_id: String,
    /// Display name of that tenant
    pub default_tenant_name: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            tenants_key: "sms_tenants".to_string(),
            current_tenant_key: "sms_current_tenant".to_string(),
            namespace_prefix: "sms_demo:".to_string(),
            single_tenant_key: "sms_demo".to_string(),

            default_tenant_id: "demo".to_string(),
            default_tenant_name: "Demo School".to_string(),
        }
    }
}

impl StoreSettings {
    /// Blob key for one tenant
    pub fn tenant_key(&self, tenant_id: &str) -> String {
        format!("{}{}", self.namespace_prefix, tenant_id)
    }
}
