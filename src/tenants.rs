//! Tenant registry
//!
//! An ordered list of schools, stored as one JSON array, plus a separately
//! stored pointer to the active one. Each tenant's records live in their own
//! namespaced blob (see [`crate::persistence`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persistence::{Namespace, SchoolDb, StoreError};
use crate::platform::KeyValueStore;
use crate::settings::StoreSettings;

/// Slug used when a name has no ASCII letters or digits at all
pub const FALLBACK_SLUG: &str = "school";

/// One school
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Derive a tenant id from a display name.
///
/// Lowercases (full Unicode mapping, so `K` KELVIN SIGN becomes `k`), turns
/// every run of characters outside `[a-z0-9]` into a single hyphen and trims
/// hyphens from both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// First of `base`, `base-1`, `base-2`, ... not already taken
fn unique_id(base: String, tenants: &[Tenant]) -> String {
    let taken = |id: &str| tenants.iter().any(|t| t.id == id);
    if !taken(&base) {
        return base;
    }
    let mut suffix = 1;
    loop {
        let id = format!("{}-{}", base, suffix);
        if !taken(&id) {
            return id;
        }
        suffix += 1;
    }
}

/// Tenant list and current-tenant pointer
#[derive(Debug, Clone)]
pub struct TenantRegistry<S> {
    kv: S,
    db: SchoolDb<S>,
    settings: StoreSettings,
}

impl<S: KeyValueStore> TenantRegistry<S> {
    pub fn new(kv: S, settings: StoreSettings) -> Self {
        Self {
            db: SchoolDb::new(kv.clone(), settings.clone()),
            kv,
            settings,
        }
    }

    /// Stored registry entries exactly as written, including ones that do not
    /// decode as a [`Tenant`]. Missing, unreadable or non-array storage reads
    /// as empty.
    fn stored_entries(&self) -> Vec<Value> {
        let json = match self.kv.get(&self.settings.tenants_key) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Tenant list unavailable: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_str(&json) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                log::warn!("Ignoring tenant list that is not an array");
                Vec::new()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable tenant list: {}", e);
                Vec::new()
            }
        }
    }

    /// All tenants in creation order.
    ///
    /// Entries without a string `id` are skipped; a missing `name` reads as
    /// empty. Skipped entries stay in storage.
    pub fn list(&self) -> Vec<Tenant> {
        self.stored_entries()
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Tenant>(entry) {
                Ok(tenant) => Some(tenant),
                Err(e) => {
                    log::warn!("Skipping unreadable tenant entry: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Append one tenant to the stored array, keeping every existing entry
    /// (extra fields and unreadable entries included) as it was.
    fn append(&self, tenant: &Tenant) -> Result<(), StoreError> {
        let mut entries = self.stored_entries();
        entries.push(serde_json::to_value(tenant)?);
        let json = serde_json::to_string(&entries)?;
        self.kv.set(&self.settings.tenants_key, &json)?;
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<Tenant> {
        self.list().into_iter().find(|t| t.id == id)
    }

    /// Active tenant id, if one was ever set
    pub fn current(&self) -> Option<String> {
        match self.kv.get(&self.settings.current_tenant_key) {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                log::warn!("Current tenant unavailable: {}", e);
                None
            }
        }
    }

    /// Point at `id`. Does not check that the tenant exists.
    pub fn set_current(&self, id: &str) -> Result<(), StoreError> {
        self.kv.set(&self.settings.current_tenant_key, id)?;
        Ok(())
    }

    /// Make sure a valid current tenant exists and return its id.
    ///
    /// A registry with no usable tenant gets the demo tenant appended. A
    /// missing or dangling pointer falls back to the first tenant in list
    /// order.
    pub fn ensure_default(&self) -> Result<String, StoreError> {
        let tenants = self.list();
        if tenants.is_empty() {
            let tenant = Tenant {
                id: self.settings.default_tenant_id.clone(),
                name: self.settings.default_tenant_name.clone(),
            };
            self.append(&tenant)?;
            self.set_current(&tenant.id)?;
            log::info!("Created default tenant '{}'", tenant.id);
            return Ok(tenant.id);
        }

        match self.current() {
            Some(id) if tenants.iter().any(|t| t.id == id) => Ok(id),
            stale => {
                let first = tenants[0].id.clone();
                if let Some(id) = stale {
                    log::warn!("Current tenant '{}' is not registered, using '{}'", id, first);
                }
                self.set_current(&first)?;
                Ok(first)
            }
        }
    }

    /// Register a new school, make it current, and seed its empty records.
    ///
    /// Returns `None` without touching storage when `name` is blank.
    pub fn create(&self, name: &str) -> Result<Option<Tenant>, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let id = unique_id(slugify(name), &self.list());
        let tenant = Tenant {
            id,
            name: name.to_string(),
        };
        self.append(&tenant)?;
        self.set_current(&tenant.id)?;
        self.db.seed(&Namespace::tenant(tenant.id.as_str()))?;

        log::info!("Created tenant '{}' ({})", tenant.id, tenant.name);
        Ok(Some(tenant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;
    use crate::school::SchoolState;
    use proptest::prelude::*;

    fn registry() -> (MemoryStore, TenantRegistry<MemoryStore>) {
        let kv = MemoryStore::new();
        (kv.clone(), TenantRegistry::new(kv, StoreSettings::default()))
    }

    #[test]
    fn test_slugify_examples() {
        assert_eq!(slugify("St. Mary's School!"), "st-mary-s-school");
        assert_eq!(slugify("  Hill  Top -- Academy "), "hill-top-academy");
        assert_eq!(slugify("School 42"), "school-42");
        assert_eq!(slugify("!!!"), "school");
        assert_eq!(slugify(""), "school");
        assert_eq!(slugify("École Élé"), "cole-l");
    }

    #[test]
    fn test_slugify_unicode_lowercase() {
        // KELVIN SIGN lowercases to ASCII 'k'
        assert_eq!(slugify("\u{212A}ELVIN"), "kelvin");
        // 'İ' lowercases to 'i' plus a combining dot, which acts as a separator
        assert_eq!(slugify("İzmir"), "i-zmir");
    }

    #[test]
    fn test_entry_missing_name_is_kept() {
        let (kv, reg) = registry();
        let stored = r#"[{"id":"alpha","name":"Alpha"},{"id":"beta"}]"#;
        kv.set("sms_tenants", stored).unwrap();
        reg.set_current("alpha").unwrap();

        let ids: Vec<String> = reg.list().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
        assert_eq!(reg.find("beta").unwrap().name, "");

        assert_eq!(reg.ensure_default().unwrap(), "alpha");
        assert_eq!(kv.get("sms_tenants").unwrap().as_deref(), Some(stored));
    }

    #[test]
    fn test_extra_fields_survive_create() {
        let (kv, reg) = registry();
        kv.set(
            "sms_tenants",
            r#"[{"id":"alpha","name":"Alpha","city":"Leeds"}]"#,
        )
        .unwrap();

        reg.create("Beta").unwrap();
        let stored: Value = serde_json::from_str(&kv.get("sms_tenants").unwrap().unwrap()).unwrap();
        assert_eq!(stored[0]["city"], "Leeds");
        assert_eq!(stored[1]["id"], "beta");
        assert_eq!(reg.list().len(), 2);
    }

    #[test]
    fn test_unusable_entries_are_not_overwritten() {
        let (kv, reg) = registry();
        kv.set("sms_tenants", r#"[{"name":"No Id"},7]"#).unwrap();
        assert!(reg.list().is_empty());

        assert_eq!(reg.ensure_default().unwrap(), "demo");
        let stored: Value = serde_json::from_str(&kv.get("sms_tenants").unwrap().unwrap()).unwrap();
        let entries = stored.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["name"], "No Id");
        assert_eq!(entries[1], 7);
        assert_eq!(entries[2]["id"], "demo");
        assert_eq!(reg.list().len(), 1);
    }

    #[test]
    fn test_non_array_list_reads_as_empty() {
        let (kv, reg) = registry();
        kv.set("sms_tenants", r#"{"id":"alpha","name":"Alpha"}"#)
            .unwrap();
        assert!(reg.list().is_empty());

        assert_eq!(reg.ensure_default().unwrap(), "demo");
        assert_eq!(
            reg.list(),
            vec![Tenant {
                id: "demo".into(),
                name: "Demo School".into()
            }]
        );
    }

    #[test]
    fn test_ensure_default_on_empty_store() {
        let (_, reg) = registry();
        assert_eq!(reg.ensure_default().unwrap(), "demo");
        assert_eq!(
            reg.list(),
            vec![Tenant {
                id: "demo".into(),
                name: "Demo School".into()
            }]
        );
        assert_eq!(reg.current().as_deref(), Some("demo"));
    }

    #[test]
    fn test_ensure_default_keeps_valid_current() {
        let (_, reg) = registry();
        reg.create("Alpha").unwrap();
        reg.create("Beta").unwrap();
        assert_eq!(reg.ensure_default().unwrap(), "beta");
        assert_eq!(reg.list().len(), 2);
    }

    #[test]
    fn test_ensure_default_sets_missing_pointer_to_first() {
        let (kv, reg) = registry();
        reg.create("Alpha").unwrap();
        reg.create("Beta").unwrap();
        kv.remove("sms_current_tenant").unwrap();

        assert_eq!(reg.ensure_default().unwrap(), "alpha");
        assert_eq!(reg.current().as_deref(), Some("alpha"));
    }

    #[test]
    fn test_ensure_default_repairs_dangling_pointer() {
        let (_, reg) = registry();
        reg.create("Alpha").unwrap();
        reg.set_current("deleted-school").unwrap();

        assert_eq!(reg.ensure_default().unwrap(), "alpha");
        assert_eq!(reg.current().as_deref(), Some("alpha"));
    }

    #[test]
    fn test_unreadable_list_reads_as_empty() {
        let (kv, reg) = registry();
        kv.set("sms_tenants", "{oops").unwrap();
        assert!(reg.list().is_empty());
        assert_eq!(reg.ensure_default().unwrap(), "demo");
    }

    #[test]
    fn test_create_uses_slug_and_becomes_current() {
        let (_, reg) = registry();
        let tenant = reg.create("St. Mary's School!").unwrap().unwrap();
        assert_eq!(tenant.id, "st-mary-s-school");
        assert_eq!(tenant.name, "St. Mary's School!");
        assert_eq!(reg.current().as_deref(), Some("st-mary-s-school"));
        assert_eq!(reg.find("st-mary-s-school"), Some(tenant));
    }

    #[test]
    fn test_create_disambiguates_collisions() {
        let (_, reg) = registry();
        let ids: Vec<String> = ["A", "A", "a!", "A"]
            .iter()
            .map(|n| reg.create(n).unwrap().unwrap().id)
            .collect();
        assert_eq!(ids, vec!["a", "a-1", "a-2", "a-3"]);
    }

    #[test]
    fn test_create_seeds_empty_state() {
        let (kv, reg) = registry();
        kv.set("sms_demo:beta", r#"{"students":[{"studentId":"X"}]}"#)
            .unwrap();
        reg.create("Beta").unwrap();

        let db = SchoolDb::new(kv, StoreSettings::default());
        assert_eq!(
            db.load_state(&Namespace::tenant("beta")).unwrap(),
            SchoolState::default()
        );
    }

    #[test]
    fn test_create_blank_name_is_noop() {
        let (kv, reg) = registry();
        assert_eq!(reg.create("   ").unwrap(), None);
        assert!(kv.is_empty());
    }

    #[test]
    fn test_create_trims_name() {
        let (_, reg) = registry();
        let tenant = reg.create("  Oak Park  ").unwrap().unwrap();
        assert_eq!(tenant.name, "Oak Park");
        assert_eq!(tenant.id, "oak-park");
    }

    #[test]
    fn test_set_current_does_not_validate() {
        let (_, reg) = registry();
        reg.set_current("nowhere").unwrap();
        assert_eq!(reg.current().as_deref(), Some("nowhere"));
    }

    proptest! {
        #[test]
        fn prop_slug_shape(name in ".{0,40}") {
            let slug = slugify(&name);
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn prop_created_ids_are_distinct(names in prop::collection::vec("[ A-Za-z!-]{1,6}", 1..12)) {
            let (_, reg) = registry();
            for name in &names {
                reg.create(name).unwrap();
            }
            let mut ids: Vec<String> = reg.list().into_iter().map(|t| t.id).collect();
            let count = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), count);
        }
    }
}
