//! Session controller
//!
//! Owns the active namespace and its in-memory School State. Every form
//! submission appends one record and immediately persists the whole blob.
//! There is no update or delete path.

use crate::forms::{CourseForm, EnrolmentForm, FeeForm, ResultForm, StaffForm};
use crate::persistence::{Namespace, SchoolDb, StoreError};
use crate::platform::KeyValueStore;
use crate::school::{Course, FeeRecord, ResultRecord, SchoolState, StaffMember};
use crate::settings::StoreSettings;
use crate::tenants::{Tenant, TenantRegistry};

/// MIME type of the results export
pub const EXPORT_MIME: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unknown tenant '{0}'")]
    UnknownTenant(String),
    #[error("tenants are not available in single-tenant mode")]
    SingleTenant,
}

/// Outcome of a form submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Record appended and persisted
    Recorded,
    /// Required fields missing; nothing changed
    Dropped,
}

/// A downloadable file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub mime: &'static str,
    pub contents: String,
}

/// One open school records session
#[derive(Debug)]
pub struct Session<S> {
    db: SchoolDb<S>,
    /// `None` in single-tenant mode
    registry: Option<TenantRegistry<S>>,
    namespace: Namespace,
    state: SchoolState,
}

impl<S: KeyValueStore> Session<S> {
    /// Resolve the current tenant (creating the demo tenant on first run) and
    /// load its records
    pub fn multi_tenant(kv: S, settings: StoreSettings) -> Result<Self, SessionError> {
        let registry = TenantRegistry::new(kv.clone(), settings.clone());
        let tenant_id = registry.ensure_default()?;
        let db = SchoolDb::new(kv, settings);
        let namespace = Namespace::Tenant(tenant_id);
        let state = db.init(&namespace)?;
        Ok(Self {
            db,
            registry: Some(registry),
            namespace,
            state,
        })
    }

    /// Load the single fixed blob
    pub fn single_tenant(kv: S, settings: StoreSettings) -> Result<Self, SessionError> {
        let db = SchoolDb::new(kv, settings);
        let namespace = Namespace::Single;
        let state = db.init(&namespace)?;
        Ok(Self {
            db,
            registry: None,
            namespace,
            state,
        })
    }

    pub fn state(&self) -> &SchoolState {
        &self.state
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Drop in-memory state and re-read it from storage
    pub fn reload(&mut self) -> Result<(), SessionError> {
        self.state = self.db.init(&self.namespace)?;
        Ok(())
    }

    fn registry(&self) -> Result<&TenantRegistry<S>, SessionError> {
        self.registry.as_ref().ok_or(SessionError::SingleTenant)
    }

    /// Registered tenants; empty in single-tenant mode
    pub fn tenants(&self) -> Vec<Tenant> {
        self.registry
            .as_ref()
            .map(TenantRegistry::list)
            .unwrap_or_default()
    }

    /// The tenant this session is showing
    pub fn current_tenant(&self) -> Option<Tenant> {
        let id = self.namespace.tenant_id()?;
        self.registry.as_ref()?.find(id)
    }

    /// Make `id` the current tenant and load its records.
    ///
    /// An empty id is ignored.
    pub fn switch_tenant(&mut self, id: &str) -> Result<(), SessionError> {
        let registry = self.registry()?;
        if id.is_empty() {
            return Ok(());
        }
        if registry.find(id).is_none() {
            return Err(SessionError::UnknownTenant(id.to_string()));
        }
        registry.set_current(id)?;
        self.namespace = Namespace::tenant(id);
        self.reload()?;
        log::info!("Switched to tenant '{}'", id);
        Ok(())
    }

    /// Register a school and switch to it. Blank names are ignored.
    pub fn create_tenant(&mut self, name: &str) -> Result<Option<Tenant>, SessionError> {
        let Some(tenant) = self.registry()?.create(name)? else {
            return Ok(None);
        };
        self.switch_tenant(&tenant.id)?;
        Ok(Some(tenant))
    }

    /// Push one record and persist. A failed write takes the record back out,
    /// so a retried submission is stored once.
    fn append<T>(
        &mut self,
        records: fn(&mut SchoolState) -> &mut Vec<T>,
        record: T,
    ) -> Result<Submission, SessionError> {
        records(&mut self.state).push(record);
        if let Err(e) = self.db.save(&self.namespace, &self.state) {
            records(&mut self.state).pop();
            return Err(e.into());
        }
        Ok(Submission::Recorded)
    }

    pub fn enrol(&mut self, form: EnrolmentForm) -> Result<Submission, SessionError> {
        let Some(student) = form.into_student() else {
            log::debug!("Enrolment dropped: name and student id are required");
            return Ok(Submission::Dropped);
        };
        self.append(|s| &mut s.students, student)
    }

    pub fn record_fee(&mut self, form: FeeForm) -> Result<Submission, SessionError> {
        self.append(|s| &mut s.fees, FeeRecord::from(form))
    }

    pub fn add_course(&mut self, form: CourseForm) -> Result<Submission, SessionError> {
        self.append(|s| &mut s.courses, Course::from(form))
    }

    pub fn add_staff(&mut self, form: StaffForm) -> Result<Submission, SessionError> {
        self.append(|s| &mut s.staff, StaffMember::from(form))
    }

    pub fn record_result(&mut self, form: ResultForm) -> Result<Submission, SessionError> {
        self.append(|s| &mut s.results, ResultRecord::from(form))
    }

    /// Results as a pretty-printed JSON file named after the namespace
    pub fn export_results(&self) -> Result<Export, SessionError> {
        let contents = self.state.results_json().map_err(StoreError::from)?;
        Ok(Export {
            file_name: self.namespace.export_file_name(),
            mime: EXPORT_MIME,
            contents,
        })
    }
}
