//! School Records - per-school student, fee, course, staff and result records
//!
//! Core modules:
//! - `platform`: Key-value storage backends (LocalStorage on web)
//! - `persistence`: Namespaced School State blobs with merge-on-load
//! - `tenants`: Tenant registry and current-tenant pointer
//! - `school`: Record types and the School State shape
//! - `forms`: Form submissions and enrolment validation
//! - `session`: Append-only controller over the active tenant
//! - `ui`: Panel rendering

pub mod forms;
pub mod persistence;
pub mod platform;
pub mod school;
pub mod session;
pub mod settings;
pub mod tenants;
pub mod ui;

pub use persistence::{LoadError, Namespace, SchoolDb, StoreError};
pub use platform::{KeyValueStore, MemoryStore};
pub use school::SchoolState;
pub use session::{Export, Session, SessionError, Submission};
pub use settings::StoreSettings;
pub use tenants::{Tenant, TenantRegistry, slugify};
