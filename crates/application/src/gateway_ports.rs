//! Ports consumed by the gateway services.

mod audit;
mod catalog;
mod permissions;
mod records;
mod registry;

pub use audit::{AuditActionKind, AuditEvent, AuditSink};
pub use catalog::SchemaIntrospector;
pub use permissions::PermissionRepository;
pub use records::{ColumnValue, KeyValues, RowPage, RowPageQuery, TableRecords};
pub use registry::{ActivationRepository, ConditionRepository};
