//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod postgres_audit_sink;
mod postgres_permission_repository;
mod postgres_registry_repository;
mod postgres_schema_introspector;
mod postgres_table_records;
mod sqlx_errors;
mod tracing_audit_sink;

pub use postgres_audit_sink::PostgresAuditSink;
pub use postgres_permission_repository::PostgresPermissionRepository;
pub use postgres_registry_repository::PostgresRegistryRepository;
pub use postgres_schema_introspector::PostgresSchemaIntrospector;
pub use postgres_table_records::PostgresTableRecords;
pub use tracing_audit_sink::TracingAuditSink;
