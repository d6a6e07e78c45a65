//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod activation;
mod condition;
mod permission;
mod schema;
mod user;

pub use activation::ActivatedTable;
pub use condition::{ConditionRule, RangeBound, TableCondition};
pub use permission::{CrudAction, DatabasePermission, PermissionFlags, TablePermission};
pub use schema::{ColumnClass, ColumnSchema, TableRef, TableSchema};
pub use user::User;
