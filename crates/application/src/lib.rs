//! Application services and ports for the generic table gateway.

#![forbid(unsafe_code)]

mod access_service;
mod config;
pub mod gateway_ports;
mod registry_service;
mod table_service;
mod validation_service;

pub use access_service::{AccessDecision, AccessService};
pub use config::GatewayConfig;
pub use registry_service::RegistryService;
pub use table_service::TableService;
pub use validation_service::{ValidationReport, ValidationService};
