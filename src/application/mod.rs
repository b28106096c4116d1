//! Application layer - Use cases that coordinate domain services.
//!
//! This layer contains the caller-facing provisioning calls and orchestrates
//! the flow of data between the CLI layer and the provisioners.

mod plan;
mod provision;

pub use plan::ProvisionPlan;
pub use provision::{ProvisionKind, ProvisionRequest, ProvisionUseCase};
