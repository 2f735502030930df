//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_target_commander;
mod rest_approval_gateway;

pub use http_target_commander::HttpTargetCommander;
pub use rest_approval_gateway::{ApprovalCredentials, RestApprovalGateway};
