//! Application services and ports for the authorization-request engine.

#![forbid(unsafe_code)]

mod approval_ports;
mod approval_service;
mod dispatch_ports;
mod dispatch_service;

pub use approval_ports::ApprovalGateway;
pub use approval_service::{
    ApprovalHandler, ApprovalMode, DeferredApprovalHandler, ImmediateApprovalHandler,
    PollingSupervisor,
};
pub use dispatch_ports::TargetCommander;
pub use dispatch_service::{AuthListDispatcher, DEFAULT_TARGET_TIMEOUT};
