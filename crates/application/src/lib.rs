#![forbid(unsafe_code)]

pub mod controller_service_impl;
pub mod enforcement_service_impl;
pub mod event_pipeline;
pub mod flow_monitor;
pub mod policy_reload;
