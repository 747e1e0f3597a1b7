//! Alerts module - at-most-once spending alert dispatch.

mod alerts_model;
mod alerts_service;
mod alerts_traits;


pub use alerts_model::{format_alert_message, AlertRunSummary};
pub use alerts_service::AlertService;
pub use alerts_traits::{AlertRelay, AlertRepositoryTrait, AlertServiceTrait};
