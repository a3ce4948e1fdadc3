//! Deployment pipeline

pub mod fsm;
pub mod naming;
pub mod orchestrator;
pub mod providers;
