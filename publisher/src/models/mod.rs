//! Data models

pub mod deployment;
pub mod project;
pub mod provider;
