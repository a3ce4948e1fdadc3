//! HTTP provider clients

pub mod client;
pub mod connector;
pub mod github;
pub mod vercel;
