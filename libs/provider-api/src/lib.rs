//! Provider API wire models
//!
//! Request and response bodies for the repository provider (GitHub REST)
//! and the hosting provider (Vercel REST). Only the fields the publisher
//! reads or writes are modelled; unknown fields are ignored.

pub mod models;

pub use models::{github, vercel};
