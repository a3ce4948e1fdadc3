//! Publisher Library
//!
//! Publishes generated applications: creates a source repository, pushes
//! the files as one commit, then creates, links and deploys a hosting
//! project.

pub mod app;
pub mod authn;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod storage;
pub mod utils;
