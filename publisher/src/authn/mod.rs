//! Credentials and the hosting credential policy

pub mod credential;
pub mod token_mngr;
