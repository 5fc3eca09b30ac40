//! CLI command implementations.

pub mod init;
pub mod link;
pub mod run;
pub mod status;
