//! CLI command implementations

pub mod completions;
pub mod customs;
pub mod init;
pub mod order;
pub mod source;
pub mod vendor;
