//! CLI command implementations

pub mod build;
pub mod cascade;
pub mod config;
pub mod diff;
pub mod init;
pub mod plan;
pub mod status;
pub mod verify;

pub use build::execute as build;
pub use cascade::execute as cascade;
pub use config::execute as config;
pub use diff::execute as diff;
pub use init::execute as init;
pub use plan::execute as plan;
pub use status::execute as status;
pub use verify::execute as verify;
