//! Application Layer
//!
//! User-facing CLI, configuration management, and the session factory that
//! wires the landmark stream and the input backend into a gesture session.

pub mod cli;
pub mod config;
pub mod session;

pub use cli::Cli;
pub use config::Config;
pub use session::StreamSessionFactory;
