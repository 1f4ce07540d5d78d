//! Structured adapter over WP-CLI for local site provisioning.
//!
//! The pipeline for one call is: normalize the command ([`command`]),
//! classify and inject output flags ([`flags`]), pick the execution identity
//! ([`identity`]), run with a timeout ([`process`]), then reduce the text to a
//! payload ([`noise`], [`json_blob`], [`decode`]). [`wp::WpCli`] exposes the
//! four call shapes.

pub mod command;
pub mod config;
pub mod decode;
pub mod error;
pub mod flags;
pub mod identity;
pub mod json_blob;
pub mod logging;
pub mod noise;
pub mod process;
pub mod runlog;
pub mod wp;

pub use command::CommandSpec;
pub use config::AdapterConfig;
pub use error::{AdapterError, AdapterResult};
pub use process::ExecutionOutcome;
pub use runlog::{MemoryRunLog, RunLog, TracingRunLog};
pub use wp::{Captured, WpCli};
