//! Tekton pipelines command-line client
//!
//! Library side of the `tkn` binary. The binary wires these modules to
//! clap; integration tests drive them directly.

pub mod config;
pub mod error;
pub mod kube;
pub mod task;

pub use error::TaskError;
