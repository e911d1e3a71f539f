//! Kubernetes API interaction module
//!
//! This module provides the resource-store side of the CLI: kubeconfig
//! handling, the HTTP client and URL building for Tekton resources.
//!
//! # Module Structure
//!
//! - [`auth`] - Kubeconfig discovery and context resolution
//! - [`client`] - Main client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use tkn::kube::client::KubeClient;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = KubeClient::from_kubeconfig(path, None)?;
//!     let url = client.tekton_object_url("v1alpha1", "default", "tasks", "build");
//!     let task = client.get(&url).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
