//! Clouding API interaction module
//!
//! This module provides the core functionality for talking to the Clouding
//! REST API: the HTTP transport, one client block per resource kind, and
//! polling of long-running actions.
//!
//! # Module Structure
//!
//! - [`http`] - `Transport` trait and the reqwest implementation
//! - [`client`] - Main client shared by every resource
//! - [`error`] - Error taxonomy and the provider's error envelope
//! - [`action`] - Long-running actions and the poller
//! - [`server`], [`firewall`], [`sshkey`], [`backup`], [`snapshot`], [`image`] - Resource clients
//!
//! # Example
//!
//! ```ignore
//! use clouding::clouding::{client::CloudingClient, http::ClientConfig};
//!
//! async fn example() -> clouding::Result<()> {
//!     let client = CloudingClient::new(&ClientConfig::new("token"))?;
//!     let firewall = client.get_firewall("LywOkvx5LWAp28NP").await?;
//!     println!("{}", firewall.name);
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod backup;
pub mod client;
pub mod error;
pub mod firewall;
pub mod http;
pub mod image;
pub mod server;
pub mod snapshot;
pub mod sshkey;
pub(crate) mod nullable;
pub(crate) mod timestamp;

#[cfg(test)]
pub(crate) mod mock;
