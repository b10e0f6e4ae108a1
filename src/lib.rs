//! Client for the Clouding.io API
//!
//! [`clouding`] holds the transport and per-resource API calls, [`resource`]
//! the create/read/update/delete flows that wait on actions and reconcile
//! responses with caller-held records.

pub mod clouding;
pub mod config;
pub mod resource;

pub use clouding::action::{Action, ActionPoller, ActionStatus, PollConfig, Sleeper};
pub use clouding::client::CloudingClient;
pub use clouding::error::{format_api_error, Error, ErrorEnvelope, Result};
pub use clouding::http::{ClientConfig, HttpTransport, Transport, TransportResponse};
pub use config::Config;
pub use resource::lifecycle::{Lifecycle, Tracked};
