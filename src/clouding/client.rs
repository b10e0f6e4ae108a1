//! Clouding Client
//!
//! Main client for the Clouding API. Every resource client in this module
//! tree is an `impl CloudingClient` block that turns one logical operation
//! into exactly one exchange through the shared [`Transport`].

use super::error::{Error, ErrorEnvelope, Result};
use super::http::{ClientConfig, HttpTransport, Transport, TransportResponse};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Main Clouding client
#[derive(Clone)]
pub struct CloudingClient {
    transport: Arc<dyn Transport>,
}

impl CloudingClient {
    /// Create a client backed by a fresh [`HttpTransport`]
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Create a client over an existing transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send one request and require one of `accepted` as the status.
    ///
    /// Any other status is decoded as an [`ErrorEnvelope`]; a body that is
    /// not an envelope is reported as [`Error::ErrorDecode`].
    pub(crate) async fn exchange(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        accepted: &[u16],
    ) -> Result<TransportResponse> {
        let response = self.transport.send(method, path, body).await?;
        check_status(operation, response, accepted)
    }

    /// GET `path`, expect 200 and decode the body.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        what: &'static str,
        path: &str,
    ) -> Result<T> {
        let response = self
            .exchange(operation, Method::GET, path, None, &[200])
            .await?;
        decode_body(what, &response)
    }
}

/// Statuses a PATCH update may answer with
pub(crate) const UPDATE_STATUSES: &[u16] = &[204, 200];

/// Build `{collection}/{id}` with the id percent-encoded
pub fn resource_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, urlencoding::encode(id))
}

pub(crate) fn check_status(
    operation: &'static str,
    response: TransportResponse,
    accepted: &[u16],
) -> Result<TransportResponse> {
    if accepted.contains(&response.status) {
        return Ok(response);
    }

    match serde_json::from_slice::<ErrorEnvelope>(&response.body) {
        Ok(envelope) => Err(Error::Api {
            operation,
            status: response.status,
            envelope,
        }),
        Err(source) => Err(Error::ErrorDecode {
            operation,
            status: response.status,
            source,
        }),
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(
    what: &'static str,
    response: &TransportResponse,
) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|source| Error::Decode { what, source })
}

pub(crate) fn encode_body<T: Serialize>(what: &'static str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| Error::Encode { what, source })
}
