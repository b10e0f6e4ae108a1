//! Servers
//!
//! Create and delete are asynchronous on the provider side: both answer 202
//! with an [`Action`] that has to be driven to completion with the
//! [`ActionPoller`](super::action::ActionPoller).

use super::action::Action;
use super::backup::Backup;
use super::client::{
    decode_body, encode_body, resource_path, CloudingClient, UPDATE_STATUSES,
};
use super::error::Result;
use super::firewall::Firewall;
use super::image::Image;
use super::nullable;
use super::snapshot::{Cost, Snapshot};
use super::timestamp;
use crate::resource::reconcile;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub const SERVER_PATH: &str = "servers";

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub hostname: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        rename = "vCores",
        skip_serializing_if = "is_zero_f64"
    )]
    pub v_cores: f64,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "is_zero_i64"
    )]
    pub ram_gb: i64,
    /// Flavor used on create; reads only echo [`flavor`](Self::flavor)
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub flavor_id: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub flavor: String,
    /// Firewall attached on create; reads surface the first of
    /// [`firewalls`](Self::firewalls) here
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub firewall_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_configuration: Option<AccessConfiguration>,
    /// Only populated in the create response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_access_configuration: Option<AccessConfiguration>,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "is_zero_i64"
    )]
    pub volume_size_gb: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Volume>,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub enable_private_network: bool,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        rename = "enableStrictAntiDDoSFiltering",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub enable_strict_anti_ddos_filtering: bool,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub user_data: String,
    #[serde(default, rename = "backupPreferences", skip_serializing_if = "Option::is_none")]
    pub backup_preference: Option<BackupPreference>,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Image::is_unset"
    )]
    pub image: Image,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub status: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub power_state: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub features: Vec<String>,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub pending_features: Vec<String>,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub pending_firewalls: Vec<String>,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub dns_address: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub public_ip: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub private_ip: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub ssh_key_id: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub firewalls: Vec<Firewall>,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub snapshots: Vec<Snapshot>,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub backups: Vec<Backup>,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Cost::is_zero"
    )]
    pub cost: Cost,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

/// Login settings. Every key is optional on the wire: reads echo only some of
/// them and a merge keeps the held value for any key a response leaves out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_id: Option<String>,
    /// Write-only: never returned by reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_password: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_password: Option<bool>,
}

/// Boot volume. `source` is one of `image`, `backup`, `snapshot` or
/// `server`; `id` identifies that source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssd_gb: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shut_down_source: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPreference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

/// Body of `PATCH servers/{id}/rename`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRename {
    pub new_server_name: String,
}

impl CloudingClient {
    /// GET a server exactly as the provider returns it
    pub async fn fetch_server(&self, id: &str) -> Result<Server> {
        self.fetch("getting server", "server", &resource_path(SERVER_PATH, id))
            .await
    }

    /// GET a server with the read-side normalization applied (flavor id,
    /// primary firewall, volume size and source).
    pub async fn get_server(&self, id: &str) -> Result<Server> {
        let mut server = self.fetch_server(id).await?;
        reconcile::normalize_server_read(&mut server);
        Ok(server)
    }

    /// Submit `server` for creation.
    ///
    /// On 202 the assigned id, the ssh key id and save-password flag from
    /// `requestedAccessConfiguration`, the status and the spawned action are
    /// written back onto `server`. The rest of the input is left as given.
    pub async fn create_server(&self, server: &mut Server) -> Result<()> {
        let body = encode_body("server", server)?;
        let response = self
            .exchange("creating server", Method::POST, SERVER_PATH, Some(body), &[202])
            .await?;
        let created: Server = decode_body("server", &response)?;
        reconcile::backfill_created_server(server, created);
        tracing::info!(
            "server {} submitted ({}), action {}",
            server.id,
            server.status,
            server.action.as_ref().map(|a| a.id.as_str()).unwrap_or("")
        );
        Ok(())
    }

    /// Start tearing a server down; the returned action tracks the deletion
    pub async fn delete_server(&self, id: &str) -> Result<Action> {
        let response = self
            .exchange(
                "deleting server",
                Method::DELETE,
                &resource_path(SERVER_PATH, id),
                None,
                &[202],
            )
            .await?;
        decode_body("action", &response)
    }

    /// Rename a server; the provider answers 204 or 200
    pub async fn rename_server(&self, id: &str, name: &str) -> Result<()> {
        let rename = ServerRename {
            new_server_name: name.to_string(),
        };
        let body = encode_body("server", &rename)?;
        let path = format!("{}/rename", resource_path(SERVER_PATH, id));
        self.exchange(
            "updating server name",
            Method::PATCH,
            &path,
            Some(body),
            UPDATE_STATUSES,
        )
        .await?;
        Ok(())
    }
}
