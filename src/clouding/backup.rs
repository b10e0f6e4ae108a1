//! Backups

use super::client::{resource_path, CloudingClient};
use super::error::Result;
use super::image::Image;
use super::nullable;
use super::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const BACKUP_PATH: &str = "backups";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub id: String,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub server_id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub server_name: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub volume_size_gb: i64,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub image: Image,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub status: String,
}

impl CloudingClient {
    pub async fn get_backup(&self, id: &str) -> Result<Backup> {
        self.fetch("getting backup", "backup", &resource_path(BACKUP_PATH, id))
            .await
    }
}
