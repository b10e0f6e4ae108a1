//! Snapshots

use super::client::{resource_path, CloudingClient};
use super::error::Result;
use super::image::Image;
use super::nullable;
use super::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_PATH: &str = "snapshots";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub size_gb: i64,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub description: String,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub source_server_name: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub shut_down_server: bool,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub image: Image,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub cost: Cost,
}

/// Price breakdown shared by servers and snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub price_per_hour: f64,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub price_per_month_approx: f64,
}

impl Cost {
    pub fn is_zero(&self) -> bool {
        self.price_per_hour == 0.0 && self.price_per_month_approx == 0.0
    }
}

impl CloudingClient {
    pub async fn get_snapshot(&self, id: &str) -> Result<Snapshot> {
        self.fetch("getting snapshot", "snapshot", &resource_path(SNAPSHOT_PATH, id))
            .await
    }
}
