//! Images

use super::client::{resource_path, CloudingClient};
use super::error::Result;
use super::nullable;
use serde::{Deserialize, Serialize};

pub const IMAGE_PATH: &str = "images";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub minimum_size_gb: i64,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub access_methods: ImageAccessMethods,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub price_per_hour: f64,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub price_per_month_approx: f64,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub billing_unit: String,
}

impl Image {
    /// No image reference (nothing to send on a request)
    pub fn is_unset(&self) -> bool {
        self.id.is_empty()
    }
}

/// How a server built from the image can be accessed (`required`,
/// `optional` or `not-supported` per method)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAccessMethods {
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub ssh_key: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub password: String,
}

impl CloudingClient {
    pub async fn get_image(&self, id: &str) -> Result<Image> {
        self.fetch("getting image", "image", &resource_path(IMAGE_PATH, id))
            .await
    }
}
