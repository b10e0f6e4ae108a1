//! Firewalls and firewall rules

use super::client::{
    decode_body, encode_body, resource_path, CloudingClient, UPDATE_STATUSES,
};
use super::error::Result;
use super::nullable;
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub const FIREWALL_PATH: &str = "firewalls";
const RULES_SEGMENT: &str = "rules";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Firewall {
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub rules: Vec<FirewallRule>,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attachments: Vec<FirewallAttachment>,
}

/// Body of `PATCH firewalls/{id}`. These fields only exist on the request
/// side; reads report the result through [`Firewall::name`] and
/// [`Firewall::description`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallUpdate {
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub new_name: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub new_description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub source_ip: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub protocol: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub port_range_min: i64,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub port_range_max: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// A rule together with the firewall that owns it, as returned by
/// `GET firewalls/rules/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleBinding {
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub firewall_id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub firewall_rule: FirewallRule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallAttachment {
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub server_id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub server_name: String,
}

fn rule_path(id: &str) -> String {
    format!("{}/{}", FIREWALL_PATH, resource_path(RULES_SEGMENT, id))
}

impl CloudingClient {
    pub async fn get_firewall(&self, id: &str) -> Result<Firewall> {
        self.fetch("getting firewall", "firewall", &resource_path(FIREWALL_PATH, id))
            .await
    }

    /// Create a firewall from `firewall.name`/`firewall.description`; the
    /// created record replaces `firewall`.
    pub async fn create_firewall(&self, firewall: &mut Firewall) -> Result<()> {
        let body = encode_body("firewall", firewall)?;
        let response = self
            .exchange("creating firewall", Method::POST, FIREWALL_PATH, Some(body), &[201])
            .await?;
        *firewall = decode_body("firewall", &response)?;
        tracing::info!("created firewall {} ({})", firewall.id, firewall.name);
        Ok(())
    }

    /// Change name and description; the provider answers 204 or 200
    pub async fn update_firewall(&self, id: &str, update: &FirewallUpdate) -> Result<()> {
        let body = encode_body("firewall", update)?;
        self.exchange(
            "updating firewall",
            Method::PATCH,
            &resource_path(FIREWALL_PATH, id),
            Some(body),
            UPDATE_STATUSES,
        )
        .await?;
        Ok(())
    }

    pub async fn delete_firewall(&self, id: &str) -> Result<()> {
        self.exchange(
            "deleting firewall",
            Method::DELETE,
            &resource_path(FIREWALL_PATH, id),
            None,
            &[204],
        )
        .await?;
        Ok(())
    }

    pub async fn get_firewall_rule(&self, id: &str) -> Result<FirewallRuleBinding> {
        self.fetch("getting firewall rule", "firewall rule", &rule_path(id))
            .await
    }

    /// Add `binding.firewall_rule` to `binding.firewall_id`. The created rule
    /// (with its id) replaces `binding.firewall_rule`.
    pub async fn create_firewall_rule(&self, binding: &mut FirewallRuleBinding) -> Result<()> {
        let body = encode_body("firewall rule", &binding.firewall_rule)?;
        let path = format!(
            "{}/{}",
            resource_path(FIREWALL_PATH, &binding.firewall_id),
            RULES_SEGMENT
        );
        let response = self
            .exchange("creating firewall rule", Method::POST, &path, Some(body), &[201])
            .await?;
        binding.firewall_rule = decode_body("firewall rule", &response)?;
        tracing::info!(
            "created firewall rule {} on firewall {}",
            binding.firewall_rule.id,
            binding.firewall_id
        );
        Ok(())
    }

    pub async fn delete_firewall_rule(&self, id: &str) -> Result<()> {
        self.exchange(
            "deleting firewall rule",
            Method::DELETE,
            &rule_path(id),
            None,
            &[204],
        )
        .await?;
        Ok(())
    }
}
