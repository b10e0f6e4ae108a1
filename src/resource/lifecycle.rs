//! Create / read / update / delete flows
//!
//! Each flow combines client calls with the action poller and the
//! reconciler, and keeps a [`Tracked`] record the way a declarative caller
//! keeps resource state between runs.

use super::reconcile;
use crate::clouding::action::{ActionPoller, PollConfig, Sleeper};
use crate::clouding::client::CloudingClient;
use crate::clouding::error::{Error, Result};
use crate::clouding::firewall::{Firewall, FirewallRuleBinding, FirewallUpdate};
use crate::clouding::server::Server;
use crate::clouding::sshkey::SshKey;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// How long a server create or delete may take before the wait is abandoned
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// A record plus the time this process last changed it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracked<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Tracked<T> {
    pub fn new(record: T) -> Self {
        Self {
            record,
            last_updated: None,
        }
    }

    pub fn touch(&mut self) {
        self.last_updated = Some(Utc::now());
    }
}

#[derive(Clone)]
pub struct Lifecycle {
    client: CloudingClient,
    poller: ActionPoller,
    action_timeout: Duration,
}

impl Lifecycle {
    pub fn new(client: CloudingClient) -> Self {
        Self {
            poller: ActionPoller::new(client.clone()),
            client,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }

    pub fn with_poll_config(mut self, config: PollConfig) -> Self {
        self.poller = self.poller.with_config(config);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.poller = self.poller.with_sleeper(sleeper);
        self
    }

    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    pub fn client(&self) -> &CloudingClient {
        &self.client
    }

    pub fn poller(&self) -> &ActionPoller {
        &self.poller
    }

    // Servers

    /// Create a server and wait until the provider reports it built
    pub async fn create_server(&self, server: &mut Tracked<Server>) -> Result<()> {
        self.client.create_server(&mut server.record).await?;

        let record = &mut server.record;
        let action = match record.action.as_mut() {
            Some(action) if action.has_id() => action,
            _ => return Err(Error::MissingAction { resource: "server" }),
        };
        self.poller
            .wait_with_timeout(action, self.action_timeout)
            .await?;

        tracing::info!("server {} created", record.id);
        server.touch();
        Ok(())
    }

    /// Refresh a held server from the provider
    pub async fn read_server(&self, server: &mut Tracked<Server>) -> Result<()> {
        let fetched = self.client.fetch_server(&server.record.id).await?;
        reconcile::merge_server(&mut server.record, fetched);
        reconcile::normalize_server_read(&mut server.record);
        Ok(())
    }

    /// Renaming is the only in-place server update the provider offers
    pub async fn rename_server(&self, server: &mut Tracked<Server>, name: &str) -> Result<()> {
        self.client.rename_server(&server.record.id, name).await?;
        server.record.name = name.to_string();
        server.touch();
        Ok(())
    }

    pub async fn delete_server(&self, id: &str) -> Result<()> {
        let mut action = self.client.delete_server(id).await?;
        if !action.has_id() {
            return Err(Error::MissingAction { resource: "server" });
        }
        self.poller
            .wait_with_timeout(&mut action, self.action_timeout)
            .await?;
        tracing::info!("server {} deleted", id);
        Ok(())
    }

    // Firewalls

    pub async fn create_firewall(&self, firewall: &mut Tracked<Firewall>) -> Result<()> {
        self.client.create_firewall(&mut firewall.record).await?;
        firewall.touch();
        Ok(())
    }

    pub async fn read_firewall(&self, firewall: &mut Tracked<Firewall>) -> Result<()> {
        firewall.record = self.client.get_firewall(&firewall.record.id).await?;
        Ok(())
    }

    /// Apply `update`, then re-read so the held record shows the result
    pub async fn update_firewall(
        &self,
        firewall: &mut Tracked<Firewall>,
        update: &FirewallUpdate,
    ) -> Result<()> {
        self.client
            .update_firewall(&firewall.record.id, update)
            .await?;
        firewall.record = self.client.get_firewall(&firewall.record.id).await?;
        firewall.touch();
        Ok(())
    }

    pub async fn delete_firewall(&self, id: &str) -> Result<()> {
        self.client.delete_firewall(id).await
    }

    // Firewall rules

    pub async fn create_firewall_rule(&self, rule: &mut Tracked<FirewallRuleBinding>) -> Result<()> {
        self.client.create_firewall_rule(&mut rule.record).await?;
        rule.touch();
        Ok(())
    }

    pub async fn read_firewall_rule(&self, rule: &mut Tracked<FirewallRuleBinding>) -> Result<()> {
        rule.record = self
            .client
            .get_firewall_rule(&rule.record.firewall_rule.id)
            .await?;
        Ok(())
    }

    pub async fn delete_firewall_rule(&self, id: &str) -> Result<()> {
        self.client.delete_firewall_rule(id).await
    }

    // SSH keys

    pub async fn create_ssh_key(&self, key: &mut Tracked<SshKey>) -> Result<()> {
        self.client.create_ssh_key(&mut key.record).await?;
        key.touch();
        Ok(())
    }

    pub async fn read_ssh_key(&self, key: &mut Tracked<SshKey>) -> Result<()> {
        let fetched = self.client.get_ssh_key(&key.record.id).await?;
        reconcile::merge_ssh_key(&mut key.record, fetched);
        Ok(())
    }

    pub async fn delete_ssh_key(&self, id: &str) -> Result<()> {
        self.client.delete_ssh_key(id).await
    }
}
