//! Long-running actions
//!
//! Mutations that the provider completes asynchronously (server create,
//! server delete) answer with an [`Action`]. [`ActionPoller`] re-fetches the
//! action at a fixed interval until it reaches a terminal status.

use super::client::{resource_path, CloudingClient};
use super::error::{Error, Result};
use super::nullable;
use super::timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const ACTION_PATH: &str = "actions";

/// Default delay between two action fetches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Status of a server-side action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "inProgress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "errored")]
    Errored,
    /// Anything the provider sends that is not one of the above
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl ActionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }

    pub fn is_running(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
            Self::Errored => "errored",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to an asynchronous provider operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub status: ActionStatus,
    /// Operation kind, e.g. `create` or `delete`
    #[serde(default, deserialize_with = "nullable::or_default", rename = "type")]
    pub kind: String,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub resource_id: String,
    #[serde(default, deserialize_with = "nullable::or_default")]
    pub resource_type: String,
}

impl Action {
    /// Whether the provider assigned an identifier
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Copy the terminal outcome of a re-fetched copy onto this handle.
    ///
    /// Non-terminal observations and observations of a different action are
    /// ignored, and a terminal status is never replaced.
    pub fn settle(&mut self, latest: &Action) {
        if latest.id != self.id || !latest.status.is_terminal() || self.status.is_terminal() {
            return;
        }
        self.status = latest.status;
        self.completed_at = latest.completed_at;
    }
}

impl CloudingClient {
    /// Fetch an action by id
    pub async fn get_action(&self, id: &str) -> Result<Action> {
        self.fetch("getting action", "action", &resource_path(ACTION_PATH, id))
            .await
    }

    /// Wait for `action` to finish, polling every `interval`.
    ///
    /// Shorthand for an [`ActionPoller`] with the tokio sleeper and no
    /// attempt limit.
    pub async fn wait_for_action(
        &self,
        action: &mut Action,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ActionPoller::new(self.clone())
            .with_interval(interval)
            .wait(action, cancel)
            .await
    }
}

/// Suspends the poller between two fetches
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// Give up after this many fetches; `None` polls until cancelled
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

/// Drives an [`Action`] to `completed` or `errored`
#[derive(Clone)]
pub struct ActionPoller {
    client: CloudingClient,
    sleeper: Arc<dyn Sleeper>,
    config: PollConfig,
}

impl ActionPoller {
    pub fn new(client: CloudingClient) -> Self {
        Self {
            client,
            sleeper: Arc::new(TokioSleeper),
            config: PollConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Poll until the action is terminal.
    ///
    /// Each iteration is one fetch, one status check and, while the action is
    /// still `pending`/`inProgress`, one sleep. A fetch error ends the wait
    /// immediately. On `completed` the handle receives the final status and
    /// completion time; on `errored` it is marked errored and
    /// [`Error::ActionFailed`] is returned. Cancellation is checked between
    /// iterations and once more after the loop, so a fetch already in flight
    /// when the token fires still completes.
    pub async fn wait(&self, action: &mut Action, cancel: &CancellationToken) -> Result<()> {
        let mut attempts: u32 = 0;

        let latest = loop {
            let latest = self.client.get_action(&action.id).await?;
            attempts += 1;
            tracing::debug!(
                "action {} poll #{}: {}",
                action.id,
                attempts,
                latest.status
            );

            if latest.status.is_terminal() {
                break latest;
            }
            if !latest.status.is_running() {
                return Err(Error::UnexpectedActionStatus {
                    action_id: action.id.clone(),
                });
            }
            if let Some(max) = self.config.max_attempts {
                if attempts >= max {
                    return Err(Error::PollLimitExceeded {
                        action_id: action.id.clone(),
                        attempts,
                    });
                }
            }
            if cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    action_id: action.id.clone(),
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(Error::Cancelled {
                        action_id: action.id.clone(),
                    });
                }
                _ = self.sleeper.sleep(self.config.interval) => {}
            }
        };

        action.settle(&latest);

        if latest.status == ActionStatus::Errored {
            tracing::warn!("action {} ({}) errored", action.id, action.kind);
            return Err(Error::ActionFailed {
                action_id: action.id.clone(),
            });
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled {
                action_id: action.id.clone(),
            });
        }

        tracing::info!(
            "action {} ({}) completed after {} polls",
            action.id,
            action.kind,
            attempts
        );
        Ok(())
    }

    /// [`wait`](Self::wait) bounded by `timeout`.
    ///
    /// The deadline cancels a token rather than aborting the future, so the
    /// outcome of an in-flight fetch is still observed. Expiry surfaces as
    /// [`Error::Cancelled`].
    pub async fn wait_with_timeout(&self, action: &mut Action, timeout: Duration) -> Result<()> {
        let cancel = CancellationToken::new();
        let timer = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                cancel.cancel();
            })
        };

        let result = self.wait(action, &cancel).await;
        timer.abort();
        result
    }
}
