//! Property-based tests using proptest
//!
//! These tests check the firewall rule wire round trip and the
//! reconciliation rules for server reads using randomized inputs.

use async_trait::async_trait;
use clouding::clouding::firewall::{Firewall, FirewallRule};
use clouding::clouding::image::Image;
use clouding::clouding::server::{AccessConfiguration, BackupPreference, Server, Volume};
use clouding::resource::reconcile::{merge_server, normalize_server_read};
use clouding::{
    Action, ActionPoller, ActionStatus, CloudingClient, Sleeper, Transport, TransportResponse,
};
use proptest::prelude::*;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Answers every action fetch with the next queued status
struct StatusSequence {
    statuses: Mutex<VecDeque<&'static str>>,
    fetches: Mutex<usize>,
}

#[async_trait]
impl Transport for StatusSequence {
    async fn send(
        &self,
        _method: Method,
        _path: &str,
        _body: Option<Vec<u8>>,
    ) -> clouding::Result<TransportResponse> {
        *self.fetches.lock().unwrap() += 1;
        let status = self.statuses.lock().unwrap().pop_front().unwrap_or("completed");
        let completed_at = match status {
            "completed" | "errored" => json!("2023-01-03T12:05:00Z"),
            _ => Value::Null,
        };
        let body = json!({"id": "ZPlL0kxDyR9Q3Yb5", "status": status, "completedAt": completed_at});
        Ok(TransportResponse::new(200, body.to_string()))
    }
}

#[derive(Default)]
struct CountingSleeper {
    sleeps: Mutex<usize>,
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, _duration: Duration) {
        *self.sleeps.lock().unwrap() += 1;
    }
}

/// Generate an arbitrary firewall rule input
fn arb_rule() -> impl Strategy<Value = FirewallRule> {
    (
        "([0-9]{1,3}\\.){3}[0-9]{1,3}/[0-9]{1,2}",
        prop_oneof!["tcp", "udp", "icmp", "all"],
        "[ -~]{0,40}",
        0i64..=65535,
        0i64..=65535,
    )
        .prop_map(|(source_ip, protocol, description, a, b)| FirewallRule {
            source_ip,
            protocol: protocol.to_string(),
            description,
            port_range_min: a.min(b),
            port_range_max: a.max(b),
            ..Default::default()
        })
}

fn arb_id() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{16}"
}

fn arb_volume() -> impl Strategy<Value = Option<Volume>> {
    prop::option::of(
        (
            prop::option::of(arb_id()),
            prop::option::of(prop_oneof!["image", "backup", "snapshot", "server"]),
            prop::option::of(0i64..2000),
            prop::option::of(any::<bool>()),
        )
            .prop_map(|(id, source, ssd_gb, shut_down_source)| Volume {
                id,
                source: source.map(String::from),
                ssd_gb,
                shut_down_source,
            }),
    )
}

fn arb_access() -> impl Strategy<Value = Option<AccessConfiguration>> {
    prop::option::of(
        (
            prop::option::of(arb_id()),
            prop::option::of("[a-zA-Z0-9!]{0,12}"),
            prop::option::of(any::<bool>()),
            prop::option::of(any::<bool>()),
        )
            .prop_map(
                |(ssh_key_id, password, has_password, save_password)| AccessConfiguration {
                    ssh_key_id,
                    password,
                    has_password,
                    save_password,
                },
            ),
    )
}

fn arb_backup_preference() -> impl Strategy<Value = Option<BackupPreference>> {
    prop::option::of(
        (
            prop::option::of(1i64..30),
            prop::option::of(prop_oneof!["OneDay", "OneWeek"]),
        )
            .prop_map(|(slots, frequency)| BackupPreference {
                slots,
                frequency: frequency.map(String::from),
            }),
    )
}

/// Generate a server as a read response would produce it
fn arb_fetched_server() -> impl Strategy<Value = Server> {
    (
        arb_id(),
        "[a-z][a-z0-9-]{0,20}",
        prop_oneof!["1x2", "1x4", "2x4", "4x8"],
        1i64..2000,
        arb_volume(),
        arb_id(),
        prop::collection::vec(arb_id(), 0..3),
        arb_access(),
        arb_backup_preference(),
    )
        .prop_map(
            |(id, name, flavor, volume_size_gb, volume, image_id, firewall_ids, access, backup)| {
                Server {
                    id,
                    name,
                    flavor: flavor.to_string(),
                    volume_size_gb,
                    volume,
                    image: Image {
                        id: image_id,
                        ..Default::default()
                    },
                    firewalls: firewall_ids
                        .into_iter()
                        .map(|id| Firewall {
                            id,
                            ..Default::default()
                        })
                        .collect(),
                    access_configuration: access.map(|mut a| {
                        a.password = None;
                        a
                    }),
                    backup_preference: backup,
                    ..Default::default()
                }
            },
        )
}

/// Generate a caller-held server with write-only inputs set
fn arb_held_server() -> impl Strategy<Value = Server> {
    (
        arb_volume(),
        arb_access(),
        arb_backup_preference(),
        "[ -~]{0,30}",
        any::<bool>(),
    )
        .prop_map(|(volume, access, backup, user_data, strict)| Server {
            volume,
            access_configuration: access,
            backup_preference: backup,
            user_data,
            enable_strict_anti_ddos_filtering: strict,
            ..Default::default()
        })
}

fn arb_running_statuses() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop_oneof![Just("pending"), Just("inProgress")], 0..12)
}

proptest! {
    /// n running observations before the terminal one cost n + 1 fetches and n sleeps
    #[test]
    fn poller_fetches_once_per_observation(
        running in arb_running_statuses(),
        errored in any::<bool>(),
    ) {
        let mut statuses: VecDeque<&'static str> = running.iter().copied().collect();
        statuses.push_back(if errored { "errored" } else { "completed" });
        let transport = Arc::new(StatusSequence {
            statuses: Mutex::new(statuses),
            fetches: Mutex::new(0),
        });
        let sleeper = Arc::new(CountingSleeper::default());
        let poller = ActionPoller::new(CloudingClient::with_transport(transport.clone()))
            .with_sleeper(sleeper.clone());
        let mut action = Action {
            id: "ZPlL0kxDyR9Q3Yb5".to_string(),
            status: ActionStatus::Pending,
            ..Default::default()
        };

        let result = tokio_test::block_on(poller.wait(&mut action, &CancellationToken::new()));

        prop_assert_eq!(*transport.fetches.lock().unwrap(), running.len() + 1);
        prop_assert_eq!(*sleeper.sleeps.lock().unwrap(), running.len());
        if errored {
            let err = result.unwrap_err();
            prop_assert_eq!(err.action_id(), Some("ZPlL0kxDyR9Q3Yb5"));
            prop_assert_ne!(action.status, ActionStatus::Completed);
        } else {
            prop_assert!(result.is_ok());
            prop_assert_eq!(action.status, ActionStatus::Completed);
            prop_assert!(action.completed_at.is_some());
        }
    }

    /// Encoding a rule and decoding the created response keeps the rule fields
    #[test]
    fn rule_round_trip_preserves_fields(rule in arb_rule(), id in arb_id()) {
        let sent: Value = serde_json::to_value(&rule).unwrap();
        prop_assert!(sent.get("id").is_none());

        // The provider echoes the input with an id and enabled flag added.
        let mut created = sent.clone();
        created["id"] = json!(id);
        created["enabled"] = json!(true);

        let decoded: FirewallRule = serde_json::from_value(created).unwrap();
        prop_assert_eq!(&decoded.source_ip, &rule.source_ip);
        prop_assert_eq!(&decoded.protocol, &rule.protocol);
        prop_assert_eq!(&decoded.description, &rule.description);
        prop_assert_eq!(decoded.port_range_min, rule.port_range_min);
        prop_assert_eq!(decoded.port_range_max, rule.port_range_max);
        prop_assert_eq!(decoded.id, id);
    }

    /// The nested volume size never survives normalization
    #[test]
    fn normalized_volume_size_is_top_level(server in arb_fetched_server()) {
        let mut server = server;
        normalize_server_read(&mut server);

        if let Some(volume) = &server.volume {
            prop_assert_eq!(volume.ssd_gb, Some(server.volume_size_gb));
            prop_assert_eq!(volume.id.as_deref(), Some(server.image.id.as_str()));
        }
        prop_assert_eq!(&server.flavor_id, &server.flavor);
        match server.firewalls.first() {
            Some(first) => prop_assert_eq!(&server.firewall_id, &first.id),
            None => prop_assert!(server.firewall_id.is_empty()),
        }
    }

    /// Normalizing twice changes nothing
    #[test]
    fn normalization_is_idempotent(server in arb_fetched_server()) {
        let mut once = server;
        normalize_server_read(&mut once);
        let mut twice = once.clone();
        normalize_server_read(&mut twice);
        prop_assert_eq!(once, twice);
    }

    /// Merging never drops held sub-records or write-only inputs
    #[test]
    fn merge_respects_write_only_and_omitted(
        held in arb_held_server(),
        fetched in arb_fetched_server(),
    ) {
        let original = held.clone();
        let mut merged = held;
        merge_server(&mut merged, fetched.clone());

        prop_assert_eq!(&merged.id, &fetched.id);
        prop_assert_eq!(&merged.name, &fetched.name);
        prop_assert_eq!(merged.volume_size_gb, fetched.volume_size_gb);
        prop_assert_eq!(&merged.user_data, &original.user_data);
        prop_assert_eq!(
            merged.enable_strict_anti_ddos_filtering,
            original.enable_strict_anti_ddos_filtering
        );

        prop_assert_eq!(
            merged.volume.is_some(),
            original.volume.is_some() || fetched.volume.is_some()
        );
        prop_assert_eq!(
            merged.access_configuration.is_some(),
            original.access_configuration.is_some() || fetched.access_configuration.is_some()
        );
        match (&original.backup_preference, &fetched.backup_preference) {
            (held_preference, None) => {
                prop_assert_eq!(&merged.backup_preference, held_preference);
            }
            (None, fetched_preference) => {
                prop_assert_eq!(&merged.backup_preference, fetched_preference);
            }
            (Some(held_preference), Some(fetched_preference)) => {
                let preference = merged.backup_preference.as_ref().unwrap();
                prop_assert_eq!(
                    &preference.slots,
                    &fetched_preference.slots.or(held_preference.slots)
                );
                prop_assert_eq!(
                    &preference.frequency,
                    &fetched_preference
                        .frequency
                        .clone()
                        .or_else(|| held_preference.frequency.clone())
                );
            }
        }

        if let Some(held_access) = &original.access_configuration {
            let access = merged.access_configuration.as_ref().unwrap();
            prop_assert_eq!(&access.password, &held_access.password);
            let fetched_access = fetched.access_configuration.clone().unwrap_or_default();
            prop_assert_eq!(
                access.save_password,
                fetched_access.save_password.or(held_access.save_password)
            );
            prop_assert_eq!(
                &access.ssh_key_id,
                &fetched_access.ssh_key_id.or_else(|| held_access.ssh_key_id.clone())
            );
        }
        if let Some(held_volume) = &original.volume {
            let volume = merged.volume.as_ref().unwrap();
            prop_assert_eq!(volume.shut_down_source, held_volume.shut_down_source);
            let fetched_volume = fetched.volume.clone().unwrap_or_default();
            prop_assert_eq!(
                &volume.source,
                &fetched_volume.source.or_else(|| held_volume.source.clone())
            );
        }
    }
}
