//! Reconciling provider responses with caller-held records
//!
//! Reads never echo write-only inputs (passwords, user data, the flags a
//! server was created with), and some fields come back in a different shape
//! than they were submitted in. The functions here merge a fetched record
//! into the copy a caller already holds and apply the provider quirks as
//! separate named steps.

use crate::clouding::server::{AccessConfiguration, BackupPreference, Server, Volume};
use crate::clouding::sshkey::SshKey;

/// Copy the displayed `flavor` into `flavor_id`, the field used on create.
pub fn derive_flavor_id(server: &mut Server) {
    server.flavor_id = server.flavor.clone();
}

/// Surface the first attached firewall as `firewall_id`; empty when the
/// server has no firewall.
pub fn surface_primary_firewall(server: &mut Server) {
    server.firewall_id = server
        .firewalls
        .first()
        .map(|firewall| firewall.id.clone())
        .unwrap_or_default();
}

/// The nested volume size is unreliable; the top-level `volumeSizeGb` wins.
pub fn pin_volume_size(server: &mut Server) {
    if let Some(volume) = server.volume.as_mut() {
        volume.ssd_gb = Some(server.volume_size_gb);
    }
}

/// Provider defect workaround: the volume source id in read responses does
/// not match the id supplied at creation, so the image id is used instead.
///
/// Applied whatever the volume `source` is. Whether this holds for volumes
/// restored from a backup or snapshot is unconfirmed.
pub fn substitute_volume_source_id(server: &mut Server) {
    if let Some(volume) = server.volume.as_mut() {
        volume.id = Some(server.image.id.clone());
    }
}

/// All read-side normalization steps, in order
pub fn normalize_server_read(server: &mut Server) {
    derive_flavor_id(server);
    surface_primary_firewall(server);
    pin_volume_size(server);
    substitute_volume_source_id(server);
}

/// Write the outcome of a create call back onto the submitted record.
///
/// Only the id, status and action are taken from the response, plus the
/// ssh key id and save-password flag from `requestedAccessConfiguration`
/// (the top-level access configuration is not populated on create).
pub fn backfill_created_server(held: &mut Server, created: Server) {
    held.id = created.id;
    held.status = created.status;
    held.action = created.action;

    if let Some(requested) = created.requested_access_configuration {
        let access = held
            .access_configuration
            .get_or_insert_with(AccessConfiguration::default);
        overwrite(&mut access.ssh_key_id, requested.ssh_key_id);
        overwrite(&mut access.save_password, requested.save_password);
    }
}

/// Merge `fetched` into `held`.
///
/// Server-authoritative fields are replaced. Create-only inputs (user data,
/// network flags, password, `shutDownSource`) keep the held value. Optional
/// sub-records are merged key by key when both sides have them, and only the
/// keys the response carries replace held values; a sub-record the response
/// omits is left as held and one only the response carries is adopted. The caller is expected to run
/// [`normalize_server_read`] afterwards.
pub fn merge_server(held: &mut Server, fetched: Server) {
    let access_configuration = merge_optional(
        held.access_configuration.take(),
        fetched.access_configuration,
        merge_access_configuration,
    );
    let volume = merge_optional(held.volume.take(), fetched.volume, merge_volume);
    let backup_preference = merge_optional(
        held.backup_preference.take(),
        fetched.backup_preference,
        merge_backup_preference,
    );
    let action = fetched.action.or_else(|| held.action.take());

    *held = Server {
        access_configuration,
        volume,
        backup_preference,
        action,
        user_data: std::mem::take(&mut held.user_data),
        enable_private_network: held.enable_private_network,
        enable_strict_anti_ddos_filtering: held.enable_strict_anti_ddos_filtering,
        flavor_id: std::mem::take(&mut held.flavor_id),
        firewall_id: std::mem::take(&mut held.firewall_id),
        ..fetched
    };
}

fn merge_optional<T>(held: Option<T>, fetched: Option<T>, merge: fn(&mut T, T)) -> Option<T> {
    match (held, fetched) {
        (Some(mut held), Some(fetched)) => {
            merge(&mut held, fetched);
            Some(held)
        }
        (held, None) => held,
        (None, fetched) => fetched,
    }
}

fn overwrite<T>(held: &mut Option<T>, fetched: Option<T>) {
    if fetched.is_some() {
        *held = fetched;
    }
}

/// The password is write-only and always keeps the held value.
pub fn merge_access_configuration(held: &mut AccessConfiguration, fetched: AccessConfiguration) {
    overwrite(&mut held.ssh_key_id, fetched.ssh_key_id);
    overwrite(&mut held.has_password, fetched.has_password);
    overwrite(&mut held.save_password, fetched.save_password);
}

/// `shutDownSource` is create-only and always keeps the held value.
pub fn merge_volume(held: &mut Volume, fetched: Volume) {
    overwrite(&mut held.id, fetched.id);
    overwrite(&mut held.source, fetched.source);
    overwrite(&mut held.ssd_gb, fetched.ssd_gb);
}

pub fn merge_backup_preference(held: &mut BackupPreference, fetched: BackupPreference) {
    overwrite(&mut held.slots, fetched.slots);
    overwrite(&mut held.frequency, fetched.frequency);
}

/// Generated private key material is only returned by the create call.
pub fn merge_ssh_key(held: &mut SshKey, fetched: SshKey) {
    let private_key = std::mem::take(&mut held.private_key);
    *held = fetched;
    if held.private_key.is_empty() {
        held.private_key = private_key;
    }
}
