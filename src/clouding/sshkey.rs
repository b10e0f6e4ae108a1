//! SSH key pairs

use super::client::{decode_body, encode_body, resource_path, CloudingClient};
use super::error::Result;
use super::nullable;
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub const SSHKEY_PATH: &str = "keypairs";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshKey {
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
    pub fingerprint: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub public_key: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub private_key: String,
    #[serde(
        default,
        deserialize_with = "nullable::or_default",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub has_private_key: bool,
}

impl CloudingClient {
    pub async fn get_ssh_key(&self, id: &str) -> Result<SshKey> {
        self.fetch("getting sshkey", "sshkey", &resource_path(SSHKEY_PATH, id))
            .await
    }

    /// Create a key pair; the response (id, fingerprint, generated key material)
    /// replaces `key`.
    pub async fn create_ssh_key(&self, key: &mut SshKey) -> Result<()> {
        let body = encode_body("sshkey", key)?;
        let response = self
            .exchange("creating sshkey", Method::POST, SSHKEY_PATH, Some(body), &[201])
            .await?;
        *key = decode_body("sshkey", &response)?;
        tracing::info!("created ssh key {} ({})", key.id, key.name);
        Ok(())
    }

    pub async fn delete_ssh_key(&self, id: &str) -> Result<()> {
        self.exchange(
            "deleting sshkey",
            Method::DELETE,
            &resource_path(SSHKEY_PATH, id),
            None,
            &[204],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clouding::mock::ScriptedTransport;
    use serde_json::json;

    #[tokio::test]
    async fn create_ssh_key_sends_only_populated_fields() {
        let transport = ScriptedTransport::new();
        transport.respond_json(
            201,
            json!({
                "id": "Dd8v0nXJ1924rayY",
                "name": "laptop",
                "fingerprint": "c6:09:56:cb:bc:76:0d:75:7d:8b:1c:07:3a:1d:5e:25",
                "publicKey": "ssh-ed25519 AAAA laptop",
                "hasPrivateKey": false
            }),
        );
        let mut key = SshKey {
            name: "laptop".to_string(),
            public_key: "ssh-ed25519 AAAA laptop".to_string(),
            ..Default::default()
        };

        transport.client().create_ssh_key(&mut key).await.unwrap();

        assert_eq!(key.id, "Dd8v0nXJ1924rayY");
        assert!(key.fingerprint.starts_with("c6:09"));
        let sent = transport.requests()[0].body.clone().unwrap();
        assert_eq!(
            sent,
            json!({"name": "laptop", "publicKey": "ssh-ed25519 AAAA laptop"})
        );
    }

    #[tokio::test]
    async fn delete_ssh_key_expects_no_content() {
        let transport = ScriptedTransport::new();
        transport.respond(204, "");

        transport.client().delete_ssh_key("Dd8v0nXJ1924rayY").await.unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.path, "keypairs/Dd8v0nXJ1924rayY");
    }

    #[tokio::test]
    async fn create_ssh_key_conflict() {
        let transport = ScriptedTransport::new();
        transport.respond_json(
            409,
            json!({"type": "about:blank", "title": "Key pair already exists", "status": 409}),
        );
        let mut key = SshKey {
            name: "laptop".to_string(),
            ..Default::default()
        };

        let err = transport.client().create_ssh_key(&mut key).await.unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert!(err.to_string().contains("Key pair already exists"));
        assert!(key.id.is_empty());
    }
}
