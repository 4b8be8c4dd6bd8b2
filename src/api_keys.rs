//! API keys issued from the dashboard.
//!
//! The plaintext is shown once at creation; the table only ever holds a
//! SHA-256 hash and a short prefix for display.

use crate::database::models::ApiKeyRecord;
use crate::database::Table;
use crate::error::SiteError;
use crate::postgrest::RestClient;
use chrono::Utc;
use rand::RngCore;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_PREFIX: &str = "sk_live";
const SECRET_BYTES: usize = 32;
const DISPLAY_PREFIX_LEN: usize = 12;

/// A freshly generated key. `plaintext` must not be stored.
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    pub plaintext: String,
    pub key_prefix: String,
    pub key_hash: String,
}

pub fn generate_api_key(prefix: &str) -> GeneratedKey {
    let mut secret = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut secret);

    let plaintext = format!("{}_{}", prefix, hex::encode(secret));
    GeneratedKey {
        key_prefix: plaintext.chars().take(DISPLAY_PREFIX_LEN).collect(),
        key_hash: hash_key(&plaintext),
        plaintext,
    }
}

pub fn hash_key(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a presented key against a stored record. Revoked keys never match.
pub fn verify_key(candidate: &str, record: &ApiKeyRecord) -> bool {
    record.is_active && hash_key(candidate) == record.key_hash
}

pub struct ApiKeyService<'a> {
    client: &'a RestClient,
}

impl<'a> ApiKeyService<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    /// Stores a new key and returns the record together with the one-time plaintext.
    pub async fn create(
        &self,
        name: &str,
        permissions: &[String],
    ) -> Result<(ApiKeyRecord, GeneratedKey), SiteError> {
        if name.trim().is_empty() {
            return Err(SiteError::ValidationError("API key name must not be empty".to_string()));
        }

        let key = generate_api_key(DEFAULT_PREFIX);
        let row = json!({
            "name": name.trim(),
            "key_prefix": key.key_prefix,
            "key_hash": key.key_hash,
            "permissions": permissions,
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
        });

        let created = self.client.from(Table::ApiKeys).insert(&row).await?;
        let record: ApiKeyRecord = created
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| SiteError::ValidationError("Insert into api_keys returned no row".to_string()))?;

        info!("Created API key {} ({}…)", record.name, record.key_prefix);
        Ok((record, key))
    }

    pub async fn list(&self) -> Result<Vec<ApiKeyRecord>, SiteError> {
        Ok(self
            .client
            .from(Table::ApiKeys)
            .select("*")
            .order("created_at", false)
            .fetch_as::<ApiKeyRecord>()
            .await?)
    }

    /// Marks a key inactive. Returns false when no key had that id.
    pub async fn revoke(&self, id: Uuid) -> Result<bool, SiteError> {
        let updated = self
            .client
            .from(Table::ApiKeys)
            .eq("id", id)
            .update(&json!({ "is_active": false }))
            .await?;
        Ok(!updated.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &GeneratedKey, active: bool) -> ApiKeyRecord {
        ApiKeyRecord {
            id: Uuid::new_v4(),
            name: "ci".to_string(),
            key_prefix: key.key_prefix.clone(),
            key_hash: key.key_hash.clone(),
            permissions: vec![],
            is_active: active,
            last_used_at: None,
            created_at: None,
        }
    }

    #[test]
    fn test_generated_key_shape() {
        let key = generate_api_key("sk_test");
        assert!(key.plaintext.starts_with("sk_test_"));
        assert_eq!(key.plaintext.len(), "sk_test_".len() + SECRET_BYTES * 2);
        assert_eq!(key.key_prefix.len(), DISPLAY_PREFIX_LEN);
        assert_eq!(key.key_hash.len(), 64);
        assert_ne!(key.key_hash, key.plaintext);
    }

    #[test]
    fn test_keys_are_unique() {
        assert_ne!(generate_api_key("k").plaintext, generate_api_key("k").plaintext);
    }

    #[test]
    fn test_verify() {
        let key = generate_api_key(DEFAULT_PREFIX);
        assert!(verify_key(&key.plaintext, &record(&key, true)));
        assert!(!verify_key("sk_live_wrong", &record(&key, true)));
        assert!(!verify_key(&key.plaintext, &record(&key, false)));
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            hash_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
