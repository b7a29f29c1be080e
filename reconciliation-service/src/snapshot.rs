use serde_json::Value;
use session_energy::{domain::Instructor, instructors_from_value, SnapshotError};

/// blake3 digest of a snapshot's JSON, hex encoded. Equal fingerprints mean
/// the store delivered the same subtree again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotFingerprint(String);

impl SnapshotFingerprint {
    pub fn of(value: &Value) -> Self {
        let mut hasher = blake3::Hasher::new();
        // Serializing a `Value` cannot fail.
        let bytes = serde_json::to_vec(value).unwrap_or_default();
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A fully materialized `Instructors` subtree as delivered by the store.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub fingerprint: SnapshotFingerprint,
    pub instructors: Vec<Instructor>,
}

impl StoreSnapshot {
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        let fingerprint = SnapshotFingerprint::of(&value);
        let instructors = instructors_from_value(value)?;
        Ok(Self {
            fingerprint,
            instructors,
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_subtrees_share_a_fingerprint() {
        let a = StoreSnapshot::from_value(json!({ "t1": { "Profile": { "fullName": "Ana" } } })).unwrap();
        let b = StoreSnapshot::from_slice(br#"{"t1":{"Profile":{"fullName":"Ana"}}}"#).unwrap();
        let c = StoreSnapshot::from_value(json!({ "t1": { "Profile": { "fullName": "Ben" } } })).unwrap();

        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, c.fingerprint);
        assert_eq!(a.fingerprint.as_str().len(), 64);
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(StoreSnapshot::from_slice(b"[]").is_err());
        assert!(StoreSnapshot::from_slice(b"not json").is_err());
    }
}
