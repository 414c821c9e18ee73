//! The session record shared between invocations and with remote stores.
//!
//! On disk and on the wire it is a JSON object with the fields `Name`,
//! `Data` (the wallet) and `Hash` (the passphrase hash).  Byte fields are
//! base64 strings.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, StashError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Vault name; the key under which the record is published.
    #[serde(rename = "Name")]
    pub name: String,

    /// The encrypted wallet.
    #[serde(
        rename = "Data",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub data: Vec<u8>,

    /// Passphrase hash set by the last `create`.
    #[serde(
        rename = "Hash",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub hash: Vec<u8>,
}

impl CacheRecord {
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| StashError::Encoding(format!("could not marshal record: {e}")))
    }

    pub fn from_json(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw)
            .map_err(|e| StashError::Encoding(format!("could not unmarshal record: {e}")))
    }
}

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_uses_wire_field_names() {
        let record = CacheRecord {
            name: "vault1".into(),
            data: vec![1, 2, 3],
            hash: b"$argon2id$".to_vec(),
        };
        let json: serde_json::Value =
            serde_json::from_slice(&record.to_json().unwrap()).unwrap();
        assert_eq!(json["Name"], "vault1");
        assert_eq!(json["Data"], "AQID");
        assert_eq!(json["Hash"], "JGFyZ29uMmlkJA==");
        assert_eq!(CacheRecord::from_json(&record.to_json().unwrap()).unwrap(), record);
    }

    #[test]
    fn missing_field_is_encoding_error() {
        let err = CacheRecord::from_json(br#"{"Name":"v","Data":""}"#).unwrap_err();
        assert!(matches!(err, StashError::Encoding(_)));
    }

    #[test]
    fn bad_base64_is_encoding_error() {
        let err =
            CacheRecord::from_json(br#"{"Name":"v","Data":"!!","Hash":""}"#).unwrap_err();
        assert!(matches!(err, StashError::Encoding(_)));
    }
}
