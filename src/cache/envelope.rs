//! Stored envelope codec
//!
//! The cache file holds a small JSON wrapper around the document:
//!
//! ```json
//! { "compressed": true, "data": "<base64 gzip of the document>", "updated_at": "2026-10-19T08:00:00.000Z" }
//! ```
//!
//! Files written before compression was introduced hold the document itself;
//! those are still readable but never written.

use std::io::{Read, Write};

use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::CodecError;
use super::CacheDocument;

/// On-disk representation of the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEnvelope {
    pub compressed: bool,
    /// Base64 of the gzip stream of the JSON document
    pub data: String,
    /// RFC 3339 timestamp of the write
    pub updated_at: String,
}

impl StoredEnvelope {
    /// File body as committed to the repository
    pub fn to_file_bytes(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec_pretty(self).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

/// A document read back from the cache file
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub document: CacheDocument,
    /// None when the file carries no usable timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

/// Encode a document stamped with the current time
pub fn encode(document: &CacheDocument) -> Result<StoredEnvelope, CodecError> {
    encode_at(document, Utc::now())
}

/// Encode a document stamped with `timestamp`
///
/// Output is deterministic: keys serialize in sorted order and the gzip
/// header carries no modification time.
pub fn encode_at(
    document: &CacheDocument,
    timestamp: DateTime<Utc>,
) -> Result<StoredEnvelope, CodecError> {
    let json = serde_json::to_vec(document).map_err(|e| CodecError::Encode(e.to_string()))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| CodecError::Encode(format!("gzip write failed: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| CodecError::Encode(format!("gzip finish failed: {}", e)))?;

    Ok(StoredEnvelope {
        compressed: true,
        data: base64::engine::general_purpose::STANDARD.encode(compressed),
        updated_at: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Decode the raw bytes of the cache file
pub fn decode(bytes: &[u8]) -> Result<Decoded, CodecError> {
    let raw: Value = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::Corrupt(format!("file is not JSON: {}", e)))?;
    let Value::Object(stored) = raw else {
        return Err(CodecError::Corrupt("file is not a JSON object".into()));
    };

    let updated_at = stored
        .get("updated_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    let is_compressed = stored.get("compressed").and_then(Value::as_bool) == Some(true);
    if !is_compressed {
        // Envelope bookkeeping is not part of the document
        let mut document = stored;
        document.remove("updated_at");
        document.remove("compressed");
        return Ok(Decoded {
            document,
            updated_at,
        });
    }

    let data = stored
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::Corrupt("compressed envelope has no data".into()))?;
    let document = decompress_document(data)?;

    Ok(Decoded {
        document,
        updated_at,
    })
}

fn decompress_document(data: &str) -> Result<CacheDocument, CodecError> {
    let compressed = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| CodecError::Corrupt(format!("data is not base64: {}", e)))?;

    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .map_err(|e| CodecError::Corrupt(format!("gzip read failed: {}", e)))?;

    match serde_json::from_slice(&json) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(CodecError::Corrupt("payload is not a JSON object".into())),
        Err(e) => Err(CodecError::Corrupt(format!("payload is not JSON: {}", e))),
    }
}
