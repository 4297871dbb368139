//! Wire encoding for the persisted stats blob.
//!
//! The blob is JSON, percent-encoded, then base64 — the layering the player
//! already uses for this store entry, kept so existing entries stay readable.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::stats::StatsData;

/// Characters `encodeURIComponent` leaves bare: ALPHA / DIGIT / `- _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid utf-8 in decoded blob: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid stats JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn encode(data: &StatsData) -> String {
    // StatsData serializes infallibly: plain fields, string keys.
    let json = serde_json::to_string(data).unwrap_or_default();
    let percent = utf8_percent_encode(&json, COMPONENT).to_string();
    STANDARD.encode(percent)
}

pub fn decode(encoded: &str) -> Result<StatsData, DecodeError> {
    let raw = STANDARD.decode(encoded.trim())?;
    let percent = std::str::from_utf8(&raw)?;
    let json = percent_decode_str(percent).decode_utf8()?;
    Ok(serde_json::from_str(&json)?)
}
