//! Object key derivation for stored videos.
//!
//! Key format: `{prefix}{random}.mp4` where the prefix encodes the aspect classification
//! and `random` is 32 bytes from the thread-local CSPRNG, URL-safe base64 without padding.
//! No collision check is made; uniqueness rests on the 256 bits of entropy.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use tubely_core::constants::{OBJECT_KEY_RANDOM_BYTES, VIDEO_KEY_EXTENSION};
use tubely_core::AspectClassification;

/// Key prefix for a classification (always ends with `/`).
pub fn key_prefix(classification: AspectClassification) -> &'static str {
    match classification {
        AspectClassification::Landscape16x9 => "landscape/",
        AspectClassification::Portrait9x16 => "portrait/",
        AspectClassification::Other => "other/",
    }
}

fn random_suffix() -> String {
    let mut bytes = [0u8; OBJECT_KEY_RANDOM_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Derive a fresh storage key for a video with the given classification.
pub fn derive_video_key(classification: AspectClassification) -> String {
    format!(
        "{}{}{}",
        key_prefix(classification),
        random_suffix(),
        VIDEO_KEY_EXTENSION
    )
}
