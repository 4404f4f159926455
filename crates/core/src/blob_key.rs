//! Object-storage key generation for uploaded images.

use rand::Rng;

use crate::types::{DbId, Timestamp};
use crate::upload::ImageKind;

/// Top-level prefix for every prediction image.
pub const KEY_PREFIX: &str = "predictions";

/// Build a fresh key for an uploaded image.
///
/// Format: `predictions/{user_id}/{YYYYMMDDTHHMMSS.mmmZ}-{16 hex}.{ext}`.
/// Keys for one user sort by upload time; the random suffix keeps
/// concurrent uploads in the same millisecond apart.
pub fn generate_blob_key(user_id: DbId, now: Timestamp, kind: ImageKind) -> String {
    let suffix: u64 = rand::rng().random();
    format!(
        "{KEY_PREFIX}/{user_id}/{}-{suffix:016x}.{}",
        now.format("%Y%m%dT%H%M%S%.3fZ"),
        kind.extension()
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn key_layout() {
        let now = chrono::Utc
            .with_ymd_and_hms(2024, 5, 17, 8, 30, 1)
            .unwrap();
        let key = generate_blob_key(42, now, ImageKind::Png);

        assert!(key.starts_with("predictions/42/20240517T083001.000Z-"), "{key}");
        assert!(key.ends_with(".png"));
        let suffix = key
            .rsplit_once('-')
            .map(|(_, s)| s.trim_end_matches(".png"))
            .unwrap();
        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn keys_do_not_collide() {
        let now = chrono::Utc::now();
        let a = generate_blob_key(1, now, ImageKind::Jpeg);
        let b = generate_blob_key(1, now, ImageKind::Jpeg);
        assert_ne!(a, b);
    }

    #[test]
    fn keys_sort_by_time() {
        let early = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert!(
            generate_blob_key(7, early, ImageKind::Jpeg) < generate_blob_key(7, late, ImageKind::Jpeg)
        );
    }
}
