//! Session identifiers

use crate::error::{EquiclassError, Result};
use sha2::{Digest, Sha256};

const MAX_SESSION_ID_LEN: usize = 128;

/// Caller-supplied id when present and non-blank, otherwise a fresh one.
///
/// Supplied ids become a blob path segment, so they are limited to ASCII
/// alphanumerics, `-`, `_` and `.`, and may not be `.` or `..`.
pub fn resolve_session_id(requested: Option<String>) -> Result<String> {
    let id = match requested {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => return Ok(generate_session_id()),
    };

    let allowed = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !allowed || id == "." || id == ".." || id.len() > MAX_SESSION_ID_LEN {
        return Err(EquiclassError::InvalidInput(format!(
            "Session id '{}' must be at most {} characters of [A-Za-z0-9._-]",
            id, MAX_SESSION_ID_LEN
        )));
    }
    Ok(id)
}

/// Version-4-shaped UUID string hashed from time, pid and a process counter
pub fn generate_session_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    bytes[6] = (bytes[6] & 0x0F) | 0x40;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_supplied_id() {
        assert_eq!(resolve_session_id(Some(" abc-1.2_x ".into())).unwrap(), "abc-1.2_x");
    }

    #[test]
    fn test_blank_id_is_replaced() {
        let id = resolve_session_id(Some("   ".into())).unwrap();
        assert_eq!(id.len(), 36);
        assert_eq!(resolve_session_id(None).unwrap().len(), 36);
    }

    #[test]
    fn test_path_like_ids_are_rejected() {
        for bad in ["../x", "..", ".", "a/b", "a\\b", "s 1", "sess%2F"] {
            let result = resolve_session_id(Some(bad.into()));
            assert!(
                matches!(result, Err(EquiclassError::InvalidInput(_))),
                "{} accepted",
                bad
            );
        }
        let long = "a".repeat(MAX_SESSION_ID_LEN + 1);
        assert!(resolve_session_id(Some(long)).is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert_eq!(&a[14..15], "4");
        assert!(matches!(&a[19..20], "8" | "9" | "a" | "b"));
    }

    #[test]
    fn test_leading_group_varies() {
        let leading: std::collections::HashSet<String> =
            (0..16).map(|_| generate_session_id()[..8].to_string()).collect();
        assert!(leading.len() > 1);
    }
}
