//! Setting key registry.
//!
//! Settings are stored as opaque strings in the `settings` table. This
//! registry lists the keys the dispatcher understands, so management
//! commands can describe and validate them.

pub const DEFAULT_TIMEOUT: &str = "default_timeout";
pub const MAX_RETRIES: &str = "max_retries";
pub const RETRY_BACKOFF_MS: &str = "retry_backoff_ms";

/// Metadata for a single setting key.
#[derive(Debug, Clone)]
pub struct SettingKeyInfo {
    pub key: &'static str,
    pub description: &'static str,
    /// Smallest accepted value
    pub min: u64,
}

/// All known setting keys with their metadata.
pub fn known_keys() -> &'static [SettingKeyInfo] {
    &KNOWN_KEYS
}

/// Look up a setting key.
pub fn lookup_key(key: &str) -> Option<&'static SettingKeyInfo> {
    KNOWN_KEYS.iter().find(|k| k.key == key)
}

static KNOWN_KEYS: [SettingKeyInfo; 3] = [
    SettingKeyInfo {
        key: DEFAULT_TIMEOUT,
        description: "Per-attempt timeout in seconds",
        min: 1,
    },
    SettingKeyInfo {
        key: MAX_RETRIES,
        description: "Additional attempts after a timeout or transport failure",
        min: 0,
    },
    SettingKeyInfo {
        key: RETRY_BACKOFF_MS,
        description: "Base delay in milliseconds before a retry (doubles per retry)",
        min: 0,
    },
];

/// Parse a setting value as an unsigned integer no smaller than the key's minimum.
pub fn parse_numeric(info: &SettingKeyInfo, raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|v| *v >= info.min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_key() {
        let info = lookup_key(DEFAULT_TIMEOUT).unwrap();
        assert_eq!(info.min, 1);
        assert!(lookup_key("theme").is_none());
    }

    #[test]
    fn test_all_keys_unique() {
        let keys = known_keys();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn test_parse_numeric() {
        let timeout = lookup_key(DEFAULT_TIMEOUT).unwrap();
        assert_eq!(parse_numeric(timeout, " 15 "), Some(15));
        assert_eq!(parse_numeric(timeout, "0"), None);
        assert_eq!(parse_numeric(timeout, "-3"), None);
        assert_eq!(parse_numeric(timeout, "fast"), None);

        let retries = lookup_key(MAX_RETRIES).unwrap();
        assert_eq!(parse_numeric(retries, "0"), Some(0));
    }
}
