//! Masking of secret-looking values before they leave the engine.

use std::collections::BTreeMap;

/// Replacement for values too short to partially reveal.
pub const REDACTED: &str = "****";

/// Marker placed between the revealed prefix and suffix.
pub const MASK: &str = "****";

const SENSITIVE_KEY_PARTS: &[&str] = &[
    "key",
    "token",
    "secret",
    "password",
    "credential",
    "auth",
    "bearer",
    "api_key",
    "apikey",
];

/// Mask a value, keeping the first and last four characters when it is long
/// enough to do so without revealing most of it.
///
/// Re-redacting a redacted value returns it unchanged.
pub fn redact(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return REDACTED.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{MASK}{tail}")
}

/// Whether a key name looks like it carries a secret (case-insensitive
/// substring match).
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_PARTS.iter().any(|part| lower.contains(part))
}

/// Redact the values of sensitive keys, passing the rest through.
pub fn redact_map(map: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    map.iter()
        .map(|(key, value)| {
            let shown = if is_sensitive_key(key) {
                redact(value)
            } else {
                value.clone()
            };
            (key.clone(), shown)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_values_fully_redacted() {
        assert_eq!(redact(""), REDACTED);
        assert_eq!(redact("abc"), REDACTED);
        assert_eq!(redact("12345678"), REDACTED);
    }

    #[test]
    fn test_long_values_keep_head_and_tail() {
        assert_eq!(redact("123456789"), "1234****6789");
        assert_eq!(redact("sk-live-abcdefghijkl"), "sk-l****ijkl");
    }

    #[test]
    fn test_redaction_is_idempotent() {
        for value in ["", "short", "sk-live-abcdefghijkl", "ghp_0123456789abcdef"] {
            let once = redact(value);
            assert_eq!(redact(&once), once, "value {value:?}");
        }
    }

    #[test]
    fn test_multibyte_values_do_not_panic() {
        assert_eq!(redact("ééééééééé"), "éééé****éééé");
    }

    #[test]
    fn test_sensitive_key_detection() {
        for key in [
            "API_KEY",
            "GITHUB_TOKEN",
            "client_secret",
            "DB_PASSWORD",
            "Authorization",
            "X-Auth-Token",
            "AWS_CREDENTIALS_FILE",
            "apikey",
            "monkey",
        ] {
            assert!(is_sensitive_key(key), "{key} should be sensitive");
        }
        for key in ["PATH", "NODE_ENV", "Content-Type", "DEBUG"] {
            assert!(!is_sensitive_key(key), "{key} should pass through");
        }
    }

    #[test]
    fn test_redact_map_only_touches_sensitive_keys() {
        let mut env = BTreeMap::new();
        env.insert("GITHUB_TOKEN".to_string(), "ghp_abcdefghijklmnop".to_string());
        env.insert("LOG_LEVEL".to_string(), "debug".to_string());

        let redacted = redact_map(&env);
        assert_eq!(redacted["GITHUB_TOKEN"], "ghp_****mnop");
        assert_eq!(redacted["LOG_LEVEL"], "debug");
    }
}
