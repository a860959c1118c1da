//! Environment variable helpers for runtime configuration.

use std::str::FromStr;
use std::time::Duration;

/// Parse `key` as `T`, falling back to `default` when unset or invalid.
#[inline]
pub fn env_get<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// "1", "true", "yes", "on" (any case) are true; "0", "false", "no",
/// "off" are false; anything else, or unset, yields `default`.
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Milliseconds from `key`.
pub fn env_get_ms(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_returns_default() {
        let v: usize = env_get("__IOCOMP_TEST_UNSET__", 7);
        assert_eq!(v, 7);
        assert!(env_get_bool("__IOCOMP_TEST_UNSET__", true));
        assert_eq!(
            env_get_ms("__IOCOMP_TEST_UNSET__", Duration::from_millis(5)),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn test_parse_values() {
        std::env::set_var("__IOCOMP_TEST_NUM__", " 256 ");
        let v: u32 = env_get("__IOCOMP_TEST_NUM__", 0);
        assert_eq!(v, 256);
        assert_eq!(
            env_get_ms("__IOCOMP_TEST_NUM__", Duration::ZERO),
            Duration::from_millis(256)
        );
        std::env::remove_var("__IOCOMP_TEST_NUM__");
    }

    #[test]
    fn test_bool_variants() {
        std::env::set_var("__IOCOMP_TEST_BOOL__", "ON");
        assert!(env_get_bool("__IOCOMP_TEST_BOOL__", false));
        std::env::set_var("__IOCOMP_TEST_BOOL__", "no");
        assert!(!env_get_bool("__IOCOMP_TEST_BOOL__", true));
        std::env::set_var("__IOCOMP_TEST_BOOL__", "maybe");
        assert!(env_get_bool("__IOCOMP_TEST_BOOL__", true));
        std::env::remove_var("__IOCOMP_TEST_BOOL__");
    }

    #[test]
    fn test_invalid_falls_back() {
        std::env::set_var("__IOCOMP_TEST_BAD__", "lots");
        let v: usize = env_get("__IOCOMP_TEST_BAD__", 3);
        assert_eq!(v, 3);
        std::env::remove_var("__IOCOMP_TEST_BAD__");
    }
}
