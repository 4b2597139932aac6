use std::sync::OnceLock;

fn parse_env_u8(name: &str, default: u8) -> u8 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

static PARALLEL_MASKS: OnceLock<bool> = OnceLock::new();

/// Score mask candidates on the rayon pool (`QR_PARALLEL_MASKS`, default on).
pub(crate) fn parallel_masks() -> bool {
    *PARALLEL_MASKS.get_or_init(|| parse_env_bool_u8("QR_PARALLEL_MASKS", true))
}

static PARALLEL_MIN_VERSION: OnceLock<u8> = OnceLock::new();

/// Smallest version scored in parallel (`QR_PARALLEL_MIN_VERSION`, default 7).
pub(crate) fn parallel_min_version() -> u8 {
    *PARALLEL_MIN_VERSION
        .get_or_init(|| parse_env_u8("QR_PARALLEL_MIN_VERSION", 7).clamp(1, 40))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_defaults() {
        assert_eq!(parse_env_u8("QR_TEST_UNSET_KNOB", 9), 9);
        assert!(parse_env_bool_u8("QR_TEST_UNSET_KNOB", true));
        assert!(!parse_env_bool_u8("QR_TEST_UNSET_KNOB", false));
    }

    #[test]
    fn test_min_version_in_range() {
        let v = parallel_min_version();
        assert!((1..=40).contains(&v));
    }
}
