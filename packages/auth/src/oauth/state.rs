// ABOUTME: CSRF state nonce generation and cache key namespacing

/// Namespace prefix for pending-state cache keys
pub const STATE_KEY_NAMESPACE: &str = "randStateForAuthToMemcacheKey";

const STATE_LENGTH: usize = 32;

/// Generate an unguessable state nonce for one login attempt
pub fn generate_state() -> String {
    format!("st{}", nanoid::nanoid!(STATE_LENGTH))
}

/// Cache key under which a pending state is stored
pub fn state_cache_key(state: &str) -> String {
    format!("{}-_-{}", STATE_KEY_NAMESPACE, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_state_unique() {
        let a = generate_state();
        let b = generate_state();
        assert_ne!(a, b);
        assert!(a.starts_with("st"));
        assert_eq!(a.len(), STATE_LENGTH + 2);
    }

    #[test]
    fn test_generate_state_is_url_safe() {
        let state = generate_state();
        assert!(state
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn test_state_cache_key() {
        assert_eq!(
            state_cache_key("st123"),
            "randStateForAuthToMemcacheKey-_-st123"
        );
    }
}
