//! Error message sanitization to avoid leaking request headers or bodies in logs.

/// Strip details from an upstream error message that shouldn't reach logs unredacted.
#[must_use]
pub fn sanitize_api_error(message: &str) -> String {
    let lower = message.to_lowercase();
    if lower.contains("x-api-key") || lower.contains("api_key") || lower.contains("authentication") {
        return "authentication error (check ANTHROPIC_API_KEY)".to_string();
    }
    if lower.contains("overloaded") || lower.contains("rate_limit") || lower.contains("too many requests") {
        return "rate limit or overload error from upstream provider".to_string();
    }
    message.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_auth_errors() {
        let sanitized = sanitize_api_error("Invalid x-api-key header");
        assert!(!sanitized.contains("x-api-key"));
        assert!(sanitized.contains("authentication"));
    }

    #[test]
    fn redacts_overload_errors() {
        let sanitized = sanitize_api_error("overloaded: too many requests");
        assert!(sanitized.contains("rate limit"));
    }

    #[test]
    fn passes_through_other_errors() {
        assert_eq!(sanitize_api_error("model not found"), "model not found");
    }
}
