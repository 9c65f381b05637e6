//! Candidate-name sanitisation (§3).
//!
//! Grounded on `internal/usecase/resolve/sanitizer.go`: lower-case, strip a leading
//! `*.`, then reject to empty if any character outside `[a-z0-9.-]` remains.

/// Sanitise a single candidate name. Idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let stripped = lower.strip_prefix("*.").unwrap_or(&lower);

    if stripped
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        stripped.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_cases_and_trims_wildcard_prefix() {
        assert_eq!(sanitize("*.Example.COM"), "example.com");
    }

    #[test]
    fn rejects_to_empty_on_invalid_characters() {
        assert_eq!(sanitize("exa mple.com"), "");
        assert_eq!(sanitize("exa_mple.com"), "");
    }

    #[test]
    fn passes_through_valid_names() {
        assert_eq!(sanitize("www.example.com"), "www.example.com");
    }

    #[test]
    fn is_idempotent() {
        for input in ["*.Example.COM", "exa_mple.com", "www.example.com", ""] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
        }
    }
}
