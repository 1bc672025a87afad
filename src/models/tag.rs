//! Player and clan tags.

use std::sync::OnceLock;

use regex::Regex;

/// Canonicalize a player or clan tag: trim, upper-case, add the leading `#`.
///
/// Returns `None` for strings that cannot be a game tag.
pub fn normalize_tag(raw: &str) -> Option<String> {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = TAG_RE.get_or_init(|| {
        Regex::new(r"^#[0289PYLQGRJCUV]{3,15}$").expect("tag pattern is valid")
    });

    let trimmed = raw.trim().to_uppercase();
    let tag = if trimmed.starts_with('#') {
        trimmed
    } else {
        format!("#{}", trimmed)
    };

    re.is_match(&tag).then_some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keeps_valid_tag() {
        assert_eq!(normalize_tag("#9CQ2U8QJ"), Some("#9CQ2U8QJ".to_string()));
    }

    #[test]
    fn test_normalize_adds_hash_and_uppercases() {
        assert_eq!(normalize_tag(" 9cq2u8qj "), Some("#9CQ2U8QJ".to_string()));
    }

    #[test]
    fn test_normalize_rejects_foreign_characters() {
        assert_eq!(normalize_tag("#ABCDEF"), None);
        assert_eq!(normalize_tag(""), None);
        assert_eq!(normalize_tag("#"), None);
    }
}
