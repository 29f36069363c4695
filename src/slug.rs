//! Deterministic URL-safe slug derivation for community names.
//!
//! Accents are stripped via NFKD decomposition, everything outside
//! `[a-z0-9]` collapses to single hyphens. The same name always yields
//! the same slug; collisions between *different* names are resolved by
//! the caller with [`candidates`].

use unicode_normalization::UnicodeNormalization;

/// Derive the base slug for a name: "Povo X" → "povo-x",
/// "Amazônia" → "amazonia".
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_hyphen = true; // suppress leading hyphens

    for c in name.nfkd() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if c.is_alphanumeric() {
            // Non-ASCII letter with no decomposition (e.g. CJK): keep
            // lowercased rather than dropping the whole word.
            out.extend(c.to_lowercase());
            last_hyphen = false;
        } else if (c.is_whitespace() || c == '-' || c == '_' || c == '/') && !last_hyphen {
            out.push('-');
            last_hyphen = true;
        }
        // Combining marks and punctuation are dropped.
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Infinite candidate sequence for collision resolution: `base`,
/// `base-2`, `base-3`, …
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain((2u32..).map(move |n| format!("{base}-{n}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_is_deterministic() {
        assert_eq!(slugify("Povo X"), "povo-x");
        assert_eq!(slugify("Povo X"), "povo-x");
    }

    #[test]
    fn test_slugify_strips_accents() {
        assert_eq!(slugify("Amazônia"), "amazonia");
        assert_eq!(slugify("Guaraní"), "guarani");
        assert_eq!(slugify("São Gabriel da Cachoeira"), "sao-gabriel-da-cachoeira");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  Alto   Rio Negro "), "alto-rio-negro");
        assert_eq!(slugify("a_b/c-d"), "a-b-c-d");
        assert_eq!(slugify("Terra (Nova)!"), "terra-nova");
    }

    #[test]
    fn test_candidate_sequence_starts_at_two() {
        let seq: Vec<String> = candidates("guarani").take(3).collect();
        assert_eq!(seq, vec!["guarani", "guarani-2", "guarani-3"]);
    }
}
