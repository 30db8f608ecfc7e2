// src/utils/slug.rs

use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("static slug pattern"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("static slug pattern"));

/// Turns a display name into a URL-safe slug.
///
/// "Data Structures & Algorithms" becomes "data-structures-algorithms".
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    let joined = SEPARATORS.replace_all(stripped.trim(), "-");
    joined.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn collapses_symbols_and_spaces() {
        assert_eq!(slugify("Data Structures & Algorithms"), "data-structures-algorithms");
        assert_eq!(slugify("Database & SQL"), "database-sql");
        assert_eq!(slugify("  DevOps  -- Cloud "), "devops-cloud");
    }

    #[test]
    fn keeps_underscores_and_digits() {
        assert_eq!(slugify("C++ 101_basics"), "c-101_basics");
    }
}
