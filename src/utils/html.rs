// src/utils/html.rs

/// Cleans player-authored markup (profile bios) before it is stored.
///
/// Whitelist-based: safe formatting tags (like <b>, <p>) survive while
/// <script>, <iframe> and event-handler attributes are stripped.
/// Plain text passes through unchanged apart from HTML entity escaping of
/// stray `<`/`>`.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Cleans an optional field, keeping `None` as `None`.
pub fn clean_optional(input: Option<String>) -> Option<String> {
    input.map(|text| clean_html(&text))
}
