//! UTF-8-safe string helpers used when building bounded synthesis signals.

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// Respects UTF-8 character boundaries and never panics, even with
/// multi-byte characters.
///
/// # Examples
/// ```
/// # use schemascrape::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("🎉🎊🎈", 2), "🎉🎊");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Collapse every run of whitespace into a single space and trim the ends.
///
/// ```
/// # use schemascrape::utils::string_utils::collapse_whitespace;
/// assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Collapse whitespace, then cap the result at `max_chars` characters.
pub fn bounded_text(s: &str, max_chars: usize) -> String {
    let collapsed = collapse_whitespace(s);
    safe_truncate_chars(&collapsed, max_chars).to_string()
}

/// Reduce a vocabulary term to its local name: `https://schema.org/Person`,
/// `schema:Person` and `Person` all become `Person`.
#[must_use]
pub fn local_type_name(raw: &str) -> &str {
    let raw = raw.trim();
    let after_colon = raw.rsplit(':').next().unwrap_or(raw);
    after_colon
        .rsplit(['/', '#'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(after_colon)
}
