//! String utilities
//!
//! Helpers for keeping provider error bodies and secrets out of logs in
//! readable form.

/// Safely truncate a string at a character boundary
///
/// # Example
/// ```
/// use llm_gateway::utils::truncate_str;
///
/// assert_eq!(truncate_str("Hello, World!", 5), "Hello");
/// assert_eq!(truncate_str("Hi", 5), "Hi");
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a response body for diagnostics, collapsing whitespace runs
/// so multi-line JSON errors stay on one log line.
pub fn summarize_body(body: &str, max_chars: usize) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        format!("{}...", truncate_str(&collapsed, max_chars))
    }
}

/// Mask a secret for display, keeping only the last four characters.
///
/// # Example
/// ```
/// use llm_gateway::utils::mask_secret;
///
/// assert_eq!(mask_secret("gsk_abcdefghijkl"), "****ijkl");
/// assert_eq!(mask_secret("abc"), "****");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}
