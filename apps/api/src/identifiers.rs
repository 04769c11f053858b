//! Identifiers for generated resumes: name slugs and short codes.

use uuid::Uuid;

/// Fallback slug for names with no ASCII alphanumerics.
pub const FALLBACK_SLUG: &str = "resume";

const CODE_LEN: usize = 8;

/// Lowercases `name` and collapses every run of characters outside `[a-z0-9]`
/// into a single hyphen, with no hyphen at either end.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Short URL-safe code: the first eight hex digits of a random v4 UUID.
/// Uniqueness is probabilistic; storage is not consulted.
pub fn generate_code() -> String {
    let mut code = Uuid::new_v4().simple().to_string();
    code.truncate(CODE_LEN);
    code
}

/// Caller-supplied codes: 1-64 ASCII alphanumerics, `-` or `_`.
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 64
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Object name for a stored resume PDF.
pub fn blob_name(slug: &str, code: &str) -> String {
    format!("{slug}-{code}.pdf")
}
