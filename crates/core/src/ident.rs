//! Identifier validity and sanitization for the target language.

/// Reserved words that can never be used as a binding name.
pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Returns true if `name` is an ASCII identifier that is not a keyword.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_keyword(name)
}

/// Coerces arbitrary text into a valid identifier.
///
/// Whitespace runs become a single `_`, characters outside `[A-Za-z0-9_]` are dropped, an
/// empty or digit-leading result gets a `_` prefix and a keyword gets a `_` suffix.
///
/// ```
/// use murk_core::ident::sanitize;
///
/// assert_eq!(sanitize("user input"), "user_input");
/// assert_eq!(sanitize("2fa-token"), "_2fatoken");
/// assert_eq!(sanitize("class"), "class_");
/// ```
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if is_keyword(&out) {
        out.push('_');
    }
    out
}
