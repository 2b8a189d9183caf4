//! CSS escape decoding.
//!
//! Security checks compare names and values after decoding, so that
//! `@\69mport` is treated as `@import` and `u\72l(` as `url(`.

use std::borrow::Cow;

/// Decode CSS backslash escapes.
///
/// - `\` followed by 1-6 hex digits (and one optional whitespace) is a code point
/// - `\` followed by a newline is removed
/// - `\` followed by any other character is that character
/// - a trailing `\` and invalid code points become U+FFFD
pub fn unescape(input: &str) -> Cow<'_, str> {
    if !input.contains('\\') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            None => out.push(char::REPLACEMENT_CHARACTER),
            Some('\n') => {
                chars.next();
            }
            Some(h) if h.is_ascii_hexdigit() => {
                let mut code = 0u32;
                let mut digits = 0;
                while digits < 6 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            code = code * 16 + d;
                            digits += 1;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if matches!(chars.peek(), Some(' ' | '\t' | '\n' | '\r' | '\x0C')) {
                    chars.next();
                }
                let decoded = match code {
                    0 => char::REPLACEMENT_CHARACTER,
                    _ => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
                };
                out.push(decoded);
            }
            Some(other) => {
                out.push(other);
                chars.next();
            }
        }
    }

    Cow::Owned(out)
}
