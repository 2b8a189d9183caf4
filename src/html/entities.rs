//! Character reference decoding and encoding.
//!
//! Attribute values and text are decoded before any security check, so that
//! `&#58;` or `&colon;` cannot hide a `:` from a pattern. Output is always
//! re-encoded.

use std::borrow::Cow;

/// Named references recognised by [`decode`]. Anything else is left as text.
const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("colon", ':'),
    ("sol", '/'),
    ("bsol", '\\'),
    ("lpar", '('),
    ("rpar", ')'),
    ("period", '.'),
    ("comma", ','),
    ("semi", ';'),
    ("equals", '='),
    ("num", '#'),
    ("tab", '\t'),
    ("newline", '\n'),
    ("copy", '\u{a9}'),
    ("reg", '\u{ae}'),
    ("hellip", '\u{2026}'),
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
];

/// Decode character references. Numeric references may omit the trailing
/// `;`; named ones may not. Out-of-range code points become U+FFFD.
pub fn decode(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match reference(rest) {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Parse the reference at the start of `s` (which begins with `&`).
/// Returns the character and the number of bytes consumed.
fn reference(s: &str) -> Option<(char, usize)> {
    let body = &s[1..];

    if let Some(numeric) = body.strip_prefix('#') {
        let (radix, digits_at) = match numeric.as_bytes().first() {
            Some(b'x' | b'X') => (16, 2),
            _ => (10, 1),
        };
        let digits: &str = {
            let tail = &body[digits_at..];
            let len = tail.bytes().take_while(|b| (*b as char).is_digit(radix)).count();
            &tail[..len]
        };
        if digits.is_empty() {
            return None;
        }
        let mut consumed = 1 + digits_at + digits.len();
        if body[digits_at + digits.len()..].starts_with(';') {
            consumed += 1;
        }
        let c = u32::from_str_radix(digits, radix)
            .ok()
            .and_then(char::from_u32)
            .filter(|&c| c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        return Some((c, consumed));
    }

    let semi = body.find(';')?;
    let name = &body[..semi];
    NAMED
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, c)| (c, 1 + semi + 1))
}

/// Encode text content: `&`, `<` and `>`.
pub fn encode_text(input: &str) -> Cow<'_, str> {
    encode(input, false)
}

/// Encode a double-quoted attribute value: text escapes plus `"`.
pub fn encode_attribute(input: &str) -> Cow<'_, str> {
    encode(input, true)
}

fn encode(input: &str, quote: bool) -> Cow<'_, str> {
    let needs = |c: char| matches!(c, '&' | '<' | '>') || (quote && c == '"');
    if !input.chars().any(needs) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
