//! HTML sanitizer.
//!
//! Walks the token stream once and re-serializes only what the allow-list
//! admits. Text and attribute values are entity-decoded before they are
//! checked and re-encoded when they are written, so the output is canonical.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{trace, warn};

use super::allowlist;
use super::{is_external_resource, sanitize_css};
use crate::html::entities::{decode, encode_attribute, encode_text};
use crate::html::tokenizer::{tokenize_html, Attribute, HtmlToken, StartTag};

/// Everything from `url(` up to the first `)`.
static STYLE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)url\([^)]*\)").expect("style url pattern is valid"));

/// Sanitize untrusted markup.
///
/// Returns an empty string if `html` does not tokenize.
pub fn sanitize_html(html: &str) -> String {
    let tokens = match tokenize_html(html) {
        Ok(tokens) => tokens,
        Err(err) => {
            warn!(error = %err, "html failed to parse; sanitized output is empty");
            return String::new();
        }
    };

    let mut out = String::with_capacity(html.len());
    // Disallowed element being dropped with its content: (name, nesting depth).
    let mut skipping: Option<(&str, usize)> = None;
    // Open `<svg>` elements. Inside SVG the browser decodes entities in a
    // `<style>` body, so the raw text checked here is not what it parses.
    let mut svg_depth = 0usize;

    for token in tokens {
        if let Some((name, depth)) = skipping {
            let depth = match &token {
                HtmlToken::StartTag(tag) if !tag.self_closing && tag.name.eq_ignore_ascii_case(name) => {
                    depth + 1
                }
                HtmlToken::EndTag(end) if end.eq_ignore_ascii_case(name) => depth - 1,
                _ => depth,
            };
            skipping = (depth > 0).then_some((name, depth));
            continue;
        }

        match token {
            HtmlToken::Text(text) => out.push_str(&encode_text(&decode(text))),
            HtmlToken::StartTag(tag) => match allowlist::element(tag.name) {
                Some(name) => {
                    if name == "svg" && !tag.self_closing {
                        svg_depth += 1;
                    }
                    write_start_tag(&mut out, name, &tag);
                }
                None => {
                    trace!(element = tag.name, "html sanitizer removed element");
                    if allowlist::drops_content(tag.name) && !tag.self_closing {
                        skipping = Some((tag.name, 1));
                    }
                }
            },
            HtmlToken::EndTag(name) => {
                if name.eq_ignore_ascii_case("svg") {
                    svg_depth = svg_depth.saturating_sub(1);
                }
                if let Some(name) = allowlist::element(name).filter(|n| !allowlist::is_void(n)) {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
            HtmlToken::RawText { tag, .. } if svg_depth > 0 && tag.name.eq_ignore_ascii_case("style") => {
                trace!("html sanitizer removed style element inside svg");
            }
            HtmlToken::RawText { tag, body } => write_raw_text(&mut out, &tag, body),
        }
    }

    out
}

/// Write an allowed raw-text element. Only `style`, `textarea` and `title`
/// survive; every other raw-text element is dropped with its body.
fn write_raw_text(out: &mut String, tag: &StartTag<'_>, body: &str) {
    let Some(name) = allowlist::element(tag.name) else {
        trace!(element = tag.name, "html sanitizer removed element");
        return;
    };

    let content = if name == "style" {
        sanitize_css(body)
    } else {
        encode_text(&decode(body)).into_owned()
    };

    write_start_tag(out, name, &StartTag { self_closing: false, ..tag.clone() });
    out.push_str(&content);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn write_start_tag(out: &mut String, name: &str, tag: &StartTag<'_>) {
    out.push('<');
    out.push_str(name);

    let mut seen: Vec<String> = Vec::with_capacity(tag.attributes.len());
    for attribute in &tag.attributes {
        let Some((attr_name, value)) = clean_attribute(attribute) else {
            trace!(element = name, attribute = attribute.name, "html sanitizer removed attribute");
            continue;
        };
        // First occurrence wins, as in the browser.
        if seen.contains(&attr_name) {
            continue;
        }
        out.push(' ');
        out.push_str(&attr_name);
        if let Some(value) = value {
            out.push_str("=\"");
            out.push_str(&encode_attribute(&value));
            out.push('"');
        }
        seen.push(attr_name);
    }

    if tag.self_closing && !allowlist::is_void(name) {
        out.push_str("/>");
    } else {
        out.push('>');
    }
}

/// Canonical name and decoded value of an attribute that may be kept.
fn clean_attribute(attribute: &Attribute<'_>) -> Option<(String, Option<String>)> {
    let name = allowlist::attribute(attribute.name)?;
    let Some(raw) = attribute.value else {
        return Some((name, None));
    };

    let mut value = decode(raw).into_owned();
    if name == "style" {
        // Escapes could rebuild anything the patterns below look for.
        if value.contains('\\') {
            return None;
        }
        value = strip_urls(&value);
    }
    if is_external_resource(&value) {
        return None;
    }
    Some((name, Some(value)))
}

/// Remove `url(...)` references until none are left. One pass can join the
/// halves of a nested reference into a new one.
fn strip_urls(style: &str) -> String {
    let mut current = style.to_string();
    loop {
        let next = STYLE_URL.replace_all(&current, "");
        if next == current {
            return current;
        }
        current = next.into_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn img_loses_src_and_handler() {
        let out = sanitize_html(r#"<img src="x" onerror="alert(1)">"#);
        assert!(!out.contains("src"), "{out}");
        assert!(!out.contains("onerror"), "{out}");
        assert_eq!(out, "<img>");
    }

    #[test]
    fn script_is_removed_with_content() {
        assert_eq!(
            sanitize_html("<p>a</p><script>alert(1)</script><p>b</p>"),
            "<p>a</p><p>b</p>"
        );
    }

    #[test]
    fn unknown_elements_keep_their_content() {
        assert_eq!(sanitize_html("<blink>hi <b>there</b></blink>"), "hi <b>there</b>");
    }

    #[test]
    fn nested_drop_content_elements() {
        assert_eq!(
            sanitize_html("<template><template>x</template>y</template>z"),
            "z"
        );
    }

    #[test]
    fn links_lose_href() {
        assert_eq!(
            sanitize_html(r#"<a href="javascript:alert(1)" class="x">go</a>"#),
            r#"<a class="x">go</a>"#
        );
    }

    #[test]
    fn inline_style_urls_are_stripped() {
        assert_eq!(
            sanitize_html(r#"<div style="color:red;background:url(https://evil.example/x.png)">"#),
            r#"<div style="color:red;background:">"#
        );
    }

    #[test]
    fn nested_style_urls_are_stripped_to_a_fixed_point() {
        let out = sanitize_html(r#"<i style="background:uurl(x)rl(https://e.example/y)"></i>"#);
        assert!(!out.to_ascii_lowercase().contains("url("), "{out}");
    }

    #[test]
    fn inline_style_with_escapes_is_dropped() {
        assert_eq!(
            sanitize_html(r#"<i style="background:u\72l(https://e.example/y)">x</i>"#),
            "<i>x</i>"
        );
    }

    #[test]
    fn encoded_handlers_and_urls_are_checked_decoded() {
        assert_eq!(
            sanitize_html(r#"<rect fill="&#x75;rl(https://e.example/a)"/>"#),
            "<rect/>"
        );
    }

    #[test]
    fn svg_keeps_canonical_case() {
        assert_eq!(
            sanitize_html(r#"<svg viewbox="0 0 1 1"><lineargradient id="g"></lineargradient><circle r="1" fill="url(#g)"/></svg>"#),
            r#"<svg viewBox="0 0 1 1"><linearGradient id="g"></linearGradient><circle r="1" fill="url(#g)"/></svg>"#
        );
    }

    #[test]
    fn svg_use_and_foreign_object_are_removed() {
        assert_eq!(
            sanitize_html(r#"<svg><use xlink:href="https://e.example/s.svg#a"/><foreignObject><img src=x></foreignObject></svg>"#),
            "<svg></svg>"
        );
    }

    #[test]
    fn style_element_is_sanitized_as_css() {
        assert_eq!(
            sanitize_html("<style>@import 'https://e.example/x.css'; .a { color: red }</style>"),
            "<style>.a{color:red}</style>"
        );
    }

    #[test]
    fn style_element_loses_declarations_with_markup() {
        assert_eq!(
            sanitize_html(r#"<style>.a{content:"<img src=x onerror=alert(1)>";top:0}</style>ok"#),
            "<style>.a{top:0}</style>ok"
        );
    }

    #[test]
    fn style_inside_svg_is_removed() {
        assert_eq!(
            sanitize_html(
                "<svg><style>.a{background:url(&#47;&#47;evil.example/x.png)}</style><rect class=a /></svg>"
            ),
            r#"<svg><rect class="a"/></svg>"#
        );
        assert_eq!(
            sanitize_html("<SVG><g><style>.a{}</style></g></SVG><style>.b{top:0}</style>"),
            "<svg><g></g></svg><style>.b{top:0}</style>"
        );
    }

    #[test]
    fn text_is_re_encoded() {
        assert_eq!(sanitize_html("1 < 2 &amp; 3 > 2"), "1 &lt; 2 &amp; 3 &gt; 2");
    }

    #[test]
    fn duplicate_attributes_keep_first() {
        assert_eq!(sanitize_html(r#"<p class="a" CLASS="b">"#), r#"<p class="a">"#);
    }

    #[test]
    fn comments_are_removed() {
        assert_eq!(sanitize_html("a<!-- <script>x</script> -->b"), "ab");
    }

    #[test]
    fn parse_failure_is_fail_closed() {
        assert_eq!(sanitize_html(r#"<p>ok</p><div class="x"#), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in [
            r#"<img src="x" onerror="alert(1)">"#,
            r#"<div style="background:url(https://x)" title='a "quoted" &amp; b'>1 < 2</div>"#,
            "<svg><circle r=1 /></svg><textarea><b>&lt;</b></textarea>",
            "<style>.a { color: red } </style><br/><p/>",
            "<svg><style>.a{background:url(&#x2f;&#x2f;e.example/x)}</style></svg>",
            "<!doctype html><title>a &amp; b</title><blink>x",
            "",
        ] {
            let once = sanitize_html(input);
            assert_eq!(sanitize_html(&once), once, "input: {input}");
        }
    }
}
