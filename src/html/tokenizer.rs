//! Hand-written HTML tokenizer.
//!
//! Splits markup into text, start tags (with attributes), end tags and
//! raw-text elements. Comments, doctypes and processing instructions are
//! consumed and dropped. Tokens borrow from the input.
//!
//! The scanner is strict where a browser would keep going: a tag, quoted
//! attribute or comment that never closes is an error, so callers can refuse
//! the whole input rather than guess.

/// Elements whose body is not markup. The tokenizer consumes the body and the
/// matching end tag as a single [`HtmlToken::RawText`].
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext", "textarea",
    "title",
];

/// Errors from HTML tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HtmlParseError {
    #[error("unterminated tag starting at byte {position}")]
    UnterminatedTag { position: usize },
    #[error("unterminated attribute value starting at byte {position}")]
    UnterminatedAttribute { position: usize },
    #[error("unterminated comment starting at byte {position}")]
    UnterminatedComment { position: usize },
}

/// A single attribute as written: `name`, `name=value`, `name="value"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    /// Raw value with quotes removed and entities still encoded.
    pub value: Option<&'a str>,
}

/// An opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag<'a> {
    pub name: &'a str,
    pub attributes: Vec<Attribute<'a>>,
    pub self_closing: bool,
}

/// One token of markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlToken<'a> {
    /// Character data with entities still encoded.
    Text(&'a str),
    StartTag(StartTag<'a>),
    EndTag(&'a str),
    /// A raw-text element: its start tag and unparsed body.
    RawText { tag: StartTag<'a>, body: &'a str },
}

/// Tokenize markup.
pub fn tokenize_html(input: &str) -> Result<Vec<HtmlToken<'_>>, HtmlParseError> {
    let mut scanner = Scanner { src: input, pos: 0 };
    let mut tokens = Vec::new();

    while scanner.pos < input.len() {
        let rest = &input[scanner.pos..];
        let Some(offset) = rest.find('<') else {
            tokens.push(HtmlToken::Text(rest));
            break;
        };
        if offset > 0 {
            tokens.push(HtmlToken::Text(&rest[..offset]));
        }
        scanner.pos += offset;
        if let Some(token) = scanner.markup()? {
            tokens.push(token);
        }
    }

    Ok(tokens)
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}

/// Scanner state. `pos` is always on a char boundary: it only moves past
/// ASCII delimiters or to offsets returned by `str::find`.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn byte(&self, at: usize) -> Option<u8> {
        self.src.as_bytes().get(at).copied()
    }

    fn skip_space(&mut self) {
        while self.byte(self.pos).is_some_and(is_space) {
            self.pos += 1;
        }
    }

    /// Advance while `keep` holds and return the consumed slice.
    fn take_while(&mut self, keep: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.byte(self.pos).is_some_and(&keep) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Consume through the next `>`, or fail.
    fn skip_past_gt(&mut self, start: usize) -> Result<(), HtmlParseError> {
        match self.src[self.pos..].find('>') {
            Some(i) => {
                self.pos += i + 1;
                Ok(())
            }
            None => Err(HtmlParseError::UnterminatedTag { position: start }),
        }
    }

    /// Scan whatever starts at the `<` under the cursor.
    fn markup(&mut self) -> Result<Option<HtmlToken<'a>>, HtmlParseError> {
        let start = self.pos;
        let rest = &self.src[start..];

        if rest.starts_with("<!--") {
            // `<!-->` and `<!--->` close immediately, as browsers do.
            return match self.src[start + 2..].find("-->") {
                Some(i) => {
                    self.pos = start + 2 + i + 3;
                    Ok(None)
                }
                None => Err(HtmlParseError::UnterminatedComment { position: start }),
            };
        }

        match self.byte(start + 1) {
            // Doctype, CDATA, processing instruction: bogus comment.
            Some(b'!' | b'?') => {
                self.pos = start + 2;
                self.skip_past_gt(start)?;
                Ok(None)
            }
            Some(b'/') => match self.byte(start + 2) {
                Some(b) if b.is_ascii_alphabetic() => {
                    self.pos = start + 2;
                    let name = self.take_while(|b| !is_space(b) && b != b'/' && b != b'>');
                    self.skip_past_gt(start)?;
                    Ok(Some(HtmlToken::EndTag(name)))
                }
                _ => {
                    self.pos = start + 2;
                    self.skip_past_gt(start)?;
                    Ok(None)
                }
            },
            Some(b) if b.is_ascii_alphabetic() => self.start_tag(start).map(Some),
            _ => {
                self.pos = start + 1;
                Ok(Some(HtmlToken::Text("<")))
            }
        }
    }

    fn start_tag(&mut self, start: usize) -> Result<HtmlToken<'a>, HtmlParseError> {
        self.pos = start + 1;
        let name = self.take_while(|b| !is_space(b) && b != b'/' && b != b'>');
        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_space();
            match self.byte(self.pos) {
                None => return Err(HtmlParseError::UnterminatedTag { position: start }),
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') if self.byte(self.pos + 1) == Some(b'>') => {
                    self.pos += 2;
                    self_closing = true;
                    break;
                }
                Some(b'/') => self.pos += 1,
                Some(_) => attributes.push(self.attribute()?),
            }
        }

        let tag = StartTag {
            name,
            attributes,
            self_closing,
        };

        // Raw-text elements ignore the self-closing flag, like browsers do
        // for HTML elements.
        if RAW_TEXT_ELEMENTS.iter().any(|e| e.eq_ignore_ascii_case(name)) {
            let body = self.raw_text_body(name);
            return Ok(HtmlToken::RawText { tag, body });
        }

        Ok(HtmlToken::StartTag(tag))
    }

    fn attribute(&mut self) -> Result<Attribute<'a>, HtmlParseError> {
        let name_start = self.pos;
        // A leading `=` is part of the name.
        if self.byte(self.pos) == Some(b'=') {
            self.pos += 1;
        }
        self.take_while(|b| !is_space(b) && b != b'/' && b != b'>' && b != b'=');
        let name = &self.src[name_start..self.pos];

        self.skip_space();
        if self.byte(self.pos) != Some(b'=') {
            return Ok(Attribute { name, value: None });
        }
        self.pos += 1;
        self.skip_space();

        let value = match self.byte(self.pos) {
            Some(quote @ (b'"' | b'\'')) => {
                let value_start = self.pos;
                let close = self.src[value_start + 1..]
                    .find(quote as char)
                    .ok_or(HtmlParseError::UnterminatedAttribute {
                        position: value_start,
                    })?;
                self.pos = value_start + 1 + close + 1;
                &self.src[value_start + 1..value_start + 1 + close]
            }
            _ => self.take_while(|b| !is_space(b) && b != b'>'),
        };

        Ok(Attribute {
            name,
            value: Some(value),
        })
    }

    /// Consume a raw-text body and its end tag. An element that is never
    /// closed runs to the end of the input.
    fn raw_text_body(&mut self, name: &str) -> &'a str {
        let body_start = self.pos;
        let bytes = self.src.as_bytes();
        let mut search = body_start;

        while let Some(i) = self.src[search..].find("</") {
            let tag_start = search + i;
            let name_end = tag_start + 2 + name.len();
            let matches_name = bytes
                .get(tag_start + 2..name_end)
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
            let terminated = match bytes.get(name_end) {
                None => true,
                Some(&b) => is_space(b) || b == b'/' || b == b'>',
            };
            if matches_name && terminated {
                self.pos = match self.src[name_end..].find('>') {
                    Some(gt) => name_end + gt + 1,
                    None => self.src.len(),
                };
                return &self.src[body_start..tag_start];
            }
            search = tag_start + 2;
        }

        self.pos = self.src.len();
        &self.src[body_start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(input: &str) -> Vec<HtmlToken<'_>> {
        tokenize_html(input).unwrap_or_else(|e| panic!("tokenize failed: {e}"))
    }

    fn start(name: &'static str, attributes: Vec<Attribute<'static>>, self_closing: bool) -> StartTag<'static> {
        StartTag {
            name,
            attributes,
            self_closing,
        }
    }

    fn attr(name: &'static str, value: Option<&'static str>) -> Attribute<'static> {
        Attribute { name, value }
    }

    #[test]
    fn text_and_elements() {
        assert_eq!(
            tokens("a<b>c</b>"),
            vec![
                HtmlToken::Text("a"),
                HtmlToken::StartTag(start("b", vec![], false)),
                HtmlToken::Text("c"),
                HtmlToken::EndTag("b"),
            ]
        );
    }

    #[test]
    fn attribute_forms() {
        assert_eq!(
            tokens(r#"<img src="x" alt='a b' hidden width=10 onerror=alert(1)>"#),
            vec![HtmlToken::StartTag(start(
                "img",
                vec![
                    attr("src", Some("x")),
                    attr("alt", Some("a b")),
                    attr("hidden", None),
                    attr("width", Some("10")),
                    attr("onerror", Some("alert(1)")),
                ],
                false
            ))]
        );
    }

    #[test]
    fn self_closing_svg_element() {
        assert_eq!(
            tokens(r#"<circle r="1"/>"#),
            vec![HtmlToken::StartTag(start("circle", vec![attr("r", Some("1"))], true))]
        );
    }

    #[test]
    fn raw_text_body_is_not_markup() {
        assert_eq!(
            tokens("<script>if (a<b) x('</p>')</SCRIPT >after"),
            vec![
                HtmlToken::RawText {
                    tag: start("script", vec![], false),
                    body: "if (a<b) x('</p>')",
                },
                HtmlToken::Text("after"),
            ]
        );
    }

    #[test]
    fn unclosed_raw_text_runs_to_end() {
        assert_eq!(
            tokens("<style>.a{}"),
            vec![HtmlToken::RawText {
                tag: start("style", vec![], false),
                body: ".a{}",
            }]
        );
    }

    #[test]
    fn comments_and_doctype_are_dropped() {
        assert_eq!(
            tokens("<!DOCTYPE html><!-- x --><!-->a<?php ?>"),
            vec![HtmlToken::Text("a")]
        );
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        assert_eq!(
            tokens("1 < 2"),
            vec![HtmlToken::Text("1 "), HtmlToken::Text("<"), HtmlToken::Text(" 2")]
        );
    }

    #[test]
    fn unterminated_constructs_are_errors() {
        assert_eq!(
            tokenize_html("<div class=\"a>"),
            Err(HtmlParseError::UnterminatedAttribute { position: 11 })
        );
        assert_eq!(
            tokenize_html("ok<div"),
            Err(HtmlParseError::UnterminatedTag { position: 2 })
        );
        assert_eq!(
            tokenize_html("<!-- x"),
            Err(HtmlParseError::UnterminatedComment { position: 0 })
        );
    }
}
