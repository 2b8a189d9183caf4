//! Reference rewriting: substitute every original property name across the
//! CSS rule tree and the HTML markup.
//!
//! Both rewriters are driven by one [`SubstitutionMap`] computed before any
//! text changes, and both match whole names only: `--a` never matches inside
//! `--ab`, and a substitute is never matched again once written.
//!
//! A name is a maximal run of identifier characters. The markup rewriter
//! applies that rule to the whole text; the CSS rewriter applies it inside
//! strings, `url(...)` and hashes, and compares identifier tokens as a whole.

use std::collections::HashMap;

use crate::css::model::Stylesheet;
use crate::css::tokenizer::{tokenize_spanned, Token};
use crate::property::PropertyDefinition;

/// Errors from building a [`SubstitutionMap`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("{definitions} definitions but {substitutes} substitutes")]
    LengthMismatch { definitions: usize, substitutes: usize },
    #[error("substitute `{substitute}` is assigned to both `{first}` and `{second}`")]
    DuplicateSubstitute {
        substitute: String,
        first: String,
        second: String,
    },
    #[error("substitute `{substitute}` is also an original property name")]
    SubstituteShadowsOriginal { substitute: String },
}

/// Ordered (original, substitute) pairs; a bijection between the distinct
/// original names and their substitutes.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionMap {
    pairs: Vec<(String, String)>,
    /// Original name -> index in `pairs`. Later pairs win.
    index: HashMap<String, usize>,
}

impl SubstitutionMap {
    /// Build a map from ordered pairs.
    ///
    /// A repeated original name is allowed; the later pair wins when
    /// rewriting. Two different originals sharing a substitute, or a
    /// substitute equal to any original, is rejected.
    pub fn new(pairs: Vec<(String, String)>) -> Result<Self, MappingError> {
        let mut index = HashMap::with_capacity(pairs.len());
        let mut owners: HashMap<&str, &str> = HashMap::with_capacity(pairs.len());

        for (i, (original, substitute)) in pairs.iter().enumerate() {
            if let Some(&owner) = owners.get(substitute.as_str()) {
                if owner != original {
                    return Err(MappingError::DuplicateSubstitute {
                        substitute: substitute.clone(),
                        first: owner.to_string(),
                        second: original.clone(),
                    });
                }
            }
            owners.insert(substitute, original);
            index.insert(original.clone(), i);
        }

        if let Some((_, substitute)) = pairs.iter().find(|(_, s)| index.contains_key(s)) {
            return Err(MappingError::SubstituteShadowsOriginal {
                substitute: substitute.clone(),
            });
        }

        Ok(Self { pairs, index })
    }

    /// Pair each definition's name with the substitute at the same position.
    pub fn from_definitions(
        definitions: &[PropertyDefinition],
        substitutes: &[String],
    ) -> Result<Self, MappingError> {
        if definitions.len() != substitutes.len() {
            return Err(MappingError::LengthMismatch {
                definitions: definitions.len(),
                substitutes: substitutes.len(),
            });
        }
        Self::new(
            definitions
                .iter()
                .zip(substitutes)
                .map(|(d, s)| (d.name.clone(), s.clone()))
                .collect(),
        )
    }

    /// The substitute for `original`, if it is mapped.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.index.get(original).map(|&i| self.pairs[i].1.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CSS
// ---------------------------------------------------------------------------

/// Replace mapped names in a CSS fragment. Returns `None` when nothing
/// changed (or the fragment does not lex).
fn rewrite_tokens(text: &str, map: &SubstitutionMap) -> Option<String> {
    let lexemes = tokenize_spanned(text).ok()?;
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut changed = false;

    for lexeme in lexemes {
        let source = lexeme.text(text);
        let replacement = match lexeme.token {
            Token::CustomIdent | Token::Ident => map.get(source).map(str::to_string),
            Token::StringLiteral | Token::StringLiteralSingle | Token::Url | Token::Hash => {
                replace_name_runs(source, map)
            }
            _ => None,
        };
        if let Some(replacement) = replacement {
            out.push_str(&text[last..lexeme.start]);
            out.push_str(&replacement);
            last = lexeme.end;
            changed = true;
        }
    }

    if !changed {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// Rewrite every reference in the rule tree, then drop the `@property` blocks.
///
/// Covers declaration names (`--a: 1`), declaration values (`var(--a)`,
/// `"--a"`), selectors (`[data-k="--a"]`) and at-rule preludes
/// (`@supports (--a: 1)`).
pub fn rewrite_stylesheet(sheet: &mut Stylesheet, map: &SubstitutionMap) {
    if !map.is_empty() {
        sheet.walk_rules_mut(&mut |rule| {
            if let Some(selector) = rewrite_tokens(&rule.selector, map) {
                rule.selector = selector;
            }
        });
        sheet.walk_declarations_mut(&mut |decl| {
            if let Some(substitute) = map.get(&decl.property) {
                decl.property = substitute.to_string();
            }
            if let Some(value) = rewrite_tokens(&decl.value, map) {
                decl.value = value;
            }
        });
        sheet.walk_at_rules_mut(&mut |at| {
            if let Some(params) = rewrite_tokens(&at.params, map) {
                at.params = params;
            }
        });
    }
    sheet.remove_at_rules("property");
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

/// Characters that continue a CSS identifier.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Replace every maximal identifier run in `html` that equals a mapped name.
///
/// This covers inline `style` attributes and any other literal occurrence
/// in the markup, in a single pass.
pub fn rewrite_markup(html: &str, map: &SubstitutionMap) -> String {
    if map.is_empty() {
        return html.to_string();
    }
    replace_name_runs(html, map).unwrap_or_else(|| html.to_string())
}

/// Replace every maximal identifier run in `text` that equals a mapped name.
/// Returns `None` when nothing matched.
fn replace_name_runs(text: &str, map: &SubstitutionMap) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if !is_name_char(c) {
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(i, next)) = chars.peek() {
            if !is_name_char(next) {
                break;
            }
            end = i + next.len_utf8();
            chars.next();
        }
        if let Some(substitute) = map.get(&text[start..end]) {
            out.push_str(&text[last..start]);
            out.push_str(substitute);
            last = end;
        }
    }

    if last == 0 {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// Apply `map` to both texts: returns the serialized stylesheet (with the
/// `@property` blocks removed) and the rewritten markup.
pub fn rewrite(sheet: &mut Stylesheet, html: &str, map: &SubstitutionMap) -> (String, String) {
    rewrite_stylesheet(sheet, map);
    (sheet.to_string(), rewrite_markup(html, map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parser::parse_css;
    use pretty_assertions::assert_eq;

    fn map(pairs: &[(&str, &str)]) -> SubstitutionMap {
        SubstitutionMap::new(
            pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        )
        .unwrap()
    }

    fn rewrite_css(css: &str, m: &SubstitutionMap) -> String {
        let mut sheet = parse_css(css).unwrap();
        rewrite_stylesheet(&mut sheet, m);
        sheet.to_string()
    }

    // ── Mapping ──────────────────────────────────────────────────────

    #[test]
    fn mapping_rejects_shared_substitute() {
        let err = SubstitutionMap::new(vec![
            ("--a".into(), "--x".into()),
            ("--b".into(), "--x".into()),
        ])
        .unwrap_err();
        assert!(matches!(err, MappingError::DuplicateSubstitute { .. }));
    }

    #[test]
    fn mapping_rejects_substitute_equal_to_original() {
        let err = SubstitutionMap::new(vec![
            ("--a".into(), "--b".into()),
            ("--b".into(), "--c".into()),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            MappingError::SubstituteShadowsOriginal {
                substitute: "--b".into()
            }
        );
    }

    #[test]
    fn mapping_later_duplicate_original_wins() {
        let m = map(&[("--a", "--x"), ("--a", "--y")]);
        assert_eq!(m.get("--a"), Some("--y"));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn mapping_length_mismatch() {
        let err = SubstitutionMap::from_definitions(&[PropertyDefinition::new("--a")], &[]).unwrap_err();
        assert!(matches!(err, MappingError::LengthMismatch { definitions: 1, substitutes: 0 }));
    }

    // ── CSS ──────────────────────────────────────────────────────────

    #[test]
    fn css_rewrites_declarations_and_references() {
        let m = map(&[("--a", "--x1")]);
        let out = rewrite_css(
            r#"@property --a { syntax: "<angle>"; initial-value: 0deg } .a { --a: 10deg; transform: rotate(var(--a)); }"#,
            &m,
        );
        assert_eq!(out, ".a{--x1:10deg;transform:rotate(var(--x1))}");
    }

    #[test]
    fn css_prefix_names_do_not_collide() {
        let m = map(&[("--a", "--x1"), ("--ab", "--x2")]);
        let out = rewrite_css(".a { color: var(--ab, var(--a)); --ab: 1; --a: 2 }", &m);
        assert_eq!(out, ".a{color:var(--x2, var(--x1));--x2:1;--x1:2}");
    }

    #[test]
    fn css_rewrites_names_inside_strings_only_as_whole_names() {
        let m = map(&[("--a", "--x1")]);
        let out = rewrite_css(r#".a { content: "--a"; quotes: '--a--abc' "x--a"; --abc: 1; }"#, &m);
        assert_eq!(out, r#".a{content:"--x1";quotes:'--a--abc' "x--a";--abc:1}"#);
    }

    #[test]
    fn css_rewrites_urls_and_hashes() {
        let m = map(&[("--a", "--x1")]);
        let out = rewrite_css(".a { mask: url(#--a); fill: url(--a.svg#--a) }", &m);
        assert_eq!(out, ".a{mask:url(#--x1);fill:url(--x1.svg#--x1)}");
    }

    #[test]
    fn css_rewrites_selectors() {
        let m = map(&[("--a", "--x1")]);
        let out = rewrite_css(r#".y[data-k="--a"] { top: 0 } @media print { .--a, .--ab { top: 1px } }"#, &m);
        assert_eq!(
            out,
            ".y[data-k=\"--x1\"]{top:0}\n@media print{.--x1, .--ab{top:1px}}"
        );
    }

    #[test]
    fn css_rewrites_at_rule_preludes() {
        let m = map(&[("--a", "--x1")]);
        let out = rewrite_css("@supports (--a: 1) { .a { top: 0 } }", &m);
        assert_eq!(out, "@supports (--x1: 1){.a{top:0}}");
    }

    #[test]
    fn css_removes_property_blocks_even_without_mapping() {
        let out = rewrite_css("@property --a {} .a{top:0}", &SubstitutionMap::default());
        assert_eq!(out, ".a{top:0}");
    }

    // ── HTML ─────────────────────────────────────────────────────────

    #[test]
    fn markup_rewrites_inline_styles() {
        let m = map(&[("--a", "--x1")]);
        assert_eq!(
            rewrite_markup(r#"<div style="background:var(--a)"></div>"#, &m),
            r#"<div style="background:var(--x1)"></div>"#
        );
    }

    #[test]
    fn markup_prefix_names_do_not_collide() {
        let m = map(&[("--a", "--x1"), ("--ab", "--x2")]);
        assert_eq!(
            rewrite_markup(r#"<p style="--ab:1;color:var(--a)">--ab --a --abc</p>"#, &m),
            r#"<p style="--x2:1;color:var(--x1)">--x2 --x1 --abc</p>"#
        );
    }

    #[test]
    fn markup_substitutes_are_not_rewritten_again() {
        let m = map(&[("--a", "--a-x"), ("--b", "--b-x")]);
        assert_eq!(rewrite_markup("--a --b --a-x", &m), "--a-x --b-x --a-x");
    }

    #[test]
    fn markup_handles_non_ascii_text() {
        let m = map(&[("--a", "--x1")]);
        assert_eq!(rewrite_markup("héllo --a ✓", &m), "héllo --x1 ✓");
    }

    #[test]
    fn rewrite_returns_both_texts() {
        let m = map(&[("--a", "--x1")]);
        let mut sheet = parse_css("@property --a {} .a{top:var(--a)}").unwrap();
        let (css, html) = rewrite(&mut sheet, "<i style='top:var(--a)'></i>", &m);
        assert_eq!(css, ".a{top:var(--x1)}");
        assert_eq!(html, "<i style='top:var(--x1)'></i>");
    }
}
