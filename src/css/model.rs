//! CSS rule tree: Stylesheet, Node, Rule, AtRule, Declaration.
//!
//! The tree is mutable in place: callers walk at-rules or declarations and
//! edit or remove them, then serialize the tree back to text with
//! [`Display`](std::fmt::Display). Serialization is compact and canonical, so
//! parsing the output and serializing again yields the same text.

use std::fmt;

use crate::css::escape::unescape;

/// A single CSS declaration, e.g. `color: red` or `--a: 10deg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The property name, e.g. `"color"`, `"--a"`.
    pub property: String,
    /// The value text with whitespace runs collapsed and comments removed.
    pub value: String,
    /// Whether `!important` was specified.
    pub important: bool,
}

impl Declaration {
    /// Create a new declaration.
    pub fn new(property: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important,
        }
    }

    /// Returns `true` if the property name, escape-decoded, equals `name`
    /// ignoring ASCII case.
    pub fn is_property(&self, name: &str) -> bool {
        unescape(&self.property).eq_ignore_ascii_case(name)
    }
}

/// A qualified rule: a selector prelude followed by a `{ ... }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
}

/// An at-rule such as `@import url(x.css);` or `@property --a { ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    /// Name without the `@`, as written (escapes included).
    pub name: String,
    /// Prelude text between the name and the block or `;`.
    pub params: String,
    /// Block contents; `None` for statement at-rules like `@import`.
    pub nodes: Option<Vec<Node>>,
}

impl AtRule {
    /// Returns `true` if this at-rule's name, escape-decoded, equals `name`
    /// ignoring ASCII case.
    pub fn is_named(&self, name: &str) -> bool {
        unescape(&self.name).eq_ignore_ascii_case(name)
    }
}

/// One entry of a node list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Declaration(Declaration),
}

impl Node {
    /// Statement nodes are terminated by `;` rather than a block.
    fn is_statement(&self) -> bool {
        match self {
            Node::Declaration(_) => true,
            Node::AtRule(at) => at.nodes.is_none(),
            Node::Rule(_) => false,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Rule(rule) => Some(&mut rule.nodes),
            Node::AtRule(at) => at.nodes.as_mut(),
            Node::Declaration(_) => None,
        }
    }
}

/// A parsed CSS stylesheet: the root node list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
}

impl Stylesheet {
    /// Create an empty stylesheet.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Visit every at-rule named `name` in source order, at any depth.
    pub fn walk_at_rules<'a>(&'a self, name: &str, f: &mut impl FnMut(&'a AtRule)) {
        fn walk<'a>(nodes: &'a [Node], name: &str, f: &mut impl FnMut(&'a AtRule)) {
            for node in nodes {
                match node {
                    Node::AtRule(at) => {
                        if at.is_named(name) {
                            f(at);
                        }
                        if let Some(children) = &at.nodes {
                            walk(children, name, f);
                        }
                    }
                    Node::Rule(rule) => walk(&rule.nodes, name, f),
                    Node::Declaration(_) => {}
                }
            }
        }
        walk(&self.nodes, name, f);
    }

    /// Visit every at-rule mutably, at any depth.
    pub fn walk_at_rules_mut(&mut self, f: &mut impl FnMut(&mut AtRule)) {
        fn walk(nodes: &mut [Node], f: &mut impl FnMut(&mut AtRule)) {
            for node in nodes {
                if let Node::AtRule(at) = node {
                    f(at);
                }
                if let Some(children) = node.children_mut() {
                    walk(children, f);
                }
            }
        }
        walk(&mut self.nodes, f);
    }

    /// Remove every at-rule named `name`, at any depth. Returns how many were removed.
    pub fn remove_at_rules(&mut self, name: &str) -> usize {
        fn remove(nodes: &mut Vec<Node>, name: &str) -> usize {
            let before = nodes.len();
            nodes.retain(|node| !matches!(node, Node::AtRule(at) if at.is_named(name)));
            let mut removed = before - nodes.len();
            for node in nodes.iter_mut() {
                if let Some(children) = node.children_mut() {
                    removed += remove(children, name);
                }
            }
            removed
        }
        remove(&mut self.nodes, name)
    }

    /// Visit every qualified rule mutably, at any depth.
    pub fn walk_rules_mut(&mut self, f: &mut impl FnMut(&mut Rule)) {
        fn walk(nodes: &mut [Node], f: &mut impl FnMut(&mut Rule)) {
            for node in nodes {
                if let Node::Rule(rule) = node {
                    f(rule);
                }
                if let Some(children) = node.children_mut() {
                    walk(children, f);
                }
            }
        }
        walk(&mut self.nodes, f);
    }

    /// Keep only the nodes for which `keep` returns `true`, at any depth.
    /// A removed node takes its children with it. Returns how many nodes
    /// were removed, not counting their children.
    pub fn retain_nodes(&mut self, keep: &mut impl FnMut(&Node) -> bool) -> usize {
        fn retain(nodes: &mut Vec<Node>, keep: &mut impl FnMut(&Node) -> bool) -> usize {
            let before = nodes.len();
            nodes.retain(|node| keep(node));
            let mut removed = before - nodes.len();
            for node in nodes.iter_mut() {
                if let Some(children) = node.children_mut() {
                    removed += retain(children, keep);
                }
            }
            removed
        }
        retain(&mut self.nodes, keep)
    }

    /// Visit every declaration mutably, at any depth.
    pub fn walk_declarations_mut(&mut self, f: &mut impl FnMut(&mut Declaration)) {
        fn walk(nodes: &mut [Node], f: &mut impl FnMut(&mut Declaration)) {
            for node in nodes {
                match node {
                    Node::Declaration(decl) => f(decl),
                    other => {
                        if let Some(children) = other.children_mut() {
                            walk(children, f);
                        }
                    }
                }
            }
        }
        walk(&mut self.nodes, f);
    }

    /// Keep only the declarations for which `keep` returns `true`, at any
    /// depth. Returns how many were removed.
    pub fn retain_declarations(&mut self, keep: &mut impl FnMut(&Declaration) -> bool) -> usize {
        fn retain(nodes: &mut Vec<Node>, keep: &mut impl FnMut(&Declaration) -> bool) -> usize {
            let before = nodes.len();
            nodes.retain(|node| match node {
                Node::Declaration(decl) => keep(decl),
                _ => true,
            });
            let mut removed = before - nodes.len();
            for node in nodes.iter_mut() {
                if let Some(children) = node.children_mut() {
                    removed += retain(children, keep);
                }
            }
            removed
        }
        retain(&mut self.nodes, keep)
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[Node], separator: &str) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            if nodes[i - 1].is_statement() {
                f.write_str(";")?;
            }
            f.write_str(separator)?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.property, self.value)?;
        if self.important {
            f.write_str(" !important")?;
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.selector)?;
        write_nodes(f, &self.nodes, "")?;
        f.write_str("}")
    }
}

impl fmt::Display for AtRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.params.is_empty() {
            write!(f, " {}", self.params)?;
        }
        if let Some(children) = &self.nodes {
            f.write_str("{")?;
            write_nodes(f, children, "")?;
            f.write_str("}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Rule(rule) => rule.fmt(f),
            Node::AtRule(at) => at.fmt(f),
            Node::Declaration(decl) => decl.fmt(f),
        }
    }
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.nodes, "\n")
    }
}
