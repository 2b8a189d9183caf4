//! Element and attribute allow-lists for the HTML sanitizer.
//!
//! The profile is structural and presentational HTML plus SVG shapes,
//! gradients and filter primitives. SVG names keep their canonical mixed case.
//! Nothing here can navigate, load a resource, or run script once `href`,
//! `src` and event handlers are gone.

/// HTML elements, lower case.
const HTML_ELEMENTS: &[&str] = &[
    "a", "abbr", "acronym", "address", "article", "aside", "b", "bdi", "bdo", "big", "blockquote",
    "br", "caption", "center", "cite", "code", "col", "colgroup", "dd", "del", "details", "dfn",
    "div", "dl", "dt", "em", "fieldset", "figcaption", "figure", "font", "footer", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hgroup", "hr", "i", "img", "ins", "kbd", "label", "legend", "li",
    "main", "mark", "nav", "ol", "p", "pre", "q", "rp", "rt", "ruby", "s", "samp", "section",
    "small", "span", "strike", "strong", "style", "sub", "summary", "sup", "table", "tbody", "td",
    "textarea", "tfoot", "th", "thead", "time", "title", "tr", "tt", "u", "ul", "var", "wbr",
];

/// SVG elements and filter primitives, canonical case.
const SVG_ELEMENTS: &[&str] = &[
    "svg", "g", "defs", "desc", "symbol", "circle", "ellipse", "line", "path", "polygon", "polyline",
    "rect", "text", "tspan", "textPath", "marker", "mask", "pattern", "clipPath", "linearGradient",
    "radialGradient", "stop", "filter", "feBlend", "feColorMatrix", "feComponentTransfer",
    "feComposite", "feConvolveMatrix", "feDiffuseLighting", "feDisplacementMap", "feDistantLight",
    "feDropShadow", "feFlood", "feFuncA", "feFuncB", "feFuncG", "feFuncR", "feGaussianBlur",
    "feMerge", "feMergeNode", "feMorphology", "feOffset", "fePointLight", "feSpecularLighting",
    "feSpotLight", "feTile", "feTurbulence",
];

/// Elements whose content is dropped along with them when they are not
/// allowed. Lower case.
const DROP_CONTENT: &[&str] = &[
    "script", "iframe", "object", "applet", "frameset", "noscript", "noembed", "noframes",
    "template", "xmp", "plaintext", "math", "foreignobject", "annotation-xml", "audio", "video",
    "head",
];

/// Elements that never take content or an end tag.
const VOID_ELEMENTS: &[&str] = &["br", "col", "hr", "img", "wbr"];

/// Attributes, canonical case. `data-*` and `aria-*` are allowed separately.
const ATTRIBUTES: &[&str] = &[
    // HTML
    "abbr", "align", "alt", "bgcolor", "border", "cellpadding", "cellspacing", "class", "color",
    "cols", "colspan", "datetime", "dir", "disabled", "face", "headers", "height", "hidden", "id",
    "lang", "nowrap", "open", "placeholder", "readonly", "reversed", "role", "rows", "rowspan",
    "scope", "size", "span", "start", "style", "summary", "tabindex", "title", "translate",
    "valign", "width", "wrap",
    // SVG presentation and geometry
    "baseFrequency", "clip-path", "clip-rule", "clipPathUnits", "cx", "cy", "d", "display",
    "dominant-baseline", "dx", "dy", "fill", "fill-opacity", "fill-rule", "filter", "filterUnits",
    "flood-color", "flood-opacity", "font-family", "font-size", "font-style", "font-weight", "fx",
    "fy", "gradientTransform", "gradientUnits", "in", "in2", "k1", "k2", "k3", "k4",
    "lengthAdjust", "marker-end", "marker-mid", "marker-start", "markerHeight", "markerUnits",
    "markerWidth", "mask", "maskContentUnits", "maskUnits", "mode", "numOctaves", "offset",
    "opacity", "operator", "orient", "overflow", "pathLength", "patternContentUnits",
    "patternTransform", "patternUnits", "points", "preserveAspectRatio", "primitiveUnits", "r",
    "radius", "refX", "refY", "result", "rx", "ry", "scale", "seed", "spreadMethod",
    "startOffset", "stdDeviation", "stop-color", "stop-opacity", "stroke", "stroke-dasharray",
    "stroke-dashoffset", "stroke-linecap", "stroke-linejoin", "stroke-miterlimit",
    "stroke-opacity", "stroke-width", "text-anchor", "textLength", "transform", "type", "values",
    "version", "viewBox", "visibility", "x", "x1", "x2", "xChannelSelector", "xmlns", "y", "y1",
    "y2", "yChannelSelector",
];

fn lookup(list: &'static [&'static str], name: &str) -> Option<&'static str> {
    list.iter().copied().find(|candidate| candidate.eq_ignore_ascii_case(name))
}

/// Canonical spelling of an allowed element, or `None` if it is not allowed.
pub(super) fn element(name: &str) -> Option<&'static str> {
    lookup(HTML_ELEMENTS, name).or_else(|| lookup(SVG_ELEMENTS, name))
}

/// Canonical spelling of an allowed attribute, or `None`.
///
/// `href`, `src`, `xlink:href` and every `on*` handler are never allowed.
pub(super) fn attribute(name: &str) -> Option<String> {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("on") || matches!(lower.as_str(), "href" | "src" | "xlink:href") {
        return None;
    }
    if let Some(canonical) = lookup(ATTRIBUTES, name) {
        return Some(canonical.to_string());
    }
    let is_data = lower.len() > 5 && lower.starts_with("data-");
    let is_aria = lower.len() > 5 && lower.starts_with("aria-");
    let well_formed = lower
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.');
    ((is_data || is_aria) && well_formed).then_some(lower)
}

/// Whether a disallowed element takes its content with it.
pub(super) fn drops_content(name: &str) -> bool {
    lookup(DROP_CONTENT, name).is_some()
}

pub(super) fn is_void(name: &str) -> bool {
    lookup(VOID_ELEMENTS, name).is_some()
}
