//! Allow-list re-emission of a parsed map for injection into a live page.
//!
//! Map files come from users, and raw SVG can carry scripts, event handlers and
//! external references. The preview keeps only drawing elements and paint/geometry
//! attributes, and tags every region with `data-region="<index>"`.

use crate::ingest::region_nodes;
use htmlize::{escape_attribute, escape_text};
use roxmltree::{Document, Node, NodeId};
use std::collections::HashMap;

pub const REGION_ATTR: &str = "data-region";
const SVG_NS: &str = "http://www.w3.org/2000/svg";

const ALLOWED_ELEMENTS: &[&str] = &[
    "svg", "g", "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "text",
    "tspan", "title", "desc", "defs", "linearGradient", "radialGradient", "stop", "clipPath",
    "mask", "pattern", "symbol", "use", "marker",
];

const TEXT_ELEMENTS: &[&str] = &["text", "tspan", "title", "desc"];

const ALLOWED_ATTRS: &[&str] = &[
    "id", "class", "style", "d", "transform", "viewBox", "width", "height", "x", "y", "x1",
    "y1", "x2", "y2", "cx", "cy", "r", "rx", "ry", "dx", "dy", "points", "fill", "fill-opacity",
    "fill-rule", "stroke", "stroke-width", "stroke-opacity", "stroke-linecap", "stroke-linejoin",
    "stroke-miterlimit", "stroke-dasharray", "stroke-dashoffset", "opacity", "visibility",
    "display", "clip-path", "clip-rule", "mask", "preserveAspectRatio", "version", "offset",
    "stop-color", "stop-opacity", "gradientUnits", "gradientTransform", "patternUnits",
    "patternTransform", "clipPathUnits", "maskUnits", "fx", "fy", "spreadMethod",
    "font-family", "font-size", "font-weight", "font-style", "text-anchor",
    "dominant-baseline", "vector-effect", "href", "markerWidth", "markerHeight", "refX",
    "refY", "orient", "marker-start", "marker-mid", "marker-end",
];

pub fn preview_markup(doc: &Document<'_>) -> String {
    let regions: HashMap<NodeId, usize> =
        region_nodes(doc).enumerate().map(|(i, n)| (n.id(), i)).collect();
    let mut out = String::new();
    emit(doc.root_element(), &regions, true, &mut out);
    out
}

fn emit(node: Node<'_, '_>, regions: &HashMap<NodeId, usize>, is_root: bool, out: &mut String) {
    let name = node.tag_name().name();
    if !ALLOWED_ELEMENTS.contains(&name) {
        tracing::debug!(element = name, "dropped from preview");
        return;
    }
    out.push('<');
    out.push_str(name);
    if is_root {
        out.push_str(" xmlns=\"");
        out.push_str(SVG_NS);
        out.push('"');
    }
    for attr in node.attributes() {
        let local = attr.name();
        let xlink_href = local == "href"
            && attr.namespace().is_some_and(|ns| ns.ends_with("/xlink"));
        if attr.namespace().is_some() && !xlink_href {
            continue;
        }
        let Some(value) = safe_attr_value(local, attr.value()) else {
            continue;
        };
        out.push(' ');
        out.push_str(local);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
    if let Some(index) = regions.get(&node.id()) {
        out.push_str(&format!(" {}=\"{}\"", REGION_ATTR, index));
    }
    let keeps_text = TEXT_ELEMENTS.contains(&name);
    let mut body = String::new();
    for child in node.children() {
        if child.is_element() {
            emit(child, regions, false, &mut body);
        } else if child.is_text() && keeps_text {
            body.push_str(&escape_text(child.text().unwrap_or_default()));
        }
    }
    if body.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        out.push_str(&body);
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

fn safe_attr_value<'v>(name: &str, value: &'v str) -> Option<std::borrow::Cow<'v, str>> {
    if !ALLOWED_ATTRS.contains(&name) {
        return None;
    }
    match name {
        "href" => value.trim_start().starts_with('#').then_some(value.into()),
        "style" => Some(filter_style(value).into()),
        _ if has_unsafe_reference(value) => None,
        _ => Some(value.into()),
    }
}

fn filter_style(style: &str) -> String {
    style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty() && !has_unsafe_reference(decl))
        .collect::<Vec<_>>()
        .join(";")
}

/// Anything that can reach outside the document or run code.
fn has_unsafe_reference(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    if lower.contains("javascript:") || lower.contains("expression(") || lower.contains("@import") {
        return true;
    }
    let mut rest = lower.as_str();
    while let Some(at) = rest.find("url(") {
        rest = &rest[at + 4..];
        let target = rest.trim_start().trim_start_matches(['"', '\'']);
        if !target.starts_with('#') {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse;

    fn preview(src: &str) -> String {
        preview_markup(&parse(src).unwrap())
    }

    #[test]
    fn strips_scripts_and_handlers() {
        let out = preview(
            r#"<svg xmlns="http://www.w3.org/2000/svg" onload="alert(1)"><script>alert(2)</script><path id="a" onclick="x()" d="M0 0"/><foreignObject><path id="hidden"/></foreignObject></svg>"#,
        );
        assert!(!out.contains("script"));
        assert!(!out.contains("onload"));
        assert!(!out.contains("onclick"));
        assert!(!out.contains("hidden"));
        assert!(out.contains(r#"<path id="a" d="M0 0" data-region="0"/>"#));
    }

    #[test]
    fn region_index_survives_dropped_subtrees() {
        let out = preview(
            r#"<svg><foreignObject><path id="x"/></foreignObject><path id="y"/></svg>"#,
        );
        assert!(out.contains(r#"<path id="y" data-region="1"/>"#));
    }

    #[test]
    fn external_references_are_removed() {
        let out = preview(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="http://evil/x.svg#a"/><use href="#a"/><path style="fill:url(http://evil/p);stroke:red" fill="url(#grad)"/></svg>"##,
        );
        assert!(!out.contains("evil"));
        assert!(out.contains(r##"<use href="#a"/>"##));
        assert!(out.contains(r#"style="stroke:red""#));
        assert!(out.contains(r##"fill="url(#grad)""##));
    }

    #[test]
    fn spoofed_region_markers_are_not_copied() {
        let out = preview(r#"<svg><rect data-region="7"/><path/></svg>"#);
        assert!(out.contains("<rect/>"));
        assert!(out.contains(r#"data-region="0""#));
    }

    #[test]
    fn text_content_is_escaped() {
        let out = preview("<svg><text>a &lt; b</text></svg>");
        assert!(out.contains("<text>a &lt; b</text>"));
    }
}
