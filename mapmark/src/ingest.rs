//! Turns raw map files into an addressable list of regions.
//!
//! A region is every `path` element of the document, in document order. The
//! pristine text is kept verbatim next to the regions: exports always re-parse
//! it instead of reusing anything derived for display.

use crate::config::EditorConfig;
use crate::error::{IngestError, Result};
use crate::limits;
use crate::model::{IncomingFile, PaintStyle, Region};
use crate::sanitize;
use roxmltree::{Document, Node, ParsingOptions};

pub const SVG_MIME: &str = "image/svg+xml";

/// A successfully parsed map.
#[derive(Clone, Debug)]
pub struct MapDocument {
    pub source: String,
    pub regions: Vec<Region>,
    /// Allow-listed markup safe to inject into a page.
    pub preview: String,
}

pub fn accepts(file: &IncomingFile, config: &EditorConfig) -> bool {
    let mime = file.mime.trim();
    if mime.eq_ignore_ascii_case(SVG_MIME) {
        return true;
    }
    mime.is_empty()
        && config.accept_svg_extension
        && file
            .name
            .as_deref()
            .is_some_and(|n| n.to_ascii_lowercase().ends_with(".svg"))
}

pub fn ingest(file: IncomingFile, config: &EditorConfig) -> Result<MapDocument> {
    if !accepts(&file, config) {
        return Err(IngestError::InvalidFileType { mime: file.mime });
    }
    if !limits::within_size(file.bytes.len()) {
        return Err(IngestError::TooLarge { len: file.bytes.len(), max: limits::MAX_SVG_BYTES });
    }
    let mut text = String::from_utf8(file.bytes)?;
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }
    ingest_text(text)
}

pub fn ingest_text(source: String) -> Result<MapDocument> {
    if !limits::within_size(source.len()) {
        return Err(IngestError::TooLarge { len: source.len(), max: limits::MAX_SVG_BYTES });
    }
    let (regions, preview) = {
        let doc = parse(&source)?;
        let regions = extract_regions(&doc);
        if !limits::within_region_cap(regions.len()) {
            return Err(IngestError::TooManyRegions { count: regions.len(), max: limits::MAX_REGIONS });
        }
        (regions, sanitize::preview_markup(&doc))
    };
    tracing::info!(regions = regions.len(), bytes = source.len(), "parsed map");
    Ok(MapDocument { source, regions, preview })
}

pub(crate) fn parse(text: &str) -> std::result::Result<Document<'_>, roxmltree::Error> {
    let mut opt = ParsingOptions::default();
    opt.allow_dtd = true;
    opt.nodes_limit = limits::MAX_XML_NODES;
    Document::parse_with_options(text, opt)
}

pub(crate) fn is_region(node: &Node<'_, '_>) -> bool {
    node.is_element() && node.tag_name().name() == "path"
}

pub(crate) fn region_nodes<'a, 'input>(
    doc: &'a Document<'input>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    doc.descendants().filter(|n| is_region(n))
}

/// The plain `id` attribute; namespaced look-alikes do not count.
pub(crate) fn id_attribute<'a, 'input>(node: &Node<'a, 'input>) -> Option<roxmltree::Attribute<'a, 'input>> {
    node.attributes().find(|a| a.name() == "id" && a.namespace().is_none())
}

fn extract_regions(doc: &Document<'_>) -> Vec<Region> {
    region_nodes(doc)
        .enumerate()
        .map(|(index, node)| {
            let id = id_attribute(&node).map(|a| a.value().to_string()).unwrap_or_default();
            let style = node.attribute("style").map(PaintStyle::from_inline).unwrap_or_default();
            tracing::debug!(index, id = %id, fill = ?style.fill, "region");
            Region::new(index, id, style)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg_file(body: &str) -> IncomingFile {
        IncomingFile::new(Some("m.svg".into()), SVG_MIME, body.as_bytes().to_vec())
    }

    #[test]
    fn extracts_paths_in_document_order() {
        let doc = ingest(
            svg_file(r#"<svg xmlns="http://www.w3.org/2000/svg"><g><path id="a" style="fill:#111"/></g><rect/><path/><path id="c"/></svg>"#),
            &EditorConfig::default(),
        )
        .unwrap();
        let ids: Vec<_> = doc.regions.iter().map(|r| (r.index, r.original_id.as_str())).collect();
        assert_eq!(ids, vec![(0, "a"), (1, ""), (2, "c")]);
        assert_eq!(doc.regions[0].original_style.fill.as_deref(), Some("#111"));
        assert!(doc.regions.iter().all(|r| r.label == r.original_id && !r.excluded));
    }

    #[test]
    fn zero_paths_is_an_empty_map() {
        let doc = ingest(svg_file("<svg><rect/></svg>"), &EditorConfig::default()).unwrap();
        assert!(doc.regions.is_empty());
    }

    #[test]
    fn rejects_other_mime_types() {
        let f = IncomingFile::new(Some("m.png".into()), "image/png", vec![0x89, b'P', b'N', b'G']);
        let err = ingest(f, &EditorConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidFileType { .. }));
        assert_eq!(err.code(), "invalid_file_type");
    }

    #[test]
    fn empty_mime_falls_back_to_extension() {
        let cfg = EditorConfig::default();
        let f = IncomingFile::new(Some("Map.SVG".into()), "", b"<svg/>".to_vec());
        assert!(accepts(&f, &cfg));
        let strict = EditorConfig { accept_svg_extension: false, ..EditorConfig::default() };
        assert!(!accepts(&f, &strict));
    }

    #[test]
    fn malformed_markup_is_a_parse_failure() {
        let err = ingest(svg_file("<svg><path></svg>"), &EditorConfig::default()).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
        assert_eq!(err.code(), "parse_failure");
    }

    #[test]
    fn bom_and_doctype_are_accepted() {
        let text = "\u{feff}<?xml version=\"1.0\"?>\n<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n<svg><path id=\"x\"/></svg>";
        let doc = ingest(svg_file(text), &EditorConfig::default()).unwrap();
        assert_eq!(doc.regions.len(), 1);
        assert!(doc.source.starts_with("<?xml"));
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let f = IncomingFile::new(None, SVG_MIME, vec![b'<', 0xff, 0xfe]);
        assert!(matches!(ingest(f, &EditorConfig::default()), Err(IngestError::Encoding(_))));
    }
}
