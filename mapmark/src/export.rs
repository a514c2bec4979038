//! Export: pristine text + region table -> modified SVG + JSON id mapping.
//!
//! The id rewrite splices the original text. Only `id` attribute values of
//! region paths change; every other byte of the file is carried over verbatim.

use crate::config::EditorConfig;
use crate::error::ExportError;
use crate::ingest::{id_attribute, parse, region_nodes};
use crate::store::RegionStore;
use htmlize::escape_all_quotes;
use indexmap::IndexMap;
use serde::Serialize;
use std::ops::Range;

pub const SVG_FIELD: &str = "svg";
pub const JSON_FIELD: &str = "json";

/// One file part of the upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub field: &'static str,
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct ExportPayload {
    pub name: String,
    pub mapping: IndexMap<String, String>,
    pub svg: Part,
    pub json: Part,
}

#[derive(Serialize)]
struct MappingDoc<'a> {
    name: &'a str,
    data: &'a IndexMap<String, String>,
}

pub fn build_payload(
    source: &str,
    store: &RegionStore,
    name: &str,
    config: &EditorConfig,
) -> Result<ExportPayload, ExportError> {
    let svg = rewrite_ids(source, store)?;
    let mapping = store.snapshot_for_export();
    let json = serde_json::to_vec(&MappingDoc { name, data: &mapping })?;
    tracing::info!(name, mapped = mapping.len(), svg_bytes = svg.len(), "built export payload");
    Ok(ExportPayload {
        name: name.to_string(),
        mapping,
        svg: Part {
            field: SVG_FIELD,
            file_name: config.svg_file_name.clone(),
            content_type: crate::ingest::SVG_MIME,
            bytes: svg.into_bytes(),
        },
        json: Part {
            field: JSON_FIELD,
            file_name: config.json_file_name.clone(),
            content_type: "application/json",
            bytes: json,
        },
    })
}

/// Re-parses `source` and writes each region's export id into it.
pub fn rewrite_ids(source: &str, store: &RegionStore) -> Result<String, ExportError> {
    let doc = parse(source)?;
    let body = doc.root_element().range();
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut seen = 0usize;
    let mut last_start = None;
    for (node, region) in region_nodes(&doc).zip(store.iter()) {
        seen += 1;
        let wanted = region.exported_id();
        let current = id_attribute(&node);
        if current.as_ref().is_some_and(|a| a.value() == wanted) {
            continue;
        }
        // Paths expanded from a DTD entity have no text of their own in the
        // document body, and every use of the entity shares the same bytes.
        let start = node.range().start;
        if !body.contains(&start) || last_start.is_some_and(|prev| start <= prev) {
            return Err(ExportError::Unspliceable { index: region.index });
        }
        last_start = Some(start);
        let tag = scan_start_tag(source, start);
        match (current, tag.id_value) {
            (Some(_), Some(value)) => edits.push((value, escape_all_quotes(wanted).into_owned())),
            _ if wanted.is_empty() && !region.excluded => {}
            _ => edits.push((
                tag.name_end..tag.name_end,
                format!(" id=\"{}\"", escape_all_quotes(wanted)),
            )),
        }
    }
    if seen != store.len() {
        tracing::warn!(document = seen, store = store.len(), "region count drifted from store");
    }

    let mut out = String::with_capacity(source.len() + edits.len() * 8);
    let mut at = 0;
    for (range, text) in edits {
        out.push_str(&source[at..range.start]);
        out.push_str(&text);
        at = range.end;
    }
    out.push_str(&source[at..]);
    Ok(out)
}

struct StartTag {
    name_end: usize,
    id_value: Option<Range<usize>>,
}

/// Locates the tag name end and the unprefixed `id` value inside a start tag
/// that the XML parser already accepted.
fn scan_start_tag(src: &str, start: usize) -> StartTag {
    let bytes = src.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() && !is_tag_break(bytes[i]) {
        i += 1;
    }
    let name_end = i;
    let mut id_value = None;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] == b'/' || bytes[i] == b'>' {
            break;
        }
        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let attr_name = &src[name_start..i];
        while i < bytes.len() && (bytes[i] == b'=' || bytes[i].is_ascii_whitespace()) {
            i += 1;
        }
        let Some(&quote) = bytes.get(i) else { break };
        i += 1;
        let value_start = i;
        while i < bytes.len() && bytes[i] != quote {
            i += 1;
        }
        if attr_name == "id" {
            id_value = Some(value_start..i);
        }
        i += 1;
    }
    StartTag { name_end, id_value }
}

fn is_tag_break(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/' || b == b'>'
}

impl ExportPayload {
    /// `multipart/form-data` body for transports that do not build forms
    /// themselves. Returns the boundary alongside the body.
    pub fn to_multipart(&self) -> (String, Vec<u8>) {
        let boundary = self.boundary();
        let mut body = Vec::with_capacity(self.svg.bytes.len() + self.json.bytes.len() + 512);
        for part in [&self.svg, &self.json] {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.field,
                    part.file_name.replace(['"', '\r', '\n'], "_")
                )
                .as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
            body.extend_from_slice(&part.bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        (boundary, body)
    }

    pub fn content_type(boundary: &str) -> String {
        format!("multipart/form-data; boundary={boundary}")
    }

    fn boundary(&self) -> String {
        let mut seed = fnv1a(&self.svg.bytes) ^ fnv1a(&self.json.bytes).rotate_left(17);
        loop {
            let candidate = format!("----mapmark-{seed:016x}");
            let needle = candidate.as_bytes();
            if !contains(&self.svg.bytes, needle) && !contains(&self.json.bytes, needle) {
                return candidate;
            }
            seed = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0xcbf2_9ce4_8422_2325u64, |h, &b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3))
}

fn contains(hay: &[u8], needle: &[u8]) -> bool {
    hay.windows(needle.len()).any(|w| w == needle)
}
