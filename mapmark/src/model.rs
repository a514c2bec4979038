use serde::{Deserialize, Serialize};

/// Inline paint properties of a region. `None` means the property is not set
/// inline, so the element falls back to its presentation attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<String>,
}

impl PaintStyle {
    /// Reads `fill`, `stroke` and `stroke-width` out of an inline `style` attribute.
    pub fn from_inline(style: &str) -> PaintStyle {
        let mut paint = PaintStyle::default();
        for decl in style.split(';') {
            let Some((prop, value)) = decl.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match prop.trim().to_ascii_lowercase().as_str() {
                "fill" => paint.fill = Some(value.to_string()),
                "stroke" => paint.stroke = Some(value.to_string()),
                "stroke-width" => paint.stroke_width = Some(value.to_string()),
                _ => {}
            }
        }
        paint
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub index: usize,
    pub original_id: String,
    pub label: String,
    pub original_style: PaintStyle,
    pub excluded: bool,
}

impl Region {
    pub fn new(index: usize, original_id: String, original_style: PaintStyle) -> Region {
        Region {
            index,
            label: original_id.clone(),
            original_id,
            original_style,
            excluded: false,
        }
    }

    /// Identifier this region carries on export: blank when excluded, otherwise
    /// the label, or the original id when the label was cleared.
    pub fn exported_id(&self) -> &str {
        if self.excluded {
            ""
        } else if self.label.is_empty() {
            &self.original_id
        } else {
            &self.label
        }
    }
}

/// A file as delivered by the acquisition layer (drop zone, file picker, CLI).
#[derive(Clone, Debug)]
pub struct IncomingFile {
    pub name: Option<String>,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: Option<String>, mime: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        IncomingFile { name, mime: mime.into(), bytes: bytes.into() }
    }

    pub fn stem(&self) -> Option<&str> {
        self.name.as_deref().and_then(file_stem)
    }
}

/// File name without directory or extension.
pub fn file_stem(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = match base.rfind('.') {
        Some(0) => return None,
        Some(dot) => &base[..dot],
        None => base,
    };
    if stem.is_empty() { None } else { Some(stem) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_style_picks_paint_properties() {
        let p = PaintStyle::from_inline("fill: #abc ; STROKE:red;stroke-width:2px;opacity:0.5;bogus");
        assert_eq!(p.fill.as_deref(), Some("#abc"));
        assert_eq!(p.stroke.as_deref(), Some("red"));
        assert_eq!(p.stroke_width.as_deref(), Some("2px"));
    }

    #[test]
    fn empty_declarations_are_unset() {
        assert_eq!(PaintStyle::from_inline("fill:;"), PaintStyle::default());
    }

    #[test]
    fn exported_id_precedence() {
        let mut r = Region::new(0, "a".into(), PaintStyle::default());
        assert_eq!(r.exported_id(), "a");
        r.label = "Alpha".into();
        assert_eq!(r.exported_id(), "Alpha");
        r.label.clear();
        assert_eq!(r.exported_id(), "a");
        r.excluded = true;
        assert_eq!(r.exported_id(), "");
    }

    #[test]
    fn stem_strips_dirs_and_extension() {
        let f = IncomingFile::new(Some("maps/polska.svg".into()), "image/svg+xml", Vec::new());
        assert_eq!(f.stem(), Some("polska"));
        let f = IncomingFile::new(Some(".svg".into()), "image/svg+xml", Vec::new());
        assert_eq!(f.stem(), None);
        assert_eq!(file_stem("dir/.hidden.svg"), Some(".hidden"));
        let f = IncomingFile::new(None, "", Vec::new());
        assert_eq!(f.stem(), None);
    }
}
