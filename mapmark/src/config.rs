use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/uploadMap";
pub const DEFAULT_EMPHASIS_FILL: &str = "#ffe5b4";

/// Paint pushed onto the emphasized region. Unset stroke fields leave the
/// region's own stroke in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmphasisTheme {
    pub fill: String,
    pub stroke: Option<String>,
    pub stroke_width: Option<String>,
}

impl Default for EmphasisTheme {
    fn default() -> Self {
        EmphasisTheme { fill: DEFAULT_EMPHASIS_FILL.to_string(), stroke: None, stroke_width: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub endpoint: String,
    /// `name` field of the JSON part; the uploaded file's stem when unset.
    pub payload_name: Option<String>,
    pub svg_file_name: String,
    pub json_file_name: String,
    pub emphasis: EmphasisTheme,
    /// Accept a `.svg` file name when the platform reports no MIME type.
    pub accept_svg_extension: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            payload_name: None,
            svg_file_name: "map.svg".to_string(),
            json_file_name: "data.json".to_string(),
            emphasis: EmphasisTheme::default(),
            accept_svg_extension: true,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(s: &str) -> Result<EditorConfig, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let c = EditorConfig::from_json_str(r##"{"endpoint":"http://maps.local/up","emphasis":{"stroke_width":"3"}}"##).unwrap();
        assert_eq!(c.endpoint, "http://maps.local/up");
        assert_eq!(c.svg_file_name, "map.svg");
        assert_eq!(c.emphasis.fill, DEFAULT_EMPHASIS_FILL);
        assert_eq!(c.emphasis.stroke_width.as_deref(), Some("3"));
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        assert!(EditorConfig::from_json_str(r#"{"theme":"dark"}"#).is_ok());
    }
}
