//! Importer configuration.

use serde::Deserialize;

use crate::scene::Color;

/// Extensions accepted for boundary-representation shape files.
pub const BREP_EXTENSIONS: [&str; 2] = ["brp", "brep"];

/// One way of deriving a shape file name from an object name:
/// `<prefix><object name>.<extension>`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NamingScheme {
    pub prefix: String,
    #[serde(default = "default_brep_extension")]
    pub extension: String,
}

fn default_brep_extension() -> String {
    "brp".to_string()
}

impl NamingScheme {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    pub fn file_name(&self, object_name: &str) -> String {
        format!("{}{}.{}", self.prefix, object_name, self.extension)
    }
}

/// Schemes tried in order: current export naming first, then the legacy one.
pub fn default_naming_schemes() -> Vec<NamingScheme> {
    vec![
        NamingScheme::new("lens_", "brp"),
        NamingScheme::new("ondsel_", "brp"),
    ]
}

/// Options controlling an import.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Color for objects whose presentation data sets none
    #[serde(with = "packed_color")]
    pub default_color: Color,

    /// Shape file naming schemes, tried in order
    pub naming_schemes: Vec<NamingScheme>,

    /// Decode shapes on the rayon pool instead of one after another
    pub parallel_decode: bool,

    /// Wait for image planes before returning from the import
    pub join_images: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            default_color: Color::default(),
            naming_schemes: default_naming_schemes(),
            parallel_decode: false,
            join_images: false,
        }
    }
}

impl ImportOptions {
    /// Load options from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_default_color(mut self, color: Color) -> Self {
        self.default_color = color;
        self
    }

    pub fn with_naming_schemes(mut self, schemes: Vec<NamingScheme>) -> Self {
        self.naming_schemes = schemes;
        self
    }

    pub fn with_parallel_decode(mut self, parallel: bool) -> Self {
        self.parallel_decode = parallel;
        self
    }

    pub fn with_join_images(mut self, join: bool) -> Self {
        self.join_images = join;
        self
    }
}

/// Colors in config files are written the way documents store them:
/// a packed `0xRRGGBBAA` integer.
mod packed_color {
    use serde::{Deserialize, Deserializer};

    use crate::scene::Color;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
        u32::deserialize(deserializer).map(Color::from_packed)
    }
}
