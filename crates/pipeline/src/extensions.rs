//! Supported image extensions.
//!
//! Only URLs whose path ends in a known raster extension are downloaded and
//! scored. Anything else (HTML pages, SVG, extensionless CDN URLs) is
//! emitted unscored.

use url::Url;

/// Extensions accepted by default, compared case-insensitively
pub const DEFAULT_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Allow-list of image file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedExtensions {
    extensions: Vec<String>,
}

impl SupportedExtensions {
    /// Build from any list; leading dots and case are normalized away.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.extensions
    }

    /// Whether the path of `url` ends in a supported extension.
    ///
    /// Query string and fragment are ignored. Unparseable URLs never match.
    pub fn matches(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        let Some(file_name) = url.path().rsplit('/').next() else {
            return false;
        };
        let Some((_, extension)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.extensions
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(extension))
    }
}

impl Default for SupportedExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}
