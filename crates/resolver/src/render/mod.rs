//! Rendered-DOM capability.
//!
//! A `PageRenderer` loads a page in a real browsing engine and reports the
//! `<img>` elements of the live, script-mutated document. Implementations
//! own the whole engine session and must release it on every exit path,
//! including when the returned future is dropped mid-flight.

#[cfg(feature = "chromium")]
pub mod chromium;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumRenderer;

use crate::document::ImageNode;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// Images read from a live document.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// `window.location.href` once the page settled
    pub final_url: Url,
    pub images: Vec<ImageNode>,
}

/// Loads pages in a browsing engine.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render_images(&self, url: &Url) -> Result<RenderedPage>;
}

/// Shape returned by `COLLECT_IMAGES_JS`.
#[derive(Debug, Clone, Deserialize)]
pub struct DomSnapshot {
    pub href: String,
    #[serde(default)]
    pub images: Vec<ImageNode>,
}

/// Script evaluated in the page to snapshot every `<img>`.
///
/// `rendered` prefers intrinsic pixel size and falls back to layout size.
pub const COLLECT_IMAGES_JS: &str = r#"(() => {
  const attr = (img, name) => img.getAttribute(name);
  const images = Array.from(document.querySelectorAll('img')).map((img) => ({
    src: attr(img, 'src'),
    dataSrc: attr(img, 'data-src'),
    dataLazySrc: attr(img, 'data-lazy-src'),
    dataOriginal: attr(img, 'data-original'),
    srcset: attr(img, 'srcset'),
    width: attr(img, 'width'),
    height: attr(img, 'height'),
    rendered: {
      width: img.naturalWidth || img.width || 0,
      height: img.naturalHeight || img.height || 0,
    },
  }));
  return { href: window.location.href, images };
})()"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_deserializes_from_script_shape() {
        let json = r#"{
            "href": "https://x/a.html",
            "images": [
                {"src": "a.jpg", "dataSrc": null, "srcset": null, "width": "10",
                 "height": null, "rendered": {"width": 640, "height": 480}},
                {"dataLazySrc": "b.jpg"}
            ]
        }"#;
        let snapshot: DomSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.images.len(), 2);
        assert_eq!(snapshot.images[0].area(), 307_200);
        assert_eq!(snapshot.images[1].data_lazy_src.as_deref(), Some("b.jpg"));
        assert!(snapshot.images[1].rendered.is_none());
    }
}
