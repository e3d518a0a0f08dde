//! Extraction strategies.
//!
//! Each strategy proposes at most one candidate URL for a page. The resolver
//! runs them in order and the first `Some` wins. The two static strategies
//! are pure functions over a `PageDocument` so they can be tested without
//! any I/O.

use crate::document::{resolve_http_url, ImageNode, PageDocument};
use std::fmt;
use url::Url;

/// One stage of the resolution fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    /// Open Graph / Twitter card / `image_src` tags in static markup
    StructuredMetadata,

    /// Largest `<img>` by declared dimensions in static markup
    LargestInlineImage,

    /// Largest `<img>` in the live DOM after a headless browser ran the page
    RenderedDom,
}

impl ExtractionStrategy {
    /// Default order: cheapest first.
    pub const ALL: [ExtractionStrategy; 3] = [
        ExtractionStrategy::StructuredMetadata,
        ExtractionStrategy::LargestInlineImage,
        ExtractionStrategy::RenderedDom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExtractionStrategy::StructuredMetadata => "structured_metadata",
            ExtractionStrategy::LargestInlineImage => "largest_inline_image",
            ExtractionStrategy::RenderedDom => "rendered_dom",
        }
    }

    /// Whether this stage reads the statically fetched markup.
    pub fn needs_markup(self) -> bool {
        !matches!(self, ExtractionStrategy::RenderedDom)
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a metadata image URL can live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    /// `<meta property="...">`
    Property(&'static str),

    /// Twitter cards are published under `name=` or, on some sites, `property=`
    TwitterCard(&'static str),

    /// `<link rel="..." href>`
    LinkRel(&'static str),
}

/// Metadata tags consulted, highest priority first.
pub const METADATA_SOURCES: [MetadataSource; 5] = [
    MetadataSource::Property("og:image:secure_url"),
    MetadataSource::Property("og:image"),
    MetadataSource::TwitterCard("twitter:image:src"),
    MetadataSource::TwitterCard("twitter:image"),
    MetadataSource::LinkRel("image_src"),
];

impl MetadataSource {
    fn lookup(self, doc: &PageDocument) -> Option<&str> {
        match self {
            MetadataSource::Property(key) => doc.meta_property(key),
            MetadataSource::TwitterCard(key) => {
                doc.meta_name(key).or_else(|| doc.meta_property(key))
            }
            MetadataSource::LinkRel(rel) => doc.link_href(rel),
        }
    }
}

/// First metadata image that resolves to an absolute http(s) URL.
///
/// A tag whose value does not resolve is skipped and the next one is tried.
pub fn structured_metadata(doc: &PageDocument) -> Option<Url> {
    METADATA_SOURCES
        .iter()
        .filter_map(|source| source.lookup(doc))
        .find_map(|raw| resolve_http_url(&doc.base_url, raw))
}

/// The image with the largest area.
///
/// ## Algorithm
/// 1. For each image, take its first source that resolves to http(s);
///    images without one are skipped
/// 2. Score it by `ImageNode::area` (rendered size if measured, else
///    declared `width * height`, missing dimensions are 0)
/// 3. Keep the best so far, replacing it only on a strictly larger area,
///    so ties go to the image that appears first
pub fn largest_inline_image(images: &[ImageNode], base: &Url) -> Option<Url> {
    let mut best: Option<(u64, Url)> = None;

    for image in images {
        let Some(url) = image.resolved_source(base) else {
            continue;
        };
        let area = image.area();

        let replace = match &best {
            Some((best_area, _)) => area > *best_area,
            None => true,
        };
        if replace {
            best = Some((area, url));
        }
    }

    best.map(|(_, url)| url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(markup: &str) -> PageDocument {
        PageDocument::parse(markup, Url::parse("http://x/a.html").unwrap())
    }

    #[test]
    fn test_og_image_found() {
        let page = doc(r#"<meta property="og:image" content="http://x/full.png">"#);
        assert_eq!(
            structured_metadata(&page).unwrap().as_str(),
            "http://x/full.png"
        );
    }

    #[test]
    fn test_metadata_priority_order() {
        let page = doc(
            r#"<link rel="image_src" href="/link.jpg">
               <meta name="twitter:image" content="/tw.jpg">
               <meta property="og:image" content="/og.jpg">
               <meta property="og:image:secure_url" content="https://x/secure.jpg">"#,
        );
        assert_eq!(
            structured_metadata(&page).unwrap().as_str(),
            "https://x/secure.jpg"
        );

        let page = doc(
            r#"<link rel="image_src" href="/link.jpg">
               <meta name="twitter:image" content="/tw.jpg">
               <meta name="twitter:image:src" content="/tw-src.jpg">"#,
        );
        assert_eq!(structured_metadata(&page).unwrap().as_str(), "http://x/tw-src.jpg");
    }

    #[test]
    fn test_invalid_metadata_value_falls_through() {
        let page = doc(
            r#"<meta property="og:image" content="javascript:alert(1)">
               <meta property="twitter:image" content="/tw.jpg">"#,
        );
        assert_eq!(structured_metadata(&page).unwrap().as_str(), "http://x/tw.jpg");
    }

    #[test]
    fn test_link_rel_fallback() {
        let page = doc(r#"<link rel="image_src" href="/link.jpg">"#);
        assert_eq!(structured_metadata(&page).unwrap().as_str(), "http://x/link.jpg");
    }

    #[test]
    fn test_no_metadata() {
        let page = doc(r#"<img src="b.jpg" width="800" height="600">"#);
        assert!(structured_metadata(&page).is_none());
    }

    #[test]
    fn test_largest_image_by_area() {
        let page = doc(
            r#"<img src="c.jpg" width="200" height="200">
               <img src="b.jpg" width="800" height="600">"#,
        );
        let best = largest_inline_image(&page.images, &page.base_url).unwrap();
        assert_eq!(best.as_str(), "http://x/b.jpg");
    }

    #[test]
    fn test_tie_keeps_first_in_document_order() {
        let page = doc(
            r#"<img src="first.jpg" width="300" height="200">
               <img src="second.jpg" width="200" height="300">"#,
        );
        let best = largest_inline_image(&page.images, &page.base_url).unwrap();
        assert_eq!(best.as_str(), "http://x/first.jpg");
    }

    #[test]
    fn test_images_without_dimensions_still_count() {
        let page = doc(r#"<img src="plain.jpg"><img src="other.jpg">"#);
        let best = largest_inline_image(&page.images, &page.base_url).unwrap();
        assert_eq!(best.as_str(), "http://x/plain.jpg");
    }

    #[test]
    fn test_images_without_usable_source_are_skipped() {
        let page = doc(
            r#"<img src="data:image/png;base64,AAAA" width="2000" height="2000">
               <img width="3000" height="3000">
               <img src="small.jpg" width="10" height="10">"#,
        );
        let best = largest_inline_image(&page.images, &page.base_url).unwrap();
        assert_eq!(best.as_str(), "http://x/small.jpg");
    }

    #[test]
    fn test_oversized_dimensions_saturate() {
        let page = doc(
            r#"<img src="small.jpg" width="10" height="10">
               <img src="huge.jpg" width="9999999999" height="9999999999">
               <img src="absurd.jpg" width="999999999999999999999999" height="5">"#,
        );
        assert_eq!(page.images[1].area(), u64::MAX);
        assert_eq!(page.images[2].area(), u64::MAX);

        let best = largest_inline_image(&page.images, &page.base_url).unwrap();
        assert_eq!(best.as_str(), "http://x/huge.jpg");
    }

    #[test]
    fn test_no_images() {
        let page = doc("<p>nothing here</p>");
        assert!(largest_inline_image(&page.images, &page.base_url).is_none());
    }
}
