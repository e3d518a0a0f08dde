//! Typed snapshot of a parsed page.
//!
//! Markup is parsed once with `scraper` and copied into plain owned structs.
//! The `scraper::Html` tree is not `Send`, so it never outlives
//! `PageDocument::parse`; the snapshot can be held across `.await` points
//! inside spawned tasks.

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use url::Url;

/// A `<meta>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaTag {
    pub name: Option<String>,
    pub property: Option<String>,
    pub content: Option<String>,
}

/// A `<link>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTag {
    pub rel: Option<String>,
    pub href: Option<String>,
}

impl LinkTag {
    /// `rel` is a space-separated token list.
    pub fn has_rel(&self, wanted: &str) -> bool {
        self.rel
            .as_deref()
            .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case(wanted)))
    }
}

/// Pixel size measured by a browser after layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RenderedSize {
    pub width: u32,
    pub height: u32,
}

impl RenderedSize {
    pub fn area(self) -> u64 {
        u64::from(self.width).saturating_mul(u64::from(self.height))
    }
}

/// An `<img>` element, from static markup or a rendered DOM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageNode {
    pub src: Option<String>,
    pub data_src: Option<String>,
    pub data_lazy_src: Option<String>,
    pub data_original: Option<String>,
    pub srcset: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,

    /// Only set for nodes read from a live document
    pub rendered: Option<RenderedSize>,
}

impl ImageNode {
    /// Candidate source values in priority order, skipping blanks.
    pub fn source_candidates(&self) -> impl Iterator<Item = &str> {
        [
            self.src.as_deref(),
            self.data_src.as_deref(),
            self.data_lazy_src.as_deref(),
            self.data_original.as_deref(),
            self.srcset.as_deref().and_then(last_srcset_url),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    }

    /// First candidate that resolves to an absolute http(s) URL.
    pub fn resolved_source(&self, base: &Url) -> Option<Url> {
        self.source_candidates()
            .find_map(|candidate| resolve_http_url(base, candidate))
    }

    /// Declared `width` x `height`; missing or unparseable values count as 0.
    pub fn declared_area(&self) -> u64 {
        let width = parse_dimension(self.width.as_deref());
        width.saturating_mul(parse_dimension(self.height.as_deref()))
    }

    /// Rendered pixel area when a browser measured one, else the declared area.
    pub fn area(&self) -> u64 {
        match self.rendered.map(RenderedSize::area) {
            Some(area) if area > 0 => area,
            _ => self.declared_area(),
        }
    }
}

/// Parsed page: base URL plus the element kinds the strategies inspect.
#[derive(Debug, Clone)]
pub struct PageDocument {
    pub base_url: Url,
    pub meta: Vec<MetaTag>,
    pub links: Vec<LinkTag>,
    pub images: Vec<ImageNode>,
}

impl PageDocument {
    /// Parse markup; relative references later resolve against `base_url`.
    pub fn parse(markup: &str, base_url: Url) -> Self {
        let html = Html::parse_document(markup);

        let meta = select_all(&html, "meta", |el| MetaTag {
            name: attr(el, "name"),
            property: attr(el, "property"),
            content: attr(el, "content"),
        });
        let links = select_all(&html, "link", |el| LinkTag {
            rel: attr(el, "rel"),
            href: attr(el, "href"),
        });
        let images = select_all(&html, "img", |el| ImageNode {
            src: attr(el, "src"),
            data_src: attr(el, "data-src"),
            data_lazy_src: attr(el, "data-lazy-src"),
            data_original: attr(el, "data-original"),
            srcset: attr(el, "srcset"),
            width: attr(el, "width"),
            height: attr(el, "height"),
            rendered: None,
        });

        Self {
            base_url,
            meta,
            links,
            images,
        }
    }

    /// Content of the first `<meta property=...>` with a non-blank value.
    pub fn meta_property(&self, property: &str) -> Option<&str> {
        self.meta_where(|tag| tag.property.as_deref(), property)
    }

    /// Content of the first `<meta name=...>` with a non-blank value.
    pub fn meta_name(&self, name: &str) -> Option<&str> {
        self.meta_where(|tag| tag.name.as_deref(), name)
    }

    /// `href` of the first `<link>` carrying `rel`.
    pub fn link_href(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .filter(|link| link.has_rel(rel))
            .filter_map(|link| link.href.as_deref())
            .map(str::trim)
            .find(|href| !href.is_empty())
    }

    fn meta_where<'a>(
        &'a self,
        key: impl Fn(&'a MetaTag) -> Option<&'a str>,
        wanted: &str,
    ) -> Option<&'a str> {
        self.meta
            .iter()
            .filter(|tag| key(*tag).is_some_and(|k| k.trim().eq_ignore_ascii_case(wanted)))
            .filter_map(|tag| tag.content.as_deref())
            .map(str::trim)
            .find(|content| !content.is_empty())
    }
}

/// Resolve `raw` against `base`, keeping it only if the result is http(s).
pub fn resolve_http_url(base: &Url, raw: &str) -> Option<Url> {
    let url = base.join(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// URL part of the last entry of a `srcset` list.
///
/// `"a.jpg 1x, b.jpg 2x"` gives `"b.jpg"`. Trailing empty entries are skipped.
pub fn last_srcset_url(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .last()?
        .split_whitespace()
        .next()
}

/// Leading integer of a dimension attribute, so `"800px"` reads as 800.
fn parse_dimension(value: Option<&str>) -> u64 {
    let Some(value) = value else {
        return 0;
    };
    let digits: String = value
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return 0;
    }
    // Only overflow can fail here; absurd sizes saturate
    digits.parse().unwrap_or(u64::MAX)
}

fn select_all<T>(html: &Html, css: &str, build: impl Fn(ElementRef<'_>) -> T) -> Vec<T> {
    match Selector::parse(css) {
        Ok(selector) => html.select(&selector).map(build).collect(),
        Err(_) => Vec::new(),
    }
}

fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value().attr(name).map(str::to_string)
}
