//! # Resolver Crate
//!
//! Finds the best full-resolution image for an arbitrary web page.
//!
//! ## Stages
//!
//! ### Structured metadata
//! Open Graph (`og:image:secure_url`, `og:image`), Twitter card
//! (`twitter:image:src`, `twitter:image`) and `<link rel="image_src">`,
//! in that order, from the static markup.
//!
//! ### Largest inline image
//! Every `<img>` in the same markup, scored by declared `width * height`.
//! Lazy-load attributes and the last `srcset` entry are used when `src`
//! is missing or unusable.
//!
//! ### Rendered DOM
//! The page is loaded in a headless browser and the largest image of the
//! live document wins, measured in real pixels. Needs the `chromium` feature
//! (or any other `PageRenderer`).
//!
//! ## Example Usage
//!
//! ```ignore
//! use resolver::{CandidateImageResolver, ResolverConfig};
//!
//! let resolver = CandidateImageResolver::from_config(ResolverConfig::default())?;
//! if let Some(url) = resolver.resolve("https://example.com/article").await {
//!     println!("best image: {}", url);
//! }
//! ```

// Public modules
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod render;
pub mod resolver;
pub mod strategies;

// Re-export commonly used types
pub use config::ResolverConfig;
pub use document::{ImageNode, PageDocument, RenderedSize};
pub use error::ResolveError;
pub use fetch::{FetchedPage, HttpPageFetcher, PageFetcher};
pub use render::{PageRenderer, RenderedPage};
pub use resolver::CandidateImageResolver;
pub use strategies::ExtractionStrategy;
