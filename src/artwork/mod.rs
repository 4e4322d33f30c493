//! Cover art references and their resolution into renderable images.

mod loader;

pub use loader::CoverArtLoader;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a track's cover art comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArtworkRef {
    /// Image resource compiled into the host application
    Bundled(u32),
    /// Path inside the application's bundled assets
    BundledPath(String),
    Remote(String),
}

impl ArtworkRef {
    /// Classify a free-form cover source string.
    ///
    /// `http://` and `https://` sources are fetched remotely; anything else
    /// is looked up among the bundled assets.
    pub fn from_source(source: &str) -> Self {
        let trimmed = source.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ArtworkRef::Remote(trimmed.to_string())
        } else {
            ArtworkRef::BundledPath(trimmed.to_string())
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ArtworkRef::Remote(_))
    }
}

impl From<u32> for ArtworkRef {
    fn from(id: u32) -> Self {
        ArtworkRef::Bundled(id)
    }
}

/// A resolved, renderable cover image
#[derive(Clone)]
pub enum Artwork {
    /// Rendered by the host straight from its resource table
    Resource(u32),
    Bitmap(Arc<DynamicImage>),
}

impl Artwork {
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Artwork::Resource(_) => None,
            Artwork::Bitmap(image) => Some((image.width(), image.height())),
        }
    }
}

impl PartialEq for Artwork {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Artwork::Resource(a), Artwork::Resource(b)) => a == b,
            (Artwork::Bitmap(a), Artwork::Bitmap(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Artwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artwork::Resource(id) => f.debug_tuple("Resource").field(id).finish(),
            Artwork::Bitmap(image) => write!(f, "Bitmap({}x{})", image.width(), image.height()),
        }
    }
}
