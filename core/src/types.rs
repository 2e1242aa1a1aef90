//! Domain types for the post API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Wire names follow the service (`_id`, `imgUrl`); the aliases let the
//! client read the spelled-out forms too. Unknown fields such as timestamps
//! are ignored on purpose: the service is the source of truth and the client
//! only reads what it renders.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fallback upload name when a picked URI has no usable last segment.
const DEFAULT_IMAGE_NAME: &str = "image.jpg";
const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

/// Server-assigned post identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A single post as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id", alias = "id")]
    pub id: PostId,
    pub title: String,
    pub description: String,
    #[serde(
        rename = "imgUrl",
        alias = "imageUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
}

/// Reference to an image: either a local file handed back by the media
/// picker or the remote URL of an image already attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn uri(&self) -> &str {
        &self.0
    }

    /// Last path segment of the URI, used as the upload file name.
    pub fn file_name(&self) -> String {
        let without_query = self.0.split(['?', '#']).next().unwrap_or_default();
        without_query
            .rsplit('/')
            .next()
            .filter(|segment| !segment.trim().is_empty())
            .unwrap_or(DEFAULT_IMAGE_NAME)
            .to_string()
    }

    /// Content type guessed from the file extension. Anything that is not
    /// an image type falls back to JPEG, which is what pickers produce.
    pub fn content_type(&self) -> String {
        mime_guess::from_path(self.file_name())
            .first()
            .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string())
    }

    /// Filesystem path for `file://` URIs; other URIs are returned as-is.
    pub fn local_path(&self) -> &str {
        self.0.strip_prefix("file://").unwrap_or(&self.0)
    }

    /// Whether this reference points at the given remote image URL.
    pub fn matches_url(&self, url: Option<&str>) -> bool {
        url == Some(self.0.as_str())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text fields plus an optional image: the body of a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPayload {
    pub title: String,
    pub description: String,
    pub image: Option<ImageRef>,
}
