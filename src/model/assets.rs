// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Generated asset types and the final [`AssetBundle`].

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;

/// Opaque handle to a generated video (URL, object URL, storage key...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoRef(String);

impl VideoRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to a generated image, usually a data URI or URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Wrap raw JPEG bytes as a `data:image/jpeg;base64,...` URI.
    pub fn from_jpeg_bytes(bytes: &[u8]) -> Self {
        Self(format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Title, description and ordered tags for the upload page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl SeoMetadata {
    /// Parse the JSON object a backend returns for SEO metadata.
    ///
    /// Surrounding whitespace is ignored; anything that is not an object with
    /// `title`, `description` and `tags` is a [`GatewayError::MalformedPayload`].
    pub fn from_json(raw: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(raw.trim())
            .map_err(|e| GatewayError::MalformedPayload(format!("SEO metadata: {}", e)))
    }
}

/// The finished set of assets for one run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetBundle {
    script: String,
    video: VideoRef,
    thumbnail: ImageRef,
    seo: SeoMetadata,
}

impl AssetBundle {
    pub fn new(script: String, video: VideoRef, thumbnail: ImageRef, seo: SeoMetadata) -> Self {
        Self {
            script,
            video,
            thumbnail,
            seo,
        }
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn video(&self) -> &VideoRef {
        &self.video
    }

    pub fn thumbnail(&self) -> &ImageRef {
        &self.thumbnail
    }

    pub fn seo(&self) -> &SeoMetadata {
        &self.seo
    }
}
