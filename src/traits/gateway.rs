// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::model::{ImageRef, SeoMetadata, VideoRef};
use crate::traits::progress::ProgressReporter;

/// The four generation operations the engine drives.
///
/// Implementations own everything provider-specific: prompts, HTTP calls,
/// polling cadence, downloads. The engine only sees inputs, outputs and
/// [`GatewayError`]s, and never retries a failed call.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Write the video script for `topic`.
    async fn generate_script(&self, topic: &str) -> Result<String, GatewayError>;

    /// Render a thumbnail for a video called `title`.
    async fn generate_thumbnail(&self, title: &str) -> Result<ImageRef, GatewayError>;

    /// Derive upload metadata from the script. A payload that does not parse as
    /// `{title, description, tags}` must be reported as
    /// [`GatewayError::MalformedPayload`].
    async fn generate_seo_metadata(&self, script: &str) -> Result<SeoMetadata, GatewayError>;

    /// Produce a video for the script. This can take minutes; intermediate status
    /// goes through `progress`, any number of times, before the call resolves.
    async fn generate_video(
        &self,
        script: &str,
        progress: ProgressReporter,
    ) -> Result<VideoRef, GatewayError>;

    fn name(&self) -> &'static str;
}
