// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::backends::ScriptedGateway;
use crate::errors::GatewayError;
use crate::model::{ImageRef, SeoMetadata, StepId, VideoRef};
use crate::traits::{GenerationGateway, ProgressReporter};

/// A gateway that panics inside one chosen operation and delegates the rest
pub struct PanickingGateway {
    pub panic_in: StepId,
    pub inner: ScriptedGateway,
}

impl PanickingGateway {
    pub fn new(panic_in: StepId) -> Self {
        Self {
            panic_in,
            inner: ScriptedGateway::new(),
        }
    }

    fn maybe_panic(&self, step: StepId) {
        if self.panic_in == step {
            panic!("{} backend exploded", step);
        }
    }
}

#[async_trait]
impl GenerationGateway for PanickingGateway {
    async fn generate_script(&self, topic: &str) -> Result<String, GatewayError> {
        self.maybe_panic(StepId::Script);
        self.inner.generate_script(topic).await
    }

    async fn generate_thumbnail(&self, title: &str) -> Result<ImageRef, GatewayError> {
        self.maybe_panic(StepId::Thumbnail);
        self.inner.generate_thumbnail(title).await
    }

    async fn generate_seo_metadata(&self, script: &str) -> Result<SeoMetadata, GatewayError> {
        self.maybe_panic(StepId::Seo);
        self.inner.generate_seo_metadata(script).await
    }

    async fn generate_video(
        &self,
        script: &str,
        progress: ProgressReporter,
    ) -> Result<VideoRef, GatewayError> {
        self.maybe_panic(StepId::Video);
        self.inner.generate_video(script, progress).await
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

/// Video generation that reports fixed progress messages and then holds the
/// first call open until released. Later calls answer immediately.
pub struct GatedVideoGateway {
    pub progress: Vec<String>,
    pub first_reference: VideoRef,
    pub later_reference: VideoRef,
    /// Signalled once the first call has reported all of its progress
    pub reported: Arc<Notify>,
    /// Releases the first call
    pub release: Arc<Notify>,
    calls: AtomicUsize,
    inner: ScriptedGateway,
}

impl GatedVideoGateway {
    pub fn new(progress: &[&str]) -> Self {
        Self {
            progress: progress.iter().map(|m| m.to_string()).collect(),
            first_reference: VideoRef::new("blob:first-run"),
            later_reference: VideoRef::new("blob:later-run"),
            reported: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            calls: AtomicUsize::new(0),
            inner: ScriptedGateway::new(),
        }
    }
}

#[async_trait]
impl GenerationGateway for GatedVideoGateway {
    async fn generate_script(&self, topic: &str) -> Result<String, GatewayError> {
        self.inner.generate_script(topic).await
    }

    async fn generate_thumbnail(&self, title: &str) -> Result<ImageRef, GatewayError> {
        self.inner.generate_thumbnail(title).await
    }

    async fn generate_seo_metadata(&self, script: &str) -> Result<SeoMetadata, GatewayError> {
        self.inner.generate_seo_metadata(script).await
    }

    async fn generate_video(
        &self,
        _script: &str,
        progress: ProgressReporter,
    ) -> Result<VideoRef, GatewayError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            return Ok(self.later_reference.clone());
        }
        for message in &self.progress {
            progress.report(message.clone());
        }
        self.reported.notify_one();
        self.release.notified().await;
        // Reported after release so a superseded run still emits late progress
        progress.report("late progress from the first call");
        Ok(self.first_reference.clone())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}
