// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A deterministic, in-memory [`GenerationGateway`].
//!
//! Every operation returns a canned output (or a canned failure) after an
//! optional delay, and every call is recorded with its input so callers can check
//! what the engine asked for. Video generation goes through the real
//! [`poll_to_completion`] loop against a scripted job, so it reports the same
//! progress messages a provider-backed gateway would.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backends::long_running::{poll_to_completion, JobState, LongRunningJob, PollingOptions};
use crate::errors::GatewayError;
use crate::model::{ImageRef, SeoMetadata, StepId, VideoRef};
use crate::traits::{GenerationGateway, ProgressReporter};

const DEFAULT_SEO_JSON: &str = r#"{
  "title": "Passive Income, Explained",
  "description": "00:00 Intro\n00:30 The strategies\n05:00 Wrap-up",
  "tags": ["passive income", "side hustle", "investing"]
}"#;

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCall {
    pub step: StepId,
    pub input: String,
}

#[derive(Debug, Clone)]
struct VideoScript {
    polls_until_ready: u32,
    refresh_failures: u32,
    reference: Option<VideoRef>,
    download_failure: Option<String>,
}

/// In-memory gateway with canned outputs, failures and delays per step.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use the_clapperboard::backends::ScriptedGateway;
/// use the_clapperboard::model::StepId;
///
/// let gateway = ScriptedGateway::new()
///     .with_script("Five ways to earn while you sleep")
///     .failing(StepId::Thumbnail, "image quota exceeded")
///     .delayed(StepId::Seo, Duration::from_millis(20));
/// ```
#[derive(Debug)]
pub struct ScriptedGateway {
    script: Option<String>,
    thumbnail: ImageRef,
    seo_json: String,
    video: VideoScript,
    failures: HashMap<StepId, GatewayError>,
    delays: HashMap<StepId, Duration>,
    polling: PollingOptions,
    calls: Mutex<Vec<GatewayCall>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    /// Every step succeeds. The script echoes the topic, video rendering takes two
    /// polls at a 5 ms interval.
    pub fn new() -> Self {
        Self {
            script: None,
            thumbnail: ImageRef::from_jpeg_bytes(&[0xFF, 0xD8, 0xFF, 0xD9]),
            seo_json: DEFAULT_SEO_JSON.to_string(),
            video: VideoScript {
                polls_until_ready: 2,
                refresh_failures: 0,
                reference: Some(VideoRef::new("blob:scripted-video")),
                download_failure: None,
            },
            failures: HashMap::new(),
            delays: HashMap::new(),
            polling: PollingOptions::new(Duration::from_millis(5), Duration::from_secs(5)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: ImageRef) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    /// Raw JSON handed to [`SeoMetadata::from_json`]; a payload of the wrong
    /// shape makes the seo step fail as a malformed payload.
    pub fn with_seo_json(mut self, raw: impl Into<String>) -> Self {
        self.seo_json = raw.into();
        self
    }

    pub fn with_video(mut self, reference: VideoRef) -> Self {
        self.video.reference = Some(reference);
        self
    }

    /// The video job finishes without producing a reference.
    pub fn with_video_missing_reference(mut self) -> Self {
        self.video.reference = None;
        self
    }

    /// The video job finishes, but downloading the file fails with `status`.
    pub fn with_video_download_failure(mut self, status: impl Into<String>) -> Self {
        self.video.download_failure = Some(status.into());
        self
    }

    pub fn with_video_polls(mut self, polls_until_ready: u32) -> Self {
        self.video.polls_until_ready = polls_until_ready;
        self
    }

    /// The first `count` refreshes of the video job fail transiently.
    pub fn with_video_refresh_failures(mut self, count: u32) -> Self {
        self.video.refresh_failures = count;
        self
    }

    pub fn with_polling(mut self, polling: PollingOptions) -> Self {
        self.polling = polling;
        self
    }

    /// `step` rejects with `message`.
    pub fn failing(mut self, step: StepId, message: impl Into<String>) -> Self {
        self.failures
            .insert(step, GatewayError::Rejected(message.into()));
        self
    }

    /// `step` waits `delay` before answering.
    pub fn delayed(mut self, step: StepId, delay: Duration) -> Self {
        self.delays.insert(step, delay);
        self
    }

    /// Calls received so far, in arrival order.
    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().await.clone()
    }

    /// Inputs received for `step`, in arrival order.
    pub async fn inputs_for(&self, step: StepId) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.step == step)
            .map(|call| call.input.clone())
            .collect()
    }

    async fn enter(&self, step: StepId, input: &str) -> Result<(), GatewayError> {
        self.calls.lock().await.push(GatewayCall {
            step,
            input: input.to_string(),
        });
        if let Some(delay) = self.delays.get(&step) {
            tokio::time::sleep(*delay).await;
        }
        match self.failures.get(&step) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

struct ScriptedVideoJob {
    script: VideoScript,
    refreshes: u32,
}

#[async_trait]
impl LongRunningJob for ScriptedVideoJob {
    type Output = VideoRef;

    async fn submit(&mut self) -> Result<JobState<VideoRef>, GatewayError> {
        Ok(self.state())
    }

    async fn refresh(&mut self) -> Result<JobState<VideoRef>, GatewayError> {
        self.refreshes += 1;
        if self.refreshes <= self.script.refresh_failures {
            return Err(GatewayError::Rejected(format!(
                "refresh {} unavailable",
                self.refreshes
            )));
        }
        Ok(self.state())
    }

    async fn fetch(&mut self, reference: VideoRef) -> Result<VideoRef, GatewayError> {
        match &self.script.download_failure {
            Some(status) => Err(GatewayError::Download(status.clone())),
            None => Ok(reference),
        }
    }

    fn operation(&self) -> &str {
        "video generation"
    }
}

impl ScriptedVideoJob {
    fn state(&self) -> JobState<VideoRef> {
        let successful = self.refreshes.saturating_sub(self.script.refresh_failures);
        if successful >= self.script.polls_until_ready {
            JobState::Finished(self.script.reference.clone())
        } else {
            JobState::Running
        }
    }
}

#[async_trait]
impl GenerationGateway for ScriptedGateway {
    async fn generate_script(&self, topic: &str) -> Result<String, GatewayError> {
        self.enter(StepId::Script, topic).await?;
        Ok(self
            .script
            .clone()
            .unwrap_or_else(|| format!("A five minute script about {}.", topic)))
    }

    async fn generate_thumbnail(&self, title: &str) -> Result<ImageRef, GatewayError> {
        self.enter(StepId::Thumbnail, title).await?;
        Ok(self.thumbnail.clone())
    }

    async fn generate_seo_metadata(&self, script: &str) -> Result<SeoMetadata, GatewayError> {
        self.enter(StepId::Seo, script).await?;
        SeoMetadata::from_json(&self.seo_json)
    }

    async fn generate_video(
        &self,
        script: &str,
        progress: ProgressReporter,
    ) -> Result<VideoRef, GatewayError> {
        self.enter(StepId::Video, script).await?;
        let mut job = ScriptedVideoJob {
            script: self.video.clone(),
            refreshes: 0,
        };
        poll_to_completion(&mut job, &progress, self.polling).await
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
