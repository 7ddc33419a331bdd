// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Topic used when a run is requested with a blank topic
pub const DEFAULT_TOPIC: &str = "Top 5 Passive Income Streams for Beginners";
/// Placeholder replaced by the resolved topic in title templates
pub const TOPIC_PLACEHOLDER: &str = "{topic}";
/// Default title handed to the thumbnail operation
pub const DEFAULT_THUMBNAIL_TITLE_TEMPLATE: &str = "How to earn passive income with {topic}";

/// Progress message shown as soon as the video step starts
pub const VIDEO_INITIAL_PROGRESS: &str = "Initializing video generation...";

/// Default script generation timeout (2 minutes)
pub const DEFAULT_SCRIPT_TIMEOUT_SECONDS: u64 = 120;
/// Default video generation timeout (15 minutes); rendering is slow
pub const DEFAULT_VIDEO_TIMEOUT_SECONDS: u64 = 900;
/// Default thumbnail generation timeout (2 minutes)
pub const DEFAULT_THUMBNAIL_TIMEOUT_SECONDS: u64 = 120;
/// Default SEO metadata generation timeout (2 minutes)
pub const DEFAULT_SEO_TIMEOUT_SECONDS: u64 = 120;

/// Default delay between long-running job refreshes (10 seconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
/// Default ceiling on how long a long-running job is polled (15 minutes)
pub const DEFAULT_MAX_WAIT_SECONDS: u64 = 900;
