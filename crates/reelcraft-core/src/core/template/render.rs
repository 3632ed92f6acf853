//! Render Pipeline Types
//!
//! The engine gates every render on validation and then hands a [`RenderJob`]
//! to a [`RenderBackend`]. The bundled [`MockRenderBackend`] produces no
//! pixels; it only reports where the output would have been written.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::models::Template;
use super::validation::TemplateData;
use crate::core::{CoreResult, TemplateId};

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderFormat {
    #[default]
    Mp4,
    Webm,
    Gif,
}

impl RenderFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            RenderFormat::Mp4 => "mp4",
            RenderFormat::Webm => "webm",
            RenderFormat::Gif => "gif",
        }
    }
}

impl std::str::FromStr for RenderFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(RenderFormat::Mp4),
            "webm" => Ok(RenderFormat::Webm),
            "gif" => Ok(RenderFormat::Gif),
            other => Err(format!("Unknown render format: {other}")),
        }
    }
}

/// Output quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderQuality {
    Low,
    Medium,
    #[default]
    High,
}

/// Per-render settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Directory the output file goes into
    pub output_dir: PathBuf,
    /// Container format
    pub format: RenderFormat,
    /// Quality preset
    pub quality: RenderQuality,
    /// Frame rate override; the template fps is used when unset
    pub fps: Option<u32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("renders"),
            format: RenderFormat::default(),
            quality: RenderQuality::default(),
            fps: None,
        }
    }
}

/// Work handed to a backend after validation passed
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Snapshot of the template being rendered
    pub template: Template,
    /// Resolved value per placeholder id (data value or default)
    pub values: TemplateData,
    /// Render settings
    pub config: RenderConfig,
    /// Where the output should be written
    pub output_path: PathBuf,
}

impl RenderJob {
    /// Frames to produce at the effective frame rate
    pub fn frame_count(&self) -> u64 {
        let fps = self.config.fps.unwrap_or(self.template.fps);
        (self.template.duration.max(0.0) * fps as f64).round() as u64
    }
}

/// Outcome of one render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    /// Whether an output was produced
    pub success: bool,
    /// Output file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Wall-clock render time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// Frames produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<u64>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderResult {
    /// Creates a successful result
    pub fn succeeded(output_path: PathBuf, duration_ms: f64, frames: u64) -> Self {
        Self {
            success: true,
            output_path: Some(output_path),
            duration_ms: Some(duration_ms),
            frames: Some(frames),
            error: None,
        }
    }

    /// Creates a failed result
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output_path: None,
            duration_ms: None,
            frames: None,
            error: Some(error.into()),
        }
    }
}

/// One entry of a batch render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub template_id: TemplateId,
    #[serde(default)]
    pub data: TemplateData,
    #[serde(default)]
    pub config: RenderConfig,
}

impl RenderRequest {
    /// Creates a request with default render settings
    pub fn new(template_id: impl Into<TemplateId>, data: TemplateData) -> Self {
        Self {
            template_id: template_id.into(),
            data,
            config: RenderConfig::default(),
        }
    }
}

/// Running render statistics.
///
/// Only renders that passed validation are counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStatistics {
    /// Renders handed to the backend
    pub total_renders: u64,
    /// Renders the backend reported as failed
    pub failed_renders: u64,
    /// Running mean of render time in milliseconds
    pub average_render_time_ms: f64,
}

impl RenderStatistics {
    /// Folds one attempted render into the running mean
    pub fn record(&mut self, duration_ms: f64, success: bool) {
        self.total_renders += 1;
        if !success {
            self.failed_renders += 1;
        }
        let n = self.total_renders as f64;
        self.average_render_time_ms += (duration_ms - self.average_render_time_ms) / n;
    }
}

/// Produces the output for a validated render job
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Returns the backend name for logging
    fn name(&self) -> &str;

    /// Renders the job and returns the written output path
    async fn render(&self, job: &RenderJob) -> CoreResult<PathBuf>;
}

/// Backend that writes nothing and reports the planned output path
#[derive(Debug, Clone, Default)]
pub struct MockRenderBackend {
    /// Simulated work per render
    pub delay: Duration,
}

impl MockRenderBackend {
    /// Creates a backend that returns immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that sleeps for `delay` per render
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl RenderBackend for MockRenderBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render(&self, job: &RenderJob) -> CoreResult<PathBuf> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tracing::debug!(
            template_id = %job.template.id,
            frames = job.frame_count(),
            "mock render"
        );
        Ok(job.output_path.clone())
    }
}
