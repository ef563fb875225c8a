//! Pipeline configuration

use crate::batch::CollisionPolicy;
use crate::LoadError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use template::{QrStyle, RenderOptions, MIN_QR_SIZE_PX};

/// Settings shared by batch, preview and single runs
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Batch worker threads; `None` uses the available parallelism
    pub workers: Option<usize>,
    /// Per-asset decode timeout in milliseconds
    pub decode_timeout_ms: u64,
    /// Base resolution of previews before zoom
    pub preview_dpi: f32,
    pub qr_style: QrStyle,
    pub qr_size_px: u32,
    pub collision_policy: CollisionPolicy,
    /// Directory searched first for raster fonts
    pub font_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let render = RenderOptions::default();
        Self {
            workers: None,
            decode_timeout_ms: 10_000,
            preview_dpi: 100.0,
            qr_style: render.qr_style,
            qr_size_px: render.qr_size_px,
            collision_policy: CollisionPolicy::default(),
            font_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject values no run could use
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.qr_size_px < MIN_QR_SIZE_PX {
            return Err(LoadError::Invalid(format!(
                "qr_size_px must be at least {MIN_QR_SIZE_PX}, got {}",
                self.qr_size_px
            )));
        }
        if !self.preview_dpi.is_finite() || self.preview_dpi <= 0.0 {
            return Err(LoadError::Invalid(format!(
                "preview_dpi must be a positive number, got {}",
                self.preview_dpi
            )));
        }
        Ok(())
    }

    pub fn decode_timeout(&self) -> Duration {
        Duration::from_millis(self.decode_timeout_ms)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            qr_style: self.qr_style,
            qr_size_px: self.qr_size_px,
        }
    }

    /// Worker count actually used, never zero
    pub fn worker_count(&self) -> usize {
        self.workers.filter(|n| *n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(
            PipelineConfig::from_json_str("{}").unwrap(),
            PipelineConfig::default()
        );
    }

    #[test]
    fn test_partial_config() {
        let config = PipelineConfig::from_json_str(
            r#"{ "workers": 2, "qr_style": "square", "collision_policy": "suffix" }"#,
        )
        .unwrap();
        assert_eq!(config.worker_count(), 2);
        assert_eq!(config.qr_style, QrStyle::Square);
        assert_eq!(config.collision_policy, CollisionPolicy::Suffix);
        assert_eq!(config.decode_timeout(), Duration::from_secs(10));
        assert_eq!(config.preview_dpi, 100.0);
    }

    #[test]
    fn test_zero_workers_falls_back() {
        let config = PipelineConfig {
            workers: Some(0),
            ..PipelineConfig::default()
        };
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_undersized_qr_is_rejected() {
        let err = PipelineConfig::from_json_str(r#"{ "qr_size_px": 0 }"#).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
        assert!(PipelineConfig::from_json_str(r#"{ "qr_size_px": 60 }"#).is_err());
        assert!(PipelineConfig::from_json_str(r#"{ "qr_size_px": 160 }"#).is_ok());
    }

    #[test]
    fn test_non_positive_dpi_is_rejected() {
        let err = PipelineConfig::from_json_str(r#"{ "preview_dpi": 0 }"#).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
        assert!(PipelineConfig::from_json_str(r#"{ "preview_dpi": -50.0 }"#).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        assert!(PipelineConfig::from_json_str(r#"{ "qr_style": "dots" }"#).is_err());
    }
}
