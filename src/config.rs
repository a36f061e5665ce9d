//! Tunable parameters for plate detection and text extraction.
//!
//! Every threshold here is an empirical constant tied to an assumed capture
//! distance and resolution. Recalibrate per deployment by editing a JSON file
//! and loading it with [`PipelineConfig::from_json_file`].

use serde::{Deserialize, Serialize};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LprError;

/// Geometric and filtering constants of the preprocessor and candidate detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Taps of the gaussian smoothing kernel (odd)
    pub blur_kernel_size: u32,
    /// Side of the gaussian neighbourhood used by the adaptive threshold (odd)
    pub adaptive_block_size: u32,
    /// Subtracted from the local mean before comparing
    pub adaptive_offset: i32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Exclusive bounds on width / height
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    /// Exclusive bounds on enclosed contour area, in pixels²
    pub min_area: f64,
    pub max_area: f64,
    /// Drop a passing contour whose box nests with an already retained one
    pub suppress_nested: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: 5,
            adaptive_block_size: 11,
            adaptive_offset: 2,
            canny_low: 100.0,
            canny_high: 200.0,
            min_aspect_ratio: 2.0,
            max_aspect_ratio: 6.0,
            min_area: 1000.0,
            max_area: 15000.0,
            suppress_nested: true,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), LprError> {
        if self.blur_kernel_size % 2 == 0 || self.adaptive_block_size % 2 == 0 {
            return Err(LprError::invalid_input(format!(
                "kernel sizes must be odd, got blur={} block={}",
                self.blur_kernel_size, self.adaptive_block_size
            )));
        }
        if self.canny_low > self.canny_high {
            return Err(LprError::invalid_input("canny low threshold above high threshold"));
        }
        if self.min_aspect_ratio >= self.max_aspect_ratio || self.min_area >= self.max_area {
            return Err(LprError::invalid_input("empty aspect ratio or area range"));
        }
        Ok(())
    }
}

/// Where to find the tesseract binary and which language data to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    /// Explicit binary; falls back to `TESSERACT_CMD`, then `tesseract` on PATH
    pub executable: Option<PathBuf>,
    pub language: String,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            executable: None,
            language: "eng".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub detector: DetectorConfig,
    pub tesseract: TesseractConfig,
    /// TrueType font for the region-name overlay, replaces the built-in one
    pub font_path: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LprError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.detector.validate()?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), LprError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}


#[cfg(test)]
mod test {

    use super::{DetectorConfig, PipelineConfig};

    #[test]
    fn defaults_are_the_calibrated_constants() {
        let config = DetectorConfig::default();
        assert_eq!(config.blur_kernel_size, 5);
        assert_eq!(config.adaptive_block_size, 11);
        assert_eq!(config.adaptive_offset, 2);
        assert_eq!((config.canny_low, config.canny_high), (100.0, 200.0));
        assert_eq!((config.min_aspect_ratio, config.max_aspect_ratio), (2.0, 6.0));
        assert_eq!((config.min_area, config.max_area), (1000.0, 15000.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn even_kernel_is_rejected() {
        let config = DetectorConfig { adaptive_block_size: 10, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "detector": { "min_area": 500.0 }, "tesseract": { "language": "msa" } }"#)
                .unwrap();
        assert_eq!(config.detector.min_area, 500.0);
        assert_eq!(config.detector.max_area, 15000.0);
        assert_eq!(config.tesseract.language, "msa");
        assert!(config.tesseract.executable.is_none());
        assert!(config.font_path.is_none());
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lpr.json");
        let mut config = PipelineConfig::default();
        config.detector.canny_low = 80.0;
        config.to_json_file(&path).unwrap();
        assert_eq!(PipelineConfig::from_json_file(&path).unwrap(), config);
    }
}
