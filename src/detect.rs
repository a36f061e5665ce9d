//! Plate-shaped region search over the contour tree of an edge map.

use image::{ DynamicImage, GenericImageView };
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DetectorConfig;
use crate::error::LprError;
use crate::image_process;

/// Pixel rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.x <= other.x && self.y <= other.y
            && self.right() >= other.right() && self.bottom() >= other.bottom()
    }

    /// Non-empty and fully inside a `width`×`height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0 && self.height > 0
            && self.x.checked_add(self.width).map_or(false, |r| r <= width)
            && self.y.checked_add(self.height).map_or(false, |b| b <= height)
    }
}

impl From<[u32; 4]> for BoundingBox {
    fn from([x, y, width, height]: [u32; 4]) -> Self {
        Self { x, y, width, height }
    }
}

/// A plate-shaped box and the image it was found in.
#[derive(Debug, Clone, Copy)]
pub struct PlateCandidate<'a> {
    pub bbox: BoundingBox,
    pub area: f64,
    image: &'a DynamicImage,
}

impl<'a> PlateCandidate<'a> {
    pub fn image(&self) -> &'a DynamicImage {
        self.image
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.bbox.aspect_ratio()
    }
}

pub struct PlateDetector {
    config: DetectorConfig,
}

impl Default for PlateDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl PlateDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Candidates in contour discovery order; an empty vec means no plate.
    ///
    /// With `suppress_nested` on (the default) the output is de-duplicated:
    /// a contour nested with an earlier candidate's box is dropped.
    pub fn detect<'a>(&self, img: &'a DynamicImage) -> Result<Vec<PlateCandidate<'a>>, LprError> {
        let config = &self.config;
        let binary = image_process::preprocess(img, config)?;
        let edges = image_process::edge_map(&binary, config);
        let contours = image_process::find_contours(&edges);
        let (width, height) = img.dimensions();

        let mut candidates: Vec<PlateCandidate<'a>> = Vec::new();
        for points in &contours {
            let bbox: BoundingBox = match image_process::bounding_rect(points) {
                Some(rect) => rect.into(),
                None => continue,
            };
            if !bbox.fits_within(width, height) {
                continue;
            }
            let area = image_process::contour_area(points);
            if !self.is_plate_shaped(&bbox, area) {
                continue;
            }
            if config.suppress_nested && candidates.iter().any(|c| c.bbox.contains(&bbox) || bbox.contains(&c.bbox)) {
                continue;
            }
            candidates.push(PlateCandidate { bbox, area, image: img });
        }
        debug!(contours = contours.len(), candidates = candidates.len(), "plate candidates");
        Ok(candidates)
    }

    fn is_plate_shaped(&self, bbox: &BoundingBox, area: f64) -> bool {
        let config = &self.config;
        let aspect_ratio = bbox.aspect_ratio();
        config.min_aspect_ratio < aspect_ratio && aspect_ratio < config.max_aspect_ratio
            && config.min_area < area && area < config.max_area
    }
}
