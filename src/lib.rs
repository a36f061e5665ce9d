use image::{ DynamicImage, Rgb, RgbImage };
use imageproc::{ drawing, rect };
use rusttype::{ Font, Scale };
use tracing::{ debug, info, warn };

use std::fs;
use std::path::Path;

pub mod config;
pub mod detect;
pub mod error;
pub mod image_process;
pub mod ocr;
pub mod region;
pub mod select;
pub mod utils;

pub use config::{ DetectorConfig, PipelineConfig, TesseractConfig };
pub use detect::{ BoundingBox, PlateCandidate, PlateDetector };
pub use error::{ LprError, LprErrorKind };
pub use ocr::{ OcrEngine, Tesseract, TextExtractor };
pub use region::RegionLabel;
pub use select::{ CandidateSelector, ClosestAspect, FirstCandidate, LargestArea };

const NO_PLATE: &str = "No plate detected";
const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 2;
const LABEL_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const LABEL_SCALE: f32 = 24.0;
const FONT_DATA: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

/// Outcome of one `analyze` call.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Trimmed OCR text, empty when nothing was read
    pub text: String,
    pub region: RegionLabel,
    /// `None` when no plate-shaped region was found
    pub bbox: Option<BoundingBox>,
    /// Copy of the input with the box and region name drawn on it
    pub annotated: RgbImage,
}

impl DetectionResult {
    pub fn is_detected(&self) -> bool {
        self.bbox.is_some()
    }

    /// `"Plate: <text> | State: <region>"`, or `"No plate detected"`.
    pub fn summary(&self) -> String {
        match self.bbox {
            Some(_) => format!("Plate: {} | State: {}", self.text, self.region),
            None => NO_PLATE.to_string(),
        }
    }
}

pub struct Lpr {
    detector: PlateDetector,
    extractor: TextExtractor,
    selector: Box<dyn CandidateSelector>,
    font: Option<Font<'static>>,
}

impl Lpr {

    pub fn new(config: DetectorConfig, engine: impl OcrEngine + 'static) -> Self {
        Lpr {
            detector: PlateDetector::new(config),
            extractor: TextExtractor::new(engine),
            selector: Box::new(FirstCandidate),
            font: Font::try_from_bytes(FONT_DATA),
        }
    }

    /// Build with tesseract resolved now, so a missing binary fails here
    /// rather than on the first image.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, LprError> {
        config.detector.validate()?;
        let tesseract = Tesseract::locate(&config.tesseract)?;
        let mut lpr = Self::new(config.detector.clone(), tesseract);
        if let Some(font_path) = &config.font_path {
            lpr = lpr.with_font_file(font_path)?;
        }
        Ok(lpr)
    }

    pub fn with_selector(mut self, selector: impl CandidateSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn with_font(mut self, font: Font<'static>) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_font_file(self, path: impl AsRef<Path>) -> Result<Self, LprError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let font = Font::try_from_vec(data).ok_or_else(|| LprErrorKind::InvalidFont(path.to_path_buf()))?;
        Ok(self.with_font(font))
    }

    pub fn detector(&self) -> &PlateDetector {
        &self.detector
    }

    /// Load a jpeg/png and analyze it.
    pub fn analyze_path(&self, path: impl AsRef<Path>) -> Result<DetectionResult, LprError> {
        let img = utils::load_image(path)?;
        self.analyze(&img)
    }

    /// Find a plate, read it and resolve its region.
    ///
    /// Only a malformed image is an error. OCR failures leave the box drawn
    /// with empty text and an `Unknown` region.
    pub fn analyze(&self, img: &DynamicImage) -> Result<DetectionResult, LprError> {
        let candidates = self.detector.detect(img)?;
        let mut annotated = img.to_rgb8();

        let candidate = match self.selector.select(&candidates).and_then(|i| candidates.get(i)) {
            Some(candidate) => candidate,
            None => {
                info!("{}", NO_PLATE);
                return Ok(DetectionResult {
                    text: String::new(),
                    region: RegionLabel::Unknown,
                    bbox: None,
                    annotated,
                });
            }
        };
        let bbox = candidate.bbox;
        debug!(?bbox, area = candidate.area, "selected candidate");
        self.draw_box(&mut annotated, bbox);

        let text = match self.extractor.extract_text(candidate.image(), bbox) {
            Ok(text) => text,
            Err(e) if e.is_recoverable() => {
                warn!("no text extracted: {}", e);
                String::new()
            }
            Err(e) => return Err(e),
        };
        let region = region::resolve(&text);
        self.draw_label(&mut annotated, bbox, region);

        let result = DetectionResult { text, region, bbox: Some(bbox), annotated };
        info!("{}", result.summary());
        Ok(result)
    }

    fn draw_box(&self, canvas: &mut RgbImage, bbox: BoundingBox) {
        for i in 0..BOX_THICKNESS {
            let (x, y) = (bbox.x as i32 - i as i32, bbox.y as i32 - i as i32);
            let r = rect::Rect::at(x, y).of_size(bbox.width + 2*i, bbox.height + 2*i);
            drawing::draw_hollow_rect_mut(canvas, r, BOX_COLOR);
        }
    }

    fn draw_label(&self, canvas: &mut RgbImage, bbox: BoundingBox, region: RegionLabel) {
        let font = match &self.font {
            Some(font) => font,
            None => return,
        };
        let (_, height) = canvas.dimensions();
        let text_height = LABEL_SCALE as u32;
        // above the box when there is room, otherwise just inside it
        let y = if bbox.y >= text_height + BOX_THICKNESS {
            bbox.y - text_height - BOX_THICKNESS
        } else {
            bbox.y.min(height.saturating_sub(1))
        };
        let scale = Scale::uniform(LABEL_SCALE);
        drawing::draw_text_mut(canvas, LABEL_COLOR, bbox.x, y, scale, font, region.name());
    }
}
