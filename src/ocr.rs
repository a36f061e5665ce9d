//! Plate text extraction on top of an external single-line OCR engine.

use image::{ DynamicImage, GenericImageView, GrayImage };
use imageproc::contrast;
use tempfile::Builder;
use tracing::debug;

use std::env;
use std::path::{ Path, PathBuf };
use std::process::Command;

use crate::config::TesseractConfig;
use crate::detect::BoundingBox;
use crate::error::LprError;

const TESSERACT_ENV: &str = "TESSERACT_CMD";
// tesseract page segmentation mode: treat the image as a single text line
const PSM_SINGLE_LINE: &str = "7";

/// Reads one line of text from a binary image.
pub trait OcrEngine {
    fn recognize_line(&self, line: &GrayImage) -> Result<String, LprError>;
}

/// The `tesseract` command line program.
#[derive(Debug, Clone)]
pub struct Tesseract {
    executable: PathBuf,
    language: String,
}

impl Tesseract {
    /// Probe `executable` with `--version`, failing fast when it can not run.
    pub fn new(executable: impl AsRef<Path>, language: impl Into<String>) -> Result<Self, LprError> {
        let executable = executable.as_ref().to_path_buf();
        let output = Command::new(&executable).arg("--version").output().map_err(|e| {
            LprError::ocr_unavailable(format!("can not run {:?}: {}", executable, e))
        })?;
        if !output.status.success() {
            return Err(LprError::ocr_unavailable(format!("{:?} --version exited with {}", executable, output.status)));
        }
        debug!(executable = ?executable, "tesseract found");
        Ok(Self { executable, language: language.into() })
    }

    /// Resolve the binary from config, then `TESSERACT_CMD`, then PATH.
    pub fn locate(config: &TesseractConfig) -> Result<Self, LprError> {
        let executable = config.executable.clone()
            .or_else(|| env::var_os(TESSERACT_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("tesseract"));
        Self::new(executable, config.language.clone())
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl OcrEngine for Tesseract {
    fn recognize_line(&self, line: &GrayImage) -> Result<String, LprError> {
        let input = Builder::new().prefix("lpr-plate-").suffix(".png").tempfile()
            .map_err(|e| LprError::ocr_unavailable(format!("can not create temp file: {}", e)))?;
        line.save(input.path())
            .map_err(|e| LprError::ocr_unavailable(format!("can not write ocr input: {}", e)))?;

        let output = Command::new(&self.executable)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(PSM_SINGLE_LINE)
            .output()
            .map_err(|e| LprError::ocr_unavailable(format!("can not run {:?}: {}", self.executable, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LprError::ocr_unavailable(format!("tesseract failed: {}", stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Crops a candidate out of the source image, binarizes it and reads it.
pub struct TextExtractor {
    engine: Box<dyn OcrEngine>,
}

impl TextExtractor {
    pub fn new(engine: impl OcrEngine + 'static) -> Self {
        Self { engine: Box::new(engine) }
    }

    /// Trimmed text inside `bbox`, possibly empty.
    pub fn extract_text(&self, img: &DynamicImage, bbox: BoundingBox) -> Result<String, LprError> {
        let binary = binarize_region(img, bbox)?;
        let raw = self.engine.recognize_line(&binary)?;
        Ok(raw.trim().to_string())
    }
}

/// Grayscale crop thresholded at its Otsu level.
pub fn binarize_region(img: &DynamicImage, bbox: BoundingBox) -> Result<GrayImage, LprError> {
    let (width, height) = img.dimensions();
    if !bbox.fits_within(width, height) {
        return Err(LprError::invalid_input(format!("{:?} is outside the {}x{} image", bbox, width, height)));
    }
    let roi = img.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height).to_luma8();
    let level = contrast::otsu_level(&roi);
    debug!("otsu level of plate crop: {}", level);
    Ok(contrast::threshold(&roi, level))
}


#[cfg(test)]
mod test {

    use image::{ DynamicImage, GrayImage, Luma, Rgb, RgbImage };
    use imageproc::{ drawing, rect::Rect };

    use super::*;
    use crate::config::TesseractConfig;
    use crate::error::{ LprError, LprErrorKind };
    use crate::utils::is_binary;

    struct Echo(&'static str);

    impl OcrEngine for Echo {
        fn recognize_line(&self, line: &GrayImage) -> Result<String, LprError> {
            assert!(is_binary(line));
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    impl OcrEngine for Broken {
        fn recognize_line(&self, _: &GrayImage) -> Result<String, LprError> {
            Err(LprError::ocr_unavailable("engine offline"))
        }
    }

    fn plate() -> DynamicImage {
        let mut img = RgbImage::from_pixel(100, 60, Rgb([230, 230, 230]));
        drawing::draw_filled_rect_mut(&mut img, Rect::at(20, 20).of_size(12, 20), Rgb([15, 15, 15]));
        drawing::draw_filled_rect_mut(&mut img, Rect::at(40, 20).of_size(12, 20), Rgb([15, 15, 15]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn crop_is_binarized_at_otsu_level() {
        let bin = binarize_region(&plate(), BoundingBox::new(10, 10, 60, 40)).unwrap();
        assert_eq!(bin.dimensions(), (60, 40));
        assert!(is_binary(&bin));
        assert_eq!(*bin.get_pixel(0, 0), Luma([255]));
        assert_eq!(*bin.get_pixel(15, 15), Luma([0]));
    }

    #[test]
    fn text_is_trimmed() {
        let extractor = TextExtractor::new(Echo("  WXY 1234\n\n"));
        let text = extractor.extract_text(&plate(), BoundingBox::new(10, 10, 60, 40)).unwrap();
        assert_eq!(text, "WXY 1234");
    }

    #[test]
    fn whitespace_only_output_is_empty_text() {
        let extractor = TextExtractor::new(Echo(" \n\x0c"));
        assert_eq!(extractor.extract_text(&plate(), BoundingBox::new(0, 0, 100, 60)).unwrap(), "");
    }

    #[test]
    fn engine_failure_is_ocr_unavailable() {
        let extractor = TextExtractor::new(Broken);
        let err = extractor.extract_text(&plate(), BoundingBox::new(10, 10, 60, 40)).unwrap_err();
        assert!(matches!(err.kind(), LprErrorKind::OcrUnavailable(_)));
    }

    #[test]
    fn box_outside_image_is_invalid() {
        let extractor = TextExtractor::new(Broken);
        let err = extractor.extract_text(&plate(), BoundingBox::new(80, 10, 60, 40)).unwrap_err();
        assert!(matches!(err.kind(), LprErrorKind::InvalidInput(_)));
    }

    #[test]
    fn overflowing_box_is_invalid() {
        let extractor = TextExtractor::new(Broken);
        let err = extractor.extract_text(&plate(), BoundingBox::new(u32::MAX - 5, 0, 10, 10)).unwrap_err();
        assert!(matches!(err.kind(), LprErrorKind::InvalidInput(_)));
        let err = extractor.extract_text(&plate(), BoundingBox::new(0, u32::MAX, 10, 1)).unwrap_err();
        assert!(matches!(err.kind(), LprErrorKind::InvalidInput(_)));
    }

    #[test]
    fn missing_binary_fails_fast() {
        let config = TesseractConfig {
            executable: Some("/nonexistent/bin/tesseract".into()),
            ..Default::default()
        };
        let err = Tesseract::locate(&config).unwrap_err();
        assert!(matches!(err.kind(), LprErrorKind::OcrUnavailable(_)));
    }

    #[test]
    #[ignore = "needs a tesseract install"]
    fn tesseract_reads_blank_line() {
        let tesseract = Tesseract::locate(&TesseractConfig::default()).unwrap();
        let blank = GrayImage::from_pixel(120, 40, Luma([255]));
        let text = tesseract.recognize_line(&blank).unwrap();
        assert!(text.trim().is_empty());
    }
}
