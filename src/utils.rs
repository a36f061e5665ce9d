use image::{ DynamicImage, GrayImage, ImageBuffer, Luma };
use imageproc::filter;

use std::path::Path;

use crate::error::LprError;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Load a JPEG or PNG from disk.
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, LprError> {
    let path = path.as_ref();
    if !is_supported_image(path) {
        return Err(LprError::invalid_input(format!("{:?} is not a jpeg or png file", path)));
    }
    Ok(image::open(path)?)
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// 1-D gaussian taps, sigma derived from the kernel size.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1) as usize;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f32;
    let mut kernel: Vec<f32> = (0..size).map(|i| {
        let d = i as f32 - center;
        (-(d * d) / (2.0 * sigma * sigma)).exp()
    }).collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|v| *v /= sum);
    kernel
}

/// Gaussian smoothing with a fixed `size`×`size` kernel, borders replicated.
pub fn gaussian_blur(img: &GrayImage, size: u32) -> GrayImage {
    let kernel = gaussian_kernel(size);
    filter::separable_filter_equal(img, &kernel)
}

/// Global histogram equalization, cdf normalised against its first non-zero bin.
pub fn equalize_hist_in_gray(img: &GrayImage) -> GrayImage {
    let mut vec = img.to_vec();
    let len = vec.len();

    // 分布函数
    let mut df = [0usize; 256];
    for v in &vec {
        df[*v as usize] += 1;
    }
    // cdf
    let mut temp = df[0];
    df.iter_mut().skip(1).for_each(|v| {
        *v += temp;
        temp = *v;
    });
    let cdf_min = match df.iter().find(|v| **v != 0) {
        Some(v) => *v,
        None => return img.clone(),
    };
    // a single grey level has nothing to stretch
    if len == cdf_min {
        return img.clone();
    }
    vec.iter_mut().for_each(|v| {
        let x = df[*v as usize] - cdf_min;
        let y = len - cdf_min;
        *v = ((x as f32/y as f32)*255.0).round() as u8;
    });
    ImageBuffer::from_raw(img.width(), img.height(), vec).unwrap_or_else(|| img.clone())
}

/// Binarize against a gaussian-weighted local mean: `pixel > mean - offset` → 255.
pub fn adaptive_threshold_gaussian(img: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let local_mean = gaussian_blur(img, block_size);
    let mut out = GrayImage::new(img.width(), img.height());
    out.pixels_mut().zip(img.pixels().zip(local_mean.pixels())).for_each(|(o, (p, m))| {
        let threshold = m.0[0] as i32 - offset;
        *o = if p.0[0] as i32 > threshold { Luma([255]) } else { Luma([0]) };
    });
    out
}

pub fn is_binary(img: &GrayImage) -> bool {
    img.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255)
}
