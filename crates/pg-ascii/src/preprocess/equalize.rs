use pg_core::error::CoreError;
use pg_core::frame::Image;

use super::{luma_histogram, map_luma};

/// Global histogram equalization of the luma channel.
///
/// Chroma and alpha are kept. An image with a single luma value is returned
/// unchanged.
///
/// # Errors
/// [`CoreError::InvalidImage`] on a zero-sized image.
///
/// # Example
/// ```
/// use pg_ascii::preprocess::equalize;
/// use pg_core::frame::Image;
///
/// let mut img = Image::filled(2, 1, [60, 60, 60, 255]);
/// img.data[4..8].copy_from_slice(&[90, 90, 90, 255]);
/// let out = equalize(&img).unwrap();
/// assert_eq!(out.pixel(0, 0), (0, 0, 0, 255));
/// assert_eq!(out.pixel(1, 0), (255, 255, 255, 255));
/// ```
pub fn equalize(image: &Image) -> Result<Image, CoreError> {
    image.validate()?;
    let lut = equalization_lut(&luma_histogram(image));
    Ok(map_luma(image, |_, _, luma| lut[luma as usize]))
}

/// `lut[v] = round((cdf(v) - cdf_min) * 255 / (total - cdf_min))`.
pub(crate) fn equalization_lut(hist: &[u32; 256]) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (v, slot) in lut.iter_mut().enumerate() {
        *slot = v as u8;
    }

    let total: u64 = hist.iter().map(|&c| u64::from(c)).sum();
    let Some(first) = hist.iter().position(|&c| c > 0) else {
        return lut;
    };
    let cdf_min = u64::from(hist[first]);
    if total == cdf_min {
        // Une seule valeur : identité.
        return lut;
    }

    let scale = 255.0 / (total - cdf_min) as f64;
    let mut cdf = 0u64;
    for (slot, &count) in lut.iter_mut().zip(hist.iter()) {
        cdf += u64::from(count);
        *slot = (cdf.saturating_sub(cdf_min) as f64 * scale)
            .round()
            .clamp(0.0, 255.0) as u8;
    }
    lut
}
