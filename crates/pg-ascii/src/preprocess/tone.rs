use pg_core::error::CoreError;
use pg_core::frame::Image;

use super::{luma_histogram, map_channels};

/// Rescale R, G and B so the luma percentiles `low_pct` / `high_pct` map to 0 / 255.
///
/// Values outside the percentile window are clipped. If both percentiles
/// land on the same value the image is returned unchanged.
///
/// # Errors
/// [`CoreError::InvalidImage`] on a zero-sized image,
/// [`CoreError::PreprocessingFailure`] unless `0 ≤ low_pct < high_pct ≤ 100`.
///
/// # Example
/// ```
/// use pg_ascii::preprocess::contrast_stretch;
/// use pg_core::frame::Image;
///
/// let mut img = Image::filled(2, 1, [100, 100, 100, 255]);
/// img.data[4..8].copy_from_slice(&[150, 150, 150, 255]);
/// let out = contrast_stretch(&img, 0.0, 100.0).unwrap();
/// assert_eq!(out.pixel(0, 0), (0, 0, 0, 255));
/// assert_eq!(out.pixel(1, 0), (255, 255, 255, 255));
/// ```
pub fn contrast_stretch(image: &Image, low_pct: f32, high_pct: f32) -> Result<Image, CoreError> {
    image.validate()?;
    if !(low_pct >= 0.0 && low_pct < high_pct && high_pct <= 100.0) {
        return Err(CoreError::preprocessing(format!(
            "percentiles {low_pct}–{high_pct} hors de 0 ≤ bas < haut ≤ 100"
        )));
    }

    let hist = luma_histogram(image);
    let low = percentile(&hist, low_pct);
    let high = percentile(&hist, high_pct);
    if high <= low {
        return Ok(image.clone());
    }

    let span = f32::from(high - low);
    let mut lut = [0u8; 256];
    for (v, slot) in lut.iter_mut().enumerate() {
        let scaled = (v as f32 - f32::from(low)) * 255.0 / span;
        *slot = scaled.round().clamp(0.0, 255.0) as u8;
    }
    Ok(map_channels(image, &lut))
}

/// Power-law lookup: `255 * (v / 255)^(1 / gamma)` on R, G and B.
///
/// # Errors
/// [`CoreError::InvalidImage`] on a zero-sized image,
/// [`CoreError::PreprocessingFailure`] if `gamma` is not a positive finite number.
///
/// # Example
/// ```
/// use pg_ascii::preprocess::gamma_correct;
/// use pg_core::frame::Image;
///
/// let img = Image::filled(1, 1, [128, 0, 255, 7]);
/// let out = gamma_correct(&img, 2.2).unwrap();
/// assert_eq!(out.pixel(0, 0), (186, 0, 255, 7));
/// ```
pub fn gamma_correct(image: &Image, gamma: f32) -> Result<Image, CoreError> {
    image.validate()?;
    if !(gamma.is_finite() && gamma > 0.0) {
        return Err(CoreError::preprocessing(format!("gamma {gamma} (doit être > 0)")));
    }
    let inv = 1.0 / f64::from(gamma);
    let mut lut = [0u8; 256];
    for (v, slot) in lut.iter_mut().enumerate() {
        *slot = (255.0 * (v as f64 / 255.0).powf(inv)).round().clamp(0.0, 255.0) as u8;
    }
    Ok(map_channels(image, &lut))
}

/// Smallest luma value whose cumulative share reaches `pct` percent.
fn percentile(hist: &[u32; 256], pct: f32) -> u8 {
    let total: u64 = hist.iter().map(|&c| u64::from(c)).sum();
    let target = ((f64::from(pct) / 100.0 * total as f64).ceil() as u64).max(1);
    let mut cumulative = 0u64;
    for (v, &count) in hist.iter().enumerate() {
        cumulative += u64::from(count);
        if cumulative >= target {
            return v as u8;
        }
    }
    255
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Image {
        // 100 pixels gris 50..149.
        let mut img = Image::new(100, 1);
        for (i, px) in img.data.chunks_exact_mut(4).enumerate() {
            let v = 50 + i as u8;
            px.copy_from_slice(&[v, v, v, 255]);
        }
        img
    }

    #[test]
    fn percentiles_on_a_ramp() {
        let hist = luma_histogram(&ramp());
        assert_eq!(percentile(&hist, 0.0), 50);
        assert_eq!(percentile(&hist, 2.0), 51);
        assert_eq!(percentile(&hist, 98.0), 147);
        assert_eq!(percentile(&hist, 100.0), 149);
    }

    #[test]
    fn stretch_clips_outliers() {
        let out = contrast_stretch(&ramp(), 2.0, 98.0).unwrap();
        assert_eq!(out.pixel(0, 0).0, 0);
        assert_eq!(out.pixel(99, 0).0, 255);
        assert_eq!(out.pixel(98, 0).0, 255);
    }

    #[test]
    fn stretch_of_flat_image_is_identity() {
        let img = Image::filled(3, 3, [77, 77, 77, 255]);
        assert_eq!(contrast_stretch(&img, 2.0, 98.0).unwrap(), img);
    }

    #[test]
    fn stretch_rejects_inverted_window() {
        assert!(matches!(
            contrast_stretch(&ramp(), 60.0, 40.0),
            Err(CoreError::PreprocessingFailure(_))
        ));
    }

    #[test]
    fn gamma_one_is_identity_and_endpoints_fixed() {
        let img = ramp();
        assert_eq!(gamma_correct(&img, 1.0).unwrap(), img);
        let bright = gamma_correct(&Image::filled(1, 1, [0, 255, 64, 255]), 0.5).unwrap();
        assert_eq!(bright.pixel(0, 0), (0, 255, 16, 255));
    }

    #[test]
    fn gamma_rejects_non_positive() {
        assert!(gamma_correct(&ramp(), 0.0).is_err());
        assert!(gamma_correct(&ramp(), f32::NAN).is_err());
    }
}
