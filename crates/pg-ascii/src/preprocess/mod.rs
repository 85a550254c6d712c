//! Transformations image → image appliquées avant le découpage en tuiles.
//!
//! Every transform is pure: it reads the input image and returns a new one.
//! Luma-based steps work on the Y channel of full-range YCbCr and leave
//! chroma and alpha untouched.

pub mod clahe;
pub mod equalize;
pub mod tone;

use pg_core::color::{luma_u8, shift_luma};
use pg_core::config::PreprocessConfig;
use pg_core::error::CoreError;
use pg_core::frame::Image;
use rayon::prelude::*;

pub use clahe::adaptive_equalize;
pub use equalize::equalize;
pub use tone::{contrast_stretch, gamma_correct};

/// Chains the enabled preprocessing steps in a fixed order.
///
/// # Example
/// ```
/// use pg_ascii::preprocess::Preprocessor;
/// use pg_core::config::PreprocessConfig;
/// use pg_core::frame::Image;
///
/// let config = PreprocessConfig { adaptive_equalize: false, ..PreprocessConfig::default() };
/// let pre = Preprocessor::new(config);
/// let img = Image::filled(4, 4, [10, 20, 30, 255]);
/// assert_eq!(pre.apply(&img).unwrap(), img);
/// ```
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    #[must_use]
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Run equalize → adaptive_equalize → contrast_stretch → gamma_correct,
    /// skipping disabled steps.
    ///
    /// # Errors
    /// [`CoreError::InvalidImage`] on a malformed image,
    /// [`CoreError::PreprocessingFailure`] on invalid step parameters.
    pub fn apply(&self, image: &Image) -> Result<Image, CoreError> {
        image.validate()?;
        let c = &self.config;
        let mut current = image.clone();
        if c.equalize {
            current = equalize(&current)?;
            log::debug!("Égalisation globale appliquée");
        }
        if c.adaptive_equalize {
            current = adaptive_equalize(&current, c.clip_limit, c.clahe_grid)?;
            log::debug!("CLAHE appliqué (clip {}, grille {})", c.clip_limit, c.clahe_grid);
        }
        if c.contrast_stretch {
            current = contrast_stretch(&current, c.stretch_low, c.stretch_high)?;
            log::debug!("Étirement {}–{} %", c.stretch_low, c.stretch_high);
        }
        if c.gamma_correct {
            current = gamma_correct(&current, c.gamma)?;
            log::debug!("Gamma {}", c.gamma);
        }
        Ok(current)
    }
}

/// Histogramme 256 classes de la luma 8 bits.
pub(crate) fn luma_histogram(image: &Image) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for px in image.data.chunks_exact(4) {
        hist[luma_u8(px[0], px[1], px[2]) as usize] += 1;
    }
    hist
}

/// Rebuild an image whose luma at `(x, y)` becomes `remap(x, y, luma)`.
pub(crate) fn map_luma<F>(image: &Image, remap: F) -> Image
where
    F: Fn(u32, u32, u8) -> u8 + Sync,
{
    let mut out = image.clone();
    let stride = image.width as usize * 4;
    out.data
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let luma = luma_u8(px[0], px[1], px[2]);
                let target = remap(x as u32, y as u32, luma);
                let delta = i16::from(target) - i16::from(luma);
                if delta != 0 {
                    let (r, g, b) = shift_luma(px[0], px[1], px[2], delta);
                    px[0] = r;
                    px[1] = g;
                    px[2] = b;
                }
            }
        });
    out
}

/// Apply one lookup table to R, G and B; alpha untouched.
pub(crate) fn map_channels(image: &Image, lut: &[u8; 256]) -> Image {
    let mut out = image.clone();
    out.data.par_chunks_mut(4).for_each(|px| {
        px[0] = lut[px[0] as usize];
        px[1] = lut[px[1] as usize];
        px[2] = lut[px[2] as usize];
    });
    out
}
