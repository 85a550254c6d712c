//! Analyse d'une tuile : porte alpha, couleur moyenne, intensité → (glyphe, couleur).

use pg_core::charset::DensityMap;
use pg_core::color::{Rgb, Swatch, luma};
use pg_core::config::IntensityMode;
use pg_core::frame::Image;
use pg_core::traits::NearestColor;

use crate::tiler::Tile;

/// Mean alpha below which a tile is treated as empty.
pub const ALPHA_VISIBLE_MIN: f32 = 10.0;
/// Any pixel with alpha below this drops the tile color.
pub const ALPHA_COLOR_MIN: u8 = 128;
/// Côté du voisinage du seuil local.
pub const THRESHOLD_BLOCK: usize = 5;
/// Soustrait à la moyenne locale pondérée.
pub const THRESHOLD_OFFSET: f32 = 10.0;

/// Gaussian support: `sigma = (block - 1) / 6`, truncated at 4 sigma.
const GAUSS_RADIUS: usize = 3;

/// Turns one tile into a `(glyph, color)` cell.
///
/// Holds everything fixed for a run: density map, color matcher, intensity
/// strategy and the invert / alpha-weighting switches. Shared read-only
/// between rayon workers.
///
/// # Example
/// ```
/// use pg_ascii::analyzer::CellAnalyzer;
/// use pg_ascii::palette::TrueColor;
/// use pg_ascii::tiler::Tile;
/// use pg_core::charset::DensityMap;
/// use pg_core::config::IntensityMode;
/// use pg_core::frame::Image;
///
/// let map = DensityMap::new(" .:#").unwrap();
/// let analyzer = CellAnalyzer::new(map, Box::new(TrueColor), IntensityMode::MeanLuminance);
/// let img = Image::filled(2, 2, [255, 255, 255, 255]);
/// let (glyph, color) = analyzer.analyze(&img, Tile { x: 0, y: 0, width: 2, height: 2 });
/// assert_eq!(glyph, '#');
/// assert!(color.is_some());
/// ```
pub struct CellAnalyzer {
    density_map: DensityMap,
    matcher: Box<dyn NearestColor>,
    mode: IntensityMode,
    invert: bool,
    alpha_weighted: bool,
    kernel: [f32; 2 * GAUSS_RADIUS + 1],
}

impl CellAnalyzer {
    #[must_use]
    pub fn new(density_map: DensityMap, matcher: Box<dyn NearestColor>, mode: IntensityMode) -> Self {
        Self {
            density_map,
            matcher,
            mode,
            invert: false,
            alpha_weighted: false,
            kernel: gaussian_kernel(),
        }
    }

    /// Invert tile values (`255 - c`) before intensity and color.
    #[must_use]
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Scale mean-luminance intensity by the tile's mean alpha.
    #[must_use]
    pub fn with_alpha_weighting(mut self, alpha_weighted: bool) -> Self {
        self.alpha_weighted = alpha_weighted;
        self
    }

    #[must_use]
    pub fn density_map(&self) -> &DensityMap {
        &self.density_map
    }

    #[must_use]
    pub fn matcher(&self) -> &dyn NearestColor {
        self.matcher.as_ref()
    }

    /// Glyph and color for `tile` of `image`.
    ///
    /// `(' ', None)` when the tile's mean alpha is under [`ALPHA_VISIBLE_MIN`];
    /// color `None` when any pixel's alpha is under [`ALPHA_COLOR_MIN`].
    #[must_use]
    pub fn analyze(&self, image: &Image, tile: Tile) -> (char, Option<Swatch>) {
        let mut sums = [0u64; 4];
        let mut min_alpha = u8::MAX;
        for y in tile.y..tile.y + tile.height {
            let row = image.row(y);
            let span = &row[tile.x as usize * 4..(tile.x + tile.width) as usize * 4];
            for px in span.chunks_exact(4) {
                sums[0] += u64::from(px[0]);
                sums[1] += u64::from(px[1]);
                sums[2] += u64::from(px[2]);
                sums[3] += u64::from(px[3]);
                min_alpha = min_alpha.min(px[3]);
            }
        }
        let count = f64::from(tile.area().max(1));
        let mean = |s: u64| (s as f64 / count) as f32;
        let alpha = mean(sums[3]);
        if alpha < ALPHA_VISIBLE_MIN {
            return (' ', None);
        }

        let mut rgb = [mean(sums[0]), mean(sums[1]), mean(sums[2])];
        if self.invert {
            for c in &mut rgb {
                *c = 255.0 - *c;
            }
        }

        let intensity = match self.mode {
            IntensityMode::MeanLuminance => {
                let base = luma(rgb[0], rgb[1], rgb[2]) / 255.0;
                if self.alpha_weighted {
                    base * alpha / 255.0
                } else {
                    base
                }
            }
            IntensityMode::AdaptiveThreshold => self.threshold_density(image, tile),
        };
        let glyph = self.density_map.glyph(intensity);

        let color = (min_alpha >= ALPHA_COLOR_MIN).then(|| {
            let [r, g, b] = rgb.map(|c| c.round().clamp(0.0, 255.0) as u8);
            self.matcher.nearest(Rgb::new(r, g, b))
        });
        (glyph, color)
    }

    /// Fraction of tile pixels brighter than their local Gaussian threshold.
    fn threshold_density(&self, image: &Image, tile: Tile) -> f32 {
        let (w, h) = (tile.width as usize, tile.height as usize);
        let mut gray = Vec::with_capacity(w * h);
        for y in tile.y..tile.y + tile.height {
            for x in tile.x..tile.x + tile.width {
                let v = f32::from(image.luminance(x, y));
                gray.push(if self.invert { 255.0 - v } else { v });
            }
        }
        let local = gaussian_blur(&gray, w, h, &self.kernel);
        let on = gray
            .iter()
            .zip(&local)
            .filter(|&(&v, &m)| v > m - THRESHOLD_OFFSET)
            .count();
        on as f32 / gray.len().max(1) as f32
    }
}

/// Noyau gaussien 1D normalisé, sigma = (bloc - 1) / 6.
fn gaussian_kernel() -> [f32; 2 * GAUSS_RADIUS + 1] {
    let sigma = (THRESHOLD_BLOCK as f32 - 1.0) / 6.0;
    let mut kernel = [0f32; 2 * GAUSS_RADIUS + 1];
    for (i, k) in kernel.iter_mut().enumerate() {
        let d = i as f32 - GAUSS_RADIUS as f32;
        *k = (-0.5 * d * d / (sigma * sigma)).exp();
    }
    let total: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= total;
    }
    kernel
}

/// Half-sample symmetric index (`d c b a | a b c d | d c b a`).
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let m = i.rem_euclid(2 * n);
    (if m < n { m } else { 2 * n - 1 - m }) as usize
}

/// Separable Gaussian blur with reflected borders.
fn gaussian_blur(src: &[f32], w: usize, h: usize, kernel: &[f32]) -> Vec<f32> {
    let r = (kernel.len() / 2) as isize;
    let mut tmp = vec![0f32; src.len()];
    for y in 0..h {
        for x in 0..w {
            tmp[y * w + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, &wgt)| wgt * src[y * w + reflect(x as isize + k as isize - r, w)])
                .sum();
        }
    }
    let mut out = vec![0f32; src.len()];
    for y in 0..h {
        for x in 0..w {
            out[y * w + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, &wgt)| wgt * tmp[reflect(y as isize + k as isize - r, h) * w + x])
                .sum();
        }
    }
    out
}
