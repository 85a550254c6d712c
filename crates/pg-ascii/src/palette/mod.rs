//! Palettes de couleurs et recherche du plus proche voisin.

pub mod kdtree;

use pg_core::color::{Rgb, Swatch};
use pg_core::config::PaletteKind;
use pg_core::error::CoreError;
use pg_core::traits::NearestColor;

use kdtree::KdTree;

/// Niveaux par canal du cube 6×6×6 xterm.
pub const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

/// Les 8 couleurs de base (codes 0–7).
pub const BASIC_COLORS: [Rgb; 8] = [
    Rgb::new(0, 0, 0),
    Rgb::new(128, 0, 0),
    Rgb::new(0, 128, 0),
    Rgb::new(128, 128, 0),
    Rgb::new(0, 0, 128),
    Rgb::new(128, 0, 128),
    Rgb::new(0, 128, 128),
    Rgb::new(192, 192, 192),
];

/// Les 8 couleurs vives (codes 8–15).
pub const BRIGHT_COLORS: [Rgb; 8] = [
    Rgb::new(128, 128, 128),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(0, 0, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

/// First code of the xterm gray ramp.
const GRAY_BASE_CODE: u8 = 232;

/// Ordered, non-empty list of palette entries.
///
/// Order matters: when two entries are equally close to a color, the one
/// listed first wins.
///
/// # Example
/// ```
/// use pg_ascii::palette::Palette;
/// let p = Palette::xterm256();
/// assert_eq!(p.len(), 248);
/// assert_eq!(p.swatches()[8].code, Some(16));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    swatches: Vec<Swatch>,
}

impl Palette {
    /// # Errors
    /// [`CoreError::InvalidConfiguration`] on an empty list.
    pub fn new(swatches: Vec<Swatch>) -> Result<Self, CoreError> {
        if swatches.is_empty() {
            return Err(CoreError::config("palette vide"));
        }
        Ok(Self { swatches })
    }

    /// 8 basic colors, the 6×6×6 cube, then the gray ramp 8, 18, …, 238.
    ///
    /// 248 entries; black appears twice (codes 0 and 16).
    #[must_use]
    pub fn xterm256() -> Self {
        let mut swatches = Vec::with_capacity(248);
        swatches.extend(
            BASIC_COLORS
                .iter()
                .zip(0u8..)
                .map(|(&rgb, code)| Swatch::indexed(rgb, code)),
        );
        let mut code = 16u8;
        for &r in &CUBE_LEVELS {
            for &g in &CUBE_LEVELS {
                for &b in &CUBE_LEVELS {
                    swatches.push(Swatch::indexed(Rgb::new(r, g, b), code));
                    code += 1;
                }
            }
        }
        for (step, code) in (GRAY_BASE_CODE..=255).enumerate() {
            let v = 8 + 10 * step as u8;
            swatches.push(Swatch::indexed(Rgb::new(v, v, v), code));
        }
        Self { swatches }
    }

    /// Les 16 couleurs ANSI classiques.
    #[must_use]
    pub fn ansi16() -> Self {
        let swatches = BASIC_COLORS
            .iter()
            .chain(BRIGHT_COLORS.iter())
            .zip(0u8..)
            .map(|(&rgb, code)| Swatch::indexed(rgb, code))
            .collect();
        Self { swatches }
    }

    #[must_use]
    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.swatches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.swatches.is_empty()
    }
}

/// Nearest-color matcher backed by a k-d tree over a [`Palette`].
///
/// Duplicate colors are indexed once, under their first position, so the
/// tree stays exact and ties still resolve to the lowest palette index.
///
/// # Example
/// ```
/// use pg_ascii::palette::{KdPalette, Palette};
/// use pg_core::color::Rgb;
/// use pg_core::traits::NearestColor;
///
/// let matcher = KdPalette::new(Palette::xterm256());
/// let hit = matcher.nearest(Rgb::new(250, 3, 8));
/// assert_eq!((hit.rgb, hit.code), (Rgb::new(255, 0, 0), Some(196)));
/// ```
pub struct KdPalette {
    palette: Palette,
    tree: KdTree,
    /// Point de l'arbre → index dans la palette.
    origin: Vec<usize>,
    name: &'static str,
}

impl KdPalette {
    #[must_use]
    pub fn new(palette: Palette) -> Self {
        Self::named(palette, "kd-palette")
    }

    fn named(palette: Palette, name: &'static str) -> Self {
        let mut points: Vec<Rgb> = Vec::with_capacity(palette.len());
        let mut origin = Vec::with_capacity(palette.len());
        for (i, s) in palette.swatches().iter().enumerate() {
            if !points.contains(&s.rgb) {
                points.push(s.rgb);
                origin.push(i);
            }
        }
        let tree = KdTree::build(&points);
        log::debug!(
            "Palette {name} : {} entrées, {} couleurs distinctes",
            palette.len(),
            points.len()
        );
        Self {
            palette,
            tree,
            origin,
            name,
        }
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Palette index of the nearest entry and its squared distance.
    #[must_use]
    pub fn nearest_index(&self, color: Rgb) -> (usize, u32) {
        // Palette non vide par construction.
        match self.tree.nearest(color) {
            Some((point, d)) => (self.origin[point], d),
            None => (0, color.distance_sq(self.palette.swatches[0].rgb)),
        }
    }
}

impl NearestColor for KdPalette {
    fn nearest(&self, color: Rgb) -> Swatch {
        self.palette.swatches[self.nearest_index(color).0]
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Pas de quantification : chaque couleur est sa propre entrée 24 bits.
pub struct TrueColor;

impl NearestColor for TrueColor {
    #[inline(always)]
    fn nearest(&self, color: Rgb) -> Swatch {
        Swatch::direct(color)
    }

    fn name(&self) -> &'static str {
        "truecolor"
    }
}

/// Matcher for a configured palette kind.
///
/// # Example
/// ```
/// use pg_ascii::palette::matcher_for;
/// use pg_core::config::PaletteKind;
/// assert_eq!(matcher_for(PaletteKind::Ansi16).name(), "ansi16");
/// ```
#[must_use]
pub fn matcher_for(kind: PaletteKind) -> Box<dyn NearestColor> {
    match kind {
        PaletteKind::Xterm256 => Box::new(KdPalette::named(Palette::xterm256(), "xterm256")),
        PaletteKind::Ansi16 => Box::new(KdPalette::named(Palette::ansi16(), "ansi16")),
        PaletteKind::TrueColor => Box::new(TrueColor),
    }
}
