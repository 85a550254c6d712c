use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 16 caractères: sélection par k-means sur la densité rendue (défaut).
pub const DENSITY_MAP_16: &str = " .,:\"<+[?e=E*%#@";

/// 95 caractères ASCII imprimables triés par densité d'encre mesurée.
pub const DENSITY_MAP_FULL: &str = " _,.`;':-~\"|!\\/<()L>+J^=c*[{}]zirj1?syulvCIZt7oTx2Yng3pSqaeU5fVwEFOQXGmd9hHbD6PAk4%WB8K&N$#R0M@";

/// 10 caractères: compact, bon contraste.
pub const DENSITY_MAP_COMPACT: &str = " .:-=+*#%@";

/// 70 caractères: Paul Bourke extended.
pub const DENSITY_MAP_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Blocs Unicode: pseudo-pixels.
pub const DENSITY_MAP_BLOCKS: &str = " ░▒▓█";

/// Named built-in density maps.
///
/// # Example
/// ```
/// use pg_core::charset::DensityPreset;
/// assert_eq!("blocks".parse::<DensityPreset>().unwrap().glyphs(), " ░▒▓█");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum DensityPreset {
    #[default]
    Sixteen,
    Full,
    Compact,
    Standard,
    Blocks,
}

impl DensityPreset {
    /// Glyphs of the preset, lightest first.
    #[must_use]
    pub const fn glyphs(self) -> &'static str {
        match self {
            Self::Sixteen => DENSITY_MAP_16,
            Self::Full => DENSITY_MAP_FULL,
            Self::Compact => DENSITY_MAP_COMPACT,
            Self::Standard => DENSITY_MAP_STANDARD,
            Self::Blocks => DENSITY_MAP_BLOCKS,
        }
    }
}

impl std::str::FromStr for DensityPreset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sixteen" | "16" => Ok(Self::Sixteen),
            "full" | "256" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "standard" => Ok(Self::Standard),
            "blocks" => Ok(Self::Blocks),
            other => Err(CoreError::config(format!("preset de densité inconnu '{other}'"))),
        }
    }
}

/// Ordered glyph sequence, index 0 = least ink, last = most ink.
///
/// Built once per run and used as an intensity → glyph lookup table.
///
/// # Example
/// ```
/// use pg_core::charset::DensityMap;
/// let map = DensityMap::new(" .:#@").unwrap();
/// assert_eq!(map.glyph(0.0), ' ');
/// assert_eq!(map.glyph(1.0), '@');
/// assert_eq!(map.glyph(0.5), ':');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DensityMap {
    glyphs: Vec<char>,
}

impl DensityMap {
    /// Build a map from glyphs ordered lightest → densest.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidConfiguration`] if fewer than 2 glyphs are given.
    pub fn new(glyphs: &str) -> Result<Self, CoreError> {
        let glyphs: Vec<char> = glyphs.chars().collect();
        if glyphs.len() < 2 {
            return Err(CoreError::config(format!(
                "la carte de densité doit contenir au moins 2 caractères (reçu {})",
                glyphs.len()
            )));
        }
        Ok(Self { glyphs })
    }

    /// Number of glyphs (always ≥ 2).
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false`; present for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// `floor(intensity * (len - 1))`, clamped to `[0, len - 1]`.
    ///
    /// NaN maps to 0.
    ///
    /// # Example
    /// ```
    /// use pg_core::charset::DensityMap;
    /// let map = DensityMap::new(" .:#@").unwrap();
    /// assert_eq!(map.index_for(-3.0), 0);
    /// assert_eq!(map.index_for(0.99), 3);
    /// assert_eq!(map.index_for(7.0), 4);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn index_for(&self, intensity: f32) -> usize {
        let last = self.glyphs.len() - 1;
        // `as usize` sature : négatif et NaN → 0.
        ((intensity * last as f32).floor() as usize).min(last)
    }

    /// Glyph for a normalized intensity.
    #[inline(always)]
    #[must_use]
    pub fn glyph(&self, intensity: f32) -> char {
        self.glyphs[self.index_for(intensity)]
    }

    /// Glyphs in order.
    #[must_use]
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }
}
