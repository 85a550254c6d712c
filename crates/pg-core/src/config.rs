use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{DENSITY_MAP_16, DensityMap};
use crate::error::CoreError;

/// Rapport largeur/hauteur empirique d'une cellule de police monospace.
///
/// A terminal cell covers about twice as much vertical extent as horizontal,
/// so rows are scaled by this factor to keep the output visually square.
pub const CHARACTER_ASPECT_RATIO: f32 = 0.489_795_92;

/// Configuration complète d'une conversion.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use pg_core::config::ConversionConfig;
/// let config = ConversionConfig::default();
/// assert_eq!(config.width, 100);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ConversionConfig {
    // === Grille ===
    /// Nombre de colonnes demandé. Signé : les valeurs ≤ 0 sont rejetées par `validate`.
    pub width: i64,
    /// Correction d'aspect des caractères (≈0.49).
    pub char_aspect_ratio: f32,

    // === Glyphes ===
    /// Carte de densité, du plus clair au plus dense.
    pub density_map: String,
    /// Stratégie d'intensité, fixe pour toute la conversion.
    pub intensity: IntensityMode,
    /// Pondérer l'intensité moyenne par l'alpha moyen de la tuile.
    pub alpha_weighted: bool,
    /// Inverser les valeurs de la tuile (pour fond clair).
    pub invert: bool,

    // === Couleur ===
    /// Palette de quantification.
    pub palette: PaletteKind,

    // === Prétraitement ===
    pub preprocess: PreprocessConfig,

    // === Sortie ===
    pub output: OutputMode,
    /// Couleur appliquée au texte ou au fond de la cellule.
    pub layer: ColorLayer,
}

/// Preprocessing steps and their parameters.
///
/// Steps run in a fixed order: equalize, adaptive_equalize, contrast_stretch,
/// gamma_correct.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PreprocessConfig {
    /// Égalisation globale de l'histogramme de luma.
    pub equalize: bool,
    /// CLAHE sur la luma.
    pub adaptive_equalize: bool,
    /// Étirement de contraste par percentiles.
    pub contrast_stretch: bool,
    /// Correction gamma.
    pub gamma_correct: bool,
    /// Gamma (> 0). Sortie = 255 · (entrée/255)^(1/gamma).
    pub gamma: f32,
    /// Percentile bas de l'étirement [0, 100).
    pub stretch_low: f32,
    /// Percentile haut de l'étirement (low, 100].
    pub stretch_high: f32,
    /// Limite d'écrêtage CLAHE (multiple de la hauteur moyenne de l'histogramme).
    pub clip_limit: f32,
    /// Grille de tuiles CLAHE (par axe).
    pub clahe_grid: u32,
}

/// How a tile's scalar intensity is computed.
///
/// # Example
/// ```
/// use pg_core::config::IntensityMode;
/// assert_eq!("adaptive".parse::<IntensityMode>().unwrap(), IntensityMode::AdaptiveThreshold);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum IntensityMode {
    /// Mean BT.601 luma of the tile, scaled to [0, 1].
    #[default]
    MeanLuminance,
    /// Fraction of pixels above a Gaussian local threshold.
    AdaptiveThreshold,
}

/// Palette variant used for color quantization.
///
/// # Example
/// ```
/// use pg_core::config::PaletteKind;
/// assert_eq!("ansi16".parse::<PaletteKind>().unwrap(), PaletteKind::Ansi16);
/// assert!("cmyk".parse::<PaletteKind>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum PaletteKind {
    /// 8 basic + 6×6×6 cube + 24 grays.
    #[default]
    Xterm256,
    /// 8 basic + 8 bright.
    Ansi16,
    /// 24-bit, no quantization.
    TrueColor,
}

/// Output sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum OutputMode {
    /// Glyphs only, on the terminal.
    Monochrome,
    /// Glyphs with palette escapes, on the terminal.
    #[default]
    Colored,
    /// Glyphs only, to a text file.
    PlainText,
    /// Colored `<span>` markup, to an HTML file.
    Html,
}

/// Which part of the cell receives the palette color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ColorLayer {
    #[default]
    Foreground,
    Background,
}

impl FromStr for IntensityMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" | "luminance" | "meanluminance" => Ok(Self::MeanLuminance),
            "adaptive" | "threshold" | "adaptivethreshold" => Ok(Self::AdaptiveThreshold),
            other => Err(CoreError::config(format!("mode d'intensité inconnu '{other}'"))),
        }
    }
}

impl FromStr for PaletteKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xterm256" | "256" => Ok(Self::Xterm256),
            "ansi16" | "16" => Ok(Self::Ansi16),
            "truecolor" | "24bit" => Ok(Self::TrueColor),
            other => Err(CoreError::config(format!("palette inconnue '{other}'"))),
        }
    }
}

impl FromStr for OutputMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mono" | "monochrome" => Ok(Self::Monochrome),
            "color" | "colored" => Ok(Self::Colored),
            "text" | "plaintext" => Ok(Self::PlainText),
            "html" => Ok(Self::Html),
            other => Err(CoreError::config(format!("mode de sortie inconnu '{other}'"))),
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            equalize: false,
            adaptive_equalize: true,
            contrast_stretch: false,
            gamma_correct: false,
            gamma: 2.2,
            stretch_low: 2.0,
            stretch_high: 98.0,
            clip_limit: 2.0,
            clahe_grid: 8,
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            width: 100,
            char_aspect_ratio: CHARACTER_ASPECT_RATIO,
            density_map: DENSITY_MAP_16.to_string(),
            intensity: IntensityMode::MeanLuminance,
            alpha_weighted: false,
            invert: false,
            palette: PaletteKind::Xterm256,
            preprocess: PreprocessConfig::default(),
            output: OutputMode::Colored,
            layer: ColorLayer::Foreground,
        }
    }
}

impl ConversionConfig {
    /// Reject configurations that cannot produce a conversion.
    ///
    /// Runs before any pixel is touched.
    ///
    /// # Errors
    /// [`CoreError::InvalidConfiguration`] naming the first offending field,
    /// or [`CoreError::PreprocessingFailure`] for an unusable preprocessing
    /// parameter (see [`PreprocessConfig::validate`]).
    ///
    /// # Example
    /// ```
    /// use pg_core::config::ConversionConfig;
    /// let config = ConversionConfig { width: 0, ..ConversionConfig::default() };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.width <= 0 {
            return Err(CoreError::config(format!(
                "largeur demandée {} (doit être > 0)",
                self.width
            )));
        }
        if u32::try_from(self.width).is_err() {
            return Err(CoreError::config(format!("largeur demandée {} trop grande", self.width)));
        }
        if !self.char_aspect_ratio.is_finite() || self.char_aspect_ratio <= 0.0 {
            return Err(CoreError::config(format!(
                "ratio d'aspect {} (doit être fini et > 0)",
                self.char_aspect_ratio
            )));
        }
        DensityMap::new(&self.density_map)?;
        self.preprocess.validate()
    }
}

impl PreprocessConfig {
    /// Parameter checks for the enabled steps only.
    ///
    /// # Errors
    /// [`CoreError::PreprocessingFailure`] on an out-of-range parameter, the
    /// same kind the transform itself would report.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.gamma_correct && !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(CoreError::preprocessing(format!("gamma {} (doit être > 0)", self.gamma)));
        }
        if self.contrast_stretch {
            let (low, high) = (self.stretch_low, self.stretch_high);
            if !(low >= 0.0 && low < high && high <= 100.0) {
                return Err(CoreError::preprocessing(format!(
                    "percentiles d'étirement {low}–{high} (attendu 0 ≤ bas < haut ≤ 100)"
                )));
            }
        }
        let clip_ok = self.clip_limit.is_finite() && self.clip_limit > 0.0;
        if self.adaptive_equalize && (!clip_ok || self.clahe_grid == 0) {
            return Err(CoreError::preprocessing(format!(
                "CLAHE clip_limit {} / grille {} invalides",
                self.clip_limit, self.clahe_grid
            )));
        }
        Ok(())
    }

    /// `true` if at least one step is enabled.
    #[must_use]
    pub fn any(&self) -> bool {
        self.equalize || self.adaptive_equalize || self.contrast_stretch || self.gamma_correct
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    conversion: Option<ConversionSection>,
    preprocess: Option<PreprocessSection>,
    output: Option<OutputSection>,
}

#[derive(Deserialize)]
struct ConversionSection {
    width: Option<i64>,
    char_aspect_ratio: Option<f32>,
    density_map: Option<String>,
    intensity: Option<IntensityMode>,
    alpha_weighted: Option<bool>,
    invert: Option<bool>,
    palette: Option<PaletteKind>,
}

#[derive(Deserialize)]
struct PreprocessSection {
    equalize: Option<bool>,
    adaptive_equalize: Option<bool>,
    contrast_stretch: Option<bool>,
    gamma_correct: Option<bool>,
    gamma: Option<f32>,
    stretch_low: Option<f32>,
    stretch_high: Option<f32>,
    clip_limit: Option<f32>,
    clahe_grid: Option<u32>,
}

#[derive(Deserialize)]
struct OutputSection {
    mode: Option<OutputMode>,
    layer: Option<ColorLayer>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or fails validation.
///
/// # Example
/// ```no_run
/// use pg_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<ConversionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    log::debug!("Config chargée depuis {}", path.display());
    Ok(config)
}

/// Parse TOML text over the defaults, then validate.
///
/// # Errors
/// Returns an error on malformed TOML or an invalid resulting configuration.
///
/// # Example
/// ```
/// use pg_core::config::{parse_config, PaletteKind};
/// let config = parse_config("[conversion]\nwidth = 40\npalette = \"Ansi16\"\n").unwrap();
/// assert_eq!(config.width, 40);
/// assert_eq!(config.palette, PaletteKind::Ansi16);
/// ```
pub fn parse_config(content: &str) -> Result<ConversionConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = ConversionConfig::default();

    if let Some(c) = file.conversion {
        if let Some(v) = c.width {
            config.width = v;
        }
        if let Some(v) = c.char_aspect_ratio {
            config.char_aspect_ratio = v;
        }
        if let Some(v) = c.density_map {
            config.density_map = v;
        }
        if let Some(v) = c.intensity {
            config.intensity = v;
        }
        if let Some(v) = c.alpha_weighted {
            config.alpha_weighted = v;
        }
        if let Some(v) = c.invert {
            config.invert = v;
        }
        if let Some(v) = c.palette {
            config.palette = v;
        }
    }

    if let Some(p) = file.preprocess {
        let pre = &mut config.preprocess;
        if let Some(v) = p.equalize {
            pre.equalize = v;
        }
        if let Some(v) = p.adaptive_equalize {
            pre.adaptive_equalize = v;
        }
        if let Some(v) = p.contrast_stretch {
            pre.contrast_stretch = v;
        }
        if let Some(v) = p.gamma_correct {
            pre.gamma_correct = v;
        }
        if let Some(v) = p.gamma {
            pre.gamma = v;
        }
        if let Some(v) = p.stretch_low {
            pre.stretch_low = v;
        }
        if let Some(v) = p.stretch_high {
            pre.stretch_high = v;
        }
        if let Some(v) = p.clip_limit {
            pre.clip_limit = v;
        }
        if let Some(v) = p.clahe_grid {
            pre.clahe_grid = v;
        }
    }

    if let Some(o) = file.output {
        if let Some(v) = o.mode {
            config.output = v;
        }
        if let Some(v) = o.layer {
            config.layer = v;
        }
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ConversionConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_width_is_a_configuration_error() {
        let config = ConversionConfig {
            width: -3,
            ..ConversionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn empty_density_map_is_rejected() {
        let config = ConversionConfig {
            density_map: String::new(),
            ..ConversionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn stretch_percentiles_checked_only_when_enabled() {
        let mut config = ConversionConfig::default();
        config.preprocess.stretch_low = 90.0;
        config.preprocess.stretch_high = 10.0;
        assert!(config.validate().is_ok());
        config.preprocess.contrast_stretch = true;
        assert!(matches!(
            config.validate(),
            Err(CoreError::PreprocessingFailure(_))
        ));
    }

    #[test]
    fn bad_gamma_is_a_preprocessing_failure() {
        let mut config = ConversionConfig::default();
        config.preprocess.gamma = -1.0;
        assert!(config.validate().is_ok());
        config.preprocess.gamma_correct = true;
        assert!(matches!(
            config.validate(),
            Err(CoreError::PreprocessingFailure(_))
        ));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = parse_config(
            "[preprocess]\nequalize = true\n\n[output]\nmode = \"Html\"\nlayer = \"Background\"\n",
        )
        .unwrap();
        assert!(config.preprocess.equalize);
        assert!(config.preprocess.adaptive_equalize);
        assert_eq!(config.output, OutputMode::Html);
        assert_eq!(config.layer, ColorLayer::Background);
        assert_eq!(config.width, 100);
    }

    #[test]
    fn shipped_default_file_matches_defaults() {
        let config = parse_config(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config, ConversionConfig::default());
    }

    #[test]
    fn invalid_toml_width_fails_validation() {
        let err = parse_config("[conversion]\nwidth = 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("largeur"));
    }

    #[test]
    fn unknown_palette_name_is_rejected() {
        assert!(parse_config("[conversion]\npalette = \"Sepia\"\n").is_err());
        assert!(matches!(
            "sepia".parse::<PaletteKind>(),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }
}
