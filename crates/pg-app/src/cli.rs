use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use pg_core::charset::DensityPreset;
use pg_core::config::{IntensityMode, PaletteKind};

/// pixglyph: convertit une image en art ASCII coloré.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("source").args(["file", "stdin", "url", "cats", "dogs"])))]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Image à convertir (PNG, JPEG, BMP, GIF). `-` lit l'entrée standard.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Lire l'image encodée sur l'entrée standard (défaut si elle est redirigée).
    #[arg(long, default_value_t = false)]
    pub stdin: bool,

    /// Télécharger l'image depuis cette URL.
    #[arg(short, long)]
    pub url: Option<String>,

    /// Chat aléatoire (thecatapi.com).
    #[arg(long, default_value_t = false)]
    pub cats: bool,

    /// Chien aléatoire (dog.ceo).
    #[arg(long, default_value_t = false)]
    pub dogs: bool,

    /// Largeur en caractères. Remplace la valeur de la config (défaut 100).
    #[arg(short, long, allow_negative_numbers = true)]
    pub width: Option<i64>,

    /// Adapter la largeur au terminal (colonnes - 1).
    #[arg(long, default_value_t = false, conflicts_with = "width")]
    pub fit: bool,

    /// Palette : xterm256, ansi16, truecolor.
    #[arg(long)]
    pub palette: Option<PaletteKind>,

    /// Carte de densité personnalisée, du plus clair au plus dense.
    #[arg(long)]
    pub density_map: Option<String>,

    /// Carte de densité prédéfinie : sixteen, full, compact, standard, blocks.
    #[arg(long, conflicts_with = "density_map")]
    pub density_preset: Option<DensityPreset>,

    /// Inverser les valeurs (fond clair).
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Sortie monochrome (sans couleur).
    #[arg(long, default_value_t = false)]
    pub mono: bool,

    /// Colorer le fond des cellules plutôt que les glyphes.
    #[arg(long, default_value_t = false)]
    pub background: bool,

    /// Calcul d'intensité : mean, adaptive.
    #[arg(long)]
    pub intensity: Option<IntensityMode>,

    /// Égalisation globale de l'histogramme de luminance.
    #[arg(long, default_value_t = false)]
    pub equalize: bool,

    /// Forcer l'égalisation adaptative (CLAHE).
    #[arg(long, default_value_t = false)]
    pub adaptive_equalize: bool,

    /// Désactiver l'égalisation adaptative (CLAHE).
    #[arg(long, default_value_t = false, conflicts_with = "adaptive_equalize")]
    pub no_adaptive_equalize: bool,

    /// Étirement de contraste entre les percentiles 2 et 98.
    #[arg(long, default_value_t = false)]
    pub contrast_stretching: bool,

    /// Correction gamma (défaut 2.2 si la valeur est omise).
    #[arg(long, num_args = 0..=1, default_missing_value = "2.2", value_name = "GAMMA")]
    pub gamma_correction: Option<f32>,

    /// Écrire l'art en texte brut dans ce fichier.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Écrire l'art coloré dans ce fichier HTML.
    #[arg(long, conflicts_with = "output")]
    pub html: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/default.toml s'il existe.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Where the image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceArg {
    File(PathBuf),
    Stdin,
    Url(String),
    RandomPhoto,
    RandomCat,
    RandomDog,
}

impl Cli {
    /// Resolve the image source from the flags and the state of stdin.
    #[must_use]
    pub fn source(&self) -> SourceArg {
        self.source_with(io::stdin().is_terminal())
    }

    /// Sans option de source : l'entrée standard si elle est redirigée,
    /// sinon une photo aléatoire (rien à lire sur un terminal).
    #[must_use]
    pub fn source_with(&self, stdin_is_terminal: bool) -> SourceArg {
        if let Some(url) = &self.url {
            return SourceArg::Url(url.clone());
        }
        if self.cats {
            return SourceArg::RandomCat;
        }
        if self.dogs {
            return SourceArg::RandomDog;
        }
        match &self.file {
            Some(path) if path.as_os_str() != "-" => SourceArg::File(path.clone()),
            Some(_) => SourceArg::Stdin,
            None if self.stdin || !stdin_is_terminal => SourceArg::Stdin,
            None => SourceArg::RandomPhoto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pixglyph").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn default_source_depends_on_stdin() {
        let cli = parse(&[]);
        assert_eq!(cli.source_with(false), SourceArg::Stdin);
        assert_eq!(cli.source_with(true), SourceArg::RandomPhoto);
        assert_eq!(parse(&["--stdin"]).source_with(true), SourceArg::Stdin);
        assert_eq!(cli.width, None);
        assert_eq!(cli.log_level, "warn");
        assert!(cli.gamma_correction.is_none());
    }

    #[test]
    fn file_and_dash() {
        assert_eq!(
            parse(&["--file", "cat.png"]).source(),
            SourceArg::File(PathBuf::from("cat.png"))
        );
        assert_eq!(parse(&["-f", "-"]).source_with(true), SourceArg::Stdin);
    }

    #[test]
    fn url_and_random_sources() {
        assert_eq!(
            parse(&["-u", "https://example.org/a.png"]).source(),
            SourceArg::Url("https://example.org/a.png".into())
        );
        assert_eq!(parse(&["--cats"]).source(), SourceArg::RandomCat);
        assert_eq!(parse(&["--dogs"]).source(), SourceArg::RandomDog);
    }

    #[test]
    fn only_one_source_flag() {
        assert!(Cli::try_parse_from(["pixglyph", "--url", "http://x", "--file", "a.png"]).is_err());
        assert!(Cli::try_parse_from(["pixglyph", "--cats", "--dogs"]).is_err());
        assert!(Cli::try_parse_from(["pixglyph", "--stdin", "--url", "http://x"]).is_err());
    }

    #[test]
    fn negative_width_reaches_validation() {
        assert_eq!(parse(&["-w", "-4"]).width, Some(-4));
    }

    #[test]
    fn typed_options_parse() {
        let cli = parse(&[
            "--palette",
            "ansi16",
            "--intensity",
            "adaptive",
            "--density-preset",
            "blocks",
        ]);
        assert_eq!(cli.palette, Some(PaletteKind::Ansi16));
        assert_eq!(cli.intensity, Some(IntensityMode::AdaptiveThreshold));
        assert_eq!(cli.density_preset, Some(DensityPreset::Blocks));
    }

    #[test]
    fn unknown_palette_is_a_parse_error() {
        assert!(Cli::try_parse_from(["pixglyph", "--palette", "sepia"]).is_err());
    }

    #[test]
    fn gamma_value_is_optional() {
        assert_eq!(parse(&["--gamma-correction"]).gamma_correction, Some(2.2));
        assert_eq!(parse(&["--gamma-correction", "1.8"]).gamma_correction, Some(1.8));
    }

    #[test]
    fn output_and_html_conflict() {
        assert!(Cli::try_parse_from(["pixglyph", "-o", "a.txt", "--html", "a.html"]).is_err());
    }
}
