use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pg_ascii::Converter;
use pg_core::config::{ColorLayer, ConversionConfig, OutputMode, load_config};
use pg_core::frame::Artwork;
use pg_core::traits::{ArtworkSink, Source};
use pg_export::{HtmlFile, TextFile};
use pg_render::{TerminalMode, TerminalRenderer};
use pg_source::{FileSource, StdinSource, UrlSource};

use crate::cli::{Cli, SourceArg};

const DEFAULT_CONFIG: &str = "config/default.toml";

/// Destination résolue de l'artwork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Terminal(TerminalMode),
    Text(PathBuf),
    Html(PathBuf),
}

/// Run one conversion end to end: source → converter → sink.
///
/// # Errors
/// Returns the first failure of configuration, acquisition, conversion, or output.
pub fn run(cli: &Cli) -> Result<()> {
    let mut config = resolve_config(cli)?;
    apply_overrides(cli, &mut config)?;
    let target = select_target(cli, &config)?;

    let mut source: Box<dyn Source> = match cli.source() {
        SourceArg::File(path) => Box::new(FileSource::new(path)),
        SourceArg::Stdin => Box::new(StdinSource::new()),
        SourceArg::Url(url) => Box::new(UrlSource::new(url)),
        SourceArg::RandomPhoto => Box::new(UrlSource::random_photo()),
        SourceArg::RandomCat => Box::new(UrlSource::random_cat()),
        SourceArg::RandomDog => Box::new(UrlSource::random_dog()),
    };
    let artwork = convert(source.as_mut(), &config)?;

    let stdout = io::stdout();
    let mut sink: Box<dyn ArtworkSink> = match &target {
        Target::Terminal(mode) => Box::new(
            TerminalRenderer::new(BufWriter::new(stdout.lock()), *mode).with_layer(config.layer),
        ),
        Target::Text(path) => Box::new(TextFile::new(path)),
        Target::Html(path) => Box::new(HtmlFile::new(path, config.layer)),
    };
    sink.render(&artwork)
}

/// Acquire the image from `source` and convert it with `config`.
///
/// # Errors
/// Returns an error if the configuration is invalid, the source fails, or the
/// conversion fails.
pub fn convert(source: &mut dyn Source, config: &ConversionConfig) -> Result<Artwork> {
    // La config est validée avant de toucher à la source.
    let converter = Converter::new(config).context("Configuration rejetée")?;
    let image = source
        .acquire()
        .with_context(|| format!("Source indisponible : {}", source.describe()))?;
    let artwork = converter
        .convert(&image)
        .with_context(|| format!("Conversion de {} impossible", source.describe()))?;
    log::info!(
        "{} converti en {}×{} ({} couleurs distinctes)",
        source.describe(),
        artwork.columns(),
        artwork.rows(),
        artwork.distinct_colors()
    );
    Ok(artwork)
}

/// Resolve config: `--config` must exist; the default path is optional.
///
/// # Errors
/// Returns an error if an explicit config file cannot be loaded.
pub fn resolve_config(cli: &Cli) -> Result<ConversionConfig> {
    if let Some(path) = &cli.config {
        return load_config(path);
    }
    let default = Path::new(DEFAULT_CONFIG);
    if default.exists() {
        load_config(default)
    } else {
        log::debug!("Pas de {DEFAULT_CONFIG}, utilisation des défauts.");
        Ok(ConversionConfig::default())
    }
}

/// Appliquer les overrides CLI par-dessus la config.
///
/// # Errors
/// Returns an error if `--fit` is given but the terminal size is unknown.
pub fn apply_overrides(cli: &Cli, config: &mut ConversionConfig) -> Result<()> {
    if let Some(width) = cli.width {
        config.width = width;
    }
    if cli.fit {
        let (columns, _) = crossterm::terminal::size().context("Taille du terminal inconnue (--fit)")?;
        config.width = i64::from(columns) - 1;
        log::debug!("--fit : largeur {}", config.width);
    }
    if let Some(palette) = cli.palette {
        config.palette = palette;
    }
    if let Some(map) = &cli.density_map {
        config.density_map.clone_from(map);
    } else if let Some(preset) = cli.density_preset {
        config.density_map = preset.glyphs().to_string();
    }
    if let Some(mode) = cli.intensity {
        config.intensity = mode;
    }
    if cli.invert {
        config.invert = true;
    }
    if cli.background {
        config.layer = ColorLayer::Background;
    }

    let pre = &mut config.preprocess;
    if cli.equalize {
        pre.equalize = true;
    }
    if cli.adaptive_equalize {
        pre.adaptive_equalize = true;
    }
    if cli.no_adaptive_equalize {
        pre.adaptive_equalize = false;
    }
    if cli.contrast_stretching {
        pre.contrast_stretch = true;
    }
    if let Some(gamma) = cli.gamma_correction {
        pre.gamma_correct = true;
        pre.gamma = gamma;
    }

    if cli.mono {
        config.output = OutputMode::Monochrome;
    }
    if cli.output.is_some() {
        config.output = OutputMode::PlainText;
    } else if cli.html.is_some() {
        config.output = OutputMode::Html;
    }
    Ok(())
}

/// Pick the sink for the configured output mode.
///
/// # Errors
/// Returns an error if a file mode is configured without a path.
pub fn select_target(cli: &Cli, config: &ConversionConfig) -> Result<Target> {
    Ok(match config.output {
        OutputMode::Monochrome => Target::Terminal(TerminalMode::Monochrome),
        OutputMode::Colored => Target::Terminal(TerminalMode::Colored),
        OutputMode::PlainText => Target::Text(
            cli.output
                .clone()
                .context("Sortie texte demandée sans chemin (-o/--output)")?,
        ),
        OutputMode::Html => Target::Html(
            cli.html
                .clone()
                .context("Sortie HTML demandée sans chemin (--html)")?,
        ),
    })
}
