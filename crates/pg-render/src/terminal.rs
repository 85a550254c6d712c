use std::io::Write;

use anyhow::{Context, Result};
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use pg_core::color::Swatch;
use pg_core::config::ColorLayer;
use pg_core::frame::Artwork;
use pg_core::traits::ArtworkSink;

/// Sortie terminal : glyphes seuls ou glyphes + séquences couleur.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TerminalMode {
    /// Glyphs only, colors ignored.
    Monochrome,
    /// 256-color escapes for indexed swatches, 24-bit for truecolor.
    #[default]
    Colored,
}

/// Streams an [`Artwork`] to a terminal-like writer, one row at a time.
///
/// In colored mode each row ends with a style reset, so an interrupted
/// stream never leaves the terminal colored. A transparent cell resets the
/// style before its space, including at the start of a row.
///
/// # Example
/// ```
/// use pg_render::terminal::{TerminalMode, TerminalRenderer};
/// use pg_core::frame::Artwork;
/// use pg_core::traits::ArtworkSink;
///
/// let art = Artwork::from_cells(1, 2, vec![('#', None), ('@', None)]);
/// let mut out = Vec::new();
/// TerminalRenderer::new(&mut out, TerminalMode::Monochrome).render(&art).unwrap();
/// assert_eq!(out, b"#@\n");
/// ```
pub struct TerminalRenderer<W: Write> {
    out: W,
    mode: TerminalMode,
    layer: ColorLayer,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, mode: TerminalMode) -> Self {
        Self {
            out,
            mode,
            layer: ColorLayer::Foreground,
        }
    }

    /// Color the cell background instead of the glyph.
    #[must_use]
    pub fn with_layer(mut self, layer: ColorLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Récupère le writer (tests, buffers).
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_plain_row(&mut self, glyphs: &[char]) -> Result<()> {
        let line: String = glyphs.iter().collect();
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn write_colored_row(&mut self, glyphs: &[char], colors: &[Option<Swatch>]) -> Result<()> {
        // Évite de réémettre la même séquence pour des cellules voisines identiques.
        // `reset` : le style est déjà remis à zéro depuis le début de la ligne.
        let mut active: Option<Swatch> = None;
        let mut reset = false;
        for (&glyph, &color) in glyphs.iter().zip(colors) {
            match color {
                None => {
                    if !reset {
                        queue!(self.out, ResetColor)?;
                        reset = true;
                        active = None;
                    }
                    queue!(self.out, Print(' '))?;
                }
                Some(swatch) => {
                    if active != Some(swatch) {
                        let c = terminal_color(swatch);
                        match self.layer {
                            ColorLayer::Foreground => queue!(self.out, SetForegroundColor(c))?,
                            ColorLayer::Background => queue!(self.out, SetBackgroundColor(c))?,
                        }
                        active = Some(swatch);
                        reset = false;
                    }
                    queue!(self.out, Print(glyph))?;
                }
            }
        }
        queue!(self.out, ResetColor, Print('\n'))?;
        Ok(())
    }
}

impl<W: Write> ArtworkSink for TerminalRenderer<W> {
    fn render(&mut self, artwork: &Artwork) -> Result<()> {
        for (glyphs, colors) in artwork.rows_iter() {
            let written = match self.mode {
                TerminalMode::Monochrome => self.write_plain_row(glyphs),
                TerminalMode::Colored => self.write_colored_row(glyphs, colors),
            };
            written.context("Écriture terminal impossible")?;
        }
        self.out.flush().context("Flush terminal impossible")?;
        log::debug!(
            "Rendu terminal {:?} : {}×{}",
            self.mode,
            artwork.columns(),
            artwork.rows()
        );
        Ok(())
    }
}

/// Couleur crossterm d'une entrée de palette.
///
/// # Example
/// ```
/// use pg_render::terminal::terminal_color;
/// use pg_core::color::{Rgb, Swatch};
/// use crossterm::style::Color;
/// assert_eq!(terminal_color(Swatch::indexed(Rgb::new(255, 0, 0), 196)), Color::AnsiValue(196));
/// assert_eq!(terminal_color(Swatch::direct(Rgb::new(1, 2, 3))), Color::Rgb { r: 1, g: 2, b: 3 });
/// ```
#[must_use]
pub fn terminal_color(swatch: Swatch) -> Color {
    match swatch.code {
        Some(code) => Color::AnsiValue(code),
        None => Color::Rgb {
            r: swatch.rgb.r,
            g: swatch.rgb.g,
            b: swatch.rgb.b,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pg_core::color::Rgb;

    const RED: Swatch = Swatch::indexed(Rgb::new(255, 0, 0), 196);

    fn render(art: &Artwork, mode: TerminalMode, layer: ColorLayer) -> String {
        let mut renderer = TerminalRenderer::new(Vec::new(), mode).with_layer(layer);
        renderer.render(art).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn sample() -> Artwork {
        Artwork::from_cells(
            2,
            3,
            vec![
                ('#', Some(RED)),
                ('#', Some(RED)),
                (':', None),
                ('.', Some(Swatch::direct(Rgb::new(1, 2, 3)))),
                (' ', None),
                ('@', Some(RED)),
            ],
        )
    }

    #[test]
    fn monochrome_ignores_colors() {
        let text = render(&sample(), TerminalMode::Monochrome, ColorLayer::Foreground);
        assert_eq!(text, "##:\n. @\n");
    }

    #[test]
    fn colored_rows_use_palette_codes_and_end_with_reset() {
        let text = render(&sample(), TerminalMode::Colored, ColorLayer::Foreground);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "\x1b[38;5;196m##\x1b[0m \x1b[0m");
        assert_eq!(rows[1], "\x1b[38;2;1;2;3m.\x1b[0m \x1b[38;5;196m@\x1b[0m");
        assert!(rows.iter().all(|r| r.ends_with("\x1b[0m")));
    }

    #[test]
    fn transparent_cells_reset_inherited_style() {
        let art = Artwork::from_cells(1, 4, vec![(' ', None), (' ', None), ('#', Some(RED)), (' ', None)]);
        let text = render(&art, TerminalMode::Colored, ColorLayer::Foreground);
        // Un seul reset pour la série de cellules vides en tête de ligne.
        assert_eq!(text, "\x1b[0m  \x1b[38;5;196m#\x1b[0m \x1b[0m\n");
    }

    #[test]
    fn background_layer_uses_background_escapes() {
        let text = render(&sample(), TerminalMode::Colored, ColorLayer::Background);
        assert!(text.starts_with("\x1b[48;5;196m##"));
        assert!(!text.contains("\x1b[38;"));
    }
}
