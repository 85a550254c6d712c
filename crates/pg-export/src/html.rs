use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pg_core::config::ColorLayer;
use pg_core::frame::Artwork;
use pg_core::traits::ArtworkSink;

const HTML_HEAD: &str = "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<title>pixglyph</title>\n\
<style>\n\
body { background: #000; color: #ccc; }\n\
pre { font-family: monospace; line-height: 1.0; }\n\
</style>\n\
</head>\n\
<body>\n\
<pre>\n";

const HTML_TAIL: &str = "</pre>\n</body>\n</html>\n";

/// Échappe un glyphe pour l'insérer dans du HTML.
///
/// # Example
/// ```
/// use pg_export::html::push_escaped;
/// let mut s = String::new();
/// for c in "<a&b>\"'".chars() { push_escaped(&mut s, c); }
/// assert_eq!(s, "&lt;a&amp;b&gt;&quot;&#39;");
/// ```
pub fn push_escaped(out: &mut String, glyph: char) {
    match glyph {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        c => out.push(c),
    }
}

/// Document HTML complet : un `<span>` coloré par cellule non vide, dans un `<pre>`.
///
/// Cells without color and blank glyphs are written bare. Rows are streamed
/// one at a time.
///
/// # Errors
/// Returns an error if the writer fails.
///
/// # Example
/// ```
/// use pg_core::color::{Rgb, Swatch};
/// use pg_core::config::ColorLayer;
/// use pg_core::frame::Artwork;
/// use pg_export::html::write_html;
///
/// let art = Artwork::from_cells(1, 1, vec![('<', Some(Swatch::direct(Rgb::new(255, 0, 0))))]);
/// let mut out = Vec::new();
/// write_html(&art, ColorLayer::Foreground, &mut out).unwrap();
/// let html = String::from_utf8(out).unwrap();
/// assert!(html.contains("<span style=\"color:#ff0000\">&lt;</span>"));
/// ```
pub fn write_html<W: Write>(artwork: &Artwork, layer: ColorLayer, out: &mut W) -> Result<()> {
    let property = match layer {
        ColorLayer::Foreground => "color",
        ColorLayer::Background => "background-color",
    };
    out.write_all(HTML_HEAD.as_bytes())?;
    let mut line = String::new();
    for (glyphs, colors) in artwork.rows_iter() {
        line.clear();
        for (&glyph, color) in glyphs.iter().zip(colors) {
            match color {
                Some(swatch) if glyph != ' ' => {
                    line.push_str("<span style=\"");
                    line.push_str(property);
                    line.push(':');
                    line.push_str(&swatch.rgb.to_hex());
                    line.push_str("\">");
                    push_escaped(&mut line, glyph);
                    line.push_str("</span>");
                }
                _ => push_escaped(&mut line, glyph),
            }
        }
        line.push('\n');
        out.write_all(line.as_bytes())?;
    }
    out.write_all(HTML_TAIL.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Crée (ou écrase) `path` et y écrit le document HTML.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn export_html(artwork: &Artwork, layer: ColorLayer, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Impossible de créer {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_html(artwork, layer, &mut out)
        .with_context(|| format!("Écriture de {} impossible", path.display()))?;
    log::info!("HTML exporté : {}", path.display());
    Ok(())
}

/// Sink that writes an HTML document to a file path.
pub struct HtmlFile {
    path: PathBuf,
    layer: ColorLayer,
}

impl HtmlFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, layer: ColorLayer) -> Self {
        Self {
            path: path.into(),
            layer,
        }
    }
}

impl ArtworkSink for HtmlFile {
    fn render(&mut self, artwork: &Artwork) -> Result<()> {
        export_html(artwork, self.layer, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pg_core::color::{Rgb, Swatch};

    fn sample() -> Artwork {
        let red = Some(Swatch::indexed(Rgb::new(255, 0, 0), 196));
        let gray = Some(Swatch::indexed(Rgb::new(8, 8, 8), 232));
        Artwork::from_cells(
            2,
            3,
            vec![
                ('&', red),
                (' ', red),
                ('>', None),
                ('@', gray),
                ('"', red),
                ('.', None),
            ],
        )
    }

    fn render(layer: ColorLayer) -> String {
        let mut out = Vec::new();
        write_html(&sample(), layer, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn document_is_complete_and_rows_are_lines() {
        let html = render(ColorLayer::Foreground);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.trim_end().ends_with("</html>"));
        let body: Vec<&str> = html
            .split("<pre>\n")
            .nth(1)
            .and_then(|s| s.split("</pre>").next())
            .unwrap()
            .lines()
            .collect();
        assert_eq!(
            body,
            [
                "<span style=\"color:#ff0000\">&amp;</span> &gt;",
                "<span style=\"color:#080808\">@</span><span style=\"color:#ff0000\">&quot;</span>.",
            ]
        );
    }

    #[test]
    fn one_span_per_colored_non_space_cell() {
        let html = render(ColorLayer::Foreground);
        assert_eq!(html.matches("<span").count(), 3);
        assert_eq!(html.matches("</span>").count(), 3);
    }

    #[test]
    fn background_layer_sets_background_color() {
        let html = render(ColorLayer::Background);
        assert!(html.contains("<span style=\"background-color:#ff0000\">&amp;</span>"));
        assert!(!html.contains("style=\"color:"));
    }

    #[test]
    fn sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.html");
        HtmlFile::new(&path, ColorLayer::Foreground).render(&sample()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, render(ColorLayer::Foreground));
    }
}
