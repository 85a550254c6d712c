use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pg_core::frame::Artwork;
use pg_core::traits::ArtworkSink;

/// Écrit les glyphes, une ligne par rangée, sans couleur.
///
/// Same bytes as the monochrome terminal output.
///
/// # Errors
/// Returns an error if the writer fails.
///
/// # Example
/// ```
/// use pg_core::frame::Artwork;
/// use pg_export::text::write_text;
/// let art = Artwork::from_cells(2, 1, vec![('<', None), ('@', None)]);
/// let mut out = Vec::new();
/// write_text(&art, &mut out).unwrap();
/// assert_eq!(out, b"<\n@\n");
/// ```
pub fn write_text<W: Write>(artwork: &Artwork, out: &mut W) -> Result<()> {
    let mut line = String::with_capacity(artwork.columns() * 4 + 1);
    for (glyphs, _) in artwork.rows_iter() {
        line.clear();
        line.extend(glyphs);
        line.push('\n');
        out.write_all(line.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// Crée (ou écrase) `path` et y écrit l'artwork en texte brut.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn export_text(artwork: &Artwork, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Impossible de créer {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_text(artwork, &mut out).with_context(|| format!("Écriture de {} impossible", path.display()))?;
    log::info!("Texte exporté : {}", path.display());
    Ok(())
}

/// Sink that writes plain text to a file path.
pub struct TextFile {
    path: PathBuf,
}

impl TextFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArtworkSink for TextFile {
    fn render(&mut self, artwork: &Artwork) -> Result<()> {
        export_text(artwork, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pg_core::color::{Rgb, Swatch};

    #[test]
    fn text_file_matches_glyph_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.txt");
        let red = Some(Swatch::indexed(Rgb::new(255, 0, 0), 196));
        let art = Artwork::from_cells(2, 2, vec![('#', red), (' ', None), ('.', red), ('@', None)]);

        TextFile::new(&path).render(&art).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# \n.@\n");
        assert_eq!(content, art.to_text());
    }

    #[test]
    fn unwritable_path_reports_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("art.txt");
        let art = Artwork::from_cells(1, 1, vec![('x', None)]);
        let err = export_text(&art, &path).unwrap_err();
        assert!(format!("{err:#}").contains("art.txt"));
    }
}
