use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pg_core::error::CoreError;
use pg_core::frame::Image;
use pg_core::traits::Source;

/// Source d'image statique lue depuis un fichier (PNG, JPEG, BMP, GIF).
///
/// The file is opened on [`Source::acquire`], not at construction.
///
/// # Example
/// ```no_run
/// use pg_source::image::FileSource;
/// use pg_core::traits::Source;
/// let mut source = FileSource::new("photo.png");
/// let image = source.acquire().unwrap();
/// ```
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for FileSource {
    fn acquire(&mut self) -> Result<Image, CoreError> {
        let image = load_image(&self.path).map_err(unavailable)?;
        log::info!(
            "Image chargée : {} ({}×{})",
            self.path.display(),
            image.width,
            image.height
        );
        Ok(image)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Image encodée lue en entier depuis un flux (l'entrée standard par défaut).
///
/// # Example
/// ```
/// use pg_source::image::StdinSource;
/// use pg_core::traits::Source;
/// use std::io::Cursor;
///
/// let mut source = StdinSource::from_reader(Cursor::new(b"pas une image".to_vec()));
/// assert!(source.acquire().is_err());
/// ```
pub struct StdinSource<R: Read = io::Stdin> {
    reader: R,
}

impl StdinSource {
    #[must_use]
    pub fn new() -> Self {
        Self { reader: io::stdin() }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Read> StdinSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> Source for StdinSource<R> {
    fn acquire(&mut self) -> Result<Image, CoreError> {
        let mut bytes = Vec::new();
        self.reader
            .read_to_end(&mut bytes)
            .context("Lecture de l'entrée standard impossible")
            .map_err(unavailable)?;
        if bytes.is_empty() {
            return Err(CoreError::SourceUnavailable(
                "entrée standard vide".to_string(),
            ));
        }
        let image = decode(&bytes).map_err(unavailable)?;
        log::info!(
            "Image lue sur l'entrée standard ({} octets, {}×{})",
            bytes.len(),
            image.width,
            image.height
        );
        Ok(image)
    }

    fn describe(&self) -> String {
        "<stdin>".to_string()
    }
}

/// Charge et convertit une image en RGBA 8 bits.
///
/// # Errors
/// Returns an error if the file cannot be opened or decoded.
///
/// # Example
/// ```no_run
/// use pg_source::image::load_image;
/// use std::path::Path;
/// let image = load_image(Path::new("photo.png")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<Image> {
    let img = image::open(path).with_context(|| format!("Impossible de charger {}", path.display()))?;
    into_image(&img)
}

/// Decode an in-memory encoded image (format sniffed from its header).
///
/// # Errors
/// Returns an error if the bytes are not a supported image.
pub fn decode(bytes: &[u8]) -> Result<Image> {
    let img = image::load_from_memory(bytes).context("Format d'image non reconnu")?;
    into_image(&img)
}

fn into_image(img: &image::DynamicImage) -> Result<Image> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Image::from_raw(width, height, 4, rgba.into_raw())?)
}

pub(crate) fn unavailable(err: anyhow::Error) -> CoreError {
    CoreError::SourceUnavailable(format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn file_source_decodes_png_with_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        img.put_pixel(2, 1, Rgba([200, 100, 50, 0]));
        img.save(&path).unwrap();

        let mut source = FileSource::new(&path);
        assert_eq!(source.path(), path);
        let loaded = source.acquire().unwrap();
        assert_eq!((loaded.width, loaded.height), (3, 2));
        assert_eq!(loaded.pixel(0, 0), (10, 20, 30, 255));
        assert_eq!(loaded.pixel(2, 1), (200, 100, 50, 0));
        assert!(source.describe().ends_with("dot.png"));
    }

    #[test]
    fn rgb_files_become_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.bmp");
        RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])).save(&path).unwrap();
        let loaded = FileSource::new(&path).acquire().unwrap();
        assert_eq!(loaded.pixel(1, 1), (1, 2, 3, 255));
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSource::new(dir.path().join("absent.png")).acquire().unwrap_err();
        match err {
            CoreError::SourceUnavailable(msg) => assert!(msg.contains("absent.png"), "{msg}"),
            other => panic!("erreur inattendue : {other:?}"),
        }
    }

    #[test]
    fn stdin_source_reads_encoded_bytes() {
        let bytes = png_bytes(&RgbaImage::from_pixel(4, 1, Rgba([9, 9, 9, 255])));
        let mut source = StdinSource::from_reader(Cursor::new(bytes));
        let loaded = source.acquire().unwrap();
        assert_eq!(loaded.width, 4);
        assert_eq!(source.describe(), "<stdin>");
    }

    #[test]
    fn empty_or_garbage_stream_is_rejected() {
        let mut empty = StdinSource::from_reader(Cursor::new(Vec::new()));
        assert!(matches!(empty.acquire(), Err(CoreError::SourceUnavailable(_))));
        let mut garbage = StdinSource::from_reader(Cursor::new(vec![0u8, 1, 2, 3, 4]));
        assert!(matches!(garbage.acquire(), Err(CoreError::SourceUnavailable(_))));
    }
}
