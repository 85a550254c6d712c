use crate::color::{Rgb, Swatch};
use crate::error::CoreError;
use crate::frame::{Artwork, Image};

/// Fournit l'image source au pipeline.
///
/// Implémenté par : `FileSource`, `StdinSource`. Any failure (I/O, decoding)
/// surfaces as [`CoreError::SourceUnavailable`] and aborts the run before
/// preprocessing starts.
///
/// # Example
/// ```
/// use pg_core::traits::Source;
/// use pg_core::frame::Image;
/// use pg_core::error::CoreError;
///
/// struct Solid;
/// impl Source for Solid {
///     fn acquire(&mut self) -> Result<Image, CoreError> { Ok(Image::filled(2, 2, [0, 0, 0, 255])) }
///     fn describe(&self) -> String { "solid".into() }
/// }
/// assert_eq!(Solid.acquire().unwrap().width, 2);
/// ```
pub trait Source {
    /// Load the image.
    ///
    /// # Errors
    /// [`CoreError::SourceUnavailable`] when the image cannot be obtained.
    fn acquire(&mut self) -> Result<Image, CoreError>;

    /// Nom lisible pour les logs.
    fn describe(&self) -> String;
}

/// "Given a color, return the closest palette entry."
///
/// Read-only after construction and shared across rayon workers.
///
/// # Example
/// ```
/// use pg_core::traits::NearestColor;
/// use pg_core::color::{Rgb, Swatch};
///
/// struct Identity;
/// impl NearestColor for Identity {
///     fn nearest(&self, color: Rgb) -> Swatch { Swatch::direct(color) }
///     fn name(&self) -> &'static str { "identity" }
/// }
/// assert_eq!(Identity.nearest(Rgb::new(1, 2, 3)).rgb, Rgb::new(1, 2, 3));
/// ```
pub trait NearestColor: Send + Sync {
    /// Closest entry by Euclidean RGB distance. Ties resolve deterministically.
    fn nearest(&self, color: Rgb) -> Swatch;

    /// Nom lisible pour le debug.
    fn name(&self) -> &'static str;
}

/// Serializes an [`Artwork`] to an output.
pub trait ArtworkSink {
    /// Write the whole artwork.
    ///
    /// # Errors
    /// Returns an error if the underlying writer fails.
    fn render(&mut self, artwork: &Artwork) -> anyhow::Result<()>;
}
