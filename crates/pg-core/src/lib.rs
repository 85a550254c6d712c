/// Configuration, types, and shared structures for pixglyph.
///
/// This crate contains all shared types, traits, and configuration logic
/// used across the pixglyph workspace.

pub mod charset;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::DensityMap;
pub use color::{Rgb, Swatch};
pub use config::ConversionConfig;
pub use error::CoreError;
pub use frame::{Artwork, Image};
