//! Moteur de conversion image → grille de caractères.
//!
//! Preprocessing, grid geometry, palette search and per-tile analysis, tied
//! together by [`converter::Converter`].
pub mod analyzer;
pub mod converter;
pub mod palette;
pub mod preprocess;
pub mod tiler;

pub use converter::Converter;
