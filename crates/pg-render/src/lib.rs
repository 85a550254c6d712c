/// Rendu terminal pour pixglyph.
///
/// Writes an `Artwork` as plain glyph lines or as crossterm color escapes.
pub mod terminal;

pub use terminal::{TerminalMode, TerminalRenderer};
