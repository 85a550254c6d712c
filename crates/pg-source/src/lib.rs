/// Sources d'image pour pixglyph (fichier, entrée standard, URL).

pub mod image;
pub mod url;

pub use crate::image::{FileSource, StdinSource};
pub use crate::url::UrlSource;
