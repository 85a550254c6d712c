/// Export fichier : texte brut et HTML.
pub mod html;
pub mod text;

pub use html::{HtmlFile, export_html, write_html};
pub use text::{TextFile, export_text, write_text};
