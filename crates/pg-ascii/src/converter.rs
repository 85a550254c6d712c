use pg_core::charset::DensityMap;
use pg_core::config::ConversionConfig;
use pg_core::error::CoreError;
use pg_core::frame::{Artwork, Image};
use rayon::prelude::*;

use crate::analyzer::CellAnalyzer;
use crate::palette::matcher_for;
use crate::preprocess::Preprocessor;
use crate::tiler::{Geometry, compute_geometry};

/// Converter orchestre prétraitement → géométrie → analyse des tuiles.
///
/// Built once from a validated [`ConversionConfig`]; palette, density map and
/// intensity strategy stay fixed for every image converted with it.
///
/// # Example
/// ```
/// use pg_ascii::converter::Converter;
/// use pg_core::config::ConversionConfig;
/// use pg_core::frame::Image;
///
/// let config = ConversionConfig { width: 4, ..ConversionConfig::default() };
/// let converter = Converter::new(&config).unwrap();
/// let art = converter.convert(&Image::filled(16, 16, [90, 90, 90, 255])).unwrap();
/// assert_eq!(art.columns(), 4);
/// ```
pub struct Converter {
    width: i64,
    char_aspect_ratio: f32,
    preprocessor: Option<Preprocessor>,
    analyzer: CellAnalyzer,
}

impl Converter {
    /// # Errors
    /// [`CoreError::InvalidConfiguration`] if `config` does not validate,
    /// [`CoreError::PreprocessingFailure`] for an unusable preprocessing parameter.
    pub fn new(config: &ConversionConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let density_map = DensityMap::new(&config.density_map)?;
        let analyzer = CellAnalyzer::new(density_map, matcher_for(config.palette), config.intensity)
            .with_invert(config.invert)
            .with_alpha_weighting(config.alpha_weighted);
        log::debug!(
            "Converter : {} colonnes, palette {}, {} glyphes, {:?}",
            config.width,
            analyzer.matcher().name(),
            analyzer.density_map().len(),
            config.intensity
        );
        let preprocessor = config
            .preprocess
            .any()
            .then(|| Preprocessor::new(config.preprocess.clone()));
        Ok(Self {
            width: config.width,
            char_aspect_ratio: config.char_aspect_ratio,
            preprocessor,
            analyzer,
        })
    }

    /// Grid geometry this converter would use for `image`.
    ///
    /// # Errors
    /// [`CoreError::InvalidImage`] on a zero-sized image.
    pub fn geometry(&self, image: &Image) -> Result<Geometry, CoreError> {
        compute_geometry(image.width, image.height, self.width, self.char_aspect_ratio)
    }

    /// Convert one image into an [`Artwork`].
    ///
    /// Rows are analysed in parallel; each worker fills only its own row, so
    /// the result does not depend on scheduling.
    ///
    /// # Errors
    /// [`CoreError::InvalidImage`] on a malformed image,
    /// [`CoreError::InvalidConfiguration`] if the grid exceeds
    /// [`MAX_CELLS`](crate::tiler::MAX_CELLS),
    /// [`CoreError::PreprocessingFailure`] if a preprocessing step fails.
    pub fn convert(&self, image: &Image) -> Result<Artwork, CoreError> {
        image.validate()?;
        let geometry = self.geometry(image)?;

        let prepared;
        let source = match &self.preprocessor {
            Some(pre) => {
                prepared = pre.apply(image)?;
                &prepared
            }
            None => image,
        };

        log::debug!(
            "Grille {}×{} (tuiles {}×{} px) pour {}×{}",
            geometry.columns,
            geometry.rows,
            geometry.column_step,
            geometry.row_step,
            image.width,
            image.height
        );

        let columns = geometry.columns as usize;
        let mut cells = vec![(' ', None); geometry.cells()];
        cells
            .par_chunks_mut(columns)
            .enumerate()
            .for_each(|(row, out)| {
                for (column, cell) in out.iter_mut().enumerate() {
                    let tile = geometry.tile(row as u32, column as u32);
                    *cell = self.analyzer.analyze(source, tile);
                }
            });

        Ok(Artwork::from_cells(geometry.rows as usize, columns, cells))
    }
}
