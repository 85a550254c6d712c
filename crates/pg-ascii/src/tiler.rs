use pg_core::error::CoreError;

/// Plus grand nombre de cellules accepté pour une grille (4096 × 4096).
pub const MAX_CELLS: u64 = 1 << 24;

/// Character-grid geometry derived from image dimensions.
///
/// Read-only once computed. `columns` always equals the requested width and
/// `rows` is at least 1.
///
/// # Example
/// ```
/// use pg_ascii::tiler::compute_geometry;
/// let g = compute_geometry(200, 100, 50, 0.5).unwrap();
/// assert_eq!((g.columns, g.rows), (50, 12));
/// assert_eq!((g.column_step, g.row_step), (4, 8));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Number of character columns (= requested width).
    pub columns: u32,
    /// Number of character rows.
    pub rows: u32,
    /// Horizontal pixel extent of one tile.
    pub column_step: u32,
    /// Vertical pixel extent of one tile.
    pub row_step: u32,
    /// Source width in pixels.
    pub image_width: u32,
    /// Source height in pixels.
    pub image_height: u32,
}

/// Rectangular pixel region mapped to one output cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Tile {
    /// Number of pixels covered.
    #[must_use]
    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// Compute the grid for an image of `image_width × image_height` pixels.
///
/// `rows = max(1, floor(height * columns / width * char_aspect_ratio))`;
/// steps are integer divisions. Pixels past the last full tile are left
/// unused. When the grid is finer than the image the step is raised to 1.
///
/// # Errors
/// - [`CoreError::InvalidConfiguration`] if `requested_columns ≤ 0`,
///   `char_aspect_ratio` is not a positive finite number, or the grid would
///   exceed [`MAX_CELLS`];
/// - [`CoreError::InvalidImage`] if a dimension is zero.
///
/// # Example
/// ```
/// use pg_ascii::tiler::compute_geometry;
/// use pg_core::error::CoreError;
/// assert!(matches!(compute_geometry(10, 10, 0, 0.5), Err(CoreError::InvalidConfiguration(_))));
/// ```
pub fn compute_geometry(
    image_width: u32,
    image_height: u32,
    requested_columns: i64,
    char_aspect_ratio: f32,
) -> Result<Geometry, CoreError> {
    if requested_columns <= 0 {
        return Err(CoreError::config(format!(
            "largeur demandée {requested_columns} (doit être > 0)"
        )));
    }
    let columns = u32::try_from(requested_columns).map_err(|_| {
        CoreError::config(format!("largeur demandée {requested_columns} trop grande"))
    })?;
    if !char_aspect_ratio.is_finite() || char_aspect_ratio <= 0.0 {
        return Err(CoreError::config(format!(
            "ratio d'aspect {char_aspect_ratio} (doit être fini et > 0)"
        )));
    }
    if image_width == 0 || image_height == 0 {
        return Err(CoreError::image(format!(
            "dimensions invalides : {image_width}×{image_height}"
        )));
    }

    let rows_f = f64::from(image_height)
        * (f64::from(columns) / f64::from(image_width))
        * f64::from(char_aspect_ratio);
    let rows = (rows_f.floor().min(f64::from(u32::MAX)) as u32).max(1);
    let cells = u64::from(rows).checked_mul(u64::from(columns));
    if cells.is_none_or(|n| n > MAX_CELLS) {
        return Err(CoreError::config(format!(
            "grille {columns}×{rows} trop grande (max {MAX_CELLS} cellules)"
        )));
    }

    Ok(Geometry {
        columns,
        rows,
        column_step: (image_width / columns).max(1),
        row_step: (image_height / rows).max(1),
        image_width,
        image_height,
    })
}

impl Geometry {
    /// Tile for the cell at (`row`, `column`).
    ///
    /// Origins are clamped inside the image and extents truncated at its
    /// edge, so a tile always covers at least one pixel.
    ///
    /// # Example
    /// ```
    /// use pg_ascii::tiler::compute_geometry;
    /// let g = compute_geometry(10, 20, 3, 0.5).unwrap();
    /// let last = g.tile(0, 2);
    /// assert_eq!((last.x, last.width), (6, 3));
    /// ```
    #[must_use]
    pub fn tile(&self, row: u32, column: u32) -> Tile {
        let (x, width) = axis(column, self.column_step, self.image_width);
        let (y, height) = axis(row, self.row_step, self.image_height);
        Tile {
            x,
            y,
            width,
            height,
        }
    }

    /// Total number of cells.
    #[must_use]
    pub fn cells(&self) -> usize {
        self.rows as usize * self.columns as usize
    }
}

fn axis(index: u32, step: u32, len: u32) -> (u32, u32) {
    let start = (u64::from(index) * u64::from(step)).min(u64::from(len - 1)) as u32;
    (start, step.min(len - start))
}
