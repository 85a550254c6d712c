use crate::color::{Rgb, Swatch, luma_u8};
use crate::error::CoreError;

/// Buffer de pixels RGBA 8 bits, row-major, 4 octets par pixel.
///
/// Never mutated in place by the pipeline: every transform returns a new image.
///
/// # Example
/// ```
/// use pg_core::frame::Image;
/// let img = Image::new(10, 10);
/// assert_eq!(img.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Image {
    /// Transparent black image of the given size.
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::Image;
    /// let img = Image::new(100, 50);
    /// assert_eq!(img.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Image filled with one RGBA value.
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::Image;
    /// let img = Image::filled(2, 2, [255, 0, 0, 255]);
    /// assert_eq!(img.pixel(1, 1), (255, 0, 0, 255));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            data: rgba.repeat(count),
            width,
            height,
        }
    }

    /// Build an image from raw interleaved samples with 3 (RGB) or 4 (RGBA) channels.
    ///
    /// RGB input gets an opaque alpha channel.
    ///
    /// # Errors
    /// [`CoreError::InvalidImage`] on a zero dimension, an unsupported channel
    /// count, or a buffer whose length does not match the dimensions.
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::Image;
    /// let img = Image::from_raw(1, 1, 3, vec![1, 2, 3]).unwrap();
    /// assert_eq!(img.pixel(0, 0), (1, 2, 3, 255));
    /// assert!(Image::from_raw(1, 1, 2, vec![0, 0]).is_err());
    /// ```
    pub fn from_raw(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self, CoreError> {
        if channels != 3 && channels != 4 {
            return Err(CoreError::image(format!(
                "nombre de canaux non supporté : {channels} (attendu 3 ou 4)"
            )));
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(CoreError::image(format!(
                "taille de buffer {} incohérente avec {width}×{height}×{channels}",
                data.len()
            )));
        }
        let data = if channels == 4 {
            data
        } else {
            data.chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect()
        };
        let img = Self { data, width, height };
        img.validate()?;
        Ok(img)
    }

    /// Check the dimensions and buffer length.
    ///
    /// # Errors
    /// [`CoreError::InvalidImage`] if either dimension is zero or the buffer
    /// is not `width * height * 4` bytes long.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::image(format!(
                "dimensions invalides : {}×{}",
                self.width, self.height
            )));
        }
        if self.data.len() != self.width as usize * self.height as usize * 4 {
            return Err(CoreError::image(format!(
                "buffer de {} octets pour {}×{} RGBA",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::Image;
    /// let img = Image::new(10, 10);
    /// assert_eq!(img.pixel(0, 0), (0, 0, 0, 0));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Luma BT.601 du pixel (x, y), alpha ignoré.
    #[inline(always)]
    #[must_use]
    pub fn luminance(&self, x: u32, y: u32) -> u8 {
        let (r, g, b, _) = self.pixel(x, y);
        luma_u8(r, g, b)
    }

    /// Row `y` as a slice of RGBA bytes.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }
}

/// Result of a conversion: a glyph grid and a parallel color grid.
///
/// Both grids are row-major with `rows * columns` cells. A `None` color marks
/// a see-through cell that must not be colored.
///
/// # Example
/// ```
/// use pg_core::frame::Artwork;
/// use pg_core::color::{Rgb, Swatch};
/// let art = Artwork::from_cells(1, 2, vec![('@', Some(Swatch::direct(Rgb::new(1, 2, 3)))), (' ', None)]);
/// assert_eq!(art.glyph(0, 0), '@');
/// assert_eq!(art.color(0, 1), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artwork {
    rows: usize,
    columns: usize,
    glyphs: Vec<char>,
    colors: Vec<Option<Swatch>>,
}

impl Artwork {
    /// Assemble an artwork from row-major `(glyph, color)` cells.
    ///
    /// # Panics
    /// Panics if `cells.len() != rows * columns`.
    #[must_use]
    pub fn from_cells(rows: usize, columns: usize, cells: Vec<(char, Option<Swatch>)>) -> Self {
        assert_eq!(cells.len(), rows * columns, "grille incohérente");
        let (glyphs, colors) = cells.into_iter().unzip();
        Self {
            rows,
            columns,
            glyphs,
            colors,
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    #[must_use]
    pub fn glyph(&self, row: usize, column: usize) -> char {
        self.glyphs[row * self.columns + column]
    }

    #[inline]
    #[must_use]
    pub fn color(&self, row: usize, column: usize) -> Option<Swatch> {
        self.colors[row * self.columns + column]
    }

    /// Iterate rows as `(glyphs, colors)` slice pairs.
    ///
    /// # Example
    /// ```
    /// use pg_core::frame::Artwork;
    /// let art = Artwork::from_cells(2, 1, vec![('a', None), ('b', None)]);
    /// let text: Vec<String> = art.rows_iter().map(|(g, _)| g.iter().collect()).collect();
    /// assert_eq!(text, ["a", "b"]);
    /// ```
    pub fn rows_iter(&self) -> impl Iterator<Item = (&[char], &[Option<Swatch>])> {
        self.glyphs
            .chunks(self.columns.max(1))
            .zip(self.colors.chunks(self.columns.max(1)))
    }

    /// Glyph grid as text, one `\n`-terminated line per row.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.rows * (self.columns + 1));
        for (glyphs, _) in self.rows_iter() {
            out.extend(glyphs);
            out.push('\n');
        }
        out
    }

    /// Distinct reference colors used by the artwork (diagnostics).
    #[must_use]
    pub fn distinct_colors(&self) -> usize {
        let mut seen: Vec<Rgb> = self.colors.iter().flatten().map(|s| s.rgb).collect();
        seen.sort_unstable_by_key(|c| (c.r, c.g, c.b));
        seen.dedup();
        seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_zero_dimensions() {
        let img = Image::new(0, 5);
        assert!(matches!(img.validate(), Err(CoreError::InvalidImage(_))));
        assert!(Image::from_raw(0, 0, 4, Vec::new()).is_err());
    }

    #[test]
    fn from_raw_rejects_length_mismatch() {
        assert!(Image::from_raw(2, 2, 4, vec![0; 15]).is_err());
    }

    #[test]
    fn row_slices_match_pixels() {
        let mut img = Image::new(3, 2);
        img.data[12..16].copy_from_slice(&[9, 8, 7, 6]);
        assert_eq!(&img.row(1)[0..4], &[9, 8, 7, 6]);
        assert_eq!(img.pixel(0, 1), (9, 8, 7, 6));
    }

    #[test]
    fn artwork_text_has_one_line_per_row() {
        let art = Artwork::from_cells(2, 2, vec![('a', None), ('b', None), ('c', None), ('d', None)]);
        assert_eq!(art.to_text(), "ab\ncd\n");
        assert_eq!(art.distinct_colors(), 0);
    }
}
