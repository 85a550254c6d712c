use serde::{Deserialize, Serialize};

/// Poids BT.601 (luma Y de YCbCr pleine échelle).
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// An 8-bit RGB triple.
///
/// # Example
/// ```
/// use pg_core::color::Rgb;
/// let c = Rgb::new(255, 0, 0);
/// assert_eq!(c.channel(0), 255);
/// assert_eq!(c.inverted(), Rgb::new(0, 255, 255));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Component by axis index: 0 = r, 1 = g, anything else = b.
    #[inline(always)]
    #[must_use]
    pub const fn channel(self, axis: usize) -> u8 {
        match axis {
            0 => self.r,
            1 => self.g,
            _ => self.b,
        }
    }

    /// Componentwise `255 - c`.
    #[must_use]
    pub const fn inverted(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Squared Euclidean distance in RGB space.
    ///
    /// # Example
    /// ```
    /// use pg_core::color::Rgb;
    /// assert_eq!(Rgb::new(0, 0, 0).distance_sq(Rgb::new(3, 4, 0)), 25);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn distance_sq(self, other: Self) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db) as u32
    }

    /// CSS hex notation, `#rrggbb`.
    ///
    /// # Example
    /// ```
    /// use pg_core::color::Rgb;
    /// assert_eq!(Rgb::new(255, 8, 0).to_hex(), "#ff0800");
    /// ```
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Luma BT.601 in [0, 255].
    #[inline(always)]
    #[must_use]
    pub fn luma(self) -> f32 {
        luma(f32::from(self.r), f32::from(self.g), f32::from(self.b))
    }
}

/// A palette entry: the reference color and the terminal code used to emit it.
///
/// `code` is the xterm 256-color index for bounded palettes and `None` for
/// truecolor entries, which are emitted as 24-bit escapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Swatch {
    /// Reference color.
    pub rgb: Rgb,
    /// xterm color index (0..=255), if the entry belongs to an indexed palette.
    pub code: Option<u8>,
}

impl Swatch {
    /// Entry of an indexed palette.
    #[must_use]
    pub const fn indexed(rgb: Rgb, code: u8) -> Self {
        Self {
            rgb,
            code: Some(code),
        }
    }

    /// 24-bit entry, no palette code.
    #[must_use]
    pub const fn direct(rgb: Rgb) -> Self {
        Self { rgb, code: None }
    }
}

/// Luma BT.601 d'un triplet flottant.
///
/// # Example
/// ```
/// use pg_core::color::luma;
/// assert!((luma(255.0, 255.0, 255.0) - 255.0).abs() < 1e-3);
/// assert!((luma(255.0, 0.0, 0.0) - 76.245).abs() < 1e-3);
/// ```
#[inline(always)]
#[must_use]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    r * LUMA_WEIGHTS[0] + g * LUMA_WEIGHTS[1] + b * LUMA_WEIGHTS[2]
}

/// Luma quantifiée sur 8 bits, comme le canal Y d'un YCbCr 8 bits.
#[inline(always)]
#[must_use]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    luma(f32::from(r), f32::from(g), f32::from(b))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Shift the Y channel of a color by `delta`, keeping Cb and Cr.
///
/// In full-range YCbCr the inverse transform has a unit Y coefficient on all
/// three channels, so replacing Y by `Y + delta` and converting back adds
/// `delta` to R, G and B. Working on the difference keeps an identity mapping
/// exact instead of paying a float round-trip per pixel.
///
/// # Example
/// ```
/// use pg_core::color::shift_luma;
/// assert_eq!(shift_luma(10, 100, 250, 20), (30, 120, 255));
/// assert_eq!(shift_luma(10, 100, 250, 0), (10, 100, 250));
/// ```
#[inline(always)]
#[must_use]
pub fn shift_luma(r: u8, g: u8, b: u8, delta: i16) -> (u8, u8, u8) {
    let shift = |c: u8| (i16::from(c) + delta).clamp(0, 255) as u8;
    (shift(r), shift(g), shift(b))
}
