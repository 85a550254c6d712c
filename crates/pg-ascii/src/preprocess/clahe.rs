//! CLAHE: égalisation adaptative à contraste limité.
//!
//! The image is split into a `grid × grid` mosaic (fewer tiles on images
//! smaller than the grid). Each tile gets its own equalization curve from a
//! clipped histogram; the excess above the clip level is spread evenly over
//! all bins. Each pixel then blends the curves of the four nearest tile
//! centres bilinearly, which removes seams between tiles.

use pg_core::color::luma_u8;
use pg_core::error::CoreError;
use pg_core::frame::Image;

use super::map_luma;

/// Contrast-limited adaptive histogram equalization of the luma channel.
///
/// `clip_limit` is expressed as a multiple of the mean bin height
/// (`tile_area / 256`), as in the usual CLAHE parameterization.
///
/// # Errors
/// [`CoreError::InvalidImage`] on a zero-sized image,
/// [`CoreError::PreprocessingFailure`] if `clip_limit` is not a positive
/// finite number or `grid` is 0.
///
/// # Example
/// ```
/// use pg_ascii::preprocess::adaptive_equalize;
/// use pg_core::frame::Image;
/// let img = Image::filled(64, 64, [40, 40, 40, 255]);
/// let out = adaptive_equalize(&img, 2.0, 8).unwrap();
/// assert_eq!((out.width, out.height), (64, 64));
/// ```
pub fn adaptive_equalize(image: &Image, clip_limit: f32, grid: u32) -> Result<Image, CoreError> {
    image.validate()?;
    if !(clip_limit.is_finite() && clip_limit > 0.0) {
        return Err(CoreError::preprocessing(format!(
            "CLAHE : clip_limit {clip_limit} (doit être > 0)"
        )));
    }
    if grid == 0 {
        return Err(CoreError::preprocessing("CLAHE : grille de 0 tuile"));
    }

    let tiles_x = grid.min(image.width);
    let tiles_y = grid.min(image.height);

    let mut curves = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        let (y0, y1) = span(ty, tiles_y, image.height);
        for tx in 0..tiles_x {
            let (x0, x1) = span(tx, tiles_x, image.width);
            let mut hist = [0u32; 256];
            for y in y0..y1 {
                let row = image.row(y);
                for px in row[(x0 as usize * 4)..(x1 as usize * 4)].chunks_exact(4) {
                    hist[luma_u8(px[0], px[1], px[2]) as usize] += 1;
                }
            }
            let area = (x1 - x0) * (y1 - y0);
            curves.push(clipped_curve(&mut hist, area, clip_limit));
        }
    }

    let tile_w = image.width as f32 / tiles_x as f32;
    let tile_h = image.height as f32 / tiles_y as f32;

    Ok(map_luma(image, |x, y, luma| {
        let (cx0, cx1, ax) = neighbours(x, tile_w, tiles_x);
        let (cy0, cy1, ay) = neighbours(y, tile_h, tiles_y);
        let at = |tx: u32, ty: u32| f32::from(curves[(ty * tiles_x + tx) as usize][luma as usize]);
        let top = at(cx0, cy0) * (1.0 - ax) + at(cx1, cy0) * ax;
        let bottom = at(cx0, cy1) * (1.0 - ax) + at(cx1, cy1) * ax;
        (top * (1.0 - ay) + bottom * ay).round().clamp(0.0, 255.0) as u8
    }))
}

/// Pixel range `[start, end)` of tile `i` among `n` over `len` pixels.
fn span(i: u32, n: u32, len: u32) -> (u32, u32) {
    let start = u64::from(i) * u64::from(len) / u64::from(n);
    let end = (u64::from(i) + 1) * u64::from(len) / u64::from(n);
    (start as u32, end as u32)
}

/// The two tile centres around pixel `p` and the blend weight of the second.
fn neighbours(p: u32, tile: f32, n: u32) -> (u32, u32, f32) {
    let f = (p as f32 + 0.5) / tile - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    let i0 = f.floor() as u32;
    if i0 >= n - 1 {
        return (n - 1, n - 1, 0.0);
    }
    (i0, i0 + 1, f - i0 as f32)
}

/// Clip, redistribute, and integrate a tile histogram into a mapping curve.
fn clipped_curve(hist: &mut [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }
    let bonus = excess / 256;
    for count in hist.iter_mut() {
        *count += bonus;
    }
    // Le reste est réparti à pas régulier sur tout l'histogramme.
    let residual = excess % 256;
    if residual > 0 {
        let step = (256 / residual).max(1) as usize;
        for count in hist.iter_mut().step_by(step).take(residual as usize) {
            *count += 1;
        }
    }

    let mut curve = [0u8; 256];
    let scale = 255.0 / area.max(1) as f32;
    let mut cdf = 0u32;
    for (slot, &count) in curve.iter_mut().zip(hist.iter()) {
        cdf += count;
        *slot = (cdf as f32 * scale).round().min(255.0) as u8;
    }
    curve
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_cover_the_axis_without_overlap() {
        let mut next = 0;
        for i in 0..8 {
            let (s, e) = span(i, 8, 37);
            assert_eq!(s, next);
            assert!(e > s);
            next = e;
        }
        assert_eq!(next, 37);
    }

    #[test]
    fn neighbours_clamp_at_borders() {
        assert_eq!(neighbours(0, 10.0, 4), (0, 0, 0.0));
        assert_eq!(neighbours(39, 10.0, 4), (3, 3, 0.0));
        let (a, b, w) = neighbours(10, 10.0, 4);
        assert_eq!((a, b), (0, 1));
        assert!((w - 0.55).abs() < 1e-4);
    }

    #[test]
    fn clipping_conserves_mass() {
        let mut hist = [0u32; 256];
        hist[10] = 900;
        hist[200] = 124;
        let curve = clipped_curve(&mut hist, 1024, 2.0);
        assert_eq!(hist.iter().sum::<u32>(), 1024);
        assert_eq!(curve[255], 255);
        assert!(curve.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn clip_limit_flattens_uniform_tiles() {
        // Sans écrêtage une zone uniforme saute à 255 ; avec, elle reste proche.
        let img = Image::filled(64, 64, [100, 100, 100, 255]);
        let out = adaptive_equalize(&img, 2.0, 8).unwrap();
        let (r, _, _, _) = out.pixel(32, 32);
        assert!(r < 160, "zone uniforme trop amplifiée : {r}");
    }

    #[test]
    fn raises_local_contrast() {
        let mut img = Image::new(32, 32);
        for (i, px) in img.data.chunks_exact_mut(4).enumerate() {
            let v = 100 + ((i % 32) as u8 % 8);
            px.copy_from_slice(&[v, v, v, 255]);
        }
        let out = adaptive_equalize(&img, 4.0, 4).unwrap();
        let spread = |im: &Image| {
            let row: Vec<u8> = (0..8).map(|x| im.luminance(x, 16)).collect();
            row.iter().max().unwrap() - row.iter().min().unwrap()
        };
        assert!(spread(&out) > spread(&img));
    }

    #[test]
    fn rejects_bad_parameters() {
        let img = Image::filled(4, 4, [0, 0, 0, 255]);
        assert!(matches!(
            adaptive_equalize(&img, 0.0, 8),
            Err(CoreError::PreprocessingFailure(_))
        ));
        assert!(adaptive_equalize(&img, 2.0, 0).is_err());
    }
}
