use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pg_ascii::Converter;
use pg_ascii::palette::{KdPalette, Palette};
use pg_core::color::Rgb;
use pg_core::config::{ConversionConfig, IntensityMode};
use pg_core::frame::Image;
use pg_core::traits::NearestColor;

fn gradient(width: u32, height: u32) -> Image {
    let mut img = Image::new(width, height);
    for (i, px) in img.data.chunks_exact_mut(4).enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        px.copy_from_slice(&[
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x + y) % 256) as u8,
            255,
        ]);
    }
    img
}

fn bench_convert(c: &mut Criterion) {
    let img = gradient(1280, 720);

    let converter = Converter::new(&ConversionConfig::default()).unwrap_or_else(|e| panic!("{e}"));
    c.bench_function("convert_720p_mean_clahe", |b| {
        b.iter(|| converter.convert(black_box(&img)));
    });

    let adaptive = ConversionConfig {
        intensity: IntensityMode::AdaptiveThreshold,
        ..ConversionConfig::default()
    };
    let converter = Converter::new(&adaptive).unwrap_or_else(|e| panic!("{e}"));
    c.bench_function("convert_720p_adaptive", |b| {
        b.iter(|| converter.convert(black_box(&img)));
    });
}

fn bench_nearest(c: &mut Criterion) {
    let matcher = KdPalette::new(Palette::xterm256());
    c.bench_function("xterm256_nearest_4096", |b| {
        b.iter(|| {
            for i in 0..4096u32 {
                let color = Rgb::new((i * 7) as u8, (i * 13) as u8, (i * 29) as u8);
                black_box(matcher.nearest(black_box(color)));
            }
        });
    });
}

criterion_group!(benches, bench_convert, bench_nearest);
criterion_main!(benches);
