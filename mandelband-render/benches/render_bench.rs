use criterion::{criterion_group, criterion_main, Criterion};

use mandelband_core::{EscapeTime, TileKernel, Viewport};
use mandelband_render::{
    build_tiles, render_frame, ColorMapper, ImageAssembler, RenderRequest, BAND_HEIGHT,
};

fn bench_full_frame_render(c: &mut Criterion) {
    let request = RenderRequest::new(Viewport::default_for(640, 480), 640, 480, 1000);
    let mut assembler = ImageAssembler::new(640, 480);

    c.bench_function("full_frame_640x480", |b| {
        b.iter(|| render_frame(&EscapeTime, &request, BAND_HEIGHT, &mut assembler));
    });
}

fn bench_band_kernel(c: &mut Criterion) {
    let vp = Viewport::default_for(640, 480);

    c.bench_function("band_640x100_1000iter", |b| {
        b.iter(|| {
            EscapeTime.compute_tile(640, 100, vp.offset_x, vp.band_origin_y(200), vp.scale, 1000)
        });
    });
}

fn bench_apply_tile(c: &mut Criterion) {
    let request = RenderRequest::new(Viewport::default_for(640, 480), 640, 480, 1000);
    let tiles = build_tiles(&request, BAND_HEIGHT, 1).unwrap();
    let tile = tiles[2];
    let counts = EscapeTime.compute_tile(
        tile.width,
        tile.height,
        tile.viewport.offset_x,
        tile.origin_y(),
        tile.viewport.scale,
        1000,
    );
    let mut assembler = ImageAssembler::new(640, 480);

    c.bench_function("apply_tile_640x100", |b| {
        b.iter(|| assembler.apply_tile(&tile, &counts, 1000));
    });
}

fn bench_color_lookup(c: &mut Criterion) {
    let mut colors = ColorMapper::new();

    c.bench_function("color_of_cached_0_to_10000", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for n in 0..10_000 {
                acc = acc.wrapping_add(colors.color_of(n, 10_000)[0] as u32);
            }
            acc
        });
    });
}

criterion_group!(
    benches,
    bench_full_frame_render,
    bench_band_kernel,
    bench_apply_tile,
    bench_color_lookup
);
criterion_main!(benches);
