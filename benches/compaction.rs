// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use image::{ImageBuffer, Rgba, RgbaImage};
use seamgrid::generator::apply_batch;
use seamgrid::seamfinder::cheapest_disjoint_seams;
use seamgrid::{remove_indices, Algorithm, Axis, EnergyMap, PriorityGrid};

fn clutter(width: u32, height: u32) -> RgbaImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let v = ((x * 53 + y * 29 + (x ^ y) * 7) % 256) as u8;
        Rgba([v, v, v, 255])
    })
}

fn compaction(c: &mut Criterion) {
    let (width, height) = (512usize, 384usize);
    let data: Vec<u32> = (0..(width * height) as u32).collect();
    // Twenty seams' worth, one pixel per row each.
    let indices: Vec<usize> = (0..height)
        .flat_map(|y| (0..20).map(move |s| y * width + s * 25))
        .collect();

    c.bench_function("remove_indices 512x384, 20 seams", |b| {
        b.iter(|| remove_indices(black_box(&data), black_box(&indices), 1).unwrap())
    });
}

fn predictive_batch(c: &mut Criterion) {
    let image = clutter(256, 192);
    let energy = EnergyMap::new(&image, None, Axis::Vertical, Algorithm::Sobel).unwrap();

    c.bench_function("predictive batch 256x192, 12 seams", |b| {
        b.iter_batched(
            || (energy.clone(), PriorityGrid::new(256, 192)),
            |(mut energy, mut grid)| {
                let seams = cheapest_disjoint_seams(&energy, 12);
                apply_batch(&mut energy, &mut grid, &seams, 0).unwrap()
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, compaction, predictive_batch);
criterion_main!(benches);
