use bencher::{benchmark_group, benchmark_main, Bencher};
use maxfind::{find_maxima, never_interrupted, FindMaximaConfig, Strategies, VoxelBuffer};

/// A small deterministic LCG so benches don't need an external `rand` dependency.
fn synthetic_volume(w: u32, h: u32, d: u32, seed: u32) -> VoxelBuffer {
    let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
    let n = (w * h * d) as usize;
    let mut data = Vec::with_capacity(n);
    for _ in 0..n {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 24) as u8);
    }
    VoxelBuffer::from_u8(w, h, d, &data).unwrap()
}

fn grow_regions_64x64(bencher: &mut Bencher) {
    let image = synthetic_volume(64, 64, 1, 7);
    let config = FindMaximaConfig::new();
    let strategies = Strategies::none();
    bencher.iter(|| find_maxima(&image, &config, &strategies, &never_interrupted).unwrap());
}

fn grow_regions_32x32x32(bencher: &mut Bencher) {
    let image = synthetic_volume(32, 32, 32, 11);
    let config = FindMaximaConfig::new();
    let strategies = Strategies::none();
    bencher.iter(|| find_maxima(&image, &config, &strategies, &never_interrupted).unwrap());
}

benchmark_group!(region_grow, grow_regions_64x64, grow_regions_32x32x32);
benchmark_main!(region_grow);
