use bencher::{benchmark_group, benchmark_main, Bencher};
use maxfind::{find_maxima, never_interrupted, FindMaximaConfig, Strategies, VoxelBuffer};

fn checkerboard_peaks(w: u32, h: u32) -> VoxelBuffer {
    let mut data = vec![0u8; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            if x % 4 == 2 && y % 4 == 2 {
                data[(y * w + x) as usize] = 200;
            } else {
                data[(y * w + x) as usize] = ((x + y) % 16) as u8;
            }
        }
    }
    VoxelBuffer::from_u8(w, h, 1, &data).unwrap()
}

fn many_seeds_128x128(bencher: &mut Bencher) {
    let image = checkerboard_peaks(128, 128);
    let config = FindMaximaConfig::new();
    let strategies = Strategies::none();
    bencher.iter(|| find_maxima(&image, &config, &strategies, &never_interrupted).unwrap());
}

fn single_seed_128x128(bencher: &mut Bencher) {
    let mut data = vec![1u8; 128 * 128];
    data[64 * 128 + 64] = 255;
    let image = VoxelBuffer::from_u8(128, 128, 1, &data).unwrap();
    let config = FindMaximaConfig::new();
    let strategies = Strategies::none();
    bencher.iter(|| find_maxima(&image, &config, &strategies, &never_interrupted).unwrap());
}

benchmark_group!(maxima, many_seeds_128x128, single_seed_128x128);
benchmark_main!(maxima);
