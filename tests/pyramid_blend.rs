//! Laplacian pyramids and the pyramid blend on synthetic tiles.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tilemosaic::lowlevel::pyramid_blend;
use tilemosaic::{arrange, Image, LaplacianPyramid, Layer, PyramidConfig, Shift};

fn random_tile(width: usize, height: usize, seed: u64) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    Image::from_fn(width, height, |_, _| rng.random_range(0.0..1.0)).unwrap()
}

#[test]
fn laplacian_round_trip_reconstructs_the_base() {
    let img = random_tile(64, 48, 21);
    let restored = LaplacianPyramid::build(&img, 4, 0.4).collapse();
    assert_eq!(restored.shape(), img.shape());
    for (got, want) in restored.data().iter().zip(img.data()) {
        assert!((got - want).abs() < 1e-9);
    }
}

#[test]
fn shift_below_margin_returns_the_arranged_canvas() {
    let a = random_tile(40, 40, 22);
    let b = random_tile(40, 40, 23);
    let shift = Shift::new(12.3, 30.0);
    let cfg = PyramidConfig {
        margin: 50,
        ..PyramidConfig::default()
    };
    let out = pyramid_blend(&a, &b, shift, &cfg).unwrap();
    assert_eq!(out, arrange(&a, &b, shift, Layer::First).unwrap().image);
}

#[test]
fn left_overlap_blends_only_inside_the_overlap() {
    let a = Image::from_vec(vec![10.0; 64 * 64], 64, 64).unwrap();
    let b = Image::from_vec(vec![20.0; 64 * 64], 64, 64).unwrap();
    let cfg = PyramidConfig {
        blur: 0.4,
        margin: 8,
        depth: 3,
    };
    let out = pyramid_blend(&a, &b, Shift::new(0.0, 32.0), &cfg).unwrap();
    assert_eq!(out.shape(), (64, 96));

    for y in 0..64 {
        // Left of the overlap: first tile only.
        assert_eq!(out.get(10, y), Some(10.0));
        // Right of the overlap: second tile only.
        assert_eq!(out.get(80, y), Some(20.0));
        // The seam moves monotonically from one tile to the other.
        let row: Vec<f64> = (32..64).map(|x| out.get(x, y).unwrap()).collect();
        assert!(row.iter().all(|v| (9.5..=20.5).contains(v)));
        assert!(row[0] < 15.0 && row[31] > 15.0, "row {y}: {row:?}");
    }
}

#[test]
fn corner_overlap_keeps_the_uncovered_corner_invalid() {
    let a = random_tile(64, 64, 24);
    let b = random_tile(64, 64, 25);
    let cfg = PyramidConfig {
        blur: 0.4,
        margin: 8,
        depth: 2,
    };
    let shift = Shift::new(20.0, 24.0);
    let out = pyramid_blend(&a, &b, shift, &cfg).unwrap();
    let plain = arrange(&a, &b, shift, Layer::First).unwrap().image;
    assert_eq!(out.shape(), plain.shape());
    assert_eq!(out.validity(), plain.validity());
    // Outside the second tile nothing changes.
    for y in 0..20 {
        for x in 0..64 {
            assert_eq!(out.get(x, y), plain.get(x, y));
        }
    }
    // Beyond the first tile the second tile is untouched.
    assert_eq!(out.get(80, 80), plain.get(80, 80));
}

fn constant(value: f64, width: usize, height: usize) -> Image {
    Image::from_vec(vec![value; width * height], width, height).unwrap()
}

fn assert_between(out: &Image, x: std::ops::Range<usize>, y: std::ops::Range<usize>) {
    for gy in y {
        for gx in x.clone() {
            let v = out.get(gx, gy).unwrap();
            assert!((9.5..=20.5).contains(&v), "({gx}, {gy}) = {v}");
        }
    }
}

#[test]
fn corner_overlap_moves_from_the_first_tile_to_the_second() {
    let a = constant(10.0, 64, 64);
    let b = constant(20.0, 64, 64);
    let cfg = PyramidConfig {
        blur: 0.4,
        margin: 8,
        depth: 3,
    };
    let out = pyramid_blend(&a, &b, Shift::new(20.0, 24.0), &cfg).unwrap();
    assert_between(&out, 24..64, 20..64);
    assert!(out.get(25, 21).unwrap() < out.get(63, 63).unwrap());
    assert_eq!(out.get(10, 10), Some(10.0));
    assert_eq!(out.get(80, 80), Some(20.0));
}

#[test]
fn second_tile_above_keeps_constant_tiles_constant() {
    let a = constant(100.0, 128, 128);
    let b = constant(100.0, 128, 128);
    let cfg = PyramidConfig {
        blur: 0.4,
        margin: 20,
        depth: 4,
    };
    let out = pyramid_blend(&a, &b, Shift::new(-40.0, 70.0), &cfg).unwrap();
    assert_eq!(out.shape(), (168, 198));
    for y in 0..168 {
        for x in 0..198 {
            if let Some(v) = out.get(x, y) {
                assert!((v - 100.0).abs() < 1e-6, "({x}, {y}) = {v}");
            }
        }
    }
}

#[test]
fn second_tile_above_blends_toward_the_first_tile_below() {
    let a = constant(10.0, 128, 128);
    let b = constant(20.0, 128, 128);
    let cfg = PyramidConfig {
        blur: 0.4,
        margin: 20,
        depth: 4,
    };
    let shift = Shift::new(-40.0, 70.0);
    let out = pyramid_blend(&a, &b, shift, &cfg).unwrap();
    let plain = arrange(&a, &b, shift, Layer::First).unwrap().image;
    assert_eq!(out.validity(), plain.validity());

    // The first tile occupies rows 40..168 and columns 0..128; the second
    // rows 0..128 and columns 70..198.
    assert_between(&out, 70..128, 40..128);
    assert!(out.get(120, 42).unwrap() > out.get(120, 126).unwrap());
    assert_eq!(out.get(10, 100), Some(10.0));
    assert_eq!(out.get(10, 10), None);
    assert_eq!(out.get(150, 10), Some(20.0));
    assert_eq!(out.get(100, 150), Some(10.0));
}

#[test]
fn stacked_overlap_blends_a_horizontal_band() {
    let a = constant(10.0, 64, 64);
    let b = constant(20.0, 64, 64);
    let cfg = PyramidConfig {
        blur: 0.4,
        margin: 8,
        depth: 3,
    };
    let out = pyramid_blend(&a, &b, Shift::new(30.0, 3.0), &cfg).unwrap();
    assert_eq!(out.shape(), (94, 67));

    // Band rows 30..64 over columns 3..64.
    assert_between(&out, 3..64, 30..64);
    assert!(out.get(30, 30).unwrap() < out.get(30, 63).unwrap());
    assert_eq!(out.get(30, 10), Some(10.0));
    assert_eq!(out.get(1, 40), Some(10.0));
    assert_eq!(out.get(65, 40), Some(20.0));
    assert_eq!(out.get(30, 80), Some(20.0));
}

#[test]
fn huge_depth_is_clamped_to_the_overlap() {
    let a = constant(10.0, 32, 32);
    let b = constant(20.0, 32, 32);
    let cfg = PyramidConfig {
        blur: 0.4,
        margin: 4,
        depth: 1_000_000,
    };
    let out = pyramid_blend(&a, &b, Shift::new(0.0, 16.0), &cfg).unwrap();
    assert_between(&out, 16..32, 0..32);
}
