use tilemosaic::{Frame, Image, MosaicError, Shift};

#[test]
fn image_rejects_invalid_dimensions() {
    let err = Image::from_vec(vec![], 0, 1).unwrap_err();
    assert_eq!(
        err,
        MosaicError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );
}

#[test]
fn image_rejects_small_buffer() {
    let err = Image::from_vec(vec![0.0; 3], 2, 2).unwrap_err();
    assert_eq!(err, MosaicError::BufferTooSmall { needed: 4, got: 3 });

    let err = Image::with_validity(vec![0.0; 4], vec![true; 2], 2, 2).unwrap_err();
    assert_eq!(err, MosaicError::BufferTooSmall { needed: 4, got: 2 });
}

#[test]
fn image_crop_matches_expected_values() {
    let img = Image::from_fn(4, 4, |x, y| (y * 4 + x) as f64).unwrap();
    let roi = img.crop(1, 1, 2, 2).unwrap();
    assert_eq!(roi.width(), 2);
    assert_eq!(roi.height(), 2);
    assert_eq!(roi.data(), &[5.0, 6.0, 9.0, 10.0]);

    let err = img.crop(3, 3, 2, 2).unwrap_err();
    assert_eq!(
        err,
        MosaicError::RoiOutOfBounds {
            x: 3,
            y: 3,
            width: 2,
            height: 2,
            img_width: 4,
            img_height: 4,
        }
    );
}

#[test]
fn validity_survives_crop_and_fill() {
    let img = Image::from_nan_sentinel(vec![1.0, f64::NAN, 3.0, 4.0], 2, 2).unwrap();
    assert_eq!(img.valid_count(), 3);
    let roi = img.crop(1, 0, 1, 2).unwrap();
    assert_eq!(roi.get(0, 0), None);
    assert_eq!(roi.get(0, 1), Some(4.0));
    let filled = img.filled(-1.0);
    assert!(filled.is_fully_valid());
    assert_eq!(filled.data(), &[1.0, -1.0, 3.0, 4.0]);
}

#[test]
fn rough_shift_rounds_half_away_from_zero() {
    assert_eq!(Shift::new(2.5, -2.5).rough(), (3, -3));
    assert_eq!(Shift::new(0.49, -0.49).rough(), (0, 0));
}

#[test]
fn frame_places_single_tiles() {
    let a = Image::from_vec(vec![1.0; 4], 2, 2).unwrap();
    let b = Image::from_vec(vec![2.0; 4], 2, 2).unwrap();
    let frame = Frame::new(&a, &b, Shift::new(1.0, -1.0)).unwrap();
    let placed = frame.place(&a, frame.first).unwrap();
    assert_eq!(placed.shape(), (3, 3));
    assert_eq!(placed.get(0, 0), None);
    assert_eq!(placed.get(2, 1), Some(1.0));
    assert_eq!(placed.get(1, 2), None);
    assert_eq!(placed.valid_count(), 4);
}
