//! Name-based strategy selection and option validation.

use std::collections::BTreeMap;
use tilemosaic::{
    arrange, dispatch, validate, AlphaConfig, Blend, BlendMethod, BlendStrategy, Image, Layer,
    MosaicError, PyramidConfig, Shift,
};

fn pair() -> (Image, Image) {
    let a = Image::from_fn(12, 10, |x, y| (x * y) as f64).unwrap();
    let b = Image::from_fn(12, 10, |x, y| (x + 2 * y) as f64).unwrap();
    (a, b)
}

#[test]
fn unknown_method_is_rejected() {
    let err = dispatch("poison").unwrap_err();
    assert_eq!(
        err,
        MosaicError::UnknownMethod {
            name: "poison".to_string()
        }
    );
}

#[test]
fn keys_outside_the_allowed_set_are_rejected() {
    let err = validate("max", [("alpha", 0.5)]).unwrap_err();
    assert_eq!(
        err,
        MosaicError::InvalidOption {
            method: "max",
            key: "alpha".to_string(),
            allowed: &[],
        }
    );

    let err = validate("pyramid", [("alpha", 0.5)]).unwrap_err();
    assert!(matches!(err, MosaicError::InvalidOption { method: "pyramid", .. }));
}

#[test]
fn out_of_range_values_are_rejected() {
    assert!(matches!(
        validate("alpha", [("alpha", 1.5)]),
        Err(MosaicError::InvalidOptionValue { key: "alpha", .. })
    ));
    assert!(matches!(
        validate("pyramid", [("depth", 2.5)]),
        Err(MosaicError::InvalidOptionValue { key: "depth", .. })
    ));
    assert!(matches!(
        validate("pyramid", [("margin", -1.0)]),
        Err(MosaicError::InvalidOptionValue { key: "margin", .. })
    ));
    assert!(matches!(
        validate("pyramid", [("blur", f64::NAN)]),
        Err(MosaicError::InvalidOptionValue { key: "blur", .. })
    ));
}

#[test]
fn dispatcher_defaults_differ_from_strategy_defaults() {
    match dispatch("alpha").unwrap() {
        BlendStrategy::Alpha(cfg) => assert_eq!(cfg.alpha, 1.0),
        other => panic!("unexpected strategy {other:?}"),
    }
    assert_eq!(AlphaConfig::default().alpha, 0.4);

    match dispatch("pyramid").unwrap() {
        BlendStrategy::Pyramid(cfg) => assert_eq!(
            cfg,
            PyramidConfig {
                blur: 0.4,
                margin: 50,
                depth: 4
            }
        ),
        other => panic!("unexpected strategy {other:?}"),
    }
    assert_eq!(PyramidConfig::default().margin, 100);
}

#[test]
fn options_override_dispatcher_defaults() {
    let mut options = BTreeMap::new();
    options.insert("margin".to_string(), 20.0);
    options.insert("depth".to_string(), 2.0);
    match validate("pyramid", options).unwrap() {
        BlendStrategy::Pyramid(cfg) => {
            assert_eq!((cfg.blur, cfg.margin, cfg.depth), (0.4, 20, 2));
        }
        other => panic!("unexpected strategy {other:?}"),
    }
}

#[test]
fn dispatched_alpha_equals_the_first_layer_order() {
    let (a, b) = pair();
    let shift = Shift::new(3.0, 5.0);
    let blended = dispatch("alpha").unwrap().blend(&a, &b, shift).unwrap();
    assert_eq!(blended.image, arrange(&a, &b, shift, Layer::First).unwrap().image);
    assert!(blended.solver.is_none());
}

#[test]
fn every_method_produces_the_canvas_shape() {
    let (a, b) = pair();
    let shift = Shift::new(-2.0, 7.0);
    let canvas = arrange(&a, &b, shift, Layer::First).unwrap().image;
    for method in BlendMethod::ALL {
        let strategy = dispatch(method.name()).unwrap();
        assert_eq!(strategy.method(), Some(method));
        let out = strategy.blend(&a, &b, shift).unwrap();
        assert_eq!(out.image.shape(), canvas.shape(), "method {method}");
    }
}

#[test]
fn custom_closures_act_as_strategies() {
    let (a, b) = pair();
    let strategy = BlendStrategy::custom(|img1: &Image, img2: &Image, shift: Shift| {
        Ok(arrange(img1, img2, shift, Layer::Second)?.image)
    });
    assert_eq!(strategy.method(), None);
    let shift = Shift::new(1.0, 1.0);
    let out = strategy.blend(&a, &b, shift).unwrap();
    assert_eq!(out.image, arrange(&a, &b, shift, Layer::Second).unwrap().image);
}
