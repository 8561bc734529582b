//! Numeric coercion tests
//!
//! Script numbers assigned to typed fields or passed to typed parameters are
//! truncated and wrapped to the declared width; floats keep NaN and infinities.

use super::harness::*;

fn gauges(rt: &mut HeapRuntime, bridge: &Bridge) -> (Shared<Gauges>, ScriptValue) {
    let shared = Shared::new(Gauges::default());
    let proxy = bridge.push_value(rt, shared.clone()).unwrap();
    (shared, proxy)
}

#[test]
fn test_signed_wraps_to_width() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);

    rt.set(&proxy, "tiny", n(300.0)).unwrap();
    assert_eq!(shared.read().tiny, 44);

    rt.set(&proxy, "tiny", n(-129.0)).unwrap();
    assert_eq!(shared.read().tiny, 127);

    rt.set(&proxy, "small", n(40000.0)).unwrap();
    assert_eq!(shared.read().small, -25536);

    rt.set(&proxy, "medium", n(1e10)).unwrap();
    assert_eq!(shared.read().medium, 1410065408);
}

#[test]
fn test_unsigned_wraps_to_width() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);

    rt.set(&proxy, "byte", n(-1.0)).unwrap();
    assert_eq!(shared.read().byte, 255);

    rt.set(&proxy, "word", n(70000.0)).unwrap();
    assert_eq!(shared.read().word, 4464);

    rt.set(&proxy, "dword", n(-1.0)).unwrap();
    assert_eq!(shared.read().dword, u32::MAX);

    rt.set(&proxy, "qword", n(1099511627776.0)).unwrap();
    assert_eq!(shared.read().qword, 1 << 40);
}

#[test]
fn test_fractions_truncate_toward_zero() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);

    rt.set(&proxy, "medium", n(2.7)).unwrap();
    assert_eq!(shared.read().medium, 2);

    rt.set(&proxy, "medium", n(-2.7)).unwrap();
    assert_eq!(shared.read().medium, -2);

    rt.set(&proxy, "byte", n(3.9)).unwrap();
    assert_eq!(shared.read().byte, 3);
}

#[test]
fn test_nan_becomes_zero() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);

    shared.write().large = 12;
    rt.set(&proxy, "large", n(f64::NAN)).unwrap();
    assert_eq!(shared.read().large, 0);
}

#[test]
fn test_unsigned_64_bit_extremes() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);

    rt.set(&proxy, "qword", n(-1.0)).unwrap();
    assert_eq!(shared.read().qword, u64::MAX);

    rt.set(&proxy, "qword", n(1e300)).unwrap();
    assert_eq!(shared.read().qword, u64::MAX);

    rt.set(&proxy, "qword", n(f64::NEG_INFINITY)).unwrap();
    assert_eq!(shared.read().qword, 0);
}

#[test]
fn test_signed_64_bit_saturates() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);

    rt.set(&proxy, "large", n(1e300)).unwrap();
    assert_eq!(shared.read().large, i64::MAX);

    rt.set(&proxy, "large", n(-1e300)).unwrap();
    assert_eq!(shared.read().large, i64::MIN);

    rt.set(&proxy, "large", n(f64::INFINITY)).unwrap();
    assert_eq!(shared.read().large, i64::MAX);
}

#[test]
fn test_infinity_wraps_narrow_integers() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);

    // i64::MAX wraps to -1, i64::MIN wraps to 0
    rt.set(&proxy, "medium", n(f64::INFINITY)).unwrap();
    assert_eq!(shared.read().medium, -1);

    rt.set(&proxy, "medium", n(f64::NEG_INFINITY)).unwrap();
    assert_eq!(shared.read().medium, 0);
}

#[test]
fn test_float_fields_keep_non_finite() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);

    rt.set(&proxy, "precise", n(f64::NAN)).unwrap();
    assert!(shared.read().precise.is_nan());
    assert!(num(rt.get(&proxy, "precise").unwrap()).is_nan());

    rt.set(&proxy, "precise", n(f64::INFINITY)).unwrap();
    assert_eq!(shared.read().precise, f64::INFINITY);

    rt.set(&proxy, "ratio", n(f64::NEG_INFINITY)).unwrap();
    assert_eq!(shared.read().ratio, f32::NEG_INFINITY);
}

#[test]
fn test_floats() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);

    rt.set(&proxy, "ratio", n(0.1)).unwrap();
    rt.set(&proxy, "precise", n(0.1)).unwrap();

    assert_eq!(shared.read().ratio, 0.1f32);
    assert_eq!(shared.read().precise, 0.1);
    assert_eq!(num(rt.get(&proxy, "ratio").unwrap()), 0.1f32 as f64);
    assert_eq!(num(rt.get(&proxy, "precise").unwrap()), 0.1);
}

#[test]
fn test_bool_and_string_fields() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);

    rt.set(&proxy, "on", ScriptValue::Bool(true)).unwrap();
    rt.set(&proxy, "label", s("gauge")).unwrap();

    assert!(shared.read().on);
    assert_eq!(shared.read().label, "gauge");
    assert_eq!(rt.get(&proxy, "on").unwrap(), ScriptValue::Bool(true));
}

#[test]
fn test_type_mismatch_leaves_field_unchanged() {
    let (mut rt, bridge) = setup();
    let (shared, proxy) = gauges(&mut rt, &bridge);
    shared.write().tiny = 5;

    assert!(matches!(
        rt.set(&proxy, "tiny", s("abc")),
        Err(ScriptError::TypeError(_))
    ));
    assert!(matches!(
        rt.set(&proxy, "label", n(5.0)),
        Err(ScriptError::TypeError(_))
    ));
    assert!(matches!(
        rt.set(&proxy, "on", n(1.0)),
        Err(ScriptError::TypeError(_))
    ));

    let host = shared.read();
    assert_eq!(host.tiny, 5);
    assert_eq!(host.label, "");
    assert!(!host.on);
}

#[test]
fn test_person_age_coercion() {
    let (mut rt, bridge) = setup();
    let (shared, person) = person_global(&mut rt, &bridge);

    rt.set(&person, "age", n(300.0)).unwrap();
    assert_eq!(shared.read().age, 44);
    assert_eq!(num(rt.get(&person, "age").unwrap()), 44.0);
}

// ============================================================================
// Parameters
// ============================================================================

#[test]
fn test_float_parameter_keeps_non_finite() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "half", |x: f64| x / 2.0)
        .unwrap();
    bridge
        .push_global_function(&mut rt, "narrow", |x: f32| x)
        .unwrap();

    assert!(num(rt.call_global("half", &[n(f64::NAN)]).unwrap()).is_nan());
    assert_eq!(
        num(rt.call_global("half", &[n(f64::INFINITY)]).unwrap()),
        f64::INFINITY
    );
    assert_eq!(
        num(rt.call_global("narrow", &[n(f64::NEG_INFINITY)]).unwrap()),
        f64::NEG_INFINITY
    );
}

#[test]
fn test_integer_parameter_coercion() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "id32", |x: i32| x)
        .unwrap();
    bridge
        .push_global_function(&mut rt, "id64", |x: i64| x == i64::MAX)
        .unwrap();
    bridge
        .push_global_function(&mut rt, "idu64", |x: u64| x == u64::MAX)
        .unwrap();

    assert_eq!(num(rt.call_global("id32", &[n(2.9)]).unwrap()), 2.0);
    assert_eq!(num(rt.call_global("id32", &[n(f64::NAN)]).unwrap()), 0.0);
    assert_eq!(num(rt.call_global("id32", &[n(f64::INFINITY)]).unwrap()), -1.0);
    assert_eq!(
        rt.call_global("id64", &[n(f64::INFINITY)]).unwrap(),
        ScriptValue::Bool(true)
    );
    assert_eq!(
        rt.call_global("idu64", &[n(-1.0)]).unwrap(),
        ScriptValue::Bool(true)
    );
}

#[test]
fn test_non_number_to_integer_parameter_is_type_error() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "id32", |x: i32| x)
        .unwrap();

    assert!(matches!(
        rt.call_global("id32", &[s("7")]),
        Err(ScriptError::TypeError(_))
    ));
    assert!(matches!(
        rt.call_global("id32", &[ScriptValue::Bool(true)]),
        Err(ScriptError::TypeError(_))
    ));
}
