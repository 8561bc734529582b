//! Host function tests
//!
//! Argument extraction, variadics, the trailing-error convention, result
//! shapes of wrapped host functions and calls back into the runtime.

use super::harness::*;
use hostlink_bridge::{
    CallContext, FromScript, HostFunction, ParamType, ReturnList, ReturnShape, Signature,
};

// ============================================================================
// Arguments
// ============================================================================

#[test]
fn test_call_global_function() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "add", |a: i32, b: i32| a + b)
        .unwrap();

    assert_eq!(num(rt.call_global("add", &[n(2.0), n(3.0)]).unwrap()), 5.0);
}

#[test]
fn test_function_name() {
    let (mut rt, bridge) = setup();
    let f = bridge.push_function(&mut rt, "greet", || "hi").unwrap();
    assert_eq!(string(rt.get(&f, "name").unwrap()), "greet");
    assert!(rt.get_global("greet").unwrap().is_undefined());
}

#[test]
fn test_missing_arguments_are_zero_filled() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "describe", |name: String, count: i32, on: bool| {
            format!("{}/{}/{}", name, count, on)
        })
        .unwrap();

    let out = rt.call_global("describe", &[s("x")]).unwrap();
    assert_eq!(string(out), "x/0/false");
}

#[test]
fn test_extra_arguments_are_ignored() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "first", |a: String| a)
        .unwrap();

    let out = rt.call_global("first", &[s("a"), s("b"), n(1.0)]).unwrap();
    assert_eq!(string(out), "a");
}

#[test]
fn test_extra_arguments_rejected_with_strict_arity() {
    let (mut rt, bridge) = setup_with(BridgeConfig {
        strict_arity: true,
        ..BridgeConfig::default()
    });
    bridge
        .push_global_function(&mut rt, "first", |a: String| a)
        .unwrap();

    assert!(matches!(
        rt.call_global("first", &[s("a"), s("b")]),
        Err(ScriptError::TypeError(_))
    ));
    assert_eq!(string(rt.call_global("first", &[s("a")]).unwrap()), "a");
}

#[test]
fn test_argument_limit() {
    let (mut rt, bridge) = setup_with(BridgeConfig {
        max_arguments: 2,
        ..BridgeConfig::default()
    });
    bridge
        .push_global_function(&mut rt, "count", |xs: Variadic<f64>| xs.len())
        .unwrap();

    assert_eq!(num(rt.call_global("count", &[n(1.0), n(2.0)]).unwrap()), 2.0);
    assert!(matches!(
        rt.call_global("count", &[n(1.0), n(2.0), n(3.0)]),
        Err(ScriptError::TypeError(_))
    ));
}

#[test]
fn test_decode_failure_is_type_error() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "double", |x: i32| x * 2)
        .unwrap();

    match rt.call_global("double", &[s("two")]) {
        Err(ScriptError::TypeError(message)) => assert!(message.contains("i32"), "{}", message),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_raw_argument_passes_through() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "kind", |v: Raw| v.0.type_name())
        .unwrap();

    assert_eq!(string(rt.call_global("kind", &[n(1.0)]).unwrap()), "number");
    assert_eq!(string(rt.call_global("kind", &[]).unwrap()), "undefined");
}

// ============================================================================
// Variadics
// ============================================================================

#[test]
fn test_variadic_arguments() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "sum", |xs: Variadic<f64>| xs.iter().sum::<f64>())
        .unwrap();

    assert_eq!(num(rt.call_global("sum", &[]).unwrap()), 0.0);
    assert_eq!(num(rt.call_global("sum", &[n(4.0)]).unwrap()), 4.0);
    assert_eq!(
        num(rt.call_global("sum", &[n(1.0), n(2.0), n(3.5)]).unwrap()),
        6.5
    );
}

#[test]
fn test_variadic_after_fixed_parameter() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "join", |sep: String, parts: Variadic<String>| {
            parts.into_inner().join(&sep)
        })
        .unwrap();

    assert_eq!(string(rt.call_global("join", &[s("-")]).unwrap()), "");
    assert_eq!(
        string(rt.call_global("join", &[s("-"), s("a"), s("b"), s("c")]).unwrap()),
        "a-b-c"
    );
}

#[test]
fn test_variadic_tail_length() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "tail", |_a: i64, rest: Variadic<String>| rest.len())
        .unwrap();

    assert_eq!(num(rt.call_global("tail", &[]).unwrap()), 0.0);
    assert_eq!(num(rt.call_global("tail", &[n(1.0)]).unwrap()), 0.0);
    assert_eq!(
        num(rt.call_global("tail", &[n(1.0), s("a"), s("b")]).unwrap()),
        2.0
    );
}

#[test]
fn test_variadic_ignores_strict_arity() {
    let (mut rt, bridge) = setup_with(BridgeConfig {
        strict_arity: true,
        ..BridgeConfig::default()
    });
    bridge
        .push_global_function(&mut rt, "count", |xs: Variadic<Raw>| xs.len())
        .unwrap();

    assert_eq!(
        num(rt.call_global("count", &[n(1.0), s("x"), ScriptValue::Null]).unwrap()),
        3.0
    );
}

// ============================================================================
// Results
// ============================================================================

#[test]
fn test_no_results_is_undefined() {
    let (mut rt, bridge) = setup();
    bridge.push_global_function(&mut rt, "noop", || {}).unwrap();

    assert!(rt.call_global("noop", &[]).unwrap().is_undefined());
}

#[test]
fn test_multiple_results_are_array() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "divmod", |a: i64, b: i64| (a / b, a % b))
        .unwrap();

    let out = rt.call_global("divmod", &[n(7.0), n(2.0)]).unwrap();
    assert_eq!(items(&rt, &out), vec![n(3.0), n(1.0)]);
}

#[test]
fn test_trailing_error_raised() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "checked", |x: i32| -> anyhow::Result<i32> {
            if x < 0 {
                anyhow::bail!("negative input: {}", x);
            }
            Ok(x * 2)
        })
        .unwrap();

    assert_eq!(num(rt.call_global("checked", &[n(4.0)]).unwrap()), 8.0);
    assert_eq!(
        rt.call_global("checked", &[n(-1.0)]).unwrap_err(),
        ScriptError::thrown("Error", "negative input: -1")
    );
}

#[test]
fn test_trailing_error_nil_strips_slot() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "unit", || -> anyhow::Result<()> { Ok(()) })
        .unwrap();
    bridge
        .push_global_function(&mut rt, "pair", || -> anyhow::Result<(String, bool)> {
            Ok(("ok".to_string(), true))
        })
        .unwrap();

    assert!(rt.call_global("unit", &[]).unwrap().is_undefined());
    let pair = rt.call_global("pair", &[]).unwrap();
    assert_eq!(items(&rt, &pair), vec![s("ok"), ScriptValue::Bool(true)]);
}

#[test]
fn test_returned_function_is_callable() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "adder", |base: i32| {
            hostlink_bridge::HostFunction::new("add", move |x: i32| base + x)
        })
        .unwrap();

    let add = rt.call_global("adder", &[n(10.0)]).unwrap();
    assert_eq!(num(rt.call(&add, &[n(5.0)]).unwrap()), 15.0);
}

// ============================================================================
// Methods
// ============================================================================

#[test]
fn test_value_method() {
    let (mut rt, bridge) = setup();
    let (_, person) = person_global(&mut rt, &bridge);

    let out = rt.call_method(&person, "greet", &[s("Bob")]).unwrap();
    assert_eq!(string(out), "Hello Bob, I am Ada");
}

#[test]
fn test_pointer_method_mutates_host() {
    let (mut rt, bridge) = setup();
    let (shared, person) = person_global(&mut rt, &bridge);

    assert_eq!(num(rt.call_method(&person, "birthday", &[]).unwrap()), 37.0);
    rt.call_method(&person, "rename", &[s("Grace"), s("Hopper")])
        .unwrap();

    let host = shared.read();
    assert_eq!(host.age, 37);
    assert_eq!(host.first_name, "Grace");
    assert_eq!(host.last_name, "Hopper");
}

#[test]
fn test_method_missing_argument_is_zero() {
    let (mut rt, bridge) = setup();
    let (shared, person) = person_global(&mut rt, &bridge);

    rt.call_method(&person, "rename", &[s("Grace")]).unwrap();
    assert_eq!(shared.read().last_name, "");
}

#[test]
fn test_bound_method_keeps_receiver() {
    let (mut rt, bridge) = setup();
    let (shared, person) = person_global(&mut rt, &bridge);

    let birthday = rt.get(&person, "birthday").unwrap();
    rt.call(&birthday, &[]).unwrap();
    rt.call(&birthday, &[]).unwrap();
    assert_eq!(shared.read().age, 38);
}

#[test]
fn test_shared_parameter_missing_is_error() {
    let (mut rt, bridge) = setup();
    bridge
        .push_global_function(&mut rt, "age", |p: Shared<Person>| {
            let age = p.read().age;
            age
        })
        .unwrap();

    assert!(matches!(
        rt.call_global("age", &[]),
        Err(ScriptError::TypeError(_))
    ));
    assert!(matches!(
        rt.call_global("age", &[n(1.0)]),
        Err(ScriptError::TypeError(_))
    ));
}

// ============================================================================
// Re-entrant calls
// ============================================================================

fn raw_signature(params: usize, results: usize) -> Signature {
    Signature::new(
        (0..params)
            .map(|_| ParamType {
                type_name: "Raw",
                variadic: false,
            })
            .collect(),
        ReturnShape {
            arity: results,
            fallible: false,
        },
    )
}

fn call_through(
    cx: &mut CallContext<'_>,
    receiver: &ScriptValue,
    method: &str,
) -> Result<ScriptValue, ScriptError> {
    let object = receiver
        .as_object()
        .ok_or_else(|| ScriptError::TypeError("receiver is not an object".into()))?;
    let callee = cx.runtime().get_property(object, method)?;
    cx.runtime().call(&callee, &[])
}

#[test]
fn test_host_function_calls_back_into_runtime() {
    let (mut rt, bridge) = setup();
    let (shared, person) = person_global(&mut rt, &bridge);

    let celebrate = HostFunction::from_invoker("celebrateTwice", raw_signature(1, 1), |cx, args| {
        let receiver = args.first().cloned().unwrap_or_default();
        call_through(cx, &receiver, "birthday")?;
        let age = call_through(cx, &receiver, "birthday")?;
        Ok(ReturnList::new(vec![HostValue::Float(
            age.as_number().unwrap_or_default(),
        )]))
    });
    bridge
        .push_global_function(&mut rt, "celebrateTwice", celebrate)
        .unwrap();

    assert_eq!(
        num(rt.call_global("celebrateTwice", &[person]).unwrap()),
        38.0
    );
    assert_eq!(shared.read().age, 38);
}

#[test]
fn test_nested_write_on_locked_record_is_busy() {
    let (mut rt, bridge) = setup();
    let (shared, person) = person_global(&mut rt, &bridge);

    let locked = HostFunction::from_invoker("whileLocked", raw_signature(1, 2), |cx, args| {
        let receiver = args.first().cloned().unwrap_or_default();
        let person = Shared::<Person>::from_script(cx, &receiver)?;
        let object = receiver
            .as_object()
            .ok_or_else(|| BridgeError::Argument("expected a proxy".into()))?;

        let guard = person.write();
        let method = call_through(cx, &receiver, "birthday");
        let field = cx
            .runtime()
            .put_property(object, "age", ScriptValue::Number(1.0));
        drop(guard);

        let outcome = |r: Result<(), ScriptError>| match r {
            Ok(()) => "completed".to_string(),
            Err(e) => e.to_string(),
        };
        Ok(ReturnList::new(vec![
            HostValue::Str(outcome(method.map(|_| ()))),
            HostValue::Str(outcome(field)),
        ]))
    });
    bridge
        .push_global_function(&mut rt, "whileLocked", locked)
        .unwrap();

    let out = rt.call_global("whileLocked", &[person.clone()]).unwrap();
    for outcome in items(&rt, &out) {
        let message = string(outcome);
        assert!(message.starts_with("BridgeError: "), "{}", message);
        assert!(message.contains("busy"), "{}", message);
    }
    assert_eq!(shared.read().age, 36);

    // the guard is gone once the host function returns
    assert_eq!(num(rt.call_method(&person, "birthday", &[]).unwrap()), 37.0);
}
