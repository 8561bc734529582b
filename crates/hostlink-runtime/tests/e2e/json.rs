//! JSON tests
//!
//! Proxies stringify through their traps: fields become members, bound
//! methods are dropped.

use serde_json::{json, Value};

use super::harness::*;

fn stringify(rt: &mut HeapRuntime, value: &ScriptValue) -> Value {
    let text = rt.stringify(value).unwrap().expect("encodable value");
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_stringify_pointer_proxy() {
    let (mut rt, bridge) = setup();
    let (_, person) = person_global(&mut rt, &bridge);

    assert_eq!(
        stringify(&mut rt, &person),
        json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "age": 36,
            "id": 7,
            "address": { "city": "Lisbon", "zip": "1000" },
            "tags": ["a"],
        })
    );
}

#[test]
fn test_stringify_drops_methods() {
    let (mut rt, bridge) = setup();
    let counter = Shared::new(Counter { value: 1, limit: 5 });
    let proxy = bridge.push_value(&mut rt, counter).unwrap();

    // value resolves to a pointer method and has no encoding
    assert_eq!(stringify(&mut rt, &proxy), json!({ "limit": 5 }));
}

#[test]
fn test_stringify_map_proxy() {
    let (mut rt, bridge) = setup();
    let map = bridge
        .push_value(
            &mut rt,
            HostValue::map([
                ("b", HostValue::List(vec![HostValue::Bool(true), HostValue::Nil])),
                ("a", HostValue::Str("x".into())),
            ]),
        )
        .unwrap();

    assert_eq!(stringify(&mut rt, &map), json!({ "a": "x", "b": [true, null] }));
}

#[test]
fn test_stringify_bare_function_has_no_encoding() {
    let (mut rt, bridge) = setup();
    let f = bridge.push_function(&mut rt, "f", || 1).unwrap();

    assert_eq!(rt.stringify(&f).unwrap(), None);
}

#[test]
fn test_host_value_from_json_payload() {
    let (mut rt, bridge) = setup();
    let pushed = bridge
        .push_value(&mut rt, json!({ "name": "cfg", "ports": [80, 443] }))
        .unwrap();

    assert_eq!(string(rt.get(&pushed, "name").unwrap()), "cfg");
    let ports = rt.get(&pushed, "ports").unwrap();
    assert_eq!(items(&rt, &ports), vec![n(80.0), n(443.0)]);
}
