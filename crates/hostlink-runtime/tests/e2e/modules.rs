//! Module search tests
//!
//! A host function installed with `set_require_function` answers
//! `require(id)`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hostlink_bridge::HostFunction;

use super::harness::*;

fn install_loader(rt: &mut HeapRuntime, bridge: &Bridge) -> Arc<AtomicUsize> {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    bridge
        .set_require_function(rt, move |id: String| -> Option<HostValue> {
            counter.fetch_add(1, Ordering::SeqCst);
            match id.as_str() {
                "math" => Some(HostValue::map([
                    ("pi", HostValue::Float(3.5)),
                    ("double", HostValue::Func(HostFunction::new("double", |x: f64| x * 2.0))),
                ])),
                "person" => Some(HostValue::pointer(&Shared::new(Person::new(
                    "Ada", "Lovelace", 36,
                )))),
                _ => None,
            }
        })
        .unwrap();
    loads
}

#[test]
fn test_require_resolves_module() {
    let (mut rt, bridge) = setup();
    install_loader(&mut rt, &bridge);

    let math = rt.require("math").unwrap();
    assert_eq!(num(rt.get(&math, "pi").unwrap()), 3.5);
    assert_eq!(num(rt.call_method(&math, "double", &[n(4.0)]).unwrap()), 8.0);

    let person = rt.require("person").unwrap();
    assert_eq!(string(rt.get(&person, "firstName").unwrap()), "Ada");
}

#[test]
fn test_require_caches_modules() {
    let (mut rt, bridge) = setup();
    let loads = install_loader(&mut rt, &bridge);

    let first = rt.require("math").unwrap();
    let second = rt.require("math").unwrap();
    assert_eq!(first, second);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_require_missing_module() {
    let (mut rt, bridge) = setup();
    let loads = install_loader(&mut rt, &bridge);

    assert!(matches!(
        rt.require("nope"),
        Err(ScriptError::ReferenceError(_))
    ));
    assert!(rt.require("nope").is_err());
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_require_hook_is_named_function() {
    let (mut rt, bridge) = setup();
    let hook = bridge
        .set_require_function(&mut rt, |_id: String| HostValue::Nil)
        .unwrap();

    assert_eq!(string(rt.get(&hook, "name").unwrap()), "modSearch");
}

#[test]
fn test_require_hook_error_propagates() {
    let (mut rt, bridge) = setup();
    bridge
        .set_require_function(&mut rt, |id: String| -> anyhow::Result<HostValue> {
            anyhow::bail!("module {} is not allowed", id)
        })
        .unwrap();

    assert_eq!(
        rt.require("fs").unwrap_err(),
        ScriptError::thrown("Error", "module fs is not allowed")
    );
}
