//! Test harness for end-to-end bridge tests
//!
//! Provides fixture types and helpers for driving a `HeapRuntime` the way
//! script code would.

#![allow(dead_code)]

pub use hostlink_bridge::{
    Bridge, BridgeConfig, BridgeError, Bridged, HostValue, Raw, Shared, TypeBuilder, Variadic,
};
pub use hostlink_runtime::{HeapRuntime, RuntimeOptions};
pub use hostlink_sdk::{ScriptError, ScriptRuntime, ScriptValue};

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Bridged, Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub city: String,
    pub zip: String,
}

#[derive(Bridged, Debug, Clone, Default, PartialEq)]
#[bridge(methods = Person::bridge_methods)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub age: u8,
    #[bridge(readonly)]
    pub id: u64,
    #[bridge(record)]
    pub address: Address,
    pub tags: Vec<String>,
    nickname: String,
}

impl Person {
    pub fn new(first: &str, last: &str, age: u8) -> Self {
        Person {
            first_name: first.to_string(),
            last_name: last.to_string(),
            age,
            id: 7,
            address: Address {
                city: "Lisbon".to_string(),
                zip: "1000".to_string(),
            },
            tags: vec!["a".to_string()],
            nickname: "secret".to_string(),
        }
    }

    fn bridge_methods(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
        builder
            .method("FullName", |p: &Person| {
                format!("{} {}", p.first_name, p.last_name)
            })
            .method("Greet", |p: &Person, other: String| {
                format!("Hello {}, I am {}", other, p.first_name)
            })
            .pointer_method("Birthday", |p: &mut Person| {
                p.age += 1;
                p.age
            })
            .pointer_method("Rename", |p: &mut Person, first: String, last: String| {
                p.first_name = first;
                p.last_name = last;
            })
    }
}

/// Numeric fields of every width
#[derive(Bridged, Debug, Clone, Default, PartialEq)]
pub struct Gauges {
    pub tiny: i8,
    pub small: i16,
    pub medium: i32,
    pub large: i64,
    pub byte: u8,
    pub word: u16,
    pub dword: u32,
    pub qword: u64,
    pub ratio: f32,
    pub precise: f64,
    pub on: bool,
    pub label: String,
}

/// A record whose method shares its name with a field
#[derive(Debug, Clone, Default)]
pub struct Counter {
    pub value: i64,
    pub limit: i64,
}

impl Bridged for Counter {
    fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
        builder
            .field("Value", |c: &Counter| c.value, |c: &mut Counter, v: i64| c.value = v)
            .field("Limit", |c: &Counter| c.limit, |c: &mut Counter, v: i64| c.limit = v)
            .method("Limit", |c: &Counter| c.limit * 10)
            .pointer_method("Value", |c: &mut Counter| {
                c.value += 1;
                c.value
            })
    }

    fn type_name() -> &'static str {
        "Counter"
    }
}

/// A record holding an optional shared pointer
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub next: Option<Shared<Address>>,
}

impl Bridged for Node {
    fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
        builder
            .field("Name", |n: &Node| n.name.clone(), |n: &mut Node, v: String| n.name = v)
            .readonly("Next", |n: &Node| n.next.clone())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Fresh runtime and bridge
pub fn setup() -> (HeapRuntime, Bridge) {
    (HeapRuntime::new(), Bridge::new())
}

/// Fresh runtime and bridge with a custom configuration
pub fn setup_with(config: BridgeConfig) -> (HeapRuntime, Bridge) {
    (HeapRuntime::new(), Bridge::with_config(config))
}

/// Shared person proxied as global `person`
pub fn person_global(rt: &mut HeapRuntime, bridge: &Bridge) -> (Shared<Person>, ScriptValue) {
    let person = Shared::new(Person::new("Ada", "Lovelace", 36));
    bridge
        .proxy_global(rt, "person", person.clone())
        .expect("proxy person");
    let proxy = rt.get_global("person").expect("read global");
    (person, proxy)
}

/// Expect a number
pub fn num(value: ScriptValue) -> f64 {
    match value {
        ScriptValue::Number(n) => n,
        other => panic!("expected number, got {:?}", other),
    }
}

/// Expect a string
pub fn string(value: ScriptValue) -> String {
    match value {
        ScriptValue::String(s) => s,
        other => panic!("expected string, got {:?}", other),
    }
}

/// Expect an array and return its elements
pub fn items(rt: &HeapRuntime, value: &ScriptValue) -> Vec<ScriptValue> {
    rt.array_items(value)
        .unwrap_or_else(|| panic!("expected array, got {:?}", value))
}

/// Number argument
pub fn n(value: f64) -> ScriptValue {
    ScriptValue::Number(value)
}

/// String argument
pub fn s(value: &str) -> ScriptValue {
    ScriptValue::String(value.to_string())
}
