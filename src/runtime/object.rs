//! The `Object` model (spec.md §3.4): OType tag, nullable prototype,
//! ordered property map, array storage, internal slots, and the optional
//! call/construct/iterator callbacks.
//!
//! `Object` is a thin `Rc<RefCell<ObjectData>>` handle; cloning an `Object`
//! clones the handle, not the data, which is exactly the reference-identity
//! semantics `===` needs on objects and the shared-graph structure closures
//! and environments rely on (SPEC_FULL.md §9).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::value::{Symbol, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OType {
    Ordinary,
    Array,
    Function,
    Error,
    RegExp,
    Map,
    Set,
    WeakMap,
    WeakSet,
    Promise,
    Proxy,
    Iterator,
}

/// A property key: either a plain string or a symbol. Hashable/orderable
/// so it can live in both the fast lookup map and the insertion-order list.
#[derive(Debug, Clone)]
pub enum Key {
    String(Rc<str>),
    Symbol(Symbol),
}

impl Key {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Key::String(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s),
            Key::Symbol(_) => None,
        }
    }

    /// A key is an "array index" key if it is a canonical non-negative
    /// integer string (used to order enumeration: indices first,
    /// ascending, spec.md §5 "Ordering guarantees").
    pub fn as_array_index(&self) -> Option<u32> {
        let s = self.as_str()?;
        if s == "0" {
            return Some(0);
        }
        if s.starts_with('0') || s.is_empty() {
            return None;
        }
        s.parse::<u32>().ok()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::String(a), Key::String(b)) => a == b,
            (Key::Symbol(a), Key::Symbol(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Key {}

impl std::hash::Hash for Key {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::String(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            Key::Symbol(sym) => {
                1u8.hash(state);
                (Rc::as_ptr(&sym.0) as usize).hash(state);
            }
        }
    }
}

/// Which attributes of a descriptor were *explicitly specified* versus
/// defaulted, needed to correctly re-define non-configurable properties
/// (spec.md §3.4, §9 "Property descriptors").
#[derive(Debug, Clone, Copy, Default)]
pub struct AttrsSpecified {
    pub value: bool,
    pub writable: bool,
    pub get: bool,
    pub set: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

#[derive(Debug, Clone)]
pub enum PropertyKind {
    Data { value: Value, writable: bool },
    Accessor { get: Option<Object>, set: Option<Object> },
}

#[derive(Debug, Clone)]
pub struct Property {
    pub kind: PropertyKind,
    pub enumerable: bool,
    pub configurable: bool,
    pub specified: AttrsSpecified,
}

impl Property {
    pub fn data(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            kind: PropertyKind::Data { value, writable },
            enumerable,
            configurable,
            specified: AttrsSpecified {
                value: true,
                writable: true,
                enumerable: true,
                configurable: true,
                ..Default::default()
            },
        }
    }

    /// A plain writable/enumerable/configurable data property, the default
    /// shape for ordinary assignment (`obj.x = 1`) and literal properties.
    pub fn value(value: Value) -> Self {
        Self::data(value, true, true, true)
    }

    pub fn get_value(&self) -> Option<Value> {
        match &self.kind {
            PropertyKind::Data { value, .. } => Some(value.clone()),
            PropertyKind::Accessor { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PromiseState {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

/// Per-OType state that doesn't fit the generic property map (spec.md
/// §3.4 "Internal slots").
#[derive(Debug, Clone)]
pub enum Slot {
    Number(f64),
    Bool(bool),
    Str(Rc<str>),
    ObjectRef(Object),
    MapEntries(Vec<(Value, Value)>),
    SetEntries(Vec<Value>),
    WeakMapEntries(Vec<(Weak<RefCell<ObjectData>>, Value)>),
    WeakSetEntries(Vec<Weak<RefCell<ObjectData>>>),
    Promise {
        state: PromiseState,
        on_fulfill: Vec<Object>,
        on_reject: Vec<Object>,
    },
    RegExp {
        source: String,
        flags: String,
    },
    BoundData {
        target: Object,
        this_arg: Value,
        args: Vec<Value>,
    },
}

pub type NativeFn =
    Rc<dyn Fn(&mut crate::runtime::interpreter::Interpreter, Value, &[Value]) -> Result<Value, Value>>;

#[derive(Clone)]
pub struct UserFunction {
    pub node: Rc<crate::frontend::ast::FunctionNode>,
    pub closure: crate::runtime::environment::Environment,
    pub is_arrow: bool,
    pub home_object: Option<Object>,
}

#[derive(Clone)]
pub enum Callable {
    Native(NativeFn),
    User(Rc<UserFunction>),
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(_) => write!(f, "<native function>"),
            Callable::User(u) => write!(
                f,
                "<function {}>",
                u.node.name.as_deref().unwrap_or("anonymous")
            ),
        }
    }
}

/// Advance a built-in iterator object, returning `(value, done)`. Stored
/// per-object rather than globally dispatched, matching spec.md §3.4's
/// `IteratorNext` slot; the closure reads/writes its own object's slots
/// (e.g. a cursor index) to advance.
pub type IteratorNextFn = Rc<dyn Fn(&mut ObjectData) -> Result<(Value, bool), Value>>;

pub struct ObjectData {
    pub otype: OType,
    pub prototype: Option<Object>,
    pub properties: HashMap<Key, Property>,
    pub insertion_order: Vec<Key>,
    pub array_data: Option<Vec<Value>>,
    pub extensible: bool,
    pub slots: HashMap<&'static str, Slot>,
    pub call: Option<Callable>,
    pub construct: Option<Callable>,
    pub iterator_next: Option<IteratorNextFn>,
}

impl fmt::Debug for ObjectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectData")
            .field("otype", &self.otype)
            .field("keys", &self.insertion_order.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Object(pub Rc<RefCell<ObjectData>>);

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Object {
    pub fn new(otype: OType, prototype: Option<Object>) -> Self {
        Self(Rc::new(RefCell::new(ObjectData {
            otype,
            prototype,
            properties: HashMap::new(),
            insertion_order: Vec::new(),
            array_data: None,
            extensible: true,
            slots: HashMap::new(),
            call: None,
            construct: None,
            iterator_next: None,
        })))
    }

    pub fn new_array(prototype: Option<Object>, elements: Vec<Value>) -> Self {
        let obj = Self::new(OType::Array, prototype);
        obj.0.borrow_mut().array_data = Some(elements);
        obj
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> Weak<RefCell<ObjectData>> {
        Rc::downgrade(&self.0)
    }

    pub fn otype(&self) -> OType {
        self.0.borrow().otype
    }

    pub fn is_callable(&self) -> bool {
        self.0.borrow().call.is_some()
    }

    pub fn is_array(&self) -> bool {
        self.0.borrow().array_data.is_some()
    }

    pub fn prototype(&self) -> Option<Object> {
        self.0.borrow().prototype.clone()
    }

    pub fn set_prototype(&self, proto: Option<Object>) {
        self.0.borrow_mut().prototype = proto;
    }

    /// Own-property lookup only (no prototype walk).
    pub fn get_own(&self, key: &Key) -> Option<Property> {
        self.0.borrow().properties.get(key).cloned()
    }

    /// Walk the prototype chain for a data/accessor descriptor. Callers
    /// needing the *value* (running getters) should go through
    /// `runtime::interpreter` helpers instead, since invoking a getter
    /// requires the interpreter.
    pub fn get_property(&self, key: &Key) -> Option<Property> {
        if let Some(p) = self.get_own(key) {
            return Some(p);
        }
        let proto = self.0.borrow().prototype.clone();
        proto.and_then(|p| p.get_property(key))
    }

    pub fn set_own(&self, key: Key, property: Property) {
        let mut data = self.0.borrow_mut();
        if !data.properties.contains_key(&key) {
            data.insertion_order.push(key.clone());
        }
        data.properties.insert(key, property);
    }

    pub fn delete_own(&self, key: &Key) -> bool {
        let mut data = self.0.borrow_mut();
        let removed = data.properties.remove(key).is_some();
        if removed {
            data.insertion_order.retain(|k| k != key);
        }
        removed
    }

    pub fn has_own(&self, key: &Key) -> bool {
        self.0.borrow().properties.contains_key(key)
    }

    pub fn has_property(&self, key: &Key) -> bool {
        if self.has_own(key) {
            return true;
        }
        match self.prototype() {
            Some(p) => p.has_property(key),
            None => false,
        }
    }

    /// Own enumerable keys in spec.md §5 order: array indices ascending,
    /// then remaining string keys in insertion order, then symbols.
    pub fn own_keys_ordered(&self) -> Vec<Key> {
        let data = self.0.borrow();
        let mut indices: Vec<u32> = Vec::new();
        let mut strings: Vec<Rc<str>> = Vec::new();
        let mut symbols: Vec<Symbol> = Vec::new();
        for key in &data.insertion_order {
            match key {
                Key::String(s) => {
                    let k = Key::String(s.clone());
                    if let Some(idx) = k.as_array_index() {
                        indices.push(idx);
                    } else {
                        strings.push(s.clone());
                    }
                }
                Key::Symbol(sym) => symbols.push(sym.clone()),
            }
        }
        indices.sort_unstable();
        let mut out = Vec::with_capacity(indices.len() + strings.len() + symbols.len());
        out.extend(indices.into_iter().map(|i| Key::String(i.to_string().into())));
        out.extend(strings.into_iter().map(Key::String));
        out.extend(symbols.into_iter().map(Key::Symbol));
        out
    }

    pub fn own_enumerable_string_keys(&self) -> Vec<Rc<str>> {
        self.own_keys_ordered()
            .into_iter()
            .filter_map(|k| match &k {
                Key::String(s) => {
                    let prop = self.get_own(&k)?;
                    prop.enumerable.then(|| s.clone())
                }
                Key::Symbol(_) => None,
            })
            .collect()
    }

    pub fn array_len(&self) -> Option<usize> {
        self.0.borrow().array_data.as_ref().map(Vec::len)
    }

    pub fn array_get(&self, index: usize) -> Option<Value> {
        self.0
            .borrow()
            .array_data
            .as_ref()
            .and_then(|v| v.get(index).cloned())
    }

    pub fn array_push(&self, value: Value) {
        if let Some(arr) = self.0.borrow_mut().array_data.as_mut() {
            arr.push(value);
        }
    }

    pub fn array_snapshot(&self) -> Vec<Value> {
        self.0
            .borrow()
            .array_data
            .clone()
            .unwrap_or_default()
    }

    pub fn set_array_snapshot(&self, values: Vec<Value>) {
        self.0.borrow_mut().array_data = Some(values);
    }

    pub fn get_slot(&self, name: &'static str) -> Option<Slot> {
        self.0.borrow().slots.get(name).cloned()
    }

    pub fn set_slot(&self, name: &'static str, slot: Slot) {
        self.0.borrow_mut().slots.insert(name, slot);
    }

    pub fn set_call(&self, callable: Callable) {
        self.0.borrow_mut().call = Some(callable);
    }

    pub fn set_construct(&self, callable: Callable) {
        self.0.borrow_mut().construct = Some(callable);
    }

    pub fn call_callable(&self) -> Option<Callable> {
        self.0.borrow().call.clone()
    }

    pub fn construct_callable(&self) -> Option<Callable> {
        self.0.borrow().construct.clone()
    }

    pub fn is_extensible(&self) -> bool {
        self.0.borrow().extensible
    }

    pub fn prevent_extensions(&self) {
        self.0.borrow_mut().extensible = false;
    }

    /// Best-effort synchronous `toString`/display used by `Display` and
    /// `console.log`; the real dispatch (honoring a user `toString`
    /// override) happens in `runtime::interpreter`.
    pub fn to_display_string(&self) -> String {
        match self.otype() {
            OType::Array => {
                let items: Vec<String> = self
                    .array_snapshot()
                    .iter()
                    .map(std::string::ToString::to_string)
                    .collect();
                items.join(",")
            }
            OType::Function => "function () { [native code] }".to_string(),
            _ => "[object Object]".to_string(),
        }
    }
}
