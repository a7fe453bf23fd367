//! Nested key-value data exchanged with XML
//!
//! A [`Value`] is either a scalar (null, boolean, number, string), an ordered
//! [`Array`] or an insertion-ordered [`Object`]. Objects map onto child
//! elements, arrays onto repeated sibling elements and scalars onto text.

use indexmap::map::{IntoIter, Iter, Keys, Values};
use indexmap::IndexMap;
use std::ops::Index;

#[cfg(feature = "serde")]
mod serialize;

/// Reserved object key whose value holds the attributes of an element
pub const ATTRIBUTES_KEY: &str = "@attributes";

/// Key under which decoded text of an element with attributes or child
/// elements is stored
pub const TEXT_KEY: &str = "#text";

/// A nested data value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (f64)
    Number(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Array),
    /// Object (key-value pairs with order preservation)
    Object(Object),
}

impl Value {
    /// Returns true if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for null, booleans, numbers and strings
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Array(_) | Self::Object(_))
    }

    /// Returns true if this value is an array
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns true if this value is an object
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns the string value if this is a string, None otherwise
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the array if this is an array, None otherwise
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the object if this is an object, None otherwise
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Text form of a scalar as written into XML.
    ///
    /// Numbers use the shortest round-tripping form (`42.0` becomes `42`),
    /// booleans become `true`/`false` and null the empty string. Containers
    /// have no text form.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Null => Some(String::new()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Array(_) | Self::Object(_) => None,
        }
    }

    /// True for null, the empty string, and empty arrays and objects
    pub fn is_empty_value(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::Array(a) => a.is_empty(),
            Self::Object(o) => o.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Recursively drop empty entries, children first, so a container whose
    /// children were all removed is removed as well. The top-level value is
    /// returned even when it ends up empty.
    pub fn prune_empty(self) -> Self {
        match self {
            Self::Object(obj) => Self::Object(obj.prune_empty()),
            Self::Array(arr) => Self::Array(arr.prune_empty()),
            scalar => scalar,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Self::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Array(Array(values))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::Object(Object(map))
    }
}

/// An order-preserving object (map of string keys to values)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object(pub(crate) IndexMap<String, Value>);

impl Object {
    /// Creates a new empty object
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Creates a new object with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    /// Returns the number of key-value pairs in the object
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the object contains no key-value pairs
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a reference to the value corresponding to the key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Inserts a key-value pair into the object
    /// Returns the previous value if the key already existed
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes a key from the object, keeping the order of the other keys
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Returns true if the object contains the specified key
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns an iterator over the keys
    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values
    pub fn values(&self) -> Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over key-value pairs
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Append `value` under `key`, turning an existing entry into an array
    /// of all values seen for that key.
    pub fn push_repeated(&mut self, key: &str, value: Value) {
        match self.0.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::take(existing);
                *existing = Value::Array(Array(vec![first, value]));
            }
            None => {
                self.0.insert(key.to_owned(), value);
            }
        }
    }

    /// Recursively drop empty entries; see [`Value::prune_empty`]
    pub fn prune_empty(self) -> Self {
        self.0
            .into_iter()
            .map(|(key, value)| (key, value.prune_empty()))
            .filter(|(_, value)| !value.is_empty_value())
            .collect()
    }
}

impl Index<&str> for Object {
    type Output = Value;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, key: &str) -> &Self::Output {
        &self.0[key]
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<IndexMap<String, Value>> for Object {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Object {
    fn from(entries: [(K, V); N]) -> Self {
        entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect()
    }
}

/// An array of values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array(pub(crate) Vec<Value>);

impl Array {
    /// Creates a new empty array
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the number of elements in the array
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the array contains no elements
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a reference to the element at the given index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Appends an element to the end of the array
    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    /// Returns an iterator over the array
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// Recursively drop empty items; see [`Value::prune_empty`]
    pub fn prune_empty(self) -> Self {
        self.0
            .into_iter()
            .map(Value::prune_empty)
            .filter(|value| !value.is_empty_value())
            .collect()
    }
}

impl Index<usize> for Array {
    type Output = Value;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Array {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Vec<Value>> for Array {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(Vec::from_iter(iter))
    }
}

/// Recursively strip empty leaves and containers from `value`
pub fn prune_empty(value: Value) -> Value {
    value.prune_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert!(Value::Null.is_null());
        assert!(Value::Null.is_scalar());
        assert!(Value::Bool(true).is_scalar());
        assert!(Value::Number(1.5).is_scalar());
        assert!(!Value::Array(Array::new()).is_scalar());
        assert!(Value::Array(Array::new()).is_array());
        assert!(Value::Object(Object::new()).is_object());
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(Value::from("x").scalar_text(), Some("x".to_string()));
        assert_eq!(Value::from(42).scalar_text(), Some("42".to_string()));
        assert_eq!(Value::from(2.5).scalar_text(), Some("2.5".to_string()));
        assert_eq!(Value::from(true).scalar_text(), Some("true".to_string()));
        assert_eq!(Value::Null.scalar_text(), Some(String::new()));
        assert_eq!(Value::Object(Object::new()).scalar_text(), None);
    }

    #[test]
    fn test_value_from_impls() {
        let v: Value = "hello".into();
        assert!(matches!(v, Value::String(s) if s == "hello"));

        let v: Value = vec![Value::Null, Value::Bool(true)].into();
        assert!(matches!(v, Value::Array(arr) if arr.len() == 2));

        let obj = Object::from([("a", 1), ("b", 2)]);
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["b"], Value::Number(2.0));
    }

    #[test]
    fn test_object_remove_keeps_order() {
        let mut obj = Object::from([("first", 1), ("second", 2), ("third", 3)]);
        assert_eq!(obj.remove("first"), Some(Value::Number(1.0)));

        let keys: Vec<_> = obj.keys().collect();
        assert_eq!(keys, vec!["second", "third"]);
    }

    #[test]
    fn test_push_repeated() {
        let mut obj = Object::new();
        obj.push_repeated("item", "a".into());
        assert_eq!(obj["item"], Value::from("a"));

        obj.push_repeated("item", "b".into());
        obj.push_repeated("item", "c".into());
        assert_eq!(
            obj["item"],
            Value::from(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_prune_empty_is_bottom_up() {
        let mut inner = Object::new();
        inner.insert("blank", "");
        inner.insert("nothing", Object::new());

        let mut obj = Object::new();
        obj.insert("keep", "x");
        obj.insert("zero", 0);
        obj.insert("inner", inner);
        obj.insert("list", vec![Value::from(""), Value::Array(Array::new())]);

        let pruned = obj.prune_empty();
        let keys: Vec<_> = pruned.keys().collect();
        assert_eq!(keys, vec!["keep", "zero"]);
    }

    #[test]
    fn test_prune_empty_array_items() {
        let arr: Array = vec![Value::from("a"), Value::Null, Value::from("b")].into();
        let pruned = prune_empty(Value::Array(arr));
        assert_eq!(pruned, Value::from(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_prune_empty_idempotent() {
        let mut nested = Object::new();
        nested.insert("a", Object::from([("b", "")]));
        nested.insert("c", "d");
        let once = Value::Object(nested).prune_empty();
        let twice = once.clone().prune_empty();
        assert_eq!(once, twice);
    }
}
