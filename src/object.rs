//! PDF object types.
//!
//! A minimal typed object model shared by the codec and security layers.
//! The parser that builds these values from bytes and the resolver that
//! chases indirect references live outside this crate; the walker here never
//! follows a [`Object::Reference`].

use std::collections::BTreeMap;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// Name (written with a leading / in PDF syntax)
    Name(String),
    /// String: an opaque byte sequence, not necessarily text
    String(Vec<u8>),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (name to value mapping)
    Dictionary(Dictionary),
    /// Stream (dictionary plus byte payload)
    Stream(Stream),
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
///
/// This is the stable identity used for walker memoization, so it is `Copy`,
/// `Eq` and `Hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    /// Object number
    pub num: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(num: u32, gen: u16) -> Self {
        Self { num, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.num, self.gen)
    }
}

/// Dictionary mapping names to objects.
///
/// Key order is not significant to PDF semantics; a sorted map keeps
/// iteration deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary(BTreeMap<String, Object>);

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.0.get(key)
    }

    /// Set an entry, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Object) {
        self.0.insert(key.into(), value);
    }

    /// Remove an entry, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.0.remove(key)
    }

    /// Whether an entry exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.0.iter()
    }

    /// Iterate over entries with mutable values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Object)> {
        self.0.iter_mut()
    }

    /// The entry keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up an integer entry.
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Object::as_integer)
    }

    /// Look up a name entry.
    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Object::as_name)
    }

    /// Look up a string entry as bytes.
    pub fn get_str_bytes(&self, key: &str) -> Option<&[u8]> {
        self.get(key).and_then(Object::as_str_bytes)
    }

    /// Look up a boolean entry.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Object::as_bool)
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (String, Object)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Stream object: a dictionary plus an opaque byte payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    /// Stream dictionary (carries `Filter`, `DecodeParms`, `Length`, ...)
    pub dict: Dictionary,
    /// Raw stream payload, still filter-encoded
    pub data: Vec<u8>,
}

impl Stream {
    /// Create a stream, setting `Length` from the payload.
    pub fn new(mut dict: Dictionary, data: Vec<u8>) -> Self {
        dict.set("Length", Object::Integer(data.len() as i64));
        Self { dict, data }
    }
}

impl Object {
    /// Human-readable type name, without data.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Name(_) => "Name",
            Object::String(_) => "String",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to string bytes.
    pub fn as_str_bytes(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both dictionaries and streams.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Check if the object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Build a name object.
    pub fn name(s: impl Into<String>) -> Object {
        Object::Name(s.into())
    }

    /// Build a string object from bytes.
    pub fn string(s: impl Into<Vec<u8>>) -> Object {
        Object::String(s.into())
    }
}
