use indexmap::IndexMap;

/// This type holds the dynamic, loosely-typed configuration data a bake
/// operates on.
///
/// It mirrors what the scripting runtime stores: booleans, numbers (integral
/// or floating), strings, flat component lists for vectors and matrices, and
/// string-keyed dictionaries. Dictionaries preserve insertion order because
/// mapping fields carry their keys through to the baked output verbatim.
///
/// Note that a vector and a matrix with the same component count are
/// indistinguishable at this level; variant baking probes component counts
/// and picks the first declared alternative that fits.
#[derive(Debug, Clone, PartialEq)]
pub enum DynValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Components(Vec<f64>),
    Dict(IndexMap<String, DynValue>),
}

impl DynValue {
    /// Kind name used in type-mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DynValue::Bool(_) => "bool",
            DynValue::Int(_) => "integer",
            DynValue::Double(_) => "number",
            DynValue::String(_) => "string",
            DynValue::Components(_) => "components",
            DynValue::Dict(_) => "table",
        }
    }

    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        match *self {
            DynValue::Bool(value) => value,
            _ => false,
        }
    }

    /// A convenience method to extract an integral value. Doubles truncate.
    /// Returns `0` for other value kinds.
    pub fn as_int(&self) -> i64 {
        match *self {
            DynValue::Int(value) => value,
            DynValue::Double(value) => value as i64,
            _ => 0,
        }
    }

    /// A convenience method to extract a numeric value.
    /// Returns `0.0` for other value kinds.
    pub fn as_double(&self) -> f64 {
        match *self {
            DynValue::Int(value) => value as f64,
            DynValue::Double(value) => value,
            _ => 0.0,
        }
    }

    /// A convenience method to extract the value out of a [String](#variant.String).
    /// Returns `""` for other value kinds.
    pub fn as_string(&self) -> &str {
        match *self {
            DynValue::String(ref value) => value.as_str(),
            _ => "",
        }
    }

    /// A convenience method to view the component list of a
    /// [Components](#variant.Components) value. Returns an empty slice for
    /// other value kinds.
    pub fn as_components(&self) -> &[f64] {
        match *self {
            DynValue::Components(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    /// A convenience method to view a [Dict](#variant.Dict).
    /// Returns `None` for other value kinds.
    pub fn as_dict(&self) -> Option<&IndexMap<String, DynValue>> {
        match *self {
            DynValue::Dict(ref entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a key inside a [Dict](#variant.Dict) value.
    pub fn get(&self, key: &str) -> Option<&DynValue> {
        self.as_dict().and_then(|entries| entries.get(key))
    }

    pub fn is_components(&self, count: usize) -> bool {
        match self {
            DynValue::Components(values) => values.len() == count,
            _ => false,
        }
    }
}

impl From<bool> for DynValue {
    fn from(value: bool) -> Self {
        DynValue::Bool(value)
    }
}

impl From<i64> for DynValue {
    fn from(value: i64) -> Self {
        DynValue::Int(value)
    }
}

impl From<f64> for DynValue {
    fn from(value: f64) -> Self {
        DynValue::Double(value)
    }
}

impl From<&str> for DynValue {
    fn from(value: &str) -> Self {
        DynValue::String(value.to_string())
    }
}

/// Builds a [DynValue::Dict] from key/value pairs, preserving order.
pub fn dict<I, K>(entries: I) -> DynValue
where
    I: IntoIterator<Item = (K, DynValue)>,
    K: Into<String>,
{
    DynValue::Dict(
        entries
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect(),
    )
}

/// Builds the dictionary rendition of a sequence: decimal keys "1".."N".
pub fn seq_dict<I>(items: I) -> DynValue
where
    I: IntoIterator<Item = DynValue>,
{
    DynValue::Dict(
        items
            .into_iter()
            .enumerate()
            .map(|(index, value)| ((index + 1).to_string(), value))
            .collect(),
    )
}
