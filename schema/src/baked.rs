use indexmap::IndexMap;

use crate::model::Scalar;
use crate::value::DynValue;

/// A strongly-typed value produced by a successful bake.
///
/// The shape follows the field's resolved `TypeNode`: primitives become their
/// native representation, sequences and fixed arrays become lists, mappings
/// keep their keys in source order, and optional fields that were absent are
/// stored as `None` inside the enclosing [BakedRecord].
#[derive(Debug, Clone, PartialEq)]
pub enum Baked {
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    String(String),
    Path(String),
    /// Generic dictionaries stay dynamic; only their presence is validated.
    Dict(IndexMap<String, DynValue>),
    Vector {
        scalar: Scalar,
        comps:  Vec<f64>,
    },
    Matrix {
        rows:   u8,
        cols:   u8,
        scalar: Scalar,
        comps:  Vec<f64>,
    },
    List(Vec<Baked>),
    Map(IndexMap<String, Baked>),
    EnumValue {
        enum_name: String,
        element:   String,
    },
    Record(BakedRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BakedRecord {
    /// Bake target name of the record, used in error messages.
    pub name:   String,
    /// One entry per declared field, in declaration order. `None` marks an
    /// optional field whose key was absent from the dictionary.
    pub fields: IndexMap<String, Option<Baked>>,
}

impl BakedRecord {
    pub fn field(&self, name: &str) -> Option<&Baked> {
        self.fields.get(name).and_then(|slot| slot.as_ref())
    }

    /// True if the optional field exists but was absent from the input.
    pub fn is_absent(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(None))
    }
}

impl Baked {
    pub fn as_int(&self) -> i64 {
        match *self {
            Baked::Int(value) => value,
            _ => 0,
        }
    }

    pub fn as_double(&self) -> f64 {
        match *self {
            Baked::Double(value) => value,
            Baked::Float(value) => value as f64,
            _ => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match *self {
            Baked::Bool(value) => value,
            _ => false,
        }
    }

    pub fn as_string(&self) -> &str {
        match *self {
            Baked::String(ref value) | Baked::Path(ref value) => value.as_str(),
            _ => "",
        }
    }

    pub fn as_record(&self) -> Option<&BakedRecord> {
        match self {
            Baked::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// Converts a baked value back into its dynamic rendition. This is the
/// inverse of the bake read rules and is used when pushing Lua return
/// values: records and mappings become dictionaries, lists become
/// dictionaries keyed "1".."N", and absent optional fields are skipped.
pub fn baked_to_dyn(value: &Baked) -> DynValue {
    match value {
        Baked::Bool(v) => DynValue::Bool(*v),
        Baked::Int(v) => DynValue::Int(*v),
        Baked::Float(v) => DynValue::Double(*v as f64),
        Baked::Double(v) => DynValue::Double(*v),
        Baked::String(v) | Baked::Path(v) => DynValue::String(v.clone()),
        Baked::Dict(entries) => DynValue::Dict(entries.clone()),
        Baked::Vector { comps, .. } => DynValue::Components(comps.clone()),
        Baked::Matrix { comps, .. } => DynValue::Components(comps.clone()),
        Baked::List(items) => DynValue::Dict(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| ((index + 1).to_string(), baked_to_dyn(item)))
                .collect(),
        ),
        Baked::Map(entries) => DynValue::Dict(
            entries
                .iter()
                .map(|(key, item)| (key.clone(), baked_to_dyn(item)))
                .collect(),
        ),
        Baked::EnumValue { element, .. } => DynValue::String(element.clone()),
        Baked::Record(record) => DynValue::Dict(
            record
                .fields
                .iter()
                .filter_map(|(key, slot)| {
                    slot.as_ref().map(|item| (key.clone(), baked_to_dyn(item)))
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_round_trips_to_decimal_keys() {
        let list = Baked::List(vec![Baked::Int(7), Baked::Int(8)]);
        let dynamic = baked_to_dyn(&list);
        assert_eq!(dynamic.get("1"), Some(&DynValue::Int(7)));
        assert_eq!(dynamic.get("2"), Some(&DynValue::Int(8)));
    }

    #[test]
    fn test_absent_optionals_are_skipped() {
        let mut fields = IndexMap::new();
        fields.insert("a".to_string(), Some(Baked::Int(1)));
        fields.insert("b".to_string(), None);
        let record = Baked::Record(BakedRecord { name: "R".to_string(), fields });
        let dynamic = baked_to_dyn(&record);
        assert_eq!(dynamic.get("a"), Some(&DynValue::Int(1)));
        assert_eq!(dynamic.get("b"), None);
    }
}
