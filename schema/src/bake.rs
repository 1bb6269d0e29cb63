use indexmap::IndexMap;

use crate::baked::{Baked, BakedRecord};
use crate::error::BakeError;
use crate::model::{Decl, Primitive, Record, Scalar, TranslationUnit, TypeNode};
use crate::value::DynValue;

/// Bakes a dynamic dictionary into the given record's typed representation.
///
/// Fields are extracted in declaration order. Required fields whose key is
/// absent fail with `MissingField`; optional fields are left in the absent
/// state. Nested records recurse into the nested dictionary under their key.
pub fn bake_record(
    unit: &TranslationUnit,
    record: &Record,
    value: &DynValue,
) -> Result<BakedRecord, BakeError> {
    let entries = value.as_dict().ok_or_else(|| BakeError::TypeMismatch {
        key:      record.target_name().to_string(),
        expected: "table".to_string(),
        found:    value.kind_name().to_string(),
    })?;

    let mut fields: IndexMap<String, Option<Baked>> = IndexMap::new();
    for field in &record.fields {
        let key = field.key();
        let slot = match (&field.ty, entries.get(key)) {
            (TypeNode::Optional(_), None) => None,
            (TypeNode::Optional(child), Some(stored)) => {
                Some(bake_value(unit, child, key, stored)?)
            }
            (_, None) => return Err(BakeError::MissingField(key.to_string())),
            (ty, Some(stored)) => Some(bake_value(unit, ty, key, stored)?),
        };
        fields.insert(key.to_string(), slot);
    }

    Ok(BakedRecord { name: record.target_name().to_string(), fields })
}

/// Bakes one stored value against a resolved type node.
pub fn bake_value(
    unit: &TranslationUnit,
    ty: &TypeNode,
    key: &str,
    value: &DynValue,
) -> Result<Baked, BakeError> {
    match ty {
        TypeNode::Primitive(primitive) => bake_primitive(primitive, key, value),
        // Key-absence is handled by the enclosing record or argument list;
        // a present optional bakes exactly like its child.
        TypeNode::Optional(child) => bake_value(unit, child, key, value),
        TypeNode::Sequence(child) => {
            let entries = expect_dict(key, value)?;
            let mut items = Vec::with_capacity(entries.len());
            for index in 1..=entries.len() {
                let index_key = index.to_string();
                let stored = entries.get(&index_key).ok_or_else(|| BakeError::MissingKey {
                    table: key.to_string(),
                    key:   index_key.clone(),
                })?;
                items.push(bake_value(unit, child, &index_key, stored)?);
            }
            Ok(Baked::List(items))
        }
        TypeNode::FixedArray(child, size) => {
            let entries = expect_dict(key, value)?;
            if entries.len() != *size {
                return Err(BakeError::WrongLength {
                    key:      key.to_string(),
                    expected: *size,
                    found:    entries.len(),
                });
            }
            let mut items = Vec::with_capacity(*size);
            for index in 1..=*size {
                let index_key = index.to_string();
                let stored = entries.get(&index_key).ok_or_else(|| BakeError::MissingKey {
                    table: key.to_string(),
                    key:   index_key.clone(),
                })?;
                items.push(bake_value(unit, child, &index_key, stored)?);
            }
            Ok(Baked::List(items))
        }
        TypeNode::Mapping(child) => {
            let entries = expect_dict(key, value)?;
            let mut baked = IndexMap::new();
            for (map_key, stored) in entries {
                baked.insert(map_key.clone(), bake_value(unit, child, map_key, stored)?);
            }
            Ok(Baked::Map(baked))
        }
        TypeNode::Variant(alternatives) => {
            // The stored value carries no discriminator. Probe each
            // alternative in declared order and take the first structural
            // match; changing this order changes which alternative wins for
            // shapes that overlap (e.g. vec4 and mat2x2).
            for alternative in alternatives {
                if probe_matches(unit, alternative, value) {
                    return bake_value(unit, alternative, key, value);
                }
            }
            Err(BakeError::NoVariantMatch(key.to_string()))
        }
        TypeNode::Named { name, target, .. } => {
            let id = target.ok_or_else(|| {
                BakeError::Internal(format!("unresolved type reference \"{}\"", name))
            })?;
            match unit.decl(id) {
                Decl::Record(record) => {
                    Ok(Baked::Record(bake_record(unit, record, value)?))
                }
                Decl::Enum(enum_decl) => {
                    let text = match value {
                        DynValue::String(text) => text,
                        other => {
                            return Err(BakeError::TypeMismatch {
                                key:      key.to_string(),
                                expected: "string".to_string(),
                                found:    other.kind_name().to_string(),
                            })
                        }
                    };
                    let element = enum_decl
                        .elements
                        .iter()
                        .find(|element| {
                            element.external_name() == text || element.name == *text
                        })
                        .ok_or_else(|| BakeError::InvalidEnumName {
                            enum_name: enum_decl.name.clone(),
                            value:     text.clone(),
                        })?;
                    Ok(Baked::EnumValue {
                        enum_name: enum_decl.name.clone(),
                        element:   element.external_name().to_string(),
                    })
                }
            }
        }
    }
}

fn expect_dict<'a>(
    key: &str,
    value: &'a DynValue,
) -> Result<&'a IndexMap<String, DynValue>, BakeError> {
    value.as_dict().ok_or_else(|| BakeError::TypeMismatch {
        key:      key.to_string(),
        expected: "table".to_string(),
        found:    value.kind_name().to_string(),
    })
}

/// Reads one primitive value. Integers truncate from a stored double; floats
/// and doubles additionally accept a stored integer representation, widening
/// it, since numbers without a decimal point arrive stored integral.
fn bake_primitive(
    primitive: &Primitive,
    key: &str,
    value: &DynValue,
) -> Result<Baked, BakeError> {
    let mismatch = |expected: &str| BakeError::TypeMismatch {
        key:      key.to_string(),
        expected: expected.to_string(),
        found:    value.kind_name().to_string(),
    };

    match primitive {
        Primitive::Bool => match value {
            DynValue::Bool(stored) => Ok(Baked::Bool(*stored)),
            _ => Err(mismatch("bool")),
        },
        Primitive::Int => match value {
            DynValue::Int(stored) => Ok(Baked::Int(*stored)),
            // Integers may be read from a floating-point representation.
            DynValue::Double(stored) => Ok(Baked::Int(stored.trunc() as i64)),
            _ => Err(mismatch("integer")),
        },
        Primitive::Double => match value {
            DynValue::Double(stored) => Ok(Baked::Double(*stored)),
            DynValue::Int(stored) => Ok(Baked::Double(*stored as f64)),
            _ => Err(mismatch("number")),
        },
        // Floats are always narrowed from the stored double.
        Primitive::Float => match value {
            DynValue::Double(stored) => Ok(Baked::Float(*stored as f32)),
            DynValue::Int(stored) => Ok(Baked::Float(*stored as f32)),
            _ => Err(mismatch("number")),
        },
        Primitive::Str => match value {
            DynValue::String(stored) => Ok(Baked::String(stored.clone())),
            _ => Err(mismatch("string")),
        },
        Primitive::Path => match value {
            DynValue::String(stored) => Ok(Baked::Path(stored.clone())),
            _ => Err(mismatch("string")),
        },
        Primitive::Dict => match value {
            DynValue::Dict(stored) => Ok(Baked::Dict(stored.clone())),
            _ => Err(mismatch("table")),
        },
        Primitive::Vector { arity, scalar } => {
            let comps = expect_components(key, value, *arity as usize)?;
            let comps = match scalar {
                Scalar::Int => comps.iter().map(|c| c.trunc()).collect(),
                _ => comps.to_vec(),
            };
            Ok(Baked::Vector { scalar: *scalar, comps })
        }
        Primitive::Matrix { rows, cols, scalar } => {
            let comps = expect_components(key, value, (*rows as usize) * (*cols as usize))?;
            Ok(Baked::Matrix {
                rows:   *rows,
                cols:   *cols,
                scalar: *scalar,
                comps:  comps.to_vec(),
            })
        }
    }
}

fn expect_components<'a>(
    key: &str,
    value: &'a DynValue,
    count: usize,
) -> Result<&'a [f64], BakeError> {
    match value {
        DynValue::Components(comps) if comps.len() == count => Ok(comps.as_slice()),
        DynValue::Components(comps) => Err(BakeError::WrongLength {
            key:      key.to_string(),
            expected: count,
            found:    comps.len(),
        }),
        other => Err(BakeError::TypeMismatch {
            key:      key.to_string(),
            expected: "components".to_string(),
            found:    other.kind_name().to_string(),
        }),
    }
}

/// Checks whether the stored value is structurally compatible with a type's
/// dynamic representation. Used by variant baking; first match wins.
pub fn probe_matches(unit: &TranslationUnit, ty: &TypeNode, value: &DynValue) -> bool {
    match ty {
        TypeNode::Primitive(primitive) => match primitive {
            Primitive::Bool => matches!(value, DynValue::Bool(_)),
            Primitive::Int | Primitive::Float | Primitive::Double => {
                matches!(value, DynValue::Int(_) | DynValue::Double(_))
            }
            Primitive::Str | Primitive::Path => matches!(value, DynValue::String(_)),
            Primitive::Dict => matches!(value, DynValue::Dict(_)),
            Primitive::Vector { arity, .. } => value.is_components(*arity as usize),
            Primitive::Matrix { rows, cols, .. } => {
                value.is_components((*rows as usize) * (*cols as usize))
            }
        },
        TypeNode::Optional(child) => probe_matches(unit, child, value),
        TypeNode::Sequence(_) | TypeNode::FixedArray(_, _) | TypeNode::Mapping(_) => {
            matches!(value, DynValue::Dict(_))
        }
        TypeNode::Variant(alternatives) => alternatives
            .iter()
            .any(|alternative| probe_matches(unit, alternative, value)),
        TypeNode::Named { target, .. } => match target.map(|id| unit.decl(id)) {
            Some(Decl::Record(_)) => matches!(value, DynValue::Dict(_)),
            Some(Decl::Enum(_)) => matches!(value, DynValue::String(_)),
            None => false,
        },
    }
}
