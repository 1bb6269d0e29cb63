use crate::attrs::validate;
use crate::error::CompileError;
use crate::utils::quote;
use cfgbake_schema::{
    Attributes, Decl, DeclId, Field, Item, Primitive, Record, TranslationUnit, TypeNode,
};

/// One documentation/validation entry for a record field.
#[derive(Debug, Clone, PartialEq)]
pub struct DocEntry {
    pub key:      String,
    pub expr:     String,
    pub required: bool,
    /// Human-readable type label ("Vector2<int>", "Table<String, int>", ...).
    pub label:    String,
    pub doc:      String,
}

/// The documentation tree of one record plus its rendered builder function.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDocs {
    pub record:  DeclId,
    pub name:    String,
    pub entries: Vec<DocEntry>,
    pub text:    String,
}

/// Emits a verifier-table builder per record, nested records first so every
/// referenced builder is declared before use.
pub fn generate(unit: &TranslationUnit) -> Result<Vec<RecordDocs>, CompileError> {
    let mut docs = Vec::new();
    for item in &unit.items {
        if let Item::Record(id) = item {
            emit_record(unit, *id, &mut docs)?;
        }
    }
    Ok(docs)
}

fn emit_record(
    unit: &TranslationUnit,
    id: DeclId,
    docs: &mut Vec<RecordDocs>,
) -> Result<(), CompileError> {
    let record = match unit.record(id) {
        Some(record) => record,
        None => return Ok(()),
    };
    for nested in &record.nested {
        emit_record(unit, *nested, docs)?;
    }

    let entries = record_entries(unit, record)?;
    let text = render_builder(record, &entries);
    docs.push(RecordDocs { record: id, name: record.qual.clone(), entries, text });
    Ok(())
}

/// Builds the per-field entries of one record, in declaration order.
pub fn record_entries(
    unit: &TranslationUnit,
    record: &Record,
) -> Result<Vec<DocEntry>, CompileError> {
    let mut entries = Vec::with_capacity(record.fields.len());
    for field in &record.fields {
        entries.push(field_entry(unit, field)?);
    }
    Ok(entries)
}

pub fn field_entry(unit: &TranslationUnit, field: &Field) -> Result<DocEntry, CompileError> {
    validate(unit, field)?;
    let required = !matches!(field.ty, TypeNode::Optional(_));
    let expr = type_expr(unit, &field.ty, &field.attrs)?;
    Ok(DocEntry {
        key: field.key().to_string(),
        expr,
        required,
        label: field.ty.display_name(unit),
        doc: field.doc.clone().unwrap_or_default(),
    })
}

fn render_builder(record: &Record, entries: &[DocEntry]) -> String {
    let mut lines = Vec::new();
    lines.push(format!("VerifierTable GetDocs_{}()", record.qual));
    lines.push("{".to_string());
    lines.push(format!("    VerifierTable table({});", quote(record.target_name())));
    for entry in entries {
        lines.push(format!(
            "    table.Add({}, {}, {}, {});",
            quote(&entry.key),
            entry.expr,
            entry.required,
            quote(&entry.doc)
        ));
    }
    lines.push("    return table;".to_string());
    lines.push("}".to_string());
    lines.push(String::new());
    lines.join("\n")
}

fn type_expr(
    unit: &TranslationUnit,
    ty: &TypeNode,
    attrs: &Attributes,
) -> Result<String, CompileError> {
    match ty {
        TypeNode::Primitive(primitive) => Ok(primitive_expr(primitive, attrs)),
        TypeNode::Optional(child) => Ok(format!(
            "VerifyOptional({})",
            type_expr(unit, child, attrs)?
        )),
        TypeNode::Sequence(child) | TypeNode::FixedArray(child, _) | TypeNode::Mapping(child) => {
            let none = Attributes::default();
            Ok(format!("VerifyTable({})", type_expr(unit, child, &none)?))
        }
        TypeNode::Variant(alternatives) => {
            let none = Attributes::default();
            let parts: Result<Vec<String>, CompileError> = alternatives
                .iter()
                .map(|alternative| type_expr(unit, alternative, &none))
                .collect();
            Ok(format!("VerifyOr({})", parts?.join(", ")))
        }
        TypeNode::Named { name, target, .. } => match target.map(|id| unit.decl(id)) {
            Some(Decl::Record(record)) => Ok(format!("GetDocs_{}()", record.qual)),
            // Enum values are stored as names; the name set itself is only
            // checked at bake time by the FromString conversion.
            Some(Decl::Enum(_)) => Ok("VerifyString()".to_string()),
            None => Err(CompileError::Internal(format!(
                "unresolved type reference {} reached the verifier generator",
                quote(name)
            ))),
        },
    }
}

fn primitive_expr(primitive: &Primitive, attrs: &Attributes) -> String {
    // String overrides replace the whole expression, qualifiers included.
    // The validator has already rejected any other co-set string constraint.
    if let Primitive::Str = primitive {
        if attrs.non_empty {
            return "VerifyNonEmptyString()".to_string();
        }
        if let Some(text) = &attrs.annotation {
            return format!("VerifyAnnotation({})", quote(text));
        }
    }

    let base = match primitive {
        Primitive::Bool => "VerifyBool()".to_string(),
        Primitive::Int => "VerifyInt()".to_string(),
        Primitive::Float => "VerifyFloat()".to_string(),
        Primitive::Double => "VerifyDouble()".to_string(),
        Primitive::Str => {
            if attrs.identifier {
                "VerifyIdentifier()".to_string()
            } else if attrs.datetime {
                "VerifyDateTime()".to_string()
            } else {
                "VerifyString()".to_string()
            }
        }
        Primitive::Path => {
            if attrs.directory {
                "VerifyDirectory()".to_string()
            } else {
                "VerifyPath()".to_string()
            }
        }
        Primitive::Dict => match &attrs.reference {
            // A reference name switches the emitted verifier kind.
            Some(name) => format!("VerifyReference({})", quote(name)),
            None => "VerifyDict()".to_string(),
        },
        Primitive::Vector { arity, scalar } => {
            if attrs.color {
                format!("VerifyColor{}()", arity)
            } else {
                format!("VerifyVector{}{}()", arity, scalar.suffix())
            }
        }
        Primitive::Matrix { rows, cols, scalar } => {
            format!("VerifyMatrix{}x{}{}()", rows, cols, scalar.suffix())
        }
    };

    apply_qualifiers(base, attrs)
}

/// Wraps the base expression with one qualifier per set constraint. The
/// application order is canonical and independent of how the attributes were
/// written in the source annotation; each wrap nests the previous expression
/// as its sole first parameter, so reordering would change the output.
fn apply_qualifiers(base: String, attrs: &Attributes) -> String {
    let mut expr = base;
    if let Some((low, high)) = &attrs.range {
        expr = format!("VerifyInRange({}, {}, {})", expr, low, high);
    }
    if let Some((low, high)) = &attrs.not_in_range {
        expr = format!("VerifyNotInRange({}, {}, {})", expr, low, high);
    }
    if let Some(bound) = &attrs.less {
        expr = format!("VerifyLess({}, {})", expr, bound);
    }
    if let Some(bound) = &attrs.less_eq {
        expr = format!("VerifyLessEqual({}, {})", expr, bound);
    }
    if let Some(bound) = &attrs.greater {
        expr = format!("VerifyGreater({}, {})", expr, bound);
    }
    if let Some(bound) = &attrs.greater_eq {
        expr = format!("VerifyGreaterEqual({}, {})", expr, bound);
    }
    if let Some(bound) = &attrs.not_eq {
        expr = format!("VerifyNotEqual({}, {})", expr, bound);
    }
    if let Some(items) = &attrs.in_list {
        expr = format!("VerifyInList({}, {})", expr, items.join(", "));
    }
    if let Some(items) = &attrs.not_in_list {
        expr = format!("VerifyNotInList({}, {})", expr, items.join(", "));
    }
    expr
}
