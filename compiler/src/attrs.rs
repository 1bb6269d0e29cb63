use crate::error::CompileError;
use cfgbake_schema::{Attributes, Decl, Field, Primitive, TranslationUnit, TypeNode};

/// Resolved attribute-legality category of a field's type. Optional wrappers
/// are transparent; all table-shaped composites share one category because
/// none of them accept constraint attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Bool,
    Numeric,
    Vector(u8),
    Matrix,
    Str,
    Path,
    Dict,
    Table,
    Variant,
    Enum,
}

pub fn category_of(unit: &TranslationUnit, ty: &TypeNode) -> Category {
    match ty {
        TypeNode::Primitive(primitive) => match primitive {
            Primitive::Bool => Category::Bool,
            Primitive::Int | Primitive::Float | Primitive::Double => Category::Numeric,
            Primitive::Vector { arity, .. } => Category::Vector(*arity),
            Primitive::Matrix { .. } => Category::Matrix,
            Primitive::Str => Category::Str,
            Primitive::Path => Category::Path,
            Primitive::Dict => Category::Dict,
        },
        TypeNode::Optional(child) => category_of(unit, child),
        TypeNode::Sequence(_) | TypeNode::FixedArray(_, _) | TypeNode::Mapping(_) => {
            Category::Table
        }
        TypeNode::Variant(_) => Category::Variant,
        TypeNode::Named { target, .. } => match target.map(|id| unit.decl(id)) {
            Some(Decl::Record(_)) | None => Category::Table,
            Some(Decl::Enum(_)) => Category::Enum,
        },
    }
}

const BOUNDS: &[&str] = &[
    "range",
    "not_in_range",
    "less",
    "less_eq",
    "greater",
    "greater_eq",
    "not_eq",
];

/// Rule table: which attribute names a category accepts. Everything not
/// listed is rejected with the type's display name.
fn allowed(category: Category) -> Vec<&'static str> {
    match category {
        // Booleans and matrices accept no constraints at all.
        Category::Bool | Category::Matrix => Vec::new(),
        Category::Numeric => BOUNDS.to_vec(),
        Category::Vector(2) => {
            let mut names = BOUNDS.to_vec();
            names.extend(["in_list", "not_in_list", "annotation"]);
            names
        }
        Category::Vector(_) => {
            let mut names = BOUNDS.to_vec();
            names.extend(["in_list", "not_in_list", "annotation", "color"]);
            names
        }
        Category::Str => vec![
            "in_list",
            "not_in_list",
            "not_eq",
            "annotation",
            "non_empty",
            "datetime",
            "identifier",
        ],
        Category::Path => vec!["directory"],
        Category::Dict => vec!["ref"],
        Category::Table | Category::Variant | Category::Enum => Vec::new(),
    }
}

fn set_names(attrs: &Attributes) -> Vec<&'static str> {
    let mut names = Vec::new();
    if attrs.range.is_some() {
        names.push("range");
    }
    if attrs.not_in_range.is_some() {
        names.push("not_in_range");
    }
    if attrs.less.is_some() {
        names.push("less");
    }
    if attrs.less_eq.is_some() {
        names.push("less_eq");
    }
    if attrs.greater.is_some() {
        names.push("greater");
    }
    if attrs.greater_eq.is_some() {
        names.push("greater_eq");
    }
    if attrs.not_eq.is_some() {
        names.push("not_eq");
    }
    if attrs.in_list.is_some() {
        names.push("in_list");
    }
    if attrs.not_in_list.is_some() {
        names.push("not_in_list");
    }
    if attrs.reference.is_some() {
        names.push("ref");
    }
    if attrs.annotation.is_some() {
        names.push("annotation");
    }
    if attrs.color {
        names.push("color");
    }
    if attrs.directory {
        names.push("directory");
    }
    if attrs.datetime {
        names.push("datetime");
    }
    if attrs.identifier {
        names.push("identifier");
    }
    if attrs.non_empty {
        names.push("non_empty");
    }
    names
}

/// Checks a field's attributes against its resolved type category.
///
/// Pure and deterministic: the verdict is a function of the category table
/// plus the string-exclusivity rule, nothing else. Invoked lazily by every
/// generator rather than at parse time.
pub fn validate(unit: &TranslationUnit, field: &Field) -> Result<(), CompileError> {
    let category = category_of(unit, &field.ty);
    let legal = allowed(category);

    for name in set_names(&field.attrs) {
        if !legal.contains(&name) {
            return Err(CompileError::UnsupportedAttribute {
                type_name: field.ty.display_name(unit),
                attribute: name.to_string(),
            });
        }
    }

    // Second-level check for string fields: annotation and non_empty replace
    // the whole verifier expression, so no other string constraint may be set
    // alongside either of them; in_list and not_eq are mutually exclusive.
    if category == Category::Str {
        let attrs = &field.attrs;
        let overriding = attrs.annotation.is_some() || attrs.non_empty;
        let others = [
            attrs.in_list.is_some(),
            attrs.not_in_list.is_some(),
            attrs.not_eq.is_some(),
            attrs.datetime,
            attrs.identifier,
        ];
        let conflict = (attrs.annotation.is_some() && attrs.non_empty)
            || (overriding && others.iter().any(|set| *set))
            || (attrs.in_list.is_some() && attrs.not_eq.is_some());
        if conflict {
            return Err(CompileError::ExclusiveAttributes(field.name.clone()));
        }
    }

    Ok(())
}
