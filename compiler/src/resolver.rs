use crate::error::CompileError;
use crate::utils::quote;
use cfgbake_schema::{Decl, DeclId, Item, TranslationUnit, TypeNode};
use std::collections::HashMap;

/// Binds every `Named` type node to the record or enum declaration it
/// designates, and assigns scope-qualified names used by the generators.
///
/// Two passes: first collect scope tables for every declaration, then walk
/// all type expressions and look names up innermost scope first, then
/// outward, then among top-level siblings. Collecting everything before
/// resolving is what makes forward references between siblings work.
pub fn resolve(unit: &mut TranslationUnit) -> Result<(), CompileError> {
    let count = unit.decls.len();
    let mut parents: Vec<Option<usize>> = vec![None; count];
    let mut quals: Vec<String> = unit.decls.iter().map(|d| d.name().to_string()).collect();
    let mut members: Vec<HashMap<String, DeclId>> = vec![HashMap::new(); count];
    let mut top: HashMap<String, DeclId> = HashMap::new();

    for item in &unit.items {
        let id = match item {
            Item::Record(id) | Item::Enum(id) => *id,
            Item::Function(_) => continue,
        };
        top.insert(unit.decl(id).name().to_string(), id);
        collect(unit, id, None, &mut parents, &mut quals, &mut members);
    }

    for (index, qual) in quals.iter().enumerate() {
        match &mut unit.decls[index] {
            Decl::Record(record) => record.qual = qual.clone(),
            Decl::Enum(enum_decl) => enum_decl.qual = qual.clone(),
        }
    }

    for index in 0..count {
        if let Decl::Record(record) = &mut unit.decls[index] {
            for field in &mut record.fields {
                resolve_type(&mut field.ty, Some(index), &parents, &members, &top)?;
            }
        }
    }

    for func in &mut unit.functions {
        for arg in &mut func.args {
            resolve_type(&mut arg.ty, None, &parents, &members, &top)?;
        }
        if let Some(ret) = &mut func.ret {
            resolve_type(ret, None, &parents, &members, &top)?;
        }
    }

    Ok(())
}

fn collect(
    unit: &TranslationUnit,
    id: DeclId,
    parent: Option<usize>,
    parents: &mut [Option<usize>],
    quals: &mut [String],
    members: &mut [HashMap<String, DeclId>],
) {
    parents[id.0] = parent;
    if let Some(parent_index) = parent {
        quals[id.0] = format!("{}_{}", quals[parent_index], unit.decl(id).name());
    }
    if let Decl::Record(record) = unit.decl(id) {
        let nested: Vec<DeclId> = record.nested.clone();
        for nested_id in &nested {
            members[id.0].insert(unit.decl(*nested_id).name().to_string(), *nested_id);
        }
        for nested_id in nested {
            collect(unit, nested_id, Some(id.0), parents, quals, members);
        }
    }
}

fn lookup(
    name: &str,
    scope: Option<usize>,
    parents: &[Option<usize>],
    members: &[HashMap<String, DeclId>],
    top: &HashMap<String, DeclId>,
) -> Option<DeclId> {
    let mut current = scope;
    while let Some(index) = current {
        if let Some(id) = members[index].get(name) {
            return Some(*id);
        }
        current = parents[index];
    }
    top.get(name).copied()
}

fn resolve_type(
    ty: &mut TypeNode,
    scope: Option<usize>,
    parents: &[Option<usize>],
    members: &[HashMap<String, DeclId>],
    top: &HashMap<String, DeclId>,
) -> Result<(), CompileError> {
    match ty {
        TypeNode::Primitive(_) => Ok(()),
        TypeNode::Optional(child)
        | TypeNode::Sequence(child)
        | TypeNode::FixedArray(child, _)
        | TypeNode::Mapping(child) => resolve_type(child, scope, parents, members, top),
        TypeNode::Variant(alternatives) => {
            for alternative in alternatives {
                resolve_type(alternative, scope, parents, members, top)?;
            }
            Ok(())
        }
        TypeNode::Named { name, line, column, target } => {
            match lookup(name, scope, parents, members, top) {
                Some(id) => {
                    *target = Some(id);
                    Ok(())
                }
                None => Err(CompileError::UnresolvedReference {
                    name:   quote(name),
                    line:   *line,
                    column: *column,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_unit;
    use crate::tokenizer::tokenize;

    fn resolved(text: &str) -> TranslationUnit {
        let tokens = tokenize(text).expect("tokenize failed");
        let mut unit = parse_unit(text, &tokens).expect("parse failed");
        resolve(&mut unit).expect("resolve failed");
        unit
    }

    #[test]
    fn test_forward_reference_between_siblings() {
        let unit = resolved(
            r#"
            struct Uses { Used used; }
            struct Used { int x; }
            "#,
        );
        let uses = unit.record(DeclId(0)).unwrap();
        match &uses.fields[0].ty {
            TypeNode::Named { target, .. } => {
                let target = target.expect("reference was not bound");
                assert_eq!(unit.decl(target).name(), "Used");
            }
            other => panic!("expected a named type, got {:?}", other),
        }
    }

    #[test]
    fn test_innermost_scope_wins() {
        let unit = resolved(
            r#"
            struct Thing { int outer_marker; }
            struct Holder {
                struct Thing { int inner_marker; }
                Thing thing;
            }
            "#,
        );
        let holder = unit
            .decls
            .iter()
            .find_map(|d| match d {
                Decl::Record(r) if r.name == "Holder" => Some(r),
                _ => None,
            })
            .unwrap();
        match &holder.fields[0].ty {
            TypeNode::Named { target, .. } => {
                let inner = unit.record(target.unwrap()).unwrap();
                assert_eq!(inner.fields[0].name, "inner_marker");
                assert_eq!(inner.qual, "Holder_Thing");
            }
            other => panic!("expected a named type, got {:?}", other),
        }
    }

    #[test]
    fn test_forward_reference_between_nested_siblings() {
        let unit = resolved(
            r#"
            struct Holder {
                struct A { B b; }
                struct B { int x; }
            }
            "#,
        );
        let a = unit
            .decls
            .iter()
            .find_map(|d| match d {
                Decl::Record(r) if r.name == "A" => Some(r),
                _ => None,
            })
            .unwrap();
        match &a.fields[0].ty {
            TypeNode::Named { target, .. } => {
                assert_eq!(unit.decl(target.unwrap()).name(), "B");
            }
            other => panic!("expected a named type, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_reference_fails() {
        let text = "struct S { Ghost g; }";
        let tokens = tokenize(text).unwrap();
        let mut unit = parse_unit(text, &tokens).unwrap();
        let err = resolve(&mut unit).unwrap_err();
        match err {
            CompileError::UnresolvedReference { name, .. } => {
                assert_eq!(name, "\"Ghost\"");
            }
            other => panic!("expected UnresolvedReference, got {:?}", other),
        }
    }
}
