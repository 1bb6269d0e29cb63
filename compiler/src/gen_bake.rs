use crate::attrs::validate;
use crate::error::CompileError;
use crate::utils::quote;
use cfgbake_schema::{
    Decl, DeclId, Item, Primitive, Record, Scalar, TranslationUnit, TypeNode,
};

/// The rendered extraction routine of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct BakeRoutine {
    pub record: DeclId,
    pub name:   String,
    pub text:   String,
}

/// Emits one bake routine per record, nested records first so every routine
/// a parent calls into is declared before use.
pub fn generate(unit: &TranslationUnit) -> Result<Vec<BakeRoutine>, CompileError> {
    let mut routines = Vec::new();
    for item in &unit.items {
        if let Item::Record(id) = item {
            emit_record(unit, *id, &mut routines)?;
        }
    }
    Ok(routines)
}

fn emit_record(
    unit: &TranslationUnit,
    id: DeclId,
    routines: &mut Vec<BakeRoutine>,
) -> Result<(), CompileError> {
    let record = match unit.record(id) {
        Some(record) => record,
        None => return Ok(()),
    };
    for nested in &record.nested {
        emit_record(unit, *nested, routines)?;
    }

    let text = render_routine(unit, record)?;
    routines.push(BakeRoutine { record: id, name: record.qual.clone(), text });
    Ok(())
}

fn render_routine(unit: &TranslationUnit, record: &Record) -> Result<String, CompileError> {
    let mut lines = Vec::new();
    lines.push(format!(
        "void Bake_{}(const ConfigDict &dict, {} &out)",
        record.qual, record.qual
    ));
    lines.push("{".to_string());

    for field in &record.fields {
        validate(unit, field)?;
        let key = quote(field.key());
        let dst = format!("out.{}", field.name);
        match &field.ty {
            TypeNode::Optional(child) => {
                // Absent key: the field stays in its default (absent) state.
                lines.push(format!("    if (dict.Has({})) {{", key));
                emit_value(unit, child, "dict", &key, &dst, 0, 2, &mut lines)?;
                lines.push("    }".to_string());
            }
            ty => {
                emit_value(unit, ty, "dict", &key, &dst, 0, 1, &mut lines)?;
            }
        }
    }

    lines.push("}".to_string());
    lines.push(String::new());
    Ok(lines.join("\n"))
}

/// Emits the statements that read one value of type `ty` out of the
/// dictionary expression `dict` at `key` and store it into `dst`.
/// `depth` suffixes the temporaries so nested containers do not collide.
fn emit_value(
    unit: &TranslationUnit,
    ty: &TypeNode,
    dict: &str,
    key: &str,
    dst: &str,
    depth: usize,
    indent: usize,
    lines: &mut Vec<String>,
) -> Result<(), CompileError> {
    let pad = "    ".repeat(indent);
    match ty {
        TypeNode::Primitive(primitive) => {
            lines.push(format!("{}{} = {}.{}({});", pad, dst, dict, accessor(primitive), key));
            Ok(())
        }
        // Below field level there is no way to express absence; a present
        // optional reads exactly like its child.
        TypeNode::Optional(child) => {
            emit_value(unit, child, dict, key, dst, depth, indent, lines)
        }
        TypeNode::Sequence(child) => {
            lines.push(format!("{}{{", pad));
            lines.push(format!(
                "{}    const ConfigDict &items{} = {}.GetDict({});",
                pad, depth, dict, key
            ));
            lines.push(format!(
                "{}    for (int i{} = 1; i{} <= items{}.Size(); i{}++) {{",
                pad, depth, depth, depth, depth
            ));
            lines.push(format!("{}        {} item{};", pad, cpp_type(unit, child), depth));
            emit_value(
                unit,
                child,
                &format!("items{}", depth),
                &format!("IndexKey(i{})", depth),
                &format!("item{}", depth),
                depth + 1,
                indent + 2,
                lines,
            )?;
            lines.push(format!("{}        {}.push_back(item{});", pad, dst, depth));
            lines.push(format!("{}    }}", pad));
            lines.push(format!("{}}}", pad));
            Ok(())
        }
        TypeNode::FixedArray(child, size) => {
            lines.push(format!("{}{{", pad));
            lines.push(format!(
                "{}    const ConfigDict &items{} = {}.GetDict({});",
                pad, depth, dict, key
            ));
            lines.push(format!("{}    items{}.RequireSize({});", pad, depth, size));
            lines.push(format!(
                "{}    for (int i{} = 1; i{} <= {}; i{}++) {{",
                pad, depth, depth, size, depth
            ));
            lines.push(format!("{}        {} item{};", pad, cpp_type(unit, child), depth));
            emit_value(
                unit,
                child,
                &format!("items{}", depth),
                &format!("IndexKey(i{})", depth),
                &format!("item{}", depth),
                depth + 1,
                indent + 2,
                lines,
            )?;
            lines.push(format!("{}        {}[i{} - 1] = item{};", pad, dst, depth, depth));
            lines.push(format!("{}    }}", pad));
            lines.push(format!("{}}}", pad));
            Ok(())
        }
        TypeNode::Mapping(child) => {
            lines.push(format!("{}{{", pad));
            lines.push(format!(
                "{}    const ConfigDict &items{} = {}.GetDict({});",
                pad, depth, dict, key
            ));
            lines.push(format!(
                "{}    for (int i{} = 1; i{} <= items{}.Size(); i{}++) {{",
                pad, depth, depth, depth, depth
            ));
            lines.push(format!(
                "{}        const String &mapKey{} = items{}.KeyAt(i{});",
                pad, depth, depth, depth
            ));
            lines.push(format!("{}        {} item{};", pad, cpp_type(unit, child), depth));
            emit_value(
                unit,
                child,
                &format!("items{}", depth),
                &format!("mapKey{}", depth),
                &format!("item{}", depth),
                depth + 1,
                indent + 2,
                lines,
            )?;
            lines.push(format!("{}        {}[mapKey{}] = item{};", pad, dst, depth, depth));
            lines.push(format!("{}    }}", pad));
            lines.push(format!("{}}}", pad));
            Ok(())
        }
        TypeNode::Variant(alternatives) => {
            // The stored value carries no discriminator: probe its runtime
            // kind against each alternative in declared order, first match
            // wins.
            lines.push(format!("{}{{", pad));
            lines.push(format!(
                "{}    const ConfigValue &stored{} = {}.GetValue({});",
                pad, depth, dict, key
            ));
            for (index, alternative) in alternatives.iter().enumerate() {
                let keyword = if index == 0 { "if" } else { "} else if" };
                lines.push(format!(
                    "{}    {} ({}) {{",
                    pad,
                    keyword,
                    probe_condition(unit, alternative, &format!("stored{}", depth))
                ));
                lines.push(format!(
                    "{}        {} alt{};",
                    pad,
                    cpp_type(unit, alternative),
                    depth
                ));
                emit_value(
                    unit,
                    alternative,
                    dict,
                    key,
                    &format!("alt{}", depth),
                    depth + 1,
                    indent + 2,
                    lines,
                )?;
                lines.push(format!("{}        {} = alt{};", pad, dst, depth));
            }
            lines.push(format!("{}    }} else {{", pad));
            lines.push(format!(
                "{}        BakeFail({}, \"no variant alternative matches\");",
                pad, key
            ));
            lines.push(format!("{}    }}", pad));
            lines.push(format!("{}}}", pad));
            Ok(())
        }
        TypeNode::Named { name, target, .. } => {
            match target.map(|id| unit.decl(id)) {
                Some(Decl::Record(record)) => {
                    lines.push(format!(
                        "{}Bake_{}({}.GetDict({}), {});",
                        pad, record.qual, dict, key, dst
                    ));
                    Ok(())
                }
                Some(Decl::Enum(enum_decl)) => {
                    lines.push(format!(
                        "{}{} = {}FromString({}.GetString({}));",
                        pad, dst, enum_decl.qual, dict, key
                    ));
                    Ok(())
                }
                None => Err(CompileError::Internal(format!(
                    "unresolved type reference {} reached the bake generator",
                    quote(name)
                ))),
            }
        }
    }
}

fn probe_condition(unit: &TranslationUnit, ty: &TypeNode, stored: &str) -> String {
    match ty {
        TypeNode::Primitive(primitive) => match primitive {
            Primitive::Bool => format!("{}.IsBool()", stored),
            Primitive::Int | Primitive::Float | Primitive::Double => {
                format!("{}.IsNumber()", stored)
            }
            Primitive::Str | Primitive::Path => format!("{}.IsString()", stored),
            Primitive::Dict => format!("{}.IsDict()", stored),
            Primitive::Vector { arity, .. } => {
                format!("{}.IsComponents({})", stored, arity)
            }
            Primitive::Matrix { rows, cols, .. } => {
                format!("{}.IsComponents({})", stored, (*rows as usize) * (*cols as usize))
            }
        },
        TypeNode::Optional(child) => probe_condition(unit, child, stored),
        TypeNode::Sequence(_) | TypeNode::FixedArray(_, _) | TypeNode::Mapping(_) => {
            format!("{}.IsDict()", stored)
        }
        TypeNode::Variant(alternatives) => {
            let parts: Vec<String> = alternatives
                .iter()
                .map(|alternative| probe_condition(unit, alternative, stored))
                .collect();
            format!("({})", parts.join(" || "))
        }
        TypeNode::Named { target, .. } => match target.map(|id| unit.decl(id)) {
            Some(Decl::Enum(_)) => format!("{}.IsString()", stored),
            _ => format!("{}.IsDict()", stored),
        },
    }
}

fn scalar_letter(scalar: &Scalar) -> &'static str {
    match scalar {
        Scalar::Int => "i",
        Scalar::Float => "f",
        Scalar::Double => "d",
    }
}

/// Dictionary accessor for a primitive read. Integer accessors truncate a
/// stored floating-point representation; the float accessor narrows from the
/// stored double.
pub fn accessor(primitive: &Primitive) -> String {
    match primitive {
        Primitive::Bool => "GetBool".to_string(),
        Primitive::Int => "GetInt".to_string(),
        Primitive::Float => "GetFloat".to_string(),
        Primitive::Double => "GetDouble".to_string(),
        Primitive::Str => "GetString".to_string(),
        Primitive::Path => "GetPath".to_string(),
        Primitive::Dict => "GetDict".to_string(),
        Primitive::Vector { arity, scalar } => {
            format!("GetVector{}{}", arity, scalar_letter(scalar))
        }
        Primitive::Matrix { rows, cols, scalar } => {
            format!("GetMatrix{}x{}{}", rows, cols, scalar_letter(scalar))
        }
    }
}

/// Native type name for a declared field or temporary in generated code.
pub fn cpp_type(unit: &TranslationUnit, ty: &TypeNode) -> String {
    match ty {
        TypeNode::Primitive(primitive) => match primitive {
            Primitive::Bool => "bool".to_string(),
            Primitive::Int => "int".to_string(),
            Primitive::Float => "float".to_string(),
            Primitive::Double => "double".to_string(),
            Primitive::Str => "String".to_string(),
            Primitive::Path => "Path".to_string(),
            Primitive::Dict => "ConfigDict".to_string(),
            Primitive::Vector { arity, scalar } => {
                format!("Vector{}{}", arity, scalar_letter(scalar))
            }
            Primitive::Matrix { rows, cols, scalar } => {
                format!("Matrix{}x{}{}", rows, cols, scalar_letter(scalar))
            }
        },
        TypeNode::Optional(child) => format!("std::optional<{}>", cpp_type(unit, child)),
        TypeNode::Sequence(child) => format!("std::vector<{}>", cpp_type(unit, child)),
        TypeNode::FixedArray(child, size) => {
            format!("std::array<{}, {}>", cpp_type(unit, child), size)
        }
        TypeNode::Mapping(child) => format!("std::map<String, {}>", cpp_type(unit, child)),
        TypeNode::Variant(alternatives) => {
            let parts: Vec<String> = alternatives
                .iter()
                .map(|alternative| cpp_type(unit, alternative))
                .collect();
            format!("std::variant<{}>", parts.join(", "))
        }
        TypeNode::Named { name, target, .. } => match target.map(|id| unit.decl(id)) {
            Some(Decl::Record(record)) => record.qual.clone(),
            Some(Decl::Enum(enum_decl)) => enum_decl.qual.clone(),
            None => name.clone(),
        },
    }
}
