use crate::attrs::validate;
use crate::error::CompileError;
use crate::gen_bake::{accessor, cpp_type};
use crate::utils::quote;
use cfgbake_schema::{Decl, Function, Primitive, TranslationUnit, TypeNode};

/// Descriptor of one wrapper argument, as exposed in the registration table.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgDesc {
    pub name:    String,
    pub label:   String,
    pub default: Option<String>,
}

/// One exported function's wrapper: descriptors, display signature and the
/// rendered stack-marshalling callback. `function` indexes into
/// [`TranslationUnit::functions`], which is what the runtime invoker takes.
#[derive(Debug, Clone, PartialEq)]
pub struct LuaBinding {
    pub function:  usize,
    pub name:      String,
    pub help:      String,
    pub signature: String,
    pub args:      Vec<ArgDesc>,
    pub ret:       Option<String>,
    pub text:      String,
}

/// Builds a binding for every function marked for export, in declaration
/// order. Unexported functions do not participate.
pub fn generate(unit: &TranslationUnit) -> Result<Vec<LuaBinding>, CompileError> {
    let mut bindings = Vec::new();
    for (index, func) in unit.functions.iter().enumerate() {
        if !func.exported {
            continue;
        }
        bindings.push(bind_function(unit, index, func)?);
    }
    Ok(bindings)
}

fn bind_function(
    unit: &TranslationUnit,
    index: usize,
    func: &Function,
) -> Result<LuaBinding, CompileError> {
    let mut args = Vec::with_capacity(func.args.len());
    for arg in &func.args {
        validate(unit, arg)?;
        args.push(ArgDesc {
            name:    arg.name.clone(),
            label:   arg.ty.short_label(unit),
            default: arg.default.clone(),
        });
    }
    let ret = func.ret.as_ref().map(|ty| ty.short_label(unit));
    let signature = render_signature(func, &args, &ret);
    let text = render_wrapper(unit, func)?;

    Ok(LuaBinding {
        function: index,
        name: func.name.clone(),
        help: func.doc.clone().unwrap_or_default(),
        signature,
        args,
        ret,
        text,
    })
}

fn render_signature(func: &Function, args: &[ArgDesc], ret: &Option<String>) -> String {
    let parts: Vec<String> = args
        .iter()
        .map(|arg| match &arg.default {
            Some(default) => format!("{}: {} = {}", arg.name, arg.label, default),
            None => format!("{}: {}", arg.name, arg.label),
        })
        .collect();
    match ret {
        Some(label) => format!("{}({}) -> {}", func.name, parts.join(", "), label),
        None => format!("{}({})", func.name, parts.join(", ")),
    }
}

fn render_wrapper(unit: &TranslationUnit, func: &Function) -> Result<String, CompileError> {
    let mut lines = Vec::new();
    lines.push(format!("static int LuaWrap_{}(lua_State *L)", func.name));
    lines.push("{".to_string());
    lines.push("    int top = lua_gettop(L);".to_string());

    for (index, arg) in func.args.iter().enumerate() {
        let position = index + 1;
        match (&arg.ty, &arg.default) {
            // The default literal is spliced in verbatim and only evaluated
            // when the stack position is absent.
            (ty, Some(default)) => {
                lines.push(format!(
                    "    {} {} = (top >= {}) ? {} : ({});",
                    cpp_type(unit, ty),
                    arg.name,
                    position,
                    read_expr(unit, ty, position)?,
                    default
                ));
            }
            (TypeNode::Optional(child), None) => {
                lines.push(format!(
                    "    {} {} = (top >= {}) ? std::optional<{}>({}) : std::nullopt;",
                    cpp_type(unit, &arg.ty),
                    arg.name,
                    position,
                    cpp_type(unit, child),
                    read_expr(unit, child, position)?
                ));
            }
            (ty, None) => {
                lines.push(format!(
                    "    {} {} = {};",
                    cpp_type(unit, ty),
                    arg.name,
                    read_expr(unit, ty, position)?
                ));
            }
        }
    }

    let call_args: Vec<&str> = func.args.iter().map(|arg| arg.name.as_str()).collect();
    match &func.ret {
        Some(ret) => {
            lines.push(format!(
                "    {} result = {}({});",
                cpp_type(unit, ret),
                func.name,
                call_args.join(", ")
            ));
            lines.push(format!("    {}", push_expr(unit, ret)?));
            lines.push("    return 1;".to_string());
        }
        None => {
            lines.push(format!("    {}({});", func.name, call_args.join(", ")));
            lines.push("    return 0;".to_string());
        }
    }

    lines.push("}".to_string());
    lines.push(String::new());
    Ok(lines.join("\n"))
}

fn read_expr(
    unit: &TranslationUnit,
    ty: &TypeNode,
    position: usize,
) -> Result<String, CompileError> {
    match ty {
        TypeNode::Primitive(primitive) => {
            Ok(format!("{}(L, {})", read_accessor(primitive), position))
        }
        TypeNode::Optional(child) => read_expr(unit, child, position),
        TypeNode::Sequence(child) => Ok(format!(
            "ReadSequence<{}>(L, {})",
            cpp_type(unit, child),
            position
        )),
        TypeNode::FixedArray(child, size) => Ok(format!(
            "ReadFixedArray<{}, {}>(L, {})",
            cpp_type(unit, child),
            size,
            position
        )),
        TypeNode::Mapping(child) => Ok(format!(
            "ReadMapping<{}>(L, {})",
            cpp_type(unit, child),
            position
        )),
        TypeNode::Variant(_) => Err(CompileError::GenError(
            "Variant arguments are not supported for exported functions".to_string(),
        )),
        TypeNode::Named { name, target, .. } => match target.map(|id| unit.decl(id)) {
            Some(Decl::Record(record)) => {
                Ok(format!("ReadRecord<{}>(L, {})", record.qual, position))
            }
            Some(Decl::Enum(enum_decl)) => Ok(format!(
                "{}FromString(ReadString(L, {}))",
                enum_decl.qual, position
            )),
            None => Err(CompileError::Internal(format!(
                "unresolved type reference {} reached the wrapper generator",
                quote(name)
            ))),
        },
    }
}

fn push_expr(unit: &TranslationUnit, ty: &TypeNode) -> Result<String, CompileError> {
    match ty {
        TypeNode::Primitive(primitive) => {
            // PushInt/PushBool/... are the inverse of the Read accessors.
            let reader = read_accessor(primitive);
            Ok(format!("Push{}(L, result);", &reader[4..]))
        }
        TypeNode::Optional(_) => Ok("PushOptional(L, result);".to_string()),
        TypeNode::Sequence(_) => Ok("PushSequence(L, result);".to_string()),
        TypeNode::FixedArray(_, _) => Ok("PushFixedArray(L, result);".to_string()),
        TypeNode::Mapping(_) => Ok("PushMapping(L, result);".to_string()),
        TypeNode::Variant(_) => Err(CompileError::GenError(
            "Variant return values are not supported for exported functions".to_string(),
        )),
        TypeNode::Named { name, target, .. } => match target.map(|id| unit.decl(id)) {
            Some(Decl::Record(_)) => Ok("PushRecord(L, result);".to_string()),
            Some(Decl::Enum(enum_decl)) => Ok(format!(
                "PushString(L, {}ToString(result));",
                enum_decl.qual
            )),
            None => Err(CompileError::Internal(format!(
                "unresolved type reference {} reached the wrapper generator",
                quote(name)
            ))),
        },
    }
}

fn read_accessor(primitive: &Primitive) -> String {
    // GetInt -> ReadInt and so on; the dictionary and stack accessors share
    // one naming scheme.
    format!("Read{}", &accessor(primitive)[3..])
}

/// Renders the registration table exposing every wrapper to the runtime.
pub fn registration_table(bindings: &[LuaBinding]) -> String {
    let mut lines = Vec::new();
    lines.push("static const LuaRegistration g_luaRegistrations[] = {".to_string());
    for binding in bindings {
        lines.push(format!(
            "    {{ {}, LuaWrap_{}, {}, {} }},",
            quote(&binding.name),
            binding.name,
            quote(&binding.signature),
            quote(&binding.help)
        ));
    }
    lines.push("};".to_string());
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_unit;
    use crate::resolver::resolve;
    use crate::tokenizer::tokenize;

    fn bindings(text: &str) -> Vec<LuaBinding> {
        let tokens = tokenize(text).expect("tokenize failed");
        let mut unit = parse_unit(text, &tokens).expect("parse failed");
        resolve(&mut unit).expect("resolve failed");
        generate(&unit).expect("generate failed")
    }

    #[test]
    fn test_unexported_functions_are_skipped() {
        let all = bindings(
            r#"
            fn Internal(int x);
            [export]
            fn Shown(int x);
            "#,
        );
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Shown");
        assert_eq!(all[0].function, 1);
    }

    #[test]
    fn test_signature_shows_defaults_and_return() {
        let all = bindings(
            r#"
            /// Spawns actors.
            [export]
            fn SpawnActors(int count = 4, string name) -> bool;
            "#,
        );
        assert_eq!(
            all[0].signature,
            "SpawnActors(count: int = 4, name: String) -> bool"
        );
        assert_eq!(all[0].help, "Spawns actors.");
    }

    #[test]
    fn test_default_literal_is_spliced_verbatim() {
        let all = bindings(
            r#"
            [export]
            fn Place(mat2 basis = mat2(1, 0, 0, 1));
            "#,
        );
        let text = &all[0].text;
        assert!(text.contains("int top = lua_gettop(L);"), "{}", text);
        assert!(
            text.contains(
                "Matrix2x2f basis = (top >= 1) ? ReadMatrix2x2f(L, 1) : (mat2(1, 0, 0, 1));"
            ),
            "{}",
            text
        );
        assert!(text.contains("return 0;"), "{}", text);
    }

    #[test]
    fn test_return_value_is_pushed() {
        let all = bindings("[export]\nfn Tally(Sequence<int> values) -> int;");
        let text = &all[0].text;
        assert!(text.contains("std::vector<int> values = ReadSequence<int>(L, 1);"), "{}", text);
        assert!(text.contains("int result = Tally(values);"), "{}", text);
        assert!(text.contains("PushInt(L, result);"), "{}", text);
        assert!(text.contains("return 1;"), "{}", text);
    }

    #[test]
    fn test_variant_argument_is_rejected() {
        let text = "[export]\nfn Odd(Variant<int, string> mixed);";
        let tokens = tokenize(text).unwrap();
        let mut unit = parse_unit(text, &tokens).unwrap();
        resolve(&mut unit).unwrap();
        let err = generate(&unit).unwrap_err();
        assert!(matches!(err, CompileError::GenError(_)), "{:?}", err);
    }

    #[test]
    fn test_registration_table_quotes_signature() {
        let all = bindings("[export]\nfn Ping();");
        let table = registration_table(&all);
        assert!(table.contains("{ \"Ping\", LuaWrap_Ping, \"Ping()\", \"\" },"), "{}", table);
    }
}
