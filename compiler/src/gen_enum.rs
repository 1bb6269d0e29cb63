use crate::error::CompileError;
use crate::utils::quote;
use cfgbake_schema::{Decl, DeclId, Enum, TranslationUnit};
use std::collections::HashSet;

/// The rendered name conversions of one enum marked for stringification.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumStringify {
    pub decl: DeclId,
    pub name: String,
    pub text: String,
}

/// Emits ToString/FromString conversions for every enum carrying the
/// stringify marker, nested enums included, in declaration order.
pub fn generate(unit: &TranslationUnit) -> Result<Vec<EnumStringify>, CompileError> {
    let mut conversions = Vec::new();
    for (index, decl) in unit.decls.iter().enumerate() {
        if let Decl::Enum(enum_decl) = decl {
            if !enum_decl.stringify {
                continue;
            }
            check_names(enum_decl)?;
            conversions.push(EnumStringify {
                decl: DeclId(index),
                name: enum_decl.qual.clone(),
                text: render_conversions(enum_decl),
            });
        }
    }
    Ok(conversions)
}

/// Two elements mapping to the same external name would make FromString
/// ambiguous.
fn check_names(enum_decl: &Enum) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    for element in &enum_decl.elements {
        if !seen.insert(element.external_name()) {
            return Err(CompileError::DuplicateEnumName {
                enum_name: enum_decl.name.clone(),
                name:      element.external_name().to_string(),
            });
        }
    }
    Ok(())
}

fn render_conversions(enum_decl: &Enum) -> String {
    let qual = &enum_decl.qual;
    let mut lines = Vec::new();

    lines.push(format!("const char *{}ToString({} value)", qual, qual));
    lines.push("{".to_string());
    lines.push("    switch (value) {".to_string());
    for element in &enum_decl.elements {
        lines.push(format!(
            "    case {}::{}: return {};",
            qual,
            element.name,
            quote(element.external_name())
        ));
    }
    lines.push("    }".to_string());
    lines.push("    return \"\";".to_string());
    lines.push("}".to_string());
    lines.push(String::new());

    lines.push(format!("{} {}FromString(const String &text)", qual, qual));
    lines.push("{".to_string());
    for element in &enum_decl.elements {
        lines.push(format!(
            "    if (text == {}) return {}::{};",
            quote(element.external_name()),
            qual,
            element.name
        ));
    }
    lines.push(format!(
        "    EnumNameFail({}, text);",
        quote(qual)
    ));
    lines.push(format!("    return {}();", qual));
    lines.push("}".to_string());
    lines.push(String::new());

    lines.join("\n")
}
