use crate::error::CompileError;
use crate::tokenizer::Token;
use crate::utils::{error, quote};
use cfgbake_schema::{
    Attributes, Decl, Enum, EnumElement, Field, Function, Item, Primitive, Record, Scalar,
    TranslationUnit, TypeNode,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref INTEGER:    Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref NUMBER:     Regex = Regex::new(r"^-?\d+(\.\d+)?$").unwrap();
    static ref STRING_LIT: Regex = Regex::new(r#"^".*"$"#).unwrap();
    static ref DOC:        Regex = Regex::new(r"^///").unwrap();
}

/// One entry of a bracketed marker/attribute group: a name and its raw
/// argument tokens exactly as written.
struct Marker {
    name:   String,
    args:   Vec<String>,
    line:   usize,
    column: usize,
}

/// Parses a token stream into a [TranslationUnit].
///
/// The source text is needed alongside the tokens so that default literals
/// on function arguments can be captured verbatim from their byte spans.
/// Parsing performs no attribute/type legality checks; those are deferred to
/// generation time.
pub fn parse_unit(text: &str, tokens: &[Token]) -> Result<TranslationUnit, CompileError> {
    let mut parser = Parser { text, tokens, index: 0 };
    parser.translation_unit()
}

struct Parser<'a> {
    text:   &'a str,
    tokens: &'a [Token],
    index:  usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> &'a Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        self.current().text.is_empty()
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.current().text == text {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, text: &str, expected: &str) -> Result<(), CompileError> {
        if !self.eat(text) {
            Err(self.unexpected(expected))
        } else {
            Ok(())
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let tok = self.current();
        let found = if tok.text.is_empty() { "end of input".to_string() } else { quote(&tok.text) };
        error(
            &format!("Expected {} but found {}", expected, found),
            tok.line,
            tok.column,
        )
    }

    fn identifier(&mut self, expected: &str) -> Result<&'a Token, CompileError> {
        let tok = self.current();
        if IDENTIFIER.is_match(&tok.text) {
            self.index += 1;
            Ok(tok)
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Collects consecutive `///` tokens into one documentation string.
    fn doc_block(&mut self) -> Option<String> {
        let mut lines = Vec::new();
        while DOC.is_match(&self.current().text) {
            let stripped = self.current().text[3..].trim_start().to_string();
            lines.push(stripped);
            self.index += 1;
        }
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    /// Parses an optional bracketed group `[name, name(args), ...]`.
    /// The same grammar serves declaration markers and field attributes;
    /// the caller decides which interpretation applies.
    fn bracket_group(&mut self) -> Result<Vec<Marker>, CompileError> {
        if !self.eat("[") {
            return Ok(Vec::new());
        }
        let mut markers = Vec::new();
        loop {
            let name_tok = self.identifier("attribute name")?;
            let mut args = Vec::new();
            if self.eat("(") {
                if !self.eat(")") {
                    loop {
                        let tok = self.current();
                        if NUMBER.is_match(&tok.text) || STRING_LIT.is_match(&tok.text) {
                            args.push(tok.text.clone());
                            self.index += 1;
                        } else {
                            return Err(self.unexpected("literal argument"));
                        }
                        if self.eat(")") {
                            break;
                        }
                        self.expect(",", "\",\"")?;
                    }
                }
            }
            markers.push(Marker {
                name:   name_tok.text.clone(),
                args,
                line:   name_tok.line,
                column: name_tok.column,
            });
            if self.eat("]") {
                break;
            }
            self.expect(",", "\",\"")?;
        }
        Ok(markers)
    }

    fn translation_unit(&mut self) -> Result<TranslationUnit, CompileError> {
        let mut unit = TranslationUnit {
            decls:     Vec::new(),
            items:     Vec::new(),
            functions: Vec::new(),
        };

        while !self.at_eof() {
            let doc = self.doc_block();
            let markers = self.bracket_group()?;
            if self.current().text == "struct" {
                let id = self.record_decl(&mut unit, &markers, true)?;
                unit.items.push(Item::Record(id));
            } else if self.current().text == "enum" {
                let id = self.enum_decl(&mut unit, &markers)?;
                unit.items.push(Item::Enum(id));
            } else if self.current().text == "fn" {
                let func = self.function_decl(doc, &markers)?;
                unit.functions.push(func);
                unit.items.push(Item::Function(unit.functions.len() - 1));
            } else {
                return Err(self.unexpected("\"struct\", \"enum\" or \"fn\""));
            }
        }
        Ok(unit)
    }

    fn record_decl(
        &mut self,
        unit: &mut TranslationUnit,
        markers: &[Marker],
        top_level: bool,
    ) -> Result<cfgbake_schema::DeclId, CompileError> {
        let mut bake_name = None;
        for marker in markers {
            match marker.name.as_str() {
                "bake" => {
                    if !top_level {
                        return Err(error(
                            "A bake target may only be set on top-level records",
                            marker.line,
                            marker.column,
                        ));
                    }
                    bake_name = Some(self.string_arg(marker, 0)?);
                }
                other => {
                    return Err(error(
                        &format!("Unknown record marker {}", quote(other)),
                        marker.line,
                        marker.column,
                    ))
                }
            }
        }

        self.expect("struct", "\"struct\"")?;
        let name_tok = self.identifier("identifier")?;
        self.expect("{", "\"{\"")?;

        let mut fields = Vec::new();
        let mut nested = Vec::new();
        while !self.eat("}") {
            let doc = self.doc_block();
            let member_markers = self.bracket_group()?;
            if self.current().text == "struct" {
                let id = self.record_decl(unit, &member_markers, false)?;
                nested.push(id);
            } else if self.current().text == "enum" {
                let id = self.enum_decl(unit, &member_markers)?;
                nested.push(id);
            } else {
                let field = self.field_decl(doc, &member_markers, false)?;
                self.expect(";", "\";\"")?;
                fields.push(field);
            }
        }
        self.eat(";");

        unit.decls.push(Decl::Record(Record {
            name:      name_tok.text.clone(),
            qual:      name_tok.text.clone(),
            line:      name_tok.line,
            column:    name_tok.column,
            bake_name,
            fields,
            nested,
        }));
        Ok(cfgbake_schema::DeclId(unit.decls.len() - 1))
    }

    fn enum_decl(
        &mut self,
        unit: &mut TranslationUnit,
        markers: &[Marker],
    ) -> Result<cfgbake_schema::DeclId, CompileError> {
        let mut stringify = false;
        for marker in markers {
            match marker.name.as_str() {
                "stringify" => {
                    self.flag_arg(marker)?;
                    stringify = true;
                }
                other => {
                    return Err(error(
                        &format!("Unknown enum marker {}", quote(other)),
                        marker.line,
                        marker.column,
                    ))
                }
            }
        }

        self.expect("enum", "\"enum\"")?;
        let name_tok = self.identifier("identifier")?;
        self.expect("{", "\"{\"")?;

        let mut elements = Vec::new();
        while !self.eat("}") {
            self.doc_block();
            let element_tok = self.identifier("enum element")?;
            let external = if self.eat("=") {
                let tok = self.current();
                if !STRING_LIT.is_match(&tok.text) {
                    return Err(self.unexpected("string literal"));
                }
                self.index += 1;
                Some(unquote(&tok.text, tok.line, tok.column)?)
            } else {
                None
            };
            elements.push(EnumElement { name: element_tok.text.clone(), external });
            if !self.eat(",") && self.current().text != "}" {
                return Err(self.unexpected("\",\" or \"}\""));
            }
        }
        self.eat(";");

        unit.decls.push(Decl::Enum(Enum {
            name:      name_tok.text.clone(),
            qual:      name_tok.text.clone(),
            line:      name_tok.line,
            column:    name_tok.column,
            stringify,
            elements,
        }));
        Ok(cfgbake_schema::DeclId(unit.decls.len() - 1))
    }

    fn function_decl(
        &mut self,
        doc: Option<String>,
        markers: &[Marker],
    ) -> Result<Function, CompileError> {
        let mut exported = false;
        for marker in markers {
            match marker.name.as_str() {
                "export" => {
                    self.flag_arg(marker)?;
                    exported = true;
                }
                other => {
                    return Err(error(
                        &format!("Unknown function marker {}", quote(other)),
                        marker.line,
                        marker.column,
                    ))
                }
            }
        }

        self.expect("fn", "\"fn\"")?;
        let name_tok = self.identifier("identifier")?;
        self.expect("(", "\"(\"")?;

        let mut args = Vec::new();
        if !self.eat(")") {
            loop {
                let arg_markers = self.bracket_group()?;
                let arg = self.field_decl(None, &arg_markers, true)?;
                args.push(arg);
                if self.eat(")") {
                    break;
                }
                self.expect(",", "\",\"")?;
            }
        }

        let ret = if self.eat("->") { Some(self.type_expr()?) } else { None };
        self.expect(";", "\";\"")?;

        Ok(Function {
            name: name_tok.text.clone(),
            doc,
            exported,
            args,
            ret,
            line: name_tok.line,
            column: name_tok.column,
        })
    }

    fn field_decl(
        &mut self,
        doc: Option<String>,
        markers: &[Marker],
        is_argument: bool,
    ) -> Result<Field, CompileError> {
        let ty = self.type_expr()?;
        let name_tok = self.identifier("identifier")?;

        let default = if self.eat("=") {
            if !is_argument {
                return Err(error(
                    "Default values are only allowed on function arguments",
                    name_tok.line,
                    name_tok.column,
                ));
            }
            Some(self.default_literal()?)
        } else {
            None
        };

        let (attrs, external) = self.apply_attributes(markers)?;
        Ok(Field {
            name: name_tok.text.clone(),
            external,
            ty,
            attrs,
            doc,
            default,
            line: name_tok.line,
            column: name_tok.column,
        })
    }

    /// Captures the default literal as opaque source text. The literal runs
    /// until a comma or closing parenthesis at nesting depth zero.
    fn default_literal(&mut self) -> Result<String, CompileError> {
        let start_tok = self.current();
        if start_tok.text.is_empty() {
            return Err(self.unexpected("default literal"));
        }
        let start = start_tok.start;
        let mut end = start;
        let mut depth = 0usize;
        loop {
            let tok = self.current();
            match tok.text.as_str() {
                "" => return Err(self.unexpected("default literal")),
                "(" | "[" => depth += 1,
                ")" | "]" if depth == 0 => break,
                ")" | "]" => depth -= 1,
                "," if depth == 0 => break,
                ";" => return Err(self.unexpected("\",\" or \")\"")),
                _ => {}
            }
            end = tok.end;
            self.index += 1;
        }
        if end <= start {
            return Err(self.unexpected("default literal"));
        }
        Ok(self.text[start..end].trim().to_string())
    }

    fn type_expr(&mut self) -> Result<TypeNode, CompileError> {
        let name_tok = self.identifier("type name")?;
        let name = name_tok.text.as_str();

        match name {
            "Optional" => {
                self.expect("<", "\"<\"")?;
                let child = self.type_expr()?;
                self.expect(">", "\">\"")?;
                Ok(TypeNode::Optional(Box::new(child)))
            }
            "Sequence" => {
                self.expect("<", "\"<\"")?;
                let child = self.type_expr()?;
                self.expect(">", "\">\"")?;
                Ok(TypeNode::Sequence(Box::new(child)))
            }
            "FixedArray" => {
                self.expect("<", "\"<\"")?;
                let child = self.type_expr()?;
                self.expect(",", "\",\"")?;
                let size_tok = self.current();
                if !INTEGER.is_match(&size_tok.text) {
                    return Err(self.unexpected("array size literal"));
                }
                let size = size_tok.text.parse::<usize>().map_err(|_| {
                    error(
                        &format!("Invalid array size {}", quote(&size_tok.text)),
                        size_tok.line,
                        size_tok.column,
                    )
                })?;
                self.index += 1;
                self.expect(">", "\">\"")?;
                Ok(TypeNode::FixedArray(Box::new(child), size))
            }
            "Mapping" => {
                self.expect("<", "\"<\"")?;
                let key_tok = self.identifier("\"string\"")?;
                if key_tok.text != "string" {
                    return Err(error(
                        "Mapping keys must be strings",
                        key_tok.line,
                        key_tok.column,
                    ));
                }
                self.expect(",", "\",\"")?;
                let child = self.type_expr()?;
                self.expect(">", "\">\"")?;
                Ok(TypeNode::Mapping(Box::new(child)))
            }
            "Variant" => {
                self.expect("<", "\"<\"")?;
                let mut alternatives = vec![self.type_expr()?];
                while self.eat(",") {
                    alternatives.push(self.type_expr()?);
                }
                self.expect(">", "\">\"")?;
                if alternatives.len() < 2 {
                    return Err(error(
                        "A Variant needs at least two alternatives",
                        name_tok.line,
                        name_tok.column,
                    ));
                }
                Ok(TypeNode::Variant(alternatives))
            }
            _ => {
                if self.current().text == "<" {
                    return Err(error(
                        &format!("Unknown generic type {}", quote(name)),
                        name_tok.line,
                        name_tok.column,
                    ));
                }
                if let Some(primitive) = primitive_from_name(name) {
                    Ok(TypeNode::Primitive(primitive))
                } else {
                    Ok(TypeNode::Named {
                        name:   name.to_string(),
                        line:   name_tok.line,
                        column: name_tok.column,
                        target: None,
                    })
                }
            }
        }
    }

    /// Turns a bracket group into Attributes slots plus the external-name
    /// override. Unknown or duplicated attribute names are parse errors.
    fn apply_attributes(
        &self,
        markers: &[Marker],
    ) -> Result<(Attributes, Option<String>), CompileError> {
        let mut attrs = Attributes::default();
        let mut external = None;

        for marker in markers {
            let dup = |name: &str| {
                error(
                    &format!("Duplicate attribute {}", quote(name)),
                    marker.line,
                    marker.column,
                )
            };
            match marker.name.as_str() {
                "range" => {
                    let (a, b) = self.pair_args(marker)?;
                    if attrs.range.replace((a, b)).is_some() {
                        return Err(dup("range"));
                    }
                }
                "not_in_range" => {
                    let (a, b) = self.pair_args(marker)?;
                    if attrs.not_in_range.replace((a, b)).is_some() {
                        return Err(dup("not_in_range"));
                    }
                }
                "less" => {
                    if attrs.less.replace(self.single_arg(marker)?).is_some() {
                        return Err(dup("less"));
                    }
                }
                "less_eq" => {
                    if attrs.less_eq.replace(self.single_arg(marker)?).is_some() {
                        return Err(dup("less_eq"));
                    }
                }
                "greater" => {
                    if attrs.greater.replace(self.single_arg(marker)?).is_some() {
                        return Err(dup("greater"));
                    }
                }
                "greater_eq" => {
                    if attrs.greater_eq.replace(self.single_arg(marker)?).is_some() {
                        return Err(dup("greater_eq"));
                    }
                }
                "not_eq" => {
                    if attrs.not_eq.replace(self.single_arg(marker)?).is_some() {
                        return Err(dup("not_eq"));
                    }
                }
                "in_list" => {
                    if attrs.in_list.replace(self.list_args(marker)?).is_some() {
                        return Err(dup("in_list"));
                    }
                }
                "not_in_list" => {
                    if attrs.not_in_list.replace(self.list_args(marker)?).is_some() {
                        return Err(dup("not_in_list"));
                    }
                }
                "ref" => {
                    if attrs.reference.replace(self.string_arg(marker, 0)?).is_some() {
                        return Err(dup("ref"));
                    }
                }
                "annotation" => {
                    if attrs.annotation.replace(self.string_arg(marker, 0)?).is_some() {
                        return Err(dup("annotation"));
                    }
                }
                "key" => {
                    if external.replace(self.string_arg(marker, 0)?).is_some() {
                        return Err(dup("key"));
                    }
                }
                "color" => {
                    self.flag_arg(marker)?;
                    attrs.color = true;
                }
                "directory" => {
                    self.flag_arg(marker)?;
                    attrs.directory = true;
                }
                "datetime" => {
                    self.flag_arg(marker)?;
                    attrs.datetime = true;
                }
                "identifier" => {
                    self.flag_arg(marker)?;
                    attrs.identifier = true;
                }
                "non_empty" => {
                    self.flag_arg(marker)?;
                    attrs.non_empty = true;
                }
                other => {
                    return Err(error(
                        &format!("Unknown attribute {}", quote(other)),
                        marker.line,
                        marker.column,
                    ))
                }
            }
        }
        Ok((attrs, external))
    }

    fn arity_error(&self, marker: &Marker, expected: &str) -> CompileError {
        error(
            &format!(
                "The attribute {} expects {} but got {}",
                quote(&marker.name),
                expected,
                marker.args.len()
            ),
            marker.line,
            marker.column,
        )
    }

    fn flag_arg(&self, marker: &Marker) -> Result<(), CompileError> {
        if marker.args.is_empty() {
            Ok(())
        } else {
            Err(self.arity_error(marker, "no arguments"))
        }
    }

    fn single_arg(&self, marker: &Marker) -> Result<String, CompileError> {
        if marker.args.len() == 1 {
            Ok(marker.args[0].clone())
        } else {
            Err(self.arity_error(marker, "1 argument"))
        }
    }

    fn pair_args(&self, marker: &Marker) -> Result<(String, String), CompileError> {
        if marker.args.len() == 2 {
            Ok((marker.args[0].clone(), marker.args[1].clone()))
        } else {
            Err(self.arity_error(marker, "2 arguments"))
        }
    }

    fn list_args(&self, marker: &Marker) -> Result<Vec<String>, CompileError> {
        if marker.args.is_empty() {
            Err(self.arity_error(marker, "at least 1 argument"))
        } else {
            Ok(marker.args.clone())
        }
    }

    fn string_arg(&self, marker: &Marker, index: usize) -> Result<String, CompileError> {
        let raw = marker.args.get(index).ok_or_else(|| self.arity_error(marker, "1 argument"))?;
        if !STRING_LIT.is_match(raw) {
            return Err(error(
                &format!("The attribute {} expects a string literal", quote(&marker.name)),
                marker.line,
                marker.column,
            ));
        }
        unquote(raw, marker.line, marker.column)
    }
}

fn unquote(raw: &str, line: usize, column: usize) -> Result<String, CompileError> {
    serde_json::from_str::<String>(raw)
        .map_err(|_| error(&format!("Invalid string literal {}", raw), line, column))
}

fn primitive_from_name(name: &str) -> Option<Primitive> {
    let vector = |arity: u8, scalar: Scalar| Some(Primitive::Vector { arity, scalar });
    let matrix = |side: u8, scalar: Scalar| {
        Some(Primitive::Matrix { rows: side, cols: side, scalar })
    };
    match name {
        "bool" => Some(Primitive::Bool),
        "int" => Some(Primitive::Int),
        "float" => Some(Primitive::Float),
        "double" => Some(Primitive::Double),
        "string" => Some(Primitive::Str),
        "path" => Some(Primitive::Path),
        "dict" => Some(Primitive::Dict),
        "vec2" => vector(2, Scalar::Float),
        "vec3" => vector(3, Scalar::Float),
        "vec4" => vector(4, Scalar::Float),
        "ivec2" => vector(2, Scalar::Int),
        "ivec3" => vector(3, Scalar::Int),
        "ivec4" => vector(4, Scalar::Int),
        "dvec2" => vector(2, Scalar::Double),
        "dvec3" => vector(3, Scalar::Double),
        "dvec4" => vector(4, Scalar::Double),
        "mat2" => matrix(2, Scalar::Float),
        "mat3" => matrix(3, Scalar::Float),
        "mat4" => matrix(4, Scalar::Float),
        "dmat2" => matrix(2, Scalar::Double),
        "dmat3" => matrix(3, Scalar::Double),
        "dmat4" => matrix(4, Scalar::Double),
        _ => None,
    }
}
