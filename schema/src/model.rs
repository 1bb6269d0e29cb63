use serde::Serialize;

/// Handle into [`TranslationUnit::decls`].
///
/// Named type references hold a `DeclId` instead of a pointer so that forward
/// references between sibling declarations can be bound in a second pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeclId(pub usize);

/// The top-level container produced by one parse.
///
/// All record and enum declarations, at any nesting depth, live in the
/// `decls` arena; `items` preserves the top-level declaration order exactly
/// as encountered in the source text.
#[derive(Debug, PartialEq, Serialize)]
pub struct TranslationUnit {
    pub decls:     Vec<Decl>,
    pub items:     Vec<Item>,
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Item {
    Record(DeclId),
    Enum(DeclId),
    Function(usize),
}

#[derive(Debug, PartialEq, Serialize)]
pub enum Decl {
    Record(Record),
    Enum(Enum),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Record(record) => &record.name,
            Decl::Enum(enum_decl) => &enum_decl.name,
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Record {
    pub name:      String,
    /// Scope-qualified name, assigned by the resolver ("Outer_Inner").
    pub qual:      String,
    pub line:      usize,
    pub column:    usize,
    /// Bake target name from the `[bake("...")]` marker, top-level only.
    pub bake_name: Option<String>,
    pub fields:    Vec<Field>,
    pub nested:    Vec<DeclId>,
}

impl Record {
    /// Display name used in error messages and documentation metadata.
    pub fn target_name(&self) -> &str {
        self.bake_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Enum {
    pub name:      String,
    pub qual:      String,
    pub line:      usize,
    pub column:    usize,
    pub stringify: bool,
    pub elements:  Vec<EnumElement>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct EnumElement {
    pub name:     String,
    pub external: Option<String>,
}

impl EnumElement {
    pub fn external_name(&self) -> &str {
        self.external.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Function {
    pub name:     String,
    pub doc:      Option<String>,
    pub exported: bool,
    pub args:     Vec<Field>,
    pub ret:      Option<TypeNode>,
    pub line:     usize,
    pub column:   usize,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Field {
    pub name:     String,
    /// External-name override from `key("...")`.
    pub external: Option<String>,
    pub ty:       TypeNode,
    pub attrs:    Attributes,
    pub doc:      Option<String>,
    /// Opaque default literal text; only set on function arguments.
    pub default:  Option<String>,
    pub line:     usize,
    pub column:   usize,
}

impl Field {
    /// The dictionary key / stack name this field is read from.
    pub fn key(&self) -> &str {
        self.external.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scalar {
    Int,
    Float,
    Double,
}

impl Scalar {
    pub fn display(&self) -> &'static str {
        match self {
            Scalar::Int => "int",
            Scalar::Float => "float",
            Scalar::Double => "double",
        }
    }

    /// Capitalized suffix used in generated verifier/accessor names.
    pub fn suffix(&self) -> &'static str {
        match self {
            Scalar::Int => "Int",
            Scalar::Float => "Float",
            Scalar::Double => "Double",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Primitive {
    Bool,
    Int,
    Float,
    Double,
    Str,
    Path,
    Dict,
    Vector { arity: u8, scalar: Scalar },
    Matrix { rows: u8, cols: u8, scalar: Scalar },
}

/// Closed union of every type expression a field may carry.
///
/// Composite variants exclusively own their children; `Named` is the only
/// back-reference in the model and is bound by the resolver after all
/// sibling declarations are visible.
#[derive(Debug, PartialEq, Serialize)]
pub enum TypeNode {
    Primitive(Primitive),
    Optional(Box<TypeNode>),
    Sequence(Box<TypeNode>),
    FixedArray(Box<TypeNode>, usize),
    /// Key type is always the string primitive.
    Mapping(Box<TypeNode>),
    /// At least two alternatives, probed in declared order.
    Variant(Vec<TypeNode>),
    Named {
        name:   String,
        line:   usize,
        column: usize,
        target: Option<DeclId>,
    },
}

impl TranslationUnit {
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.0]
    }

    pub fn record(&self, id: DeclId) -> Option<&Record> {
        match &self.decls[id.0] {
            Decl::Record(record) => Some(record),
            Decl::Enum(_) => None,
        }
    }

    pub fn enum_decl(&self, id: DeclId) -> Option<&Enum> {
        match &self.decls[id.0] {
            Decl::Enum(enum_decl) => Some(enum_decl),
            Decl::Record(_) => None,
        }
    }
}

impl Primitive {
    /// Human-readable display name used in documentation labels and in
    /// attribute-legality error messages.
    pub fn display_name(&self) -> String {
        match self {
            Primitive::Bool => "bool".to_string(),
            Primitive::Int => "int".to_string(),
            Primitive::Float => "float".to_string(),
            Primitive::Double => "double".to_string(),
            Primitive::Str => "String".to_string(),
            Primitive::Path => "Path".to_string(),
            Primitive::Dict => "Dict".to_string(),
            Primitive::Vector { arity, scalar } => {
                format!("Vector{}<{}>", arity, scalar.display())
            }
            Primitive::Matrix { rows, cols, scalar } => {
                format!("Matrix{}x{}<{}>", rows, cols, scalar.display())
            }
        }
    }

    /// Short label used in Lua wrapper signatures.
    pub fn short_label(&self) -> String {
        match self {
            Primitive::Bool => "bool".to_string(),
            Primitive::Int => "int".to_string(),
            Primitive::Float => "float".to_string(),
            Primitive::Double => "double".to_string(),
            Primitive::Str => "String".to_string(),
            Primitive::Path => "Path".to_string(),
            Primitive::Dict => "table".to_string(),
            Primitive::Vector { arity, scalar } => match scalar {
                Scalar::Int => format!("ivec{}", arity),
                Scalar::Float => format!("vec{}", arity),
                Scalar::Double => format!("dvec{}", arity),
            },
            Primitive::Matrix { rows, cols, scalar } => match scalar {
                Scalar::Double => format!("dmat{}x{}", rows, cols),
                _ => format!("mat{}x{}", rows, cols),
            },
        }
    }
}

impl TypeNode {
    /// Human-readable label for documentation entries. Variant alternatives
    /// are joined with commas and a final "or".
    pub fn display_name(&self, unit: &TranslationUnit) -> String {
        match self {
            TypeNode::Primitive(primitive) => primitive.display_name(),
            TypeNode::Optional(child) => {
                format!("Optional<{}>", child.display_name(unit))
            }
            TypeNode::Sequence(child) => {
                format!("Table<{}>", child.display_name(unit))
            }
            TypeNode::FixedArray(child, size) => {
                format!("Table<{}, {}>", child.display_name(unit), size)
            }
            TypeNode::Mapping(child) => {
                format!("Table<String, {}>", child.display_name(unit))
            }
            TypeNode::Variant(alternatives) => {
                let labels: Vec<String> =
                    alternatives.iter().map(|alt| alt.display_name(unit)).collect();
                join_with_or(&labels)
            }
            TypeNode::Named { name, target, .. } => match target {
                Some(id) => unit.decl(*id).name().to_string(),
                None => name.clone(),
            },
        }
    }

    /// Short label for Lua wrapper signatures ("int[]", "String -> vec2", ...).
    pub fn short_label(&self, unit: &TranslationUnit) -> String {
        match self {
            TypeNode::Primitive(primitive) => primitive.short_label(),
            TypeNode::Optional(child) => format!("{}?", child.short_label(unit)),
            TypeNode::Sequence(child) => format!("{}[]", child.short_label(unit)),
            TypeNode::FixedArray(child, size) => {
                format!("{}[{}]", child.short_label(unit), size)
            }
            TypeNode::Mapping(child) => {
                format!("String -> {}", child.short_label(unit))
            }
            TypeNode::Variant(alternatives) => {
                let labels: Vec<String> =
                    alternatives.iter().map(|alt| alt.short_label(unit)).collect();
                labels.join("|")
            }
            TypeNode::Named { name, target, .. } => match target {
                Some(id) => unit.decl(*id).name().to_string(),
                None => name.clone(),
            },
        }
    }
}

fn join_with_or(labels: &[String]) -> String {
    match labels.len() {
        0 => String::new(),
        1 => labels[0].clone(),
        _ => {
            let head = &labels[..labels.len() - 1];
            format!("{} or {}", head.join(", "), labels[labels.len() - 1])
        }
    }
}

/// Independently-optional scalar constraints and boolean flags attached to a
/// field. Which slots are legal for which type category is decided by the
/// compiler's attribute validator, not here. Bounds and list values are kept
/// as opaque literal text exactly as written in the source annotation.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Attributes {
    pub range:        Option<(String, String)>,
    pub not_in_range: Option<(String, String)>,
    pub less:         Option<String>,
    pub less_eq:      Option<String>,
    pub greater:      Option<String>,
    pub greater_eq:   Option<String>,
    pub not_eq:       Option<String>,
    pub in_list:      Option<Vec<String>>,
    pub not_in_list:  Option<Vec<String>>,
    pub reference:    Option<String>,
    pub annotation:   Option<String>,
    pub color:        bool,
    pub directory:    bool,
    pub datetime:     bool,
    pub identifier:   bool,
    pub non_empty:    bool,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        *self == Attributes::default()
    }
}
