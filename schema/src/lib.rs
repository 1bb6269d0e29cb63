//! Type model and dynamic-value runtime for the cfgbake generator.
//!
//! This crate holds the data the rest of the system is built around:
//!
//! - the resolved type model (`TranslationUnit`, `Record`, `Field`,
//!   `TypeNode`, `Attributes`) produced by the compiler's parser,
//! - the dynamic [`DynValue`] dictionary type that baking reads from,
//! - the typed [`Baked`] result and the bake interpreter itself,
//! - the [`LuaStack`] marshaller backing generated wrapper callbacks.
//!
//! ```
//! use cfgbake_schema::*;
//!
//! let unit = TranslationUnit { decls: vec![], items: vec![], functions: vec![] };
//! let ty = TypeNode::Primitive(Primitive::Int);
//! let baked = bake_value(&unit, &ty, "n", &DynValue::Double(5.0)).unwrap();
//! assert_eq!(baked, Baked::Int(5));
//! ```

pub mod bake;
pub mod baked;
pub mod error;
pub mod lua;
pub mod model;
pub mod value;

pub use bake::{bake_record, bake_value, probe_matches};
pub use baked::{baked_to_dyn, Baked, BakedRecord};
pub use error::BakeError;
pub use lua::{eval_default_literal, invoke_wrapper, HostFn, LuaStack};
pub use model::{
    Attributes, Decl, DeclId, Enum, EnumElement, Field, Function, Item, Primitive, Record,
    Scalar, TranslationUnit, TypeNode,
};
pub use value::{dict, seq_dict, DynValue};
