//! Compiler for annotated configuration declarations.
//!
//! Source text goes through the tokenizer, the recursive-descent parser and
//! the reference resolver, after which four independent generators walk the
//! resolved tree: verifier/documentation tables, bake extraction routines,
//! Lua wrappers and enum name conversions.

pub mod attrs;
pub mod compiler;
pub mod error;
pub mod gen_bake;
pub mod gen_enum;
pub mod gen_lua;
pub mod gen_verify;
pub mod parser;
pub mod resolver;
pub mod tokenizer;
pub mod utils;

pub use compiler::{
    bake_source, compile, docs_source, lua_source, parse_and_resolve, CompileResult,
};
pub use error::CompileError;
pub use gen_bake::BakeRoutine;
pub use gen_enum::EnumStringify;
pub use gen_lua::{ArgDesc, LuaBinding};
pub use gen_verify::{DocEntry, RecordDocs};
