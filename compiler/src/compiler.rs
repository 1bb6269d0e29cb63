use crate::error::CompileError;
use crate::gen_bake::{self, BakeRoutine};
use crate::gen_enum::{self, EnumStringify};
use crate::gen_lua::{self, LuaBinding};
use crate::gen_verify::{self, RecordDocs};
use crate::parser::parse_unit;
use crate::resolver::resolve;
use crate::tokenizer::tokenize;
use cfgbake_schema::TranslationUnit;

/// Everything one compilation run produces: the resolved translation unit
/// plus the four generated artifact streams.
#[derive(Debug)]
pub struct CompileResult {
    pub unit:        TranslationUnit,
    pub docs:        Vec<RecordDocs>,
    pub bakes:       Vec<BakeRoutine>,
    pub bindings:    Vec<LuaBinding>,
    pub stringifies: Vec<EnumStringify>,
}

/// Runs the front half of the pipeline: tokenize, parse, bind names.
pub fn parse_and_resolve(text: &str) -> Result<TranslationUnit, CompileError> {
    let tokens = tokenize(text)?;
    let mut unit = parse_unit(text, &tokens)?;
    resolve(&mut unit)?;
    Ok(unit)
}

/// Runs the whole pipeline over one source text.
pub fn compile(text: &str) -> Result<CompileResult, CompileError> {
    let unit = parse_and_resolve(text)?;
    let docs = gen_verify::generate(&unit)?;
    let bakes = gen_bake::generate(&unit)?;
    let bindings = gen_lua::generate(&unit)?;
    let stringifies = gen_enum::generate(&unit)?;
    Ok(CompileResult { unit, docs, bakes, bindings, stringifies })
}

const BANNER: &str = "// Generated by cfgbake. Do not edit.\n";

/// Assembles the verifier-table source stream.
pub fn docs_source(result: &CompileResult) -> String {
    let mut out = String::from(BANNER);
    out.push('\n');
    for docs in &result.docs {
        out.push_str(&docs.text);
        out.push('\n');
    }
    out
}

/// Assembles the extraction source stream. Enum name conversions come first
/// because the bake routines call into them.
pub fn bake_source(result: &CompileResult) -> String {
    let mut out = String::from(BANNER);
    out.push('\n');
    for stringify in &result.stringifies {
        out.push_str(&stringify.text);
        out.push('\n');
    }
    for bake in &result.bakes {
        out.push_str(&bake.text);
        out.push('\n');
    }
    out
}

/// Assembles the wrapper source stream, registration table last.
pub fn lua_source(result: &CompileResult) -> String {
    let mut out = String::from(BANNER);
    out.push('\n');
    for binding in &result.bindings {
        out.push_str(&binding.text);
        out.push('\n');
    }
    out.push_str(&gen_lua::registration_table(&result.bindings));
    out
}
