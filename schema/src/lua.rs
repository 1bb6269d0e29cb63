use crate::bake::bake_value;
use crate::baked::{baked_to_dyn, Baked};
use crate::error::BakeError;
use crate::model::{Function, TranslationUnit, TypeNode};
use crate::value::DynValue;

/// A scripting-runtime value stack. Positions are 1-based from the bottom,
/// matching how arguments arrive from Lua.
#[derive(Debug, Default)]
pub struct LuaStack {
    values: Vec<DynValue>,
}

impl LuaStack {
    pub fn new() -> LuaStack {
        LuaStack { values: Vec::new() }
    }

    pub fn push(&mut self, value: DynValue) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Option<DynValue> {
        self.values.pop()
    }

    /// Number of values currently on the stack.
    pub fn top(&self) -> usize {
        self.values.len()
    }

    /// Reads the value at a 1-based position.
    pub fn get(&self, position: usize) -> Option<&DynValue> {
        if position == 0 {
            return None;
        }
        self.values.get(position - 1)
    }
}

/// The native function a wrapper forwards to. Receives one slot per declared
/// argument, in order; `None` marks an optional argument whose stack position
/// was absent and that carried no default.
pub type HostFn<'a> = dyn FnMut(&[Option<Baked>]) -> Option<Baked> + 'a;

/// Marshals the stack into typed arguments, calls the host function and
/// pushes the converted return value. Returns the number of values pushed
/// (0 for a void return).
///
/// Arguments are read in declared order with the same accessor rules as
/// baking, substituting stack positions for dictionary keys. A declared
/// default literal is applied verbatim when the stack position is absent;
/// an argument that is neither present, defaulted nor optional fails.
/// Variant-typed arguments and returns are rejected, matching what the
/// wrapper generator accepts: a stack position carries no discriminator.
pub fn invoke_wrapper(
    unit: &TranslationUnit,
    func: &Function,
    stack: &mut LuaStack,
    host: &mut HostFn,
) -> Result<usize, BakeError> {
    for arg in &func.args {
        if is_variant(&arg.ty) {
            return Err(BakeError::UnsupportedVariant(arg.name.clone()));
        }
    }
    if let Some(ret) = &func.ret {
        if is_variant(ret) {
            return Err(BakeError::UnsupportedVariant(func.name.clone()));
        }
    }

    let top = stack.top();
    let mut args: Vec<Option<Baked>> = Vec::with_capacity(func.args.len());

    for (index, arg) in func.args.iter().enumerate() {
        let position = index + 1;
        let slot = if position <= top {
            let stored = stack
                .get(position)
                .ok_or_else(|| BakeError::MissingArgument(arg.name.clone()))?;
            Some(bake_value(unit, &arg.ty, &arg.name, stored)?)
        } else if let Some(default) = &arg.default {
            let stored = eval_default_literal(default)?;
            Some(bake_value(unit, &arg.ty, &arg.name, &stored)?)
        } else if matches!(arg.ty, TypeNode::Optional(_)) {
            None
        } else {
            return Err(BakeError::MissingArgument(arg.name.clone()));
        };
        args.push(slot);
    }

    let result = host(&args);
    match (result, &func.ret) {
        (Some(value), Some(_)) => {
            stack.push(baked_to_dyn(&value));
            Ok(1)
        }
        (None, None) => Ok(0),
        (Some(_), None) => Err(BakeError::Internal(format!(
            "function \"{}\" returned a value but declares no return type",
            func.name
        ))),
        (None, Some(_)) => Err(BakeError::Internal(format!(
            "function \"{}\" declares a return type but returned nothing",
            func.name
        ))),
    }
}

fn is_variant(ty: &TypeNode) -> bool {
    match ty {
        TypeNode::Variant(_) => true,
        TypeNode::Optional(child) => is_variant(child),
        _ => false,
    }
}

/// Materializes a default literal captured as opaque source text.
///
/// Accepted forms: string literals, `true`/`false`, integer and floating
/// numbers, and component constructors such as `vec2(1, 2)` or
/// `mat2(1, 0, 0, 1)`. The constructor name is not checked here; the
/// component count is validated by the argument's own bake step.
pub fn eval_default_literal(text: &str) -> Result<DynValue, BakeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BakeError::BadDefault(text.to_string()));
    }

    if text.starts_with('"') && text.ends_with('"') && text.len() >= 2 {
        let inner = &text[1..text.len() - 1];
        return Ok(DynValue::String(inner.replace("\\\"", "\"").replace("\\\\", "\\")));
    }
    if text == "true" {
        return Ok(DynValue::Bool(true));
    }
    if text == "false" {
        return Ok(DynValue::Bool(false));
    }
    if let Ok(value) = text.parse::<i64>() {
        return Ok(DynValue::Int(value));
    }
    if let Ok(value) = text.parse::<f64>() {
        return Ok(DynValue::Double(value));
    }

    // Constructor call: Ident(c1, c2, ...) with numeric components.
    if let Some(open) = text.find('(') {
        let ident = &text[..open];
        let valid_ident = !ident.is_empty()
            && ident
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid_ident && text.ends_with(')') {
            let inner = &text[open + 1..text.len() - 1];
            let mut comps = Vec::new();
            for part in inner.split(',') {
                let part = part.trim();
                let value = part
                    .parse::<f64>()
                    .map_err(|_| BakeError::BadDefault(text.to_string()))?;
                comps.push(value);
            }
            return Ok(DynValue::Components(comps));
        }
    }

    Err(BakeError::BadDefault(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_scalar_defaults() {
        assert_eq!(eval_default_literal("4").unwrap(), DynValue::Int(4));
        assert_eq!(eval_default_literal("-2").unwrap(), DynValue::Int(-2));
        assert_eq!(eval_default_literal("0.5").unwrap(), DynValue::Double(0.5));
        assert_eq!(eval_default_literal("true").unwrap(), DynValue::Bool(true));
        assert_eq!(
            eval_default_literal("\"hi\"").unwrap(),
            DynValue::String("hi".to_string())
        );
    }

    #[test]
    fn test_eval_constructor_default() {
        assert_eq!(
            eval_default_literal("mat2(1, 0, 0, 1)").unwrap(),
            DynValue::Components(vec![1.0, 0.0, 0.0, 1.0])
        );
        assert_eq!(
            eval_default_literal("vec2(0.5, -1)").unwrap(),
            DynValue::Components(vec![0.5, -1.0])
        );
    }

    #[test]
    fn test_eval_rejects_garbage() {
        assert!(eval_default_literal("").is_err());
        assert!(eval_default_literal("vec2(a, b)").is_err());
        assert!(eval_default_literal("not a literal").is_err());
    }

    #[test]
    fn test_stack_positions_are_one_based() {
        let mut stack = LuaStack::new();
        stack.push(DynValue::Int(10));
        stack.push(DynValue::Int(20));
        assert_eq!(stack.top(), 2);
        assert_eq!(stack.get(1), Some(&DynValue::Int(10)));
        assert_eq!(stack.get(2), Some(&DynValue::Int(20)));
        assert_eq!(stack.get(0), None);
        assert_eq!(stack.get(3), None);
    }
}
