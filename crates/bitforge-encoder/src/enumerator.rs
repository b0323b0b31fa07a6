//! Value numbering.
//!
//! Module-level values are numbered first: global variables, declarations,
//! functions, then module-level constants. Each function body continues from
//! the module-level count with its arguments, the constants only it uses,
//! and its value-producing instructions in block order. Function-local
//! numbering restarts for every function, so an argument of one function and
//! an argument of another may share an ordinal.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use bitforge_ir::{
    ConstId, DeclId, FuncId, Function, GlobalId, InstId, Instruction, Module, Value,
};

use crate::{EncodeError, Result};

/// Where a constant is emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConstScope {
    Module,
    Function(FuncId),
}

#[derive(Debug, Default)]
struct FunctionValues {
    /// Constants used only by this function, in ordinal order.
    constants: Vec<ConstId>,
    /// Ordinal each instruction is encoded at. Void instructions take the
    /// next free ordinal without consuming it.
    positions: HashMap<InstId, u32>,
    /// One past the last ordinal used by this function.
    end: u32,
}

/// Ordinals for every value of one module.
#[derive(Debug)]
pub struct Enumerator {
    ordinals: HashMap<Value, u32>,
    module_constants: Vec<ConstId>,
    module_count: u32,
    const_scopes: HashMap<ConstId, ConstScope>,
    functions: Vec<FunctionValues>,
    names: Vec<String>,
}

impl Enumerator {
    /// Number every value of `module` in one pass.
    pub fn enumerate(module: &Module) -> Self {
        let const_scopes = classify_constants(module);

        let mut ordinals = HashMap::new();
        let mut next = 0u32;
        let mut assign = |ordinals: &mut HashMap<Value, u32>, value: Value| {
            ordinals.insert(value, next);
            next += 1;
        };

        for i in 0..module.globals().len() {
            assign(&mut ordinals, Value::Global(GlobalId::new(i)));
        }
        for i in 0..module.declarations().len() {
            assign(&mut ordinals, Value::Declaration(DeclId::new(i)));
        }
        for i in 0..module.functions().len() {
            assign(&mut ordinals, Value::Function(FuncId::new(i)));
        }

        let module_constants: Vec<ConstId> = const_scopes
            .iter()
            .filter(|(_, scope)| **scope == ConstScope::Module)
            .map(|(&id, _)| id)
            .collect();
        for &id in &module_constants {
            assign(&mut ordinals, Value::Constant(id));
        }
        let module_count = next;

        let mut functions = Vec::with_capacity(module.functions().len());
        for (i, function) in module.functions().iter().enumerate() {
            let func = FuncId::new(i);
            let values =
                enumerate_function(func, function, module_count, &const_scopes, &mut ordinals);
            tracing::trace!(
                function = function.name(),
                constants = values.constants.len(),
                values = values.end - module_count,
                "enumerated function"
            );
            functions.push(values);
        }

        tracing::debug!(
            globals = module.globals().len(),
            declarations = module.declarations().len(),
            functions = module.functions().len(),
            module_constants = module_constants.len(),
            "enumerated module"
        );

        Self {
            ordinals,
            module_constants,
            module_count,
            const_scopes: const_scopes.into_iter().collect(),
            functions,
            names: module.functions().iter().map(|f| f.name().to_owned()).collect(),
        }
    }

    /// Ordinal of `value`.
    pub fn get(&self, value: Value) -> Result<u32> {
        self.ordinals
            .get(&value)
            .copied()
            .ok_or(EncodeError::Unenumerated(value))
    }

    /// Number of module-level values; the first function-local ordinal.
    pub fn module_value_count(&self) -> u32 {
        self.module_count
    }

    /// Constants emitted in the module-level constants block, in ordinal order.
    pub fn module_constants(&self) -> &[ConstId] {
        &self.module_constants
    }

    /// Constants used only by `func`, in ordinal order.
    pub fn function_constants(&self, func: FuncId) -> Result<&[ConstId]> {
        Ok(&self.function_values(func)?.constants)
    }

    /// Ordinal an instruction is encoded at: its own ordinal if it produces
    /// a value, otherwise the ordinal the next value would get.
    pub fn instruction_ordinal(&self, func: FuncId, inst: InstId) -> Result<u32> {
        self.function_values(func)?
            .positions
            .get(&inst)
            .copied()
            .ok_or(EncodeError::Unenumerated(Value::Instruction(func, inst)))
    }

    /// Check that every data operand of `inst` is visible from `func` and was
    /// numbered before `inst`. Block targets are not values and are exempt.
    pub fn check_value_order(
        &self,
        func: FuncId,
        inst: InstId,
        instruction: &Instruction,
    ) -> Result<()> {
        let position = self.instruction_ordinal(func, inst)?;
        let name = || self.names[func.index()].clone();

        for operand in instruction.kind().operands() {
            let owner = match operand {
                Value::Constant(id) => match self.const_scopes.get(&id) {
                    Some(ConstScope::Function(owner)) => Some(*owner),
                    _ => None,
                },
                other => other.owner(),
            };
            if owner.is_some_and(|owner| owner != func) {
                return Err(EncodeError::ForeignValue {
                    function: name(),
                    inst,
                    operand,
                });
            }
            if self.get(operand)? >= position {
                return Err(EncodeError::ForwardReference {
                    function: name(),
                    inst,
                    operand,
                });
            }
        }
        Ok(())
    }

    fn function_values(&self, func: FuncId) -> Result<&FunctionValues> {
        self.functions
            .get(func.index())
            .ok_or(EncodeError::UnknownFunction(func))
    }
}

fn enumerate_function(
    func: FuncId,
    function: &Function,
    start: u32,
    const_scopes: &IndexMap<ConstId, ConstScope>,
    ordinals: &mut HashMap<Value, u32>,
) -> FunctionValues {
    let mut next = start;
    for index in 0..function.args().len() {
        ordinals.insert(Value::Argument(func, index as u32), next);
        next += 1;
    }

    let mut values = FunctionValues::default();
    let mut seen = HashSet::new();
    for (_, inst) in function.body() {
        for operand in inst.kind().operands() {
            let Value::Constant(id) = operand else {
                continue;
            };
            if const_scopes.get(&id) == Some(&ConstScope::Function(func)) && seen.insert(id) {
                ordinals.insert(operand, next);
                values.constants.push(id);
                next += 1;
            }
        }
    }

    for (id, inst) in function.body() {
        values.positions.insert(id, next);
        if inst.produces_value() {
            ordinals.insert(Value::Instruction(func, id), next);
            next += 1;
        }
    }

    values.end = next;
    values
}

/// Decide, in first-use order, which constants are module-level and which
/// belong to a single function.
///
/// Initializer constants and constants used by more than one function are
/// module-level. Constants nobody uses are not emitted.
fn classify_constants(module: &Module) -> IndexMap<ConstId, ConstScope> {
    let mut scopes: IndexMap<ConstId, ConstScope> = IndexMap::new();

    for global in module.globals() {
        if let Some(init) = global.initializer() {
            scopes.insert(init, ConstScope::Module);
        }
    }

    for (i, function) in module.functions().iter().enumerate() {
        let func = FuncId::new(i);
        for (_, inst) in function.body() {
            for operand in inst.kind().operands() {
                let Value::Constant(id) = operand else {
                    continue;
                };
                let scope = scopes.entry(id).or_insert(ConstScope::Function(func));
                if *scope != ConstScope::Function(func) {
                    *scope = ConstScope::Module;
                }
            }
        }
    }

    scopes
}

