//! Modules, functions and the function builder.

use indexmap::IndexSet;

use crate::inst::{BinOp, CastOp, InstKind, Instruction, IntPredicate};
use crate::types::Type;
use crate::value::{
    BlockId, CallingConv, ConstId, Constant, DeclId, FuncId, GlobalId, InstId, Linkage,
    UnnamedAddr, Value,
};
use crate::{IrError, Result};

/// Global variable. Its value is a pointer to `ty`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Global {
    name: String,
    ty: Type,
    is_const: bool,
    init: Option<ConstId>,
    linkage: Linkage,
    align: Option<u32>,
    unnamed_addr: UnnamedAddr,
    attributes: Option<u32>,
}

impl Global {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the stored value.
    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }

    pub fn initializer(&self) -> Option<ConstId> {
        self.init
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Alignment in bytes, always a power of two.
    pub fn alignment(&self) -> Option<u32> {
        self.align
    }

    pub fn unnamed_addr(&self) -> UnnamedAddr {
        self.unnamed_addr
    }

    /// Index of the attribute group, if any.
    pub fn attributes(&self) -> Option<u32> {
        self.attributes
    }

    pub fn set_const(&mut self, is_const: bool) -> &mut Self {
        self.is_const = is_const;
        self
    }

    pub fn set_linkage(&mut self, linkage: Linkage) -> &mut Self {
        self.linkage = linkage;
        self
    }

    pub fn set_alignment(&mut self, align: u32) -> Result<&mut Self> {
        if !align.is_power_of_two() {
            return Err(IrError::InvalidAlignment(align));
        }
        self.align = Some(align);
        Ok(self)
    }

    pub fn set_unnamed_addr(&mut self, unnamed_addr: UnnamedAddr) -> &mut Self {
        self.unnamed_addr = unnamed_addr;
        self
    }

    pub fn set_attributes(&mut self, group: u32) -> &mut Self {
        self.attributes = Some(group);
        self
    }
}

/// Function without a body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    name: String,
    ty: Type,
    linkage: Linkage,
    cconv: CallingConv,
    unnamed_addr: UnnamedAddr,
}

impl Declaration {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Function type.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn calling_conv(&self) -> CallingConv {
        self.cconv
    }

    pub fn unnamed_addr(&self) -> UnnamedAddr {
        self.unnamed_addr
    }

    pub fn set_linkage(&mut self, linkage: Linkage) -> &mut Self {
        self.linkage = linkage;
        self
    }

    pub fn set_calling_conv(&mut self, cconv: CallingConv) -> &mut Self {
        self.cconv = cconv;
        self
    }

    pub fn set_unnamed_addr(&mut self, unnamed_addr: UnnamedAddr) -> &mut Self {
        self.unnamed_addr = unnamed_addr;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument {
    name: Option<String>,
    ty: Type,
}

impl Argument {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicBlock {
    name: Option<String>,
    insts: Vec<InstId>,
}

impl BasicBlock {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Instructions in program order.
    pub fn insts(&self) -> &[InstId] {
        &self.insts
    }
}

/// Function definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    name: String,
    ty: Type,
    linkage: Linkage,
    cconv: CallingConv,
    unnamed_addr: UnnamedAddr,
    args: Vec<Argument>,
    blocks: Vec<BasicBlock>,
    insts: Vec<Instruction>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Function type.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn calling_conv(&self) -> CallingConv {
        self.cconv
    }

    pub fn unnamed_addr(&self) -> UnnamedAddr {
        self.unnamed_addr
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Basic blocks in declaration order.
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    pub fn inst(&self, id: InstId) -> Option<&Instruction> {
        self.insts.get(id.index())
    }

    /// Instructions in block order, then program order within each block.
    pub fn body(&self) -> impl Iterator<Item = (InstId, &Instruction)> {
        self.blocks
            .iter()
            .flat_map(|bb| bb.insts.iter())
            .map(|&id| (id, &self.insts[id.index()]))
    }
}

/// An IR module.
///
/// Globals, declarations and functions keep their insertion order, which is
/// also the order the encoder numbers them in.
#[derive(Debug, Default)]
pub struct Module {
    source_filename: Option<String>,
    triple: Option<String>,
    data_layout: Option<String>,
    globals: Vec<Global>,
    declarations: Vec<Declaration>,
    functions: Vec<Function>,
    constants: IndexSet<Constant>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_filename(&self) -> Option<&str> {
        self.source_filename.as_deref()
    }

    pub fn set_source_filename(&mut self, name: impl Into<String>) -> &mut Self {
        self.source_filename = Some(name.into());
        self
    }

    pub fn triple(&self) -> Option<&str> {
        self.triple.as_deref()
    }

    pub fn set_triple(&mut self, triple: impl Into<String>) -> &mut Self {
        self.triple = Some(triple.into());
        self
    }

    pub fn data_layout(&self) -> Option<&str> {
        self.data_layout.as_deref()
    }

    pub fn set_data_layout(&mut self, layout: impl Into<String>) -> &mut Self {
        self.data_layout = Some(layout.into());
        self
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn global(&self, id: GlobalId) -> Option<&Global> {
        self.globals.get(id.index())
    }

    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.index())
    }

    pub fn function(&self, id: FuncId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    pub fn constant(&self, id: ConstId) -> Option<&Constant> {
        self.constants.get_index(id.index())
    }

    /// Interned constants in creation order.
    pub fn constants(&self) -> impl Iterator<Item = (ConstId, &Constant)> {
        self.constants
            .iter()
            .enumerate()
            .map(|(i, c)| (ConstId::new(i), c))
    }

    /// Add a global variable holding a value of type `ty`.
    ///
    /// New globals are mutable, uninitialized and internal.
    pub fn add_global(&mut self, name: impl Into<String>, ty: Type) -> Result<GlobalId> {
        ty.validate()?;
        if !ty.is_first_class() || ty == Type::Label {
            return Err(IrError::NotFirstClass(ty));
        }
        let id = GlobalId::new(self.globals.len());
        self.globals.push(Global {
            name: name.into(),
            ty,
            is_const: false,
            init: None,
            linkage: Linkage::Internal,
            align: None,
            unnamed_addr: UnnamedAddr::None,
            attributes: None,
        });
        Ok(id)
    }

    pub fn global_mut(&mut self, id: GlobalId) -> Result<&mut Global> {
        self.globals
            .get_mut(id.index())
            .ok_or(IrError::UnknownValue(Value::Global(id)))
    }

    /// Set the initializer of `global`; `init` must be a constant of its value type.
    pub fn set_initializer(&mut self, global: GlobalId, init: Value) -> Result<()> {
        let Value::Constant(id) = init else {
            return Err(IrError::UnknownValue(init));
        };
        let ty = self
            .constant(id)
            .ok_or(IrError::UnknownValue(init))?
            .ty();
        let target = self.global_mut(global)?;
        if ty != target.ty {
            return Err(IrError::TypeMismatch {
                expected: target.ty.clone(),
                actual: ty,
            });
        }
        target.init = Some(id);
        Ok(())
    }

    /// Declare an external function of function type `ty`.
    pub fn declare_function(&mut self, name: impl Into<String>, ty: Type) -> Result<DeclId> {
        ty.signature()?;
        ty.validate()?;
        let id = DeclId::new(self.declarations.len());
        self.declarations.push(Declaration {
            name: name.into(),
            ty,
            linkage: Linkage::External,
            cconv: CallingConv::C,
            unnamed_addr: UnnamedAddr::None,
        });
        Ok(id)
    }

    pub fn declaration_mut(&mut self, id: DeclId) -> Result<&mut Declaration> {
        self.declarations
            .get_mut(id.index())
            .ok_or(IrError::UnknownValue(Value::Declaration(id)))
    }

    /// Start defining a function of function type `ty`.
    ///
    /// The function is added to the module by [`FunctionBuilder::finish`].
    pub fn define_function(
        &mut self,
        name: impl Into<String>,
        ty: Type,
    ) -> Result<FunctionBuilder<'_>> {
        let (_, params) = ty.signature()?;
        ty.validate()?;
        let args = params
            .iter()
            .map(|ty| Argument {
                name: None,
                ty: ty.clone(),
            })
            .collect();
        let func = FuncId::new(self.functions.len());
        Ok(FunctionBuilder {
            function: Function {
                name: name.into(),
                ty,
                linkage: Linkage::External,
                cconv: CallingConv::C,
                unnamed_addr: UnnamedAddr::None,
                args,
                blocks: Vec::new(),
                insts: Vec::new(),
            },
            module: self,
            func,
            cursor: None,
        })
    }

    /// Intern `constant`, returning the existing id for an equal constant.
    pub fn intern_constant(&mut self, constant: Constant) -> Result<ConstId> {
        constant.validate()?;
        let (index, _) = self.constants.insert_full(constant);
        Ok(ConstId::new(index))
    }

    pub fn const_int(&mut self, ty: Type, value: i64) -> Result<Value> {
        self.intern_constant(Constant::Int { ty, value })
            .map(Value::Constant)
    }

    pub fn const_null(&mut self, pointer: Type) -> Result<Value> {
        self.intern_constant(Constant::Null(pointer))
            .map(Value::Constant)
    }

    pub fn const_undef(&mut self, ty: Type) -> Result<Value> {
        self.intern_constant(Constant::Undef(ty)).map(Value::Constant)
    }

    /// `[N x i8]` constant holding `bytes` verbatim.
    pub fn const_data(&mut self, bytes: impl Into<Vec<u8>>) -> Result<Value> {
        self.intern_constant(Constant::Data(bytes.into()))
            .map(Value::Constant)
    }

    /// Nul-terminated `[N x i8]` constant.
    pub fn const_cstring(&mut self, text: &str) -> Result<Value> {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        self.const_data(bytes)
    }

    /// Type of a module-level or function-local value.
    pub fn type_of(&self, value: Value) -> Result<Type> {
        let unknown = || IrError::UnknownValue(value);
        match value {
            Value::Global(id) => Ok(self.global(id).ok_or_else(unknown)?.ty.clone().ptr()),
            Value::Declaration(id) => {
                Ok(self.declaration(id).ok_or_else(unknown)?.ty.clone().ptr())
            }
            Value::Function(id) => Ok(self.function(id).ok_or_else(unknown)?.ty.clone().ptr()),
            Value::Constant(id) => Ok(self.constant(id).ok_or_else(unknown)?.ty()),
            Value::Argument(func, _) | Value::Instruction(func, _) => {
                let function = self.function(func).ok_or_else(unknown)?;
                local_type(function, value).ok_or_else(unknown)
            }
        }
    }
}

fn local_type(function: &Function, value: Value) -> Option<Type> {
    match value {
        Value::Argument(_, index) => function.args.get(index as usize).map(|a| a.ty.clone()),
        Value::Instruction(_, id) => function
            .inst(id)
            .filter(|inst| inst.produces_value())
            .map(|inst| inst.ty.clone()),
        _ => None,
    }
}

/// Appends basic blocks and instructions to a function under construction.
///
/// Every instruction is type-checked when it is appended.
#[derive(Debug)]
pub struct FunctionBuilder<'m> {
    module: &'m mut Module,
    function: Function,
    func: FuncId,
    cursor: Option<BlockId>,
}

impl FunctionBuilder<'_> {
    /// Id the function will have once finished.
    pub fn id(&self) -> FuncId {
        self.func
    }

    /// Module being extended, for creating constants.
    pub fn module(&mut self) -> &mut Module {
        self.module
    }

    pub fn set_linkage(&mut self, linkage: Linkage) -> &mut Self {
        self.function.linkage = linkage;
        self
    }

    pub fn set_calling_conv(&mut self, cconv: CallingConv) -> &mut Self {
        self.function.cconv = cconv;
        self
    }

    pub fn set_unnamed_addr(&mut self, unnamed_addr: UnnamedAddr) -> &mut Self {
        self.function.unnamed_addr = unnamed_addr;
        self
    }

    pub fn arg(&self, index: u32) -> Result<Value> {
        if index as usize >= self.function.args.len() {
            return Err(IrError::ArgumentOutOfRange {
                index,
                count: self.function.args.len(),
            });
        }
        Ok(Value::Argument(self.func, index))
    }

    /// Name an argument or a value-producing instruction.
    pub fn set_name(&mut self, value: Value, name: impl Into<String>) -> Result<()> {
        if value.owner() != Some(self.func) {
            return Err(IrError::UnknownValue(value));
        }
        let slot = match value {
            Value::Argument(_, index) => self
                .function
                .args
                .get_mut(index as usize)
                .map(|arg| &mut arg.name),
            Value::Instruction(_, id) => self
                .function
                .insts
                .get_mut(id.index())
                .filter(|inst| inst.produces_value())
                .map(|inst| &mut inst.name),
            _ => None,
        };
        let slot = slot.ok_or(IrError::NotNameable(value))?;
        *slot = Some(name.into());
        Ok(())
    }

    /// Add a basic block at the end of the function.
    pub fn append_block(&mut self, name: Option<&str>) -> BlockId {
        let id = BlockId::new(self.function.blocks.len());
        self.function.blocks.push(BasicBlock {
            name: name.map(str::to_owned),
            insts: Vec::new(),
        });
        id
    }

    /// Append subsequent instructions to `block`.
    pub fn position_at_end(&mut self, block: BlockId) -> Result<()> {
        self.check_block(block)?;
        self.cursor = Some(block);
        Ok(())
    }

    pub fn ret(&mut self, value: Option<Value>) -> Result<()> {
        let (ret, _) = self.function.ty.signature()?;
        let expected = ret.clone();
        match value {
            None if !expected.is_void() => {
                return Err(IrError::TypeMismatch {
                    expected,
                    actual: Type::Void,
                });
            }
            None => {}
            Some(value) => self.expect_type(value, &expected)?,
        }
        self.push(InstKind::Ret(value), Type::Void).map(|_| ())
    }

    pub fn jump(&mut self, target: BlockId) -> Result<()> {
        self.check_block(target)?;
        self.push(InstKind::Jump(target), Type::Void).map(|_| ())
    }

    pub fn branch(&mut self, cond: Value, on_true: BlockId, on_false: BlockId) -> Result<()> {
        self.expect_type(cond, &Type::i1())?;
        self.check_block(on_true)?;
        self.check_block(on_false)?;
        let kind = InstKind::Branch {
            cond,
            on_true,
            on_false,
        };
        self.push(kind, Type::Void).map(|_| ())
    }

    pub fn unreachable(&mut self) -> Result<()> {
        self.push(InstKind::Unreachable, Type::Void).map(|_| ())
    }

    pub fn cast(&mut self, op: CastOp, value: Value, to: Type) -> Result<Value> {
        to.validate()?;
        let from = self.value_type(value)?;
        if !op.accepts(&from, &to) {
            return Err(IrError::InvalidCast { op, from, to });
        }
        let kind = InstKind::Cast {
            op,
            value,
            to: to.clone(),
        };
        self.push(kind, to)
    }

    pub fn binop(&mut self, op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
        let ty = self.value_type(lhs)?;
        if !ty.is_int() {
            return Err(IrError::NotAnInteger(ty));
        }
        self.expect_type(rhs, &ty)?;
        self.push(InstKind::Binop { op, lhs, rhs }, ty)
    }

    pub fn icmp(&mut self, pred: IntPredicate, lhs: Value, rhs: Value) -> Result<Value> {
        let ty = self.value_type(lhs)?;
        if !ty.is_int() && !ty.is_pointer() {
            return Err(IrError::NotAnInteger(ty));
        }
        self.expect_type(rhs, &ty)?;
        self.push(InstKind::ICmp { pred, lhs, rhs }, Type::i1())
    }

    /// Check that every block ends with a terminator and add the function
    /// to the module.
    pub fn finish(self) -> Result<FuncId> {
        if self.function.blocks.is_empty() {
            return Err(IrError::EmptyFunction(self.function.name));
        }
        for (index, bb) in self.function.blocks.iter().enumerate() {
            if !self.is_terminated(bb) {
                return Err(IrError::UnterminatedBlock(BlockId::new(index)));
            }
        }
        self.module.functions.push(self.function);
        Ok(self.func)
    }

    fn is_terminated(&self, bb: &BasicBlock) -> bool {
        bb.insts
            .last()
            .is_some_and(|&id| self.function.insts[id.index()].kind.is_terminator())
    }

    fn check_block(&self, block: BlockId) -> Result<()> {
        if block.index() >= self.function.blocks.len() {
            return Err(IrError::UnknownBlock(block));
        }
        Ok(())
    }

    fn value_type(&self, value: Value) -> Result<Type> {
        match value.owner() {
            Some(func) if func == self.func => {
                local_type(&self.function, value).ok_or(IrError::UnknownValue(value))
            }
            Some(_) => Err(IrError::UnknownValue(value)),
            None => self.module.type_of(value),
        }
    }

    fn expect_type(&self, value: Value, expected: &Type) -> Result<()> {
        let actual = self.value_type(value)?;
        if actual != *expected {
            return Err(IrError::TypeMismatch {
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }

    fn push(&mut self, kind: InstKind, ty: Type) -> Result<Value> {
        let block = self.cursor.ok_or(IrError::NoInsertionBlock)?;
        let bb = &self.function.blocks[block.index()];
        if self.is_terminated(bb) {
            return Err(IrError::BlockTerminated(block));
        }

        let id = InstId::new(self.function.insts.len());
        self.function.insts.push(Instruction {
            kind,
            ty,
            name: None,
            block,
        });
        self.function.blocks[block.index()].insts.push(id);
        Ok(Value::Instruction(self.func, id))
    }
}
