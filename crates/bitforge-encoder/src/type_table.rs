//! Type numbering.
//!
//! Every type referenced by the module gets an index in the TYPE block.
//! Contained types are numbered before the types that contain them, so
//! every record only refers to earlier entries.

use indexmap::IndexSet;

use bitforge_ir::{InstKind, Module, Type};

use crate::encoding::index_width;
use crate::{EncodeError, Result};

#[derive(Debug, Default)]
pub struct TypeTable {
    types: IndexSet<Type>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every type `module` refers to, in first-use order.
    pub fn collect(module: &Module) -> Self {
        let mut table = Self::new();

        for global in module.globals() {
            table.add(&global.value_type().clone().ptr());
        }
        for decl in module.declarations() {
            table.add(decl.ty());
            table.add(&decl.ty().clone().ptr());
        }
        for function in module.functions() {
            table.add(function.ty());
            table.add(&function.ty().clone().ptr());
        }
        for (_, constant) in module.constants() {
            table.add(&constant.ty());
        }
        for function in module.functions() {
            for (_, inst) in function.body() {
                if inst.produces_value() {
                    table.add(inst.ty());
                }
                if let InstKind::Cast { to, .. } = inst.kind() {
                    table.add(to);
                }
            }
        }

        tracing::debug!(types = table.len(), "collected types");
        table
    }

    /// Add `ty` and everything it contains; returns its index.
    pub fn add(&mut self, ty: &Type) -> u64 {
        if let Some(index) = self.types.get_index_of(ty) {
            return index as u64;
        }
        for child in ty.children() {
            self.add(child);
        }
        let (index, _) = self.types.insert_full(ty.clone());
        index as u64
    }

    pub fn get(&self, ty: &Type) -> Result<u64> {
        self.types
            .get_index_of(ty)
            .map(|index| index as u64)
            .ok_or_else(|| EncodeError::UnknownType(ty.clone()))
    }

    /// Types in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Type> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Width of fixed-width type index operands.
    pub fn index_width(&self) -> u32 {
        index_width(self.types.len())
    }
}
