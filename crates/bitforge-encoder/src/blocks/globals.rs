use bitforge_bitstream::BitStream;
use bitforge_ir::{CallingConv, Linkage, Module, Type, UnnamedAddr, Value};

use crate::constants::module_code;
use crate::encoding::{alignment, calling_conv, linkage, unnamed_addr};
use crate::{Enumerator, Result, StringTable, StrtabRef, TypeTable};

/// GLOBALVAR and FUNCTION records of the module block.
///
/// Names go to the string table in record order: global variables, then
/// declarations, then defined functions.
#[derive(Debug)]
pub struct GlobalsBlock<'a> {
    module: &'a Module,
    enumerator: &'a Enumerator,
    types: &'a TypeTable,
}

/// Fields shared by declaration and definition records.
struct FunctionFields<'t> {
    name: StrtabRef,
    ty: &'t Type,
    calling_conv: CallingConv,
    is_proto: bool,
    linkage: Linkage,
    unnamed_addr: UnnamedAddr,
}

impl<'a> GlobalsBlock<'a> {
    pub fn new(module: &'a Module, enumerator: &'a Enumerator, types: &'a TypeTable) -> Self {
        Self {
            module,
            enumerator,
            types,
        }
    }

    pub fn build(&self, strtab: &mut StringTable, stream: &mut BitStream) -> Result<()> {
        for global in self.module.globals() {
            let name = strtab.add(global.name());
            let ty = self.types.get(&global.value_type().clone().ptr())?;
            let init = match global.initializer() {
                Some(id) => u64::from(self.enumerator.get(Value::Constant(id))?) + 1,
                None => 0,
            };
            let attributes = global.attributes().map_or(0, |group| u64::from(group) + 1);

            // [strtab offset, strtab size, pointer type, isconst, initid,
            //  linkage, alignment, section, visibility, threadlocal,
            //  unnamed_addr, externally_initialized, dllstorageclass, comdat,
            //  attributes, preemption]
            let record = [
                name.offset,
                name.size,
                ty,
                u64::from(global.is_const()),
                init,
                linkage(global.linkage()),
                alignment(global.alignment()),
                0,
                0,
                0,
                unnamed_addr(global.unnamed_addr()),
                0,
                0,
                0,
                attributes,
                0,
            ];
            stream.write_unabbreviated_record(module_code::GLOBALVAR, &record)?;
        }

        for decl in self.module.declarations() {
            self.write_function(
                stream,
                FunctionFields {
                    name: strtab.add(decl.name()),
                    ty: decl.ty(),
                    calling_conv: decl.calling_conv(),
                    is_proto: true,
                    linkage: decl.linkage(),
                    unnamed_addr: decl.unnamed_addr(),
                },
            )?;
        }

        for function in self.module.functions() {
            self.write_function(
                stream,
                FunctionFields {
                    name: strtab.add(function.name()),
                    ty: function.ty(),
                    calling_conv: function.calling_conv(),
                    is_proto: false,
                    linkage: function.linkage(),
                    unnamed_addr: function.unnamed_addr(),
                },
            )?;
        }

        tracing::trace!(
            globals = self.module.globals().len(),
            declarations = self.module.declarations().len(),
            functions = self.module.functions().len(),
            "wrote global records"
        );
        Ok(())
    }

    fn write_function(&self, stream: &mut BitStream, fields: FunctionFields<'_>) -> Result<()> {
        // [strtab offset, strtab size, type, callingconv, isproto, linkage,
        //  paramattr, alignment, section, visibility, gc, unnamed_addr,
        //  prologuedata, dllstorageclass, comdat, prefixdata, personalityfn,
        //  preemption]
        let record = [
            fields.name.offset,
            fields.name.size,
            self.types.get(fields.ty)?,
            calling_conv(fields.calling_conv),
            u64::from(fields.is_proto),
            linkage(fields.linkage),
            0,
            0,
            0,
            0,
            0,
            unnamed_addr(fields.unnamed_addr),
            0,
            0,
            0,
            0,
            0,
            0,
        ];
        stream.write_unabbreviated_record(module_code::FUNCTION, &record)?;
        Ok(())
    }
}
