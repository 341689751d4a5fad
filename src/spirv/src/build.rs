use byteorder::{BigEndian, ByteOrder, LittleEndian};
use rspirv::{self, dr};
use rspirv::binary::{Consumer, ParseAction};
use spirv_headers as spv;

use crate::*;
use crate::data::{self, Id, Module, Type};

const MAGIC: u32 = 0x0723_0203;
const MAX_RESERVE: usize = 0x1000;

#[derive(Debug)]
struct RawModule {
    instructions: Vec<dr::Instruction>,
}

impl RawModule {
    fn new() -> Self {
        Self {
            instructions: Default::default(),
        }
    }
}

macro_rules! get_operand_variant {
    ($operand:expr, $variant:ident) => {
        match $operand {
            Some(&dr::Operand::$variant(ref val)) => Ok(val.clone()),
            _ => Err(ReflectError::InvalidBytecode),
        }
    }
}

macro_rules! parse_operand {
    ($operands:expr, $variant:ident) => {
        get_operand_variant!($operands.next(), $variant)?
    };
    ($operands:expr, $variant:ident*) => {
        $operands.map(|operand| get_operand_variant!(Some(operand), $variant))
            .collect::<Result<Vec<_>>>()?
    };
}

fn result_id(inst: &dr::Instruction) -> Result<Id> {
    inst.result_id.ok_or(ReflectError::InvalidBytecode)
}

fn raise_module(raw: &RawModule) -> Result<Module> {
    let mut module = Module::new();
    for inst in raw.instructions.iter() {
        raise_instruction(&mut module, inst)?;
    }
    Ok(module)
}

fn raise_instruction(module: &mut Module, inst: &dr::Instruction) -> Result<()> {
    let operands = &inst.operands;
    match inst.class.opcode {
        spv::Op::Name => apply_name(module, operands)?,
        spv::Op::Decorate => apply_decoration(module, operands)?,
        spv::Op::MemberDecorate => apply_member_decoration(module, operands)?,
        spv::Op::EntryPoint => raise_entry_point(module, operands)?,
        spv::Op::Variable => raise_variable(module, inst)?,
        spv::Op::Constant
        | spv::Op::SpecConstant
        | spv::Op::ConstantTrue
        | spv::Op::ConstantFalse
        | spv::Op::ConstantComposite
        | spv::Op::ConstantNull
        | spv::Op::SpecConstantTrue
        | spv::Op::SpecConstantFalse
        | spv::Op::SpecConstantComposite
        | spv::Op::SpecConstantOp => raise_constant(module, inst)?,
        _ if inst.class.opname.starts_with("Type") => raise_type(module, inst)?,
        _ => {},
    }
    Ok(())
}

fn apply_name(module: &mut Module, operands: &[dr::Operand]) -> Result<()> {
    let mut ops = operands.iter();
    let target = parse_operand!(ops, IdRef);
    let name = parse_operand!(ops, LiteralString);
    module.decorations.entry(target).or_default().name = Some(name);
    Ok(())
}

fn apply_decoration(module: &mut Module, operands: &[dr::Operand]) -> Result<()> {
    let mut ops = operands.iter();
    let target = parse_operand!(ops, IdRef);
    let decoration = parse_operand!(ops, Decoration);
    let decos = module.decorations.entry(target).or_default();
    match decoration {
        spv::Decoration::DescriptorSet => {
            decos.set = Some(parse_operand!(ops, LiteralInt32));
        },
        spv::Decoration::Binding => {
            decos.binding = Some(parse_operand!(ops, LiteralInt32));
        },
        spv::Decoration::ArrayStride => {
            decos.array_stride = Some(parse_operand!(ops, LiteralInt32));
        },
        spv::Decoration::Block => decos.block = true,
        spv::Decoration::BufferBlock => decos.buffer_block = true,
        _ => {},
    }
    Ok(())
}

fn apply_member_decoration(module: &mut Module, operands: &[dr::Operand]) ->
    Result<()>
{
    let mut ops = operands.iter();
    let target = parse_operand!(ops, IdRef);
    let member = parse_operand!(ops, LiteralInt32);
    let decoration = parse_operand!(ops, Decoration);
    let decos = module.member_decorations.entry((target, member)).or_default();
    match decoration {
        spv::Decoration::Offset => {
            decos.offset = Some(parse_operand!(ops, LiteralInt32));
        },
        spv::Decoration::MatrixStride => {
            decos.matrix_stride = Some(parse_operand!(ops, LiteralInt32));
        },
        spv::Decoration::RowMajor => decos.row_major = true,
        spv::Decoration::BuiltIn => decos.builtin = true,
        _ => {},
    }
    Ok(())
}

fn raise_entry_point(module: &mut Module, operands: &[dr::Operand]) -> Result<()> {
    let mut ops = operands.iter();
    let execution_model = parse_operand!(ops, ExecutionModel);
    let _function = parse_operand!(ops, IdRef);
    let name = parse_operand!(ops, LiteralString);
    module.entry_points.push(data::EntryPoint { execution_model, name });
    Ok(())
}

fn raise_variable(module: &mut Module, inst: &dr::Instruction) -> Result<()> {
    let mut ops = inst.operands.iter();
    let storage_class = parse_operand!(ops, StorageClass);
    if storage_class == spv::StorageClass::Function { return Ok(()); }
    module.variables.push(data::Variable {
        id: result_id(inst)?,
        ty: inst.result_type.ok_or(ReflectError::InvalidBytecode)?,
        storage_class,
    });
    Ok(())
}

fn raise_constant(module: &mut Module, inst: &dr::Instruction) -> Result<()> {
    let id = result_id(inst)?;
    let specialized = match inst.class.opcode {
        spv::Op::SpecConstant
        | spv::Op::SpecConstantTrue
        | spv::Op::SpecConstantFalse
        | spv::Op::SpecConstantComposite
        | spv::Op::SpecConstantOp => true,
        _ => false,
    };
    let value = match inst.class.opcode {
        spv::Op::Constant | spv::Op::SpecConstant => {
            match inst.operands.first() {
                Some(&dr::Operand::LiteralInt32(val)) => Some(val as u64),
                Some(&dr::Operand::LiteralInt64(val)) => Some(val),
                _ => None,
            }
        },
        _ => None,
    };
    module.constants.insert(id, data::Constant { value, specialized });
    Ok(())
}

fn raise_type(module: &mut Module, inst: &dr::Instruction) -> Result<()> {
    // OpTypeForwardPointer declares no result
    let id = match inst.result_id {
        Some(id) => id,
        None => return Ok(()),
    };
    let mut ops = inst.operands.iter();
    let ty = match inst.class.opcode {
        spv::Op::TypeVoid => Type::Void,
        spv::Op::TypeBool => Type::Bool,
        spv::Op::TypeInt => Type::Int { width: parse_operand!(ops, LiteralInt32) },
        spv::Op::TypeFloat => Type::Float { width: parse_operand!(ops, LiteralInt32) },
        spv::Op::TypeVector => Type::Vector {
            component: parse_operand!(ops, IdRef),
            count: parse_operand!(ops, LiteralInt32),
        },
        spv::Op::TypeMatrix => Type::Matrix {
            column: parse_operand!(ops, IdRef),
            count: parse_operand!(ops, LiteralInt32),
        },
        spv::Op::TypeImage => {
            let _sampled_type = parse_operand!(ops, IdRef);
            let dim = parse_operand!(ops, Dim);
            let _depth = parse_operand!(ops, LiteralInt32);
            let arrayed = parse_operand!(ops, LiteralInt32);
            let multisampled = parse_operand!(ops, LiteralInt32);
            let sampled = parse_operand!(ops, LiteralInt32);
            Type::Image(data::ImageType {
                dim,
                arrayed: arrayed != 0,
                multisampled: multisampled != 0,
                sampled,
            })
        },
        spv::Op::TypeSampler => Type::Sampler,
        spv::Op::TypeSampledImage => Type::SampledImage {
            image: parse_operand!(ops, IdRef),
        },
        spv::Op::TypeArray => Type::Array {
            elem: parse_operand!(ops, IdRef),
            length: parse_operand!(ops, IdRef),
        },
        spv::Op::TypeRuntimeArray => Type::RuntimeArray {
            elem: parse_operand!(ops, IdRef),
        },
        spv::Op::TypeStruct => Type::Struct {
            members: parse_operand!(ops, IdRef*),
        },
        spv::Op::TypePointer => Type::Pointer {
            storage_class: parse_operand!(ops, StorageClass),
            target: parse_operand!(ops, IdRef),
        },
        _ => Type::Other,
    };
    module.types.insert(id, ty);
    Ok(())
}

impl Consumer for RawModule {
    fn initialize(&mut self) -> ParseAction {
        ParseAction::Continue
    }

    fn finalize(&mut self) -> ParseAction {
        ParseAction::Continue
    }

    fn consume_header(&mut self, header: dr::ModuleHeader) -> ParseAction {
        // The bound comes from untrusted input
        self.instructions.reserve((header.bound as usize).min(MAX_RESERVE));
        ParseAction::Continue
    }

    fn consume_instruction(&mut self, inst: dr::Instruction) -> ParseAction {
        self.instructions.push(inst);
        ParseAction::Continue
    }
}

pub(crate) fn parse_words(words: &[u32]) -> Result<Module> {
    let mut raw = RawModule::new();
    rspirv::binary::parse_words(words, &mut raw)
        .map_err(|_| ReflectError::InvalidBytecode)?;
    raise_module(&raw)
}

/// Parses a module from bytes in either byte order, as given by the
/// magic number.
pub(crate) fn parse_bytes(bytes: &[u8]) -> Result<Module> {
    if bytes.len() < 4 || bytes.len() % 4 != 0 {
        return Err(ReflectError::InvalidBytecode);
    }
    let mut words = vec![0; bytes.len() / 4];
    if LittleEndian::read_u32(bytes) == MAGIC {
        LittleEndian::read_u32_into(bytes, &mut words);
    } else if BigEndian::read_u32(bytes) == MAGIC {
        BigEndian::read_u32_into(bytes, &mut words);
    } else {
        return Err(ReflectError::InvalidBytecode);
    }
    parse_words(&words)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [u32; 5] = [MAGIC, 0x0001_0000, 0, 1, 0];

    #[test]
    fn empty_module() {
        let module = parse_words(&HEADER).unwrap();
        assert!(module.entry_points.is_empty());
        assert!(module.variables.is_empty());
    }

    #[test]
    fn byte_order() {
        let words = [
            MAGIC, 0x0001_0000, 0, 2, 0,
            (5 << 16) | spv::Op::EntryPoint as u32,
            spv::ExecutionModel::Fragment as u32,
            1,
            0x6e69_616d, // "main"
            0,
        ];
        let mut le = vec![0; words.len() * 4];
        LittleEndian::write_u32_into(&words, &mut le);
        let mut be = vec![0; words.len() * 4];
        BigEndian::write_u32_into(&words, &mut be);
        for bytes in [le, be].iter() {
            let module = parse_bytes(bytes).unwrap();
            assert_eq!(module.entry_points.len(), 1);
            assert_eq!(module.entry_points[0].name, "main");
        }
    }

    #[test]
    fn malformed() {
        assert_eq!(parse_words(&[]).err(), Some(ReflectError::InvalidBytecode));
        assert_eq!(parse_bytes(&[]).err(), Some(ReflectError::InvalidBytecode));
        assert_eq!(parse_bytes(&[3, 2, 35]).err(), Some(ReflectError::InvalidBytecode));
        assert_eq!(
            parse_bytes(&[0xde, 0xad, 0xbe, 0xef]).err(),
            Some(ReflectError::InvalidBytecode),
        );
        // Truncated instruction
        let mut words = HEADER.to_vec();
        words.push((4 << 16) | spv::Op::TypeInt as u32);
        words.push(1);
        assert_eq!(parse_words(&words).err(), Some(ReflectError::InvalidBytecode));
    }
}
