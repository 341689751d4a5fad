//! Low-level descriptor and push constant extraction. Nothing here
//! knows about the binding model; that is validated on top of these
//! records.

use fnv::FnvHashMap as HashMap;
use log::debug;
use smallvec::SmallVec;
use spirv_headers as spv;

use crate::*;
use crate::data::{self, Id, ImageType, MemberDecorationSet, Module, Type};

// Guards against type cycles in malformed modules.
const MAX_TYPE_DEPTH: u32 = 64;

/// Descriptor type as determined from the shader's declarations alone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum DescriptorKind {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
    InputAttachment,
    /// Acceleration structures, plain-data uniforms and anything else
    /// that can't be expressed as a Vulkan descriptor type we know.
    Other,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Descriptor {
    pub(crate) name: String,
    pub(crate) set: u32,
    pub(crate) binding: u32,
    pub(crate) kind: DescriptorKind,
    /// Array extents, outermost first. Unknown extents are
    /// `ARRAY_SIZE_UNKNOWN`.
    pub(crate) dims: SmallVec<[u32; 4]>,
    pub(crate) block_size: u32,
    pub(crate) image: Option<ImageType>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PushBlock {
    pub(crate) name: String,
    pub(crate) size: u32,
}

/// Everything the binding-model validation needs from a module.
#[derive(Debug, Default)]
pub(crate) struct ShaderInfo {
    pub(crate) entry_points: Vec<data::EntryPoint>,
    pub(crate) push_blocks: Vec<PushBlock>,
    pub(crate) descriptors: Vec<Descriptor>,
}

impl ShaderInfo {
    pub(crate) fn from_words(words: &[u32]) -> Result<Self> {
        Self::from_module(build::parse_words(words)?)
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_module(build::parse_bytes(bytes)?)
    }

    fn from_module(mut module: Module) -> Result<Self> {
        let entry_points = std::mem::take(&mut module.entry_points);
        let mut layout = BlockLayout::new(&module);
        let mut push_blocks = Vec::new();
        let mut descriptors = Vec::new();
        for var in module.variables.iter() {
            match var.storage_class {
                spv::StorageClass::PushConstant => {
                    push_blocks.push(reflect_push_block(&mut layout, var)?);
                },
                spv::StorageClass::UniformConstant
                | spv::StorageClass::Uniform
                | spv::StorageClass::StorageBuffer => {
                    if let Some(desc) = reflect_descriptor(&mut layout, var)? {
                        descriptors.push(desc);
                    }
                },
                _ => {},
            }
        }
        Ok(Self {
            entry_points,
            push_blocks,
            descriptors,
        })
    }
}

fn pointee(module: &Module, var: &data::Variable) -> Result<Id> {
    match *module.ty(var.ty)? {
        Type::Pointer { target, .. } => Ok(target),
        _ => Err(ReflectError::InvalidBytecode),
    }
}

fn reflect_push_block(layout: &mut BlockLayout, var: &data::Variable) ->
    Result<PushBlock>
{
    let module = layout.module;
    let ty = pointee(module, var)?;
    Ok(PushBlock {
        name: module.name(var.id).unwrap_or_default().to_owned(),
        size: layout.size_of(ty, Default::default())?,
    })
}

fn reflect_descriptor(layout: &mut BlockLayout, var: &data::Variable) ->
    Result<Option<Descriptor>>
{
    let module = layout.module;
    let name = module.name(var.id).unwrap_or_default();
    let decos = module.decorations(var.id);
    let (set, binding) = match decos.map(|d| (d.set, d.binding)) {
        Some((Some(set), Some(binding))) => (set, binding),
        _ => {
            debug!(
                "skipping {:?} variable {} ({:?}): no set/binding decorations",
                var.storage_class, var.id, name,
            );
            return Ok(None);
        },
    };

    let mut dims = SmallVec::new();
    let mut ty = pointee(module, var)?;
    for depth in 0.. {
        if depth >= MAX_TYPE_DEPTH {
            return Err(ReflectError::InvalidBytecode);
        }
        ty = match *module.ty(ty)? {
            Type::Array { elem, length } => {
                dims.push(descriptor_extent(module, length)?);
                elem
            },
            Type::RuntimeArray { elem } => {
                dims.push(ARRAY_SIZE_UNKNOWN);
                elem
            },
            _ => break,
        };
    }

    let mut desc = Descriptor {
        name: name.to_owned(),
        set,
        binding,
        kind: DescriptorKind::Other,
        dims,
        block_size: 0,
        image: None,
    };
    match (var.storage_class, module.ty(ty)?) {
        (spv::StorageClass::UniformConstant, &Type::Sampler) => {
            desc.kind = DescriptorKind::Sampler;
        },
        (spv::StorageClass::UniformConstant, &Type::SampledImage { image }) => {
            desc.kind = DescriptorKind::CombinedImageSampler;
            desc.image = match *module.ty(image)? {
                Type::Image(image) => Some(image),
                _ => return Err(ReflectError::InvalidBytecode),
            };
        },
        (spv::StorageClass::UniformConstant, &Type::Image(image)) => {
            desc.kind = image_kind(&image);
            desc.image = Some(image);
        },
        (spv::StorageClass::Uniform, &Type::Struct { .. }) => {
            let decos = module.decorations(ty);
            desc.kind = if decos.map_or(false, |d| d.block) {
                DescriptorKind::UniformBuffer
            } else if decos.map_or(false, |d| d.buffer_block) {
                DescriptorKind::StorageBuffer
            } else {
                DescriptorKind::Other
            };
        },
        (spv::StorageClass::StorageBuffer, &Type::Struct { .. }) => {
            desc.kind = DescriptorKind::StorageBuffer;
        },
        _ => {},
    }
    if let DescriptorKind::UniformBuffer | DescriptorKind::StorageBuffer = desc.kind {
        desc.block_size = layout.size_of(ty, Default::default())?;
    }

    Ok(Some(desc))
}

fn image_kind(image: &ImageType) -> DescriptorKind {
    match (image.dim, image.sampled) {
        (spv::Dim::DimSubpassData, _) => DescriptorKind::InputAttachment,
        (spv::Dim::DimBuffer, 1) => DescriptorKind::UniformTexelBuffer,
        (spv::Dim::DimBuffer, _) => DescriptorKind::StorageTexelBuffer,
        (_, 1) => DescriptorKind::SampledImage,
        (_, _) => DescriptorKind::StorageImage,
    }
}

/// Extent of a descriptor array dimension. Specialization constants
/// can be overridden at pipeline creation, so their extent is unknown.
fn descriptor_extent(module: &Module, length: Id) -> Result<u32> {
    let constant = module.constant(length)?;
    if constant.specialized {
        return Ok(ARRAY_SIZE_UNKNOWN);
    }
    let value = constant.value.ok_or(ReflectError::InvalidBytecode)?;
    Ok(if value >= ARRAY_SIZE_UNKNOWN as u64 { ARRAY_SIZE_UNKNOWN } else { value as u32 })
}

/// Extent of an array inside a block. Uses the default value of a
/// specialization constant.
fn block_extent(module: &Module, length: Id) -> Result<u32> {
    let constant = module.constant(length)?;
    match constant.value {
        Some(value) => Ok(value.min(u32::MAX as u64) as u32),
        // OpSpecConstantOp has no default to fall back on
        None if constant.specialized => Ok(0),
        None => Err(ReflectError::InvalidBytecode),
    }
}

/// Matrix layout decorations of the struct member being measured.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
struct MatrixLayout {
    stride: Option<u32>,
    row_major: bool,
}

impl MatrixLayout {
    fn of(member: Option<&MemberDecorationSet>) -> Self {
        member.map_or_else(Default::default, |m| Self {
            stride: m.matrix_stride,
            row_major: m.row_major,
        })
    }
}

/// Computes the size in bytes of types as laid out in a block. Sizes
/// are memoized so that types shared by many members are only walked
/// once.
#[derive(Debug)]
struct BlockLayout<'a> {
    module: &'a Module,
    sizes: HashMap<(Id, MatrixLayout), u32>,
}

impl<'a> BlockLayout<'a> {
    fn new(module: &'a Module) -> Self {
        Self { module, sizes: Default::default() }
    }

    fn size_of(&mut self, id: Id, matrix: MatrixLayout) -> Result<u32> {
        self.size_at(id, matrix, 0)
    }

    fn size_at(&mut self, id: Id, matrix: MatrixLayout, depth: u32) -> Result<u32> {
        if let Some(&size) = self.sizes.get(&(id, matrix)) {
            return Ok(size);
        }
        if depth >= MAX_TYPE_DEPTH {
            return Err(ReflectError::InvalidBytecode);
        }
        let size = self.measure(id, matrix, depth + 1)?;
        self.sizes.insert((id, matrix), size);
        Ok(size)
    }

    fn measure(&mut self, id: Id, matrix: MatrixLayout, depth: u32) -> Result<u32> {
        let module = self.module;
        let plain = MatrixLayout::default();
        Ok(match *module.ty(id)? {
            Type::Bool => 4,
            Type::Int { width } | Type::Float { width } => width / 8,
            Type::Vector { component, count } =>
                self.size_at(component, plain, depth)?.saturating_mul(count),
            Type::Matrix { column, count } => match matrix.stride {
                Some(stride) if matrix.row_major => {
                    let rows = match *module.ty(column)? {
                        Type::Vector { count, .. } => count,
                        _ => return Err(ReflectError::InvalidBytecode),
                    };
                    stride.saturating_mul(rows)
                },
                Some(stride) => stride.saturating_mul(count),
                None => self.size_at(column, plain, depth)?.saturating_mul(count),
            },
            Type::Array { elem, length } => {
                let stride = match module.decorations(id).and_then(|d| d.array_stride) {
                    Some(stride) => stride,
                    None => self.size_at(elem, matrix, depth)?,
                };
                stride.saturating_mul(block_extent(module, length)?)
            },
            Type::RuntimeArray { .. } => 0,
            Type::Struct { ref members } => {
                let mut end: u32 = 0;
                for (i, &ty) in members.iter().enumerate() {
                    let decos = module.member_decorations(id, i as u32);
                    if decos.map_or(false, |d| d.builtin) { continue; }
                    let offset = decos.and_then(|d| d.offset).unwrap_or(end);
                    let size = self.size_at(ty, MatrixLayout::of(decos), depth)?;
                    end = end.max(offset.saturating_add(size));
                }
                end
            },
            Type::Pointer { .. } => 8,
            Type::Void
            | Type::Image(_)
            | Type::Sampler
            | Type::SampledImage { .. }
            | Type::Other => 0,
        })
    }
}
