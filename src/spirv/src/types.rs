use std::convert::TryFrom;

use derive_more::Display;
use enum_map::Enum;
use spirv_headers as spv;

use crate::*;

/// The graphics pipeline stage implemented by a module's entry point.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum ShaderStage {
    Vertex = 1,
    TessControl = 2,
    TessEval = 3,
    Geometry = 4,
    Fragment = 5,
}

impl TryFrom<spv::ExecutionModel> for ShaderStage {
    type Error = ();
    fn try_from(val: spv::ExecutionModel) -> std::result::Result<Self, Self::Error> {
        Ok(match val {
            spv::ExecutionModel::Vertex => Self::Vertex,
            spv::ExecutionModel::TessellationControl => Self::TessControl,
            spv::ExecutionModel::TessellationEvaluation => Self::TessEval,
            spv::ExecutionModel::Geometry => Self::Geometry,
            spv::ExecutionModel::Fragment => Self::Fragment,
            _ => return Err(()),
        })
    }
}

/// The "namespaces" of the binding model. Each holds `MAX_PER_SET_SLOTS`
/// slots and only admits certain binding types.
#[derive(Clone, Copy, Debug, Display, Enum, Eq, Hash, PartialEq)]
pub enum BindingSet {
    /// Uniform and storage buffers (set 0).
    Buffer,
    /// Samplers, sampled images and uniform texel buffers (set 1).
    ReadOnlyTexel,
    /// Storage images and storage texel buffers (set 2).
    ReadWriteTexel,
    /// Input attachments (set 3).
    InputAttachment,
}

impl BindingSet {
    pub const ALL: [BindingSet; MAX_SET_COUNT as usize] = [
        BindingSet::Buffer,
        BindingSet::ReadOnlyTexel,
        BindingSet::ReadWriteTexel,
        BindingSet::InputAttachment,
    ];

    /// The descriptor set index in `layout(set = N)`.
    #[inline]
    pub fn index(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for BindingSet {
    type Error = ReflectError;
    fn try_from(set: u32) -> Result<Self> {
        Self::ALL.get(set as usize).copied()
            .ok_or(ReflectError::BindingSetOutOfRange)
    }
}

/// Descriptor types supported by the binding model.
#[derive(Clone, Copy, Debug, Display, Enum, Eq, Hash, PartialEq)]
pub enum BindingType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
    InputAttachment,
}

impl BindingType {
    pub const ALL: [BindingType; 9] = [
        BindingType::Sampler,
        BindingType::CombinedImageSampler,
        BindingType::SampledImage,
        BindingType::StorageImage,
        BindingType::UniformTexelBuffer,
        BindingType::StorageTexelBuffer,
        BindingType::UniformBuffer,
        BindingType::StorageBuffer,
        BindingType::InputAttachment,
    ];

    /// Boundary code; 0 is reserved for "unknown".
    #[inline]
    pub fn code(self) -> u32 {
        self as u32 + 1
    }

    /// Uniform and storage buffers are backed by a block whose size is
    /// reflected.
    #[inline]
    pub fn is_block(self) -> bool {
        matches!(self, Self::UniformBuffer | Self::StorageBuffer)
    }

    /// Whether the binding carries image dimensionality.
    #[inline]
    pub fn has_image_dims(self) -> bool {
        !self.is_block() && self != Self::Sampler
    }
}

/// Dimensionality of an image-like binding.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum ImageDims {
    #[display(fmt = "1D")]
    E1D = 1,
    #[display(fmt = "1DArray")]
    E1DArray = 2,
    #[display(fmt = "2D")]
    E2D = 3,
    #[display(fmt = "2DArray")]
    E2DArray = 4,
    #[display(fmt = "3D")]
    E3D = 5,
    Cube = 6,
    CubeArray = 7,
    /// A uniform or storage texel buffer.
    Buffer = 8,
    /// A subpass input attachment.
    SubpassInput = 9,
}

/// A single validated descriptor binding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BindingInfo {
    pub(crate) name: String,
    pub(crate) set: BindingSet,
    pub(crate) slot: u32,
    pub(crate) ty: BindingType,
    pub(crate) array_size: u32,
    pub(crate) block_size: u32,
    pub(crate) image_dims: Option<ImageDims>,
}

impl BindingInfo {
    /// The declared resource name; empty if debug names were stripped.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&self) -> BindingSet {
        self.set
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn ty(&self) -> BindingType {
        self.ty
    }

    /// Total element count across all array dims, 0 if the binding is
    /// not an array, or `ARRAY_SIZE_UNKNOWN`.
    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    pub fn is_array(&self) -> bool {
        self.array_size != 0
    }

    /// True if the array length is a specialization constant or the
    /// array is runtime-sized.
    pub fn is_unsized_array(&self) -> bool {
        self.array_size == ARRAY_SIZE_UNKNOWN
    }

    /// Size in bytes of the backing block. Zero unless `ty().is_block()`.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn image_dims(&self) -> Option<ImageDims> {
        self.image_dims
    }
}
