use std::convert::TryFrom;

use log::{debug, trace};
use spirv_headers as spv;

use crate::*;
use crate::data::ImageType;
use crate::descriptor::{Descriptor, DescriptorKind, ShaderInfo};
use crate::table::BindingTable;

/// Reflection info for a single-entry-point graphics shader, validated
/// against the binding model.
///
/// Construction never fails outright: a module that doesn't fit the
/// binding model is kept in a rejected state which reports its error
/// and nothing else. Every query on a rejected module returns `None`,
/// zero or an empty mask.
#[derive(Debug)]
pub struct ReflectModule {
    state: State,
}

#[derive(Debug)]
enum State {
    Valid(Reflection),
    Rejected(Rejection),
}

#[derive(Debug)]
struct Reflection {
    stage: ShaderStage,
    entry_point: String,
    push_size: u32,
    bindings: BindingTable,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Rejection {
    error: ReflectError,
    location: Option<BindingLocation>,
}

impl From<ReflectError> for Rejection {
    fn from(error: ReflectError) -> Self {
        Self { error, location: None }
    }
}

impl ReflectModule {
    /// Reflects a module from SPIR-V words using the default binding
    /// model.
    pub fn new(code: &[u32]) -> Self {
        Self::with_model(code, &Default::default())
    }

    pub fn with_model(code: &[u32], model: &BindingModel) -> Self {
        trace!("ReflectModule::new(code: [{} words])", code.len());
        Self::from_shader(ShaderInfo::from_words(code), model)
    }

    /// Reflects a module from raw bytes in either byte order.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_bytes_with_model(bytes, &Default::default())
    }

    pub fn from_bytes_with_model(bytes: &[u8], model: &BindingModel) -> Self {
        trace!("ReflectModule::from_bytes(bytes: [{} bytes])", bytes.len());
        Self::from_shader(ShaderInfo::from_bytes(bytes), model)
    }

    fn from_shader(shader: Result<ShaderInfo>, model: &BindingModel) -> Self {
        let res = shader.map_err(Rejection::from)
            .and_then(|shader| reflect(&shader, model));
        let state = match res {
            Ok(reflection) => State::Valid(reflection),
            Err(rejection) => {
                match rejection.location {
                    Some(loc) => debug!(
                        "rejected shader module: {} at {}",
                        rejection.error, loc,
                    ),
                    None => debug!("rejected shader module: {}", rejection.error),
                }
                State::Rejected(rejection)
            },
        };
        Self { state }
    }

    fn valid(&self) -> Option<&Reflection> {
        match self.state {
            State::Valid(ref reflection) => Some(reflection),
            State::Rejected(_) => None,
        }
    }

    /// The error that rejected this module, or `None` if it is valid.
    pub fn error(&self) -> Option<ReflectError> {
        match self.state {
            State::Valid(_) => None,
            State::Rejected(ref rejection) => Some(rejection.error),
        }
    }

    #[inline]
    pub fn has_error(&self) -> bool {
        self.error().is_some()
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.has_error()
    }

    pub fn check(&self) -> Result<()> {
        self.error().map_or(Ok(()), Err)
    }

    /// The declaration at fault if the module was rejected with a
    /// binding error.
    pub fn binding_error(&self) -> Option<BindingLocation> {
        match self.state {
            State::Valid(_) => None,
            State::Rejected(ref rejection) => rejection.location,
        }
    }

    pub fn stage(&self) -> Option<ShaderStage> {
        Some(self.valid()?.stage)
    }

    pub fn entry_point(&self) -> Option<&str> {
        Some(self.valid()?.entry_point.as_str())
    }

    /// Size in bytes of the push constant block, or 0 if there is none.
    pub fn push_size(&self) -> u32 {
        self.valid().map_or(0, |r| r.push_size)
    }

    /// The occupied slots of `set`.
    pub fn set_mask(&self, set: BindingSet) -> SlotMask {
        self.valid().map_or(SlotMask::empty(), |r| r.bindings.mask(set))
    }

    pub fn binding(&self, set: BindingSet, slot: u32) -> Option<&BindingInfo> {
        self.valid()?.bindings.get(set, slot)
    }

    /// The bindings in `set`, ordered by slot.
    pub fn bindings(&self, set: BindingSet) -> impl Iterator<Item = &BindingInfo> + '_ {
        self.valid().into_iter()
            .flat_map(move |r| r.bindings.iter_set(set))
    }

    pub fn binding_count(&self) -> usize {
        self.valid().map_or(0, |r| r.bindings.len())
    }
}

fn reflect(shader: &ShaderInfo, model: &BindingModel) ->
    std::result::Result<Reflection, Rejection>
{
    let (stage, entry_point) = reflect_entry_point(shader)?;
    let push_size = reflect_push_size(shader)?;

    let mut bindings = BindingTable::new();
    for desc in shader.descriptors.iter() {
        let info = parse_binding(desc, model).map_err(|error| Rejection {
            error,
            location: Some(BindingLocation { set: desc.set, slot: desc.binding }),
        })?;
        trace!(
            "reflect: {:?} {:?} at ({:?}, {}), array size {}",
            info.name, info.ty, info.set, info.slot, info.array_size,
        );
        bindings.insert(info);
    }

    Ok(Reflection {
        stage,
        entry_point: entry_point.to_owned(),
        push_size,
        bindings,
    })
}

// Zero entry points is reported the same as several.
fn reflect_entry_point(shader: &ShaderInfo) -> Result<(ShaderStage, &str)> {
    let (first, rest) = shader.entry_points.split_first()
        .ok_or(ReflectError::MultipleEntryPoints)?;
    let stage = ShaderStage::try_from(first.execution_model)
        .map_err(|_| ReflectError::InvalidStage)?;
    if !rest.is_empty() {
        return Err(ReflectError::MultipleEntryPoints);
    }
    Ok((stage, &first.name))
}

fn reflect_push_size(shader: &ShaderInfo) -> Result<u32> {
    match shader.push_blocks[..] {
        [] => Ok(0),
        [ref block] => {
            trace!("reflect: push block {:?}, {} bytes", block.name, block.size);
            Ok(block.size)
        },
        _ => Err(ReflectError::MultiplePushBlocks),
    }
}

fn parse_binding(desc: &Descriptor, model: &BindingModel) -> Result<BindingInfo> {
    let set = BindingSet::try_from(desc.set)?;
    let slot = desc.binding;
    if slot >= MAX_PER_SET_SLOTS {
        return Err(ReflectError::BindingSlotOutOfRange);
    }

    let ty = binding_type(desc.kind).ok_or(ReflectError::UnsupportedBindingType)?;
    if !model.is_legal(ty, set) {
        return Err(ReflectError::InvalidBindingType);
    }

    let block_size = if ty.is_block() { desc.block_size } else { 0 };
    let image_dims = if ty.has_image_dims() {
        let dims = desc.image.as_ref().and_then(image_dims);
        Some(dims.ok_or(ReflectError::InvalidImageDims)?)
    } else {
        None
    };

    Ok(BindingInfo {
        name: desc.name.clone(),
        set,
        slot,
        ty,
        array_size: array_size(&desc.dims),
        block_size,
        image_dims,
    })
}

fn binding_type(kind: DescriptorKind) -> Option<BindingType> {
    use BindingType as Type;
    use DescriptorKind as Kind;
    Some(match kind {
        Kind::Sampler => Type::Sampler,
        Kind::CombinedImageSampler => Type::CombinedImageSampler,
        Kind::SampledImage => Type::SampledImage,
        Kind::StorageImage => Type::StorageImage,
        Kind::UniformTexelBuffer => Type::UniformTexelBuffer,
        Kind::StorageTexelBuffer => Type::StorageTexelBuffer,
        Kind::UniformBuffer => Type::UniformBuffer,
        Kind::StorageBuffer => Type::StorageBuffer,
        Kind::InputAttachment => Type::InputAttachment,
        Kind::Other => return None,
    })
}

/// Total element count of an arrayed binding. Any unknown extent makes
/// the whole size unknown.
fn array_size(dims: &[u32]) -> u32 {
    if dims.is_empty() {
        return 0;
    }
    let mut total: u32 = 1;
    for &dim in dims {
        if dim == ARRAY_SIZE_UNKNOWN {
            return ARRAY_SIZE_UNKNOWN;
        }
        total = total.saturating_mul(dim);
    }
    total
}

fn image_dims(image: &ImageType) -> Option<ImageDims> {
    if image.multisampled {
        return None;
    }
    Some(match (image.dim, image.arrayed) {
        (spv::Dim::Dim1D, false) => ImageDims::E1D,
        (spv::Dim::Dim1D, true) => ImageDims::E1DArray,
        (spv::Dim::Dim2D, false) => ImageDims::E2D,
        (spv::Dim::Dim2D, true) => ImageDims::E2DArray,
        (spv::Dim::Dim3D, _) => ImageDims::E3D,
        (spv::Dim::DimCube, false) => ImageDims::Cube,
        (spv::Dim::DimCube, true) => ImageDims::CubeArray,
        (spv::Dim::DimBuffer, _) => ImageDims::Buffer,
        (spv::Dim::DimSubpassData, _) => ImageDims::SubpassInput,
        _ => return None,
    })
}
