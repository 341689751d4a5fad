use derivative::Derivative;
use fnv::FnvHashMap as HashMap;
use spirv_headers as spv;

use crate::*;

pub(crate) type Id = u32;

/// Id-indexed view of the module-level declarations that reflection
/// cares about.
#[derive(Debug, Default)]
pub(crate) struct Module {
    pub(crate) types: HashMap<Id, Type>,
    pub(crate) constants: HashMap<Id, Constant>,
    pub(crate) decorations: HashMap<Id, DecorationSet>,
    pub(crate) member_decorations: HashMap<(Id, u32), MemberDecorationSet>,
    /// Module-scope variables in declaration order.
    pub(crate) variables: Vec<Variable>,
    /// Entry points in declaration order.
    pub(crate) entry_points: Vec<EntryPoint>,
}

#[derive(Debug, Default)]
pub(crate) struct DecorationSet {
    pub(crate) name: Option<String>,
    pub(crate) set: Option<u32>,
    pub(crate) binding: Option<u32>,
    pub(crate) block: bool,
    pub(crate) buffer_block: bool,
    pub(crate) array_stride: Option<u32>,
}

#[derive(Debug, Default)]
pub(crate) struct MemberDecorationSet {
    pub(crate) offset: Option<u32>,
    pub(crate) matrix_stride: Option<u32>,
    pub(crate) row_major: bool,
    pub(crate) builtin: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ImageType {
    pub(crate) dim: spv::Dim,
    pub(crate) arrayed: bool,
    pub(crate) multisampled: bool,
    /// 1 if used with a sampler, 2 if used for storage, 0 if unknown.
    pub(crate) sampled: u32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Type {
    Void,
    Bool,
    Int { width: u32 },
    Float { width: u32 },
    Vector { component: Id, count: u32 },
    Matrix { column: Id, count: u32 },
    Image(ImageType),
    Sampler,
    SampledImage { image: Id },
    Array { elem: Id, length: Id },
    RuntimeArray { elem: Id },
    Struct { members: Vec<Id> },
    Pointer { storage_class: spv::StorageClass, target: Id },
    /// Any other type declaration, e.g. functions, opaque types or
    /// acceleration structures.
    Other,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Constant {
    /// The literal value, or the default value of a specialization
    /// constant. `None` for non-integer and composite constants.
    pub(crate) value: Option<u64>,
    pub(crate) specialized: bool,
}

#[derive(Debug, Derivative)]
#[derivative(Default)]
pub(crate) struct Variable {
    pub(crate) id: Id,
    /// Pointer type of the variable.
    pub(crate) ty: Id,
    #[derivative(Default(value = "spv::StorageClass::UniformConstant"))]
    pub(crate) storage_class: spv::StorageClass,
}

#[derive(Debug, Derivative)]
#[derivative(Default)]
pub(crate) struct EntryPoint {
    #[derivative(Default(value = "spv::ExecutionModel::Vertex"))]
    pub(crate) execution_model: spv::ExecutionModel,
    pub(crate) name: String,
}

impl Module {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Looks up a type declaration; a dangling reference means the
    /// module is malformed.
    pub(crate) fn ty(&self, id: Id) -> Result<&Type> {
        self.types.get(&id).ok_or(ReflectError::InvalidBytecode)
    }

    pub(crate) fn constant(&self, id: Id) -> Result<Constant> {
        self.constants.get(&id).copied()
            .ok_or(ReflectError::InvalidBytecode)
    }

    pub(crate) fn decorations(&self, id: Id) -> Option<&DecorationSet> {
        self.decorations.get(&id)
    }

    pub(crate) fn member_decorations(&self, id: Id, member: u32) ->
        Option<&MemberDecorationSet>
    {
        self.member_decorations.get(&(id, member))
    }

    pub(crate) fn name(&self, id: Id) -> Option<&str> {
        Some(self.decorations(id)?.name.as_ref()?)
    }
}
