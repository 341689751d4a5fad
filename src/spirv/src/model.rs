use enum_map::{enum_map, EnumMap};

use crate::*;

/// Assigns every binding type to the one set that may hold it.
///
/// The default partitioning puts everything that is only read through a
/// sampler or texel fetch in `ReadOnlyTexel` and everything that can be
/// written through image stores in `ReadWriteTexel`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BindingModel {
    sets: EnumMap<BindingType, BindingSet>,
}

impl Default for BindingModel {
    fn default() -> Self {
        use BindingSet as Set;
        use BindingType as Type;
        Self {
            sets: enum_map! {
                Type::Sampler => Set::ReadOnlyTexel,
                Type::CombinedImageSampler => Set::ReadOnlyTexel,
                Type::SampledImage => Set::ReadOnlyTexel,
                Type::StorageImage => Set::ReadWriteTexel,
                Type::UniformTexelBuffer => Set::ReadOnlyTexel,
                Type::StorageTexelBuffer => Set::ReadWriteTexel,
                Type::UniformBuffer => Set::Buffer,
                Type::StorageBuffer => Set::Buffer,
                Type::InputAttachment => Set::InputAttachment,
            },
        }
    }
}

impl BindingModel {
    pub fn new() -> Self {
        Default::default()
    }

    /// Moves `ty` to a different set.
    pub fn with_set(mut self, ty: BindingType, set: BindingSet) -> Self {
        self.sets[ty] = set;
        self
    }

    /// The set that `ty` must be declared in.
    #[inline]
    pub fn set_for(&self, ty: BindingType) -> BindingSet {
        self.sets[ty]
    }

    #[inline]
    pub fn is_legal(&self, ty: BindingType, set: BindingSet) -> bool {
        self.set_for(ty) == set
    }

    /// The types admitted by `set`.
    pub fn types_in(&self, set: BindingSet) -> impl Iterator<Item = BindingType> + '_ {
        self.sets.iter()
            .filter(move |&(_, &s)| s == set)
            .map(|(ty, _)| ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        use BindingSet as Set;
        use BindingType as Type;
        let model = BindingModel::default();
        let expected = [
            (Type::Sampler, Set::ReadOnlyTexel),
            (Type::CombinedImageSampler, Set::ReadOnlyTexel),
            (Type::SampledImage, Set::ReadOnlyTexel),
            (Type::StorageImage, Set::ReadWriteTexel),
            (Type::UniformTexelBuffer, Set::ReadOnlyTexel),
            (Type::StorageTexelBuffer, Set::ReadWriteTexel),
            (Type::UniformBuffer, Set::Buffer),
            (Type::StorageBuffer, Set::Buffer),
            (Type::InputAttachment, Set::InputAttachment),
        ];
        for &(ty, set) in expected.iter() {
            assert_eq!(model.set_for(ty), set, "{:?}", ty);
            for &other in Set::ALL.iter() {
                assert_eq!(model.is_legal(ty, other), other == set);
            }
        }
    }

    #[test]
    fn types_in_set() {
        let model = BindingModel::default();
        let buffers: Vec<_> = model.types_in(BindingSet::Buffer).collect();
        assert_eq!(
            buffers,
            [BindingType::UniformBuffer, BindingType::StorageBuffer],
        );
        let attachments: Vec<_> =
            model.types_in(BindingSet::InputAttachment).collect();
        assert_eq!(attachments, [BindingType::InputAttachment]);
    }

    #[test]
    fn repin() {
        let model = BindingModel::new()
            .with_set(BindingType::SampledImage, BindingSet::ReadWriteTexel);
        assert!(model.is_legal(BindingType::SampledImage, BindingSet::ReadWriteTexel));
        assert!(!model.is_legal(BindingType::SampledImage, BindingSet::ReadOnlyTexel));
        assert!(model.is_legal(BindingType::Sampler, BindingSet::ReadOnlyTexel));
    }
}
