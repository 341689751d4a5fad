use derive_more::Display;

/// Terminal reflection failure. A module that fails reflection records
/// exactly one of these and exposes nothing else.
///
/// The discriminants are the codes seen by callers on the other side of
/// a native boundary. Code 0 ("no error") and code 1 ("null module")
/// belong to that boundary and have no variant here.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum ReflectError {
    /// The byte stream is not a valid SPIR-V module.
    #[display(fmt = "invalid bytecode")]
    InvalidBytecode = 2,
    /// The entry point implements a shader stage outside the supported
    /// graphics stages.
    #[display(fmt = "invalid shader stage")]
    InvalidStage = 3,
    /// The module declares more than one push constant block.
    #[display(fmt = "multiple push constant blocks")]
    MultiplePushBlocks = 4,
    /// The module declares zero or several entry points.
    #[display(fmt = "module must declare exactly one entry point")]
    MultipleEntryPoints = 5,
    /// A descriptor has a type with no counterpart in the binding model.
    #[display(fmt = "unsupported binding type")]
    UnsupportedBindingType = 6,
    /// A descriptor type appears in a set that cannot hold it.
    #[display(fmt = "binding type invalid for its set")]
    InvalidBindingType = 7,
    /// An image binding is multisampled or has unsupported dims.
    #[display(fmt = "invalid image dims")]
    InvalidImageDims = 8,
    /// A descriptor set index is not below `MAX_SET_COUNT`.
    #[display(fmt = "binding set out of range")]
    BindingSetOutOfRange = 9,
    /// A descriptor slot index is not below `MAX_PER_SET_SLOTS`.
    #[display(fmt = "binding slot out of range")]
    BindingSlotOutOfRange = 10,
}

impl std::error::Error for ReflectError {}

impl ReflectError {
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// True for the error kinds that are attributed to a single
    /// `(set, slot)` declaration.
    pub fn is_binding_error(self) -> bool {
        use ReflectError::*;
        matches!(
            self,
            UnsupportedBindingType
                | InvalidBindingType
                | InvalidImageDims
                | BindingSetOutOfRange
                | BindingSlotOutOfRange
        )
    }
}

pub type Error = ReflectError;
pub type Result<T> = std::result::Result<T, Error>;

/// The raw `(set, slot)` of the declaration that rejected a module.
/// Values are as declared in the shader and may lie outside the binding
/// model.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
#[display(fmt = "(set = {}, binding = {})", set, slot)]
pub struct BindingLocation {
    pub set: u32,
    pub slot: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(ReflectError::InvalidBytecode.code(), 2);
        assert_eq!(ReflectError::MultipleEntryPoints.code(), 5);
        assert_eq!(ReflectError::BindingSlotOutOfRange.code(), 10);
    }

    #[test]
    fn binding_kinds() {
        assert!(ReflectError::InvalidImageDims.is_binding_error());
        assert!(ReflectError::BindingSetOutOfRange.is_binding_error());
        assert!(!ReflectError::InvalidStage.is_binding_error());
        assert!(!ReflectError::MultiplePushBlocks.is_binding_error());
    }

    #[test]
    fn display() {
        let loc = BindingLocation { set: 5, slot: 1 };
        assert_eq!(loc.to_string(), "(set = 5, binding = 1)");
        assert_eq!(
            ReflectError::InvalidBindingType.to_string(),
            "binding type invalid for its set",
        );
    }
}
