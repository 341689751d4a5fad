//! Reflection of SPIR-V shader modules against a fixed slot-based
//! binding model.
//!
//! Resources are partitioned into four binding sets, each with eight
//! slots:
//!
//! - (0) Buffers: uniform and storage buffers.
//! - (1) Read-only texel objects: samplers, sampled images and uniform
//!   texel buffers.
//! - (2) Read-write texel objects: storage images and storage texel
//!   buffers.
//! - (3) Input attachments.
//!
//! A [`ReflectModule`] is built once from a SPIR-V binary and is either
//! fully valid or permanently rejected with a single [`ReflectError`].

use spirv_headers as spv;

mod build;
mod data;
mod descriptor;
mod error;
mod model;
mod reflect;
mod table;
mod types;

pub use error::*;
pub use model::*;
pub use reflect::*;
pub use table::SlotMask;
pub use types::*;

pub use spv::ExecutionModel;

/// Number of binding sets in the binding model.
pub const MAX_SET_COUNT: u32 = 4;
/// Number of slots in each binding set.
pub const MAX_PER_SET_SLOTS: u32 = 8;
/// Reported as the array size of a binding whose length is given by a
/// specialization constant or is only known at runtime.
pub const ARRAY_SIZE_UNKNOWN: u32 = u32::MAX;
