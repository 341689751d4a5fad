use bitflags::bitflags;
use enum_map::EnumMap;
use log::trace;
use more_asserts::assert_lt;

use crate::*;

bitflags! {
    /// Which slots of a binding set are occupied.
    #[derive(Default)]
    pub struct SlotMask: u32 {
        const SLOT_0 = 1 << 0;
        const SLOT_1 = 1 << 1;
        const SLOT_2 = 1 << 2;
        const SLOT_3 = 1 << 3;
        const SLOT_4 = 1 << 4;
        const SLOT_5 = 1 << 5;
        const SLOT_6 = 1 << 6;
        const SLOT_7 = 1 << 7;
    }
}

impl SlotMask {
    /// The flag for a single slot; empty if `slot` is out of range.
    #[inline]
    pub fn slot(slot: u32) -> Self {
        if slot < MAX_PER_SET_SLOTS {
            Self::from_bits_truncate(1 << slot)
        } else {
            Self::empty()
        }
    }

    #[inline]
    pub fn has_slot(self, slot: u32) -> bool {
        slot < MAX_PER_SET_SLOTS && self.contains(Self::slot(slot))
    }

    /// Occupied slot indices in ascending order.
    pub fn slots(self) -> impl Iterator<Item = u32> {
        (0..MAX_PER_SET_SLOTS).filter(move |&slot| self.has_slot(slot))
    }

    pub fn count(self) -> u32 {
        self.bits().count_ones()
    }
}

type SetSlots = [Option<BindingInfo>; MAX_PER_SET_SLOTS as usize];

/// Fixed-capacity storage for one module's bindings, one entry per
/// `(set, slot)`.
#[derive(Debug, Default)]
pub(crate) struct BindingTable {
    slots: EnumMap<BindingSet, SetSlots>,
    masks: EnumMap<BindingSet, SlotMask>,
}

impl BindingTable {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Stores `info` at its own location, replacing any binding
    /// previously declared there.
    pub(crate) fn insert(&mut self, info: BindingInfo) {
        let (set, slot) = (info.set, info.slot);
        assert_lt!(slot, MAX_PER_SET_SLOTS);
        let entry = &mut self.slots[set][slot as usize];
        if let Some(old) = entry.as_ref() {
            trace!(
                "BindingTable::insert: {:?} slot {} redeclared ({:?} -> {:?})",
                set, slot, old.name, info.name,
            );
        }
        *entry = Some(info);
        self.masks[set].insert(SlotMask::slot(slot));
    }

    #[inline]
    pub(crate) fn get(&self, set: BindingSet, slot: u32) -> Option<&BindingInfo> {
        self.slots[set].get(slot as usize)?.as_ref()
    }

    #[inline]
    pub(crate) fn mask(&self, set: BindingSet) -> SlotMask {
        self.masks[set]
    }

    pub(crate) fn iter_set(&self, set: BindingSet) ->
        impl Iterator<Item = &BindingInfo> + '_
    {
        self.slots[set].iter().filter_map(Option::as_ref)
    }

    pub(crate) fn len(&self) -> usize {
        self.masks.values().map(|mask| mask.count() as usize).sum()
    }
}
