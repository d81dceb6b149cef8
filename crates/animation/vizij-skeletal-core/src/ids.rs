//! Opaque ids for engine-owned entities and the sequences that hand them out.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

entity_id!(
    /// Identifies a skeleton; poses and clips refer to it by this id.
    SkeletonId
);
entity_id!(ClipId);
entity_id!(CharacterId);
entity_id!(PlaybackId);

/// Monotonic sequence for one id type. Ids are never reused.
#[derive(Debug)]
pub struct IdSequence<T> {
    next: u32,
    _id: PhantomData<fn() -> T>,
}

impl<T> Default for IdSequence<T> {
    fn default() -> Self {
        Self {
            next: 0,
            _id: PhantomData,
        }
    }
}

impl<T: From<u32>> IdSequence<T> {
    #[inline]
    pub fn next_id(&mut self) -> T {
        let raw = self.next;
        self.next = self.next.wrapping_add(1);
        T::from(raw)
    }

    /// Number of ids issued so far.
    #[inline]
    pub fn issued(&self) -> u32 {
        self.next
    }
}

/// One sequence per entity kind, so each kind counts from zero.
#[derive(Default, Debug)]
pub struct IdAllocator {
    pub skeletons: IdSequence<SkeletonId>,
    pub clips: IdSequence<ClipId>,
    pub characters: IdSequence<CharacterId>,
    pub playbacks: IdSequence<PlaybackId>,
}
