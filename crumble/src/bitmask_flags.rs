use num_traits::{One, PrimInt};

use crate::constants::COLLISION_COLLECTION_COUNT;

/// Trait implemented by values that address a single bit of a flag set.
///
/// You choose the backing integer type via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: Ensure your `bit_index()` is < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container over any primitive integer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }

    pub fn count(&self) -> u32 {
        self.bits.count_ones()
    }

    pub fn clear(&mut self) {
        self.bits = T::zero();
    }
}

/// One of the rigid-body collision collections (layers) an object can sit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionCollection(u8);

impl CollisionCollection {
    /// Returns `None` for indices past the last collection.
    pub fn new(index: u8) -> Option<Self> {
        (index < COLLISION_COLLECTION_COUNT).then_some(Self(index))
    }

    pub fn index(&self) -> u8 {
        self.0
    }
}

impl FlagBitmask for CollisionCollection {
    type Storage = u32;

    fn bit_index(&self) -> u8 {
        self.0
    }
}

/// The set of collision collections a rigid body participates in.
pub type CollisionCollections = BitmaskFlags<u32>;

impl CollisionCollections {
    /// Collection 0 only, which is where new rigid bodies land by default.
    pub fn first_only() -> Self {
        Self::new(1)
    }

    /// Iterate the active collections in ascending order.
    pub fn active(&self) -> impl Iterator<Item = CollisionCollection> + '_ {
        (0..COLLISION_COLLECTION_COUNT)
            .filter_map(CollisionCollection::new)
            .filter(|cc| self.has(*cc))
    }
}
