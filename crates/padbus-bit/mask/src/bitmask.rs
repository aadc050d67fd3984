use std::marker::PhantomData;
use std::ops::{BitOr, BitOrAssign};

use crate::Bitable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bitmask<T: Bitable>(pub u64, PhantomData<T>);

impl<T: Bitable> Bitmask<T> {
    /// Create a new bitmask from a slice of values.
    pub fn new(values: &[T]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < values.len() {
            bits |= values[i].bit();
            i += 1;
        }
        Self(bits, PhantomData)
    }

    /// Create an empty bitmask.
    pub const fn empty() -> Self {
        Self(0, PhantomData)
    }

    /// Create a bitmask with every known value set.
    pub fn all() -> Self {
        Self::new(T::ALL)
    }

    /// Create a new bitmask from a raw value.
    ///
    /// Bits that do not belong to any value are kept as is.
    pub const fn from_value(value: u64) -> Self {
        Self(value, PhantomData)
    }

    /// Create a new bitmask from a raw value, dropping unknown bits.
    pub fn from_value_truncate(value: u64) -> Self {
        Self(value & Self::all().0, PhantomData)
    }

    /// Raw value of the bitmask.
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Check if the bitmask contains a specific value.
    #[inline]
    pub fn contains(&self, bit: T) -> bool {
        (self.0 & bit.bit()) != 0
    }

    /// Insert a value to the bitmask.
    #[inline]
    pub fn insert(&mut self, bit: T) {
        self.0 |= bit.bit();
    }

    /// Remove a value from the bitmask.
    #[inline]
    pub fn remove(&mut self, bit: T) {
        self.0 &= !bit.bit();
    }

    /// Insert or remove a value depending on `on`.
    #[inline]
    pub fn set(&mut self, bit: T, on: bool) {
        if on {
            self.insert(bit);
        } else {
            self.remove(bit);
        }
    }

    /// Check if the bitmask is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Check if the bitmask is subset of another bitmask.
    #[inline]
    pub fn is_subset(&self, other: &Bitmask<T>) -> bool {
        self.0 & other.0 == self.0
    }

    /// Check if the bitmask is superset of another bitmask.
    #[inline]
    pub fn is_superset(&self, other: &Bitmask<T>) -> bool {
        other.is_subset(self)
    }

    /// Count the number of bits set in the bitmask.
    #[inline]
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Iterate over the values set in the bitmask, in declaration order.
    pub fn iter(&self) -> Iter<T> {
        Iter {
            mask: *self,
            pos: 0,
        }
    }
}

impl<T: Bitable> Default for Bitmask<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Bitable> From<T> for Bitmask<T> {
    fn from(value: T) -> Self {
        Self(value.bit(), PhantomData)
    }
}

impl<T: Bitable> FromIterator<T> for Bitmask<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut mask = Self::empty();
        for value in iter {
            mask.insert(value);
        }
        mask
    }
}

impl<T: Bitable> BitOr for Bitmask<T> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0, PhantomData)
    }
}

impl<T: Bitable> BitOr<T> for Bitmask<T> {
    type Output = Self;

    fn bitor(self, rhs: T) -> Self {
        Self(self.0 | rhs.bit(), PhantomData)
    }
}

impl<T: Bitable> BitOrAssign<T> for Bitmask<T> {
    fn bitor_assign(&mut self, rhs: T) {
        self.insert(rhs);
    }
}

impl<T: Bitable> IntoIterator for Bitmask<T> {
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Iter<T> {
        self.iter()
    }
}

/// Iterator over the values of a [`Bitmask`].
#[derive(Debug, Clone)]
pub struct Iter<T: Bitable> {
    mask: Bitmask<T>,
    pos: usize,
}

impl<T: Bitable> Iterator for Iter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while let Some(value) = T::ALL.get(self.pos) {
            self.pos += 1;
            if self.mask.contains(*value) {
                return Some(*value);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::Bitmask;
    use crate::Bitable;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestFlag {
        A = 0,
        B = 1,
        C = 2,
        D = 5,
    }

    impl Bitable for TestFlag {
        const ALL: &'static [Self] =
            &[TestFlag::A, TestFlag::B, TestFlag::C, TestFlag::D];

        fn bit(&self) -> u64 {
            1u64 << (*self as u64)
        }

        fn index(&self) -> u32 {
            *self as u32
        }
    }

    #[test]
    fn empty_creates_no_bits_set() {
        let mask = Bitmask::<TestFlag>::empty();
        for flag in TestFlag::ALL {
            assert!(!mask.contains(*flag));
        }
        assert_eq!(mask, Bitmask::default());
    }

    #[test]
    fn new_sets_bits_from_slice() {
        let mask = Bitmask::new(&[TestFlag::A, TestFlag::C]);
        assert!(mask.contains(TestFlag::A));
        assert!(!mask.contains(TestFlag::B));
        assert!(mask.contains(TestFlag::C));
        assert!(!mask.contains(TestFlag::D));
    }

    #[test]
    fn new_handles_duplicates() {
        let mask = Bitmask::new(&[TestFlag::B, TestFlag::B, TestFlag::D]);
        assert_eq!(mask.count(), 2);
        assert_eq!(mask.value(), 0b10_0010);
    }

    #[test]
    fn insert_and_remove_toggle_bits() {
        let mut mask = Bitmask::empty();

        mask.insert(TestFlag::A);
        assert!(mask.contains(TestFlag::A));
        assert!(!mask.contains(TestFlag::B));

        mask.set(TestFlag::B, true);
        assert!(mask.contains(TestFlag::A));
        assert!(mask.contains(TestFlag::B));

        mask.remove(TestFlag::A);
        mask.set(TestFlag::B, false);
        assert!(mask.is_empty());
    }

    #[test]
    fn is_subset_works() {
        let empty = Bitmask::<TestFlag>::empty();
        let a = Bitmask::new(&[TestFlag::A]);
        let b = Bitmask::new(&[TestFlag::B]);
        let ab = Bitmask::new(&[TestFlag::A, TestFlag::B]);

        assert!(empty.is_subset(&empty));
        assert!(empty.is_subset(&a));
        assert!(a.is_subset(&ab));
        assert!(ab.is_superset(&a));
        assert!(!ab.is_subset(&a));
        assert!(!a.is_subset(&b));
    }

    #[test]
    fn iter_recovers_composed_values() {
        let mask = Bitmask::from(TestFlag::D) | TestFlag::A;
        let values: Vec<_> = mask.iter().collect();
        assert_eq!(values, vec![TestFlag::A, TestFlag::D]);

        let rebuilt: Bitmask<TestFlag> = values.into_iter().collect();
        assert_eq!(rebuilt, mask);
    }

    #[test]
    fn truncate_drops_unknown_bits() {
        let mask = Bitmask::<TestFlag>::from_value_truncate(0b1111_1111);
        assert_eq!(mask.value(), 0b10_0111);
        assert_eq!(Bitmask::<TestFlag>::all(), mask);
    }
}
