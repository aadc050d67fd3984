mod bitmask;

pub use bitmask::{Bitmask, Iter};

/// A fieldless enum whose variants map to single bits of a mask.
///
/// Usually implemented with `#[derive(Bit)]` from `padbus-bit-derive`.
pub trait Bitable: Copy + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    fn bit(&self) -> u64;
    fn index(&self) -> u32;
}
