mod derive;

use proc_macro::TokenStream;

use crate::derive::handle_derive_bit;

/// Implements `padbus_bit_mask::Bitable` for a fieldless enum.
///
/// Variant `n` maps to bit `1 << n`. An explicit discriminant sets the bit
/// index of that variant, which leaves reserved gaps between bits.
#[proc_macro_derive(Bit)]
pub fn derive_bit(input: TokenStream) -> TokenStream {
    handle_derive_bit(input)
}
