use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Expr, ExprLit, Fields, Lit};

pub(crate) fn handle_derive_bit(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = input.ident;

    let Data::Enum(data) = input.data else {
        return Err(syn::Error::new(
            name.span(),
            "Bit can be derived only for enums",
        ));
    };

    // Indices follow C-like discriminant rules: an explicit `= N` resets the
    // counter, following variants continue from N + 1.
    let mut next: u64 = 0;
    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Bit supports only fieldless enum variants",
            ));
        }
        if let Some((_, expr)) = &variant.discriminant {
            next = parse_index(expr)?;
        }
        if next >= 64 {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "bit index must be below 64",
            ));
        }
        variants.push((variant.ident, next));
        next += 1;
    }

    let arms = variants.iter().map(|(v, idx)| {
        quote! { #name::#v => 1u64 << #idx }
    });
    let all = variants.iter().map(|(v, _)| quote! { #name::#v });

    Ok(quote! {
        impl ::padbus_bit_mask::Bitable for #name {
            const ALL: &'static [Self] = &[ #( #all, )* ];

            #[inline]
            fn bit(&self) -> u64 {
                match self { #( #arms, )* }
            }

            #[inline]
            fn index(&self) -> u32 { self.bit().trailing_zeros() }
        }
    })
}

fn parse_index(expr: &Expr) -> syn::Result<u64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse::<u64>(),
        _ => Err(syn::Error::new_spanned(
            expr,
            "Bit discriminants must be integer literals",
        )),
    }
}
