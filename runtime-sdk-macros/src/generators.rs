use std::collections::BTreeSet;

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

pub fn wrap_in_const(tokens: TokenStream) -> TokenStream {
    quote! {
        const _: () = {
            #tokens
        };
    }
}

/// Path used by generated code to refer to `evm_runtime_sdk` items.
///
/// The SDK itself cannot refer to its own crate name.
pub fn sdk_crate_path() -> syn::Path {
    let is_internal = std::env::var("CARGO_PKG_NAME")
        .map(|pkg_name| pkg_name == "evm-runtime-sdk")
        .unwrap_or_default();
    if is_internal {
        syn::parse_quote!(crate)
    } else {
        syn::parse_quote!(::evm_runtime_sdk)
    }
}

pub trait CodedVariant {
    /// The field in the helper attribute that yields the value provided by `code`.
    const FIELD_NAME: &'static str;

    /// The variant ident.
    fn ident(&self) -> &Ident;

    /// The code to which the variant should be converted.
    fn code(&self) -> Option<u32>;
}

/// Builds a `match` expression mapping every variant of an enum to its code.
///
/// Explicit codes must be unique unless `shared_codes` is set. Variants without an explicit code
/// take the next free number when `autonumber` is set.
pub fn enum_code_converter<V: CodedVariant>(
    enum_binding: &Ident,
    variants: &[&V],
    autonumber: bool,
    shared_codes: bool,
) -> syn::Result<TokenStream> {
    if variants.is_empty() {
        return Ok(quote!(0));
    }

    let mut match_arms = Vec::with_capacity(variants.len());
    let mut next_autonumber = 0u32;
    let mut reserved_numbers = BTreeSet::new();
    for variant in variants {
        if let Some(code) = variant.code() {
            reserved_numbers.insert(code);
        }
    }
    let mut used_numbers = BTreeSet::new();

    for variant in variants {
        let variant_ident = variant.ident();
        let code = match variant.code() {
            Some(code) => {
                if !used_numbers.insert(code) && !shared_codes {
                    return Err(syn::Error::new(
                        variant_ident.span(),
                        format!("code {} already used", code),
                    ));
                }
                code
            }
            None if autonumber => {
                while reserved_numbers.contains(&next_autonumber) {
                    next_autonumber += 1;
                }
                let code = next_autonumber;
                reserved_numbers.insert(code);
                used_numbers.insert(code);
                next_autonumber += 1;
                code
            }
            None => {
                return Err(syn::Error::new(
                    variant_ident.span(),
                    format!("missing `{}` for variant", V::FIELD_NAME),
                ));
            }
        };
        match_arms.push(quote!(Self::#variant_ident { .. } => #code,));
    }

    Ok(quote! {
        match #enum_binding {
            #(#match_arms)*
        }
    })
}

/// Parses the expression given as a string literal, defaulting to `MODULE_NAME`.
pub fn module_name_expr(lit: Option<&syn::LitStr>) -> syn::Result<syn::Expr> {
    match lit {
        Some(lit) => lit.parse::<syn::Expr>(),
        None => Ok(syn::parse_quote!(MODULE_NAME)),
    }
}

#[cfg(test)]
pub(crate) fn assert_same_tokens(actual: TokenStream, expected: syn::Stmt) {
    use quote::ToTokens;

    let actual: syn::Stmt = syn::parse2(actual).expect("derived code should parse");
    assert_eq!(
        actual.to_token_stream().to_string(),
        expected.to_token_stream().to_string()
    );
}
