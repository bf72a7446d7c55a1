use darling::{util::Flag, FromDeriveInput, FromVariant};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{DeriveInput, Ident};

use crate::generators::{self as gen, CodedVariant};

#[derive(FromDeriveInput)]
#[darling(supports(enum_any), attributes(sdk_error))]
struct Error {
    ident: Ident,

    data: darling::ast::Data<ErrorVariant, darling::util::Ignored>,

    /// Expression yielding the codespace. Defaults to `MODULE_NAME`.
    #[darling(default)]
    codespace: Option<syn::LitStr>,

    /// Whether to sequentially autonumber the error codes.
    #[darling(default)]
    autonumber: Flag,
}

#[derive(FromVariant)]
#[darling(attributes(sdk_error))]
struct ErrorVariant {
    ident: Ident,

    /// The explicit error code. Overrides any autonumber set on the error enum.
    #[darling(default)]
    code: Option<u32>,
}

impl CodedVariant for ErrorVariant {
    const FIELD_NAME: &'static str = "code";

    fn ident(&self) -> &Ident {
        &self.ident
    }

    fn code(&self) -> Option<u32> {
        self.code
    }
}

pub fn derive_error(input: DeriveInput) -> TokenStream {
    let error = match Error::from_derive_input(&input) {
        Ok(error) => error,
        Err(e) => return e.write_errors(),
    };

    let error_ty_ident = &error.ident;
    let codespace = match gen::module_name_expr(error.codespace.as_ref()) {
        Ok(expr) => expr,
        Err(e) => return e.to_compile_error(),
    };
    let variants = match error.data.as_ref().take_enum() {
        Some(variants) => variants,
        None => return quote!(),
    };
    // Errors wrapping the same registered error share its code.
    let code_converter = match gen::enum_code_converter(
        &format_ident!("self"),
        &variants,
        error.autonumber.is_present(),
        true,
    ) {
        Ok(converter) => converter,
        Err(e) => return e.to_compile_error(),
    };

    let sdk_crate = gen::sdk_crate_path();

    gen::wrap_in_const(quote! {
        impl #sdk_crate::error::Error for #error_ty_ident {
            fn codespace(&self) -> &str {
                #codespace
            }

            fn code(&self) -> u32 {
                #code_converter
            }
        }
    })
}
