use darling::{util::Flag, FromDeriveInput, FromVariant};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{DeriveInput, Ident};

use crate::generators::{self as gen, CodedVariant};

#[derive(FromDeriveInput)]
#[darling(supports(enum_any), attributes(sdk_event))]
struct Event {
    ident: Ident,

    data: darling::ast::Data<EventVariant, darling::util::Ignored>,

    /// Expression yielding the module name. Defaults to `MODULE_NAME`.
    #[darling(default)]
    module_name: Option<syn::LitStr>,

    /// Whether to sequentially autonumber the event codes.
    #[darling(default)]
    autonumber: Flag,
}

#[derive(FromVariant)]
#[darling(attributes(sdk_event))]
struct EventVariant {
    ident: Ident,

    /// The explicit event code. Overrides any autonumber set on the event enum.
    #[darling(default)]
    code: Option<u32>,
}

impl CodedVariant for EventVariant {
    const FIELD_NAME: &'static str = "code";

    fn ident(&self) -> &Ident {
        &self.ident
    }

    fn code(&self) -> Option<u32> {
        self.code
    }
}

pub fn derive_event(input: DeriveInput) -> TokenStream {
    let event = match Event::from_derive_input(&input) {
        Ok(event) => event,
        Err(e) => return e.write_errors(),
    };

    let event_ty_ident = &event.ident;
    let module_name = match gen::module_name_expr(event.module_name.as_ref()) {
        Ok(expr) => expr,
        Err(e) => return e.to_compile_error(),
    };
    let variants = match event.data.as_ref().take_enum() {
        Some(variants) => variants,
        None => return quote!(),
    };
    let code_converter = match gen::enum_code_converter(
        &format_ident!("self"),
        &variants,
        event.autonumber.is_present(),
        false,
    ) {
        Ok(converter) => converter,
        Err(e) => return e.to_compile_error(),
    };

    let sdk_crate = gen::sdk_crate_path();

    gen::wrap_in_const(quote! {
        use #sdk_crate::cbor;

        impl #sdk_crate::event::Event for #event_ty_ident {
            fn module_name() -> &'static str {
                #module_name
            }

            fn code(&self) -> u32 {
                #code_converter
            }

            fn value(&self) -> cbor::Value {
                cbor::to_value(self.clone())
            }
        }
    })
}

#[cfg(test)]
mod tests {
    #[test]
    fn generate_event_impl_auto() {
        let expected: syn::Stmt = syn::parse_quote!(
            const _: () = {
                use ::evm_runtime_sdk::cbor;
                impl ::evm_runtime_sdk::event::Event for MainEvent {
                    fn module_name() -> &'static str {
                        MODULE_NAME
                    }
                    fn code(&self) -> u32 {
                        match self {
                            Self::Event0 { .. } => 0u32,
                            Self::Event2 { .. } => 2u32,
                            Self::Event1 { .. } => 1u32,
                        }
                    }
                    fn value(&self) -> cbor::Value {
                        cbor::to_value(self.clone())
                    }
                }
            };
        );

        let input: syn::DeriveInput = syn::parse_quote!(
            #[derive(Event)]
            #[sdk_event(autonumber)]
            pub enum MainEvent {
                Event0,
                #[sdk_event(code = 2)]
                Event2 {
                    payload: Vec<u8>,
                },
                Event1(String),
            }
        );
        crate::generators::assert_same_tokens(super::derive_event(input), expected);
    }

    #[test]
    fn generate_event_impl_manual() {
        let expected: syn::Stmt = syn::parse_quote!(
            const _: () = {
                use ::evm_runtime_sdk::cbor;
                impl ::evm_runtime_sdk::event::Event for MainEvent {
                    fn module_name() -> &'static str {
                        THE_MODULE_NAME
                    }
                    fn code(&self) -> u32 {
                        match self {
                            Self::Event1 { .. } => 1u32,
                        }
                    }
                    fn value(&self) -> cbor::Value {
                        cbor::to_value(self.clone())
                    }
                }
            };
        );

        let input: syn::DeriveInput = syn::parse_quote!(
            #[derive(Event)]
            #[sdk_event(module_name = "THE_MODULE_NAME")]
            pub enum MainEvent {
                #[sdk_event(code = 1)]
                Event1 { payload: Vec<u8> },
            }
        );
        crate::generators::assert_same_tokens(super::derive_event(input), expected);
    }

    #[test]
    fn reject_duplicate_event_codes() {
        let input: syn::DeriveInput = syn::parse_quote!(
            #[derive(Event)]
            pub enum MainEvent {
                #[sdk_event(code = 1)]
                Event1,
                #[sdk_event(code = 1)]
                Event2,
            }
        );
        let derived = super::derive_event(input).to_string();
        assert!(derived.contains("compile_error"));
        assert!(derived.contains("code 1 already used"));
    }
}
