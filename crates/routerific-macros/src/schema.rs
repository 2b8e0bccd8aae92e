//! `#[derive(Schema)]` implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Path};

pub fn derive_schema(input: &DeriveInput) -> syn::Result<TokenStream> {
    let validate = parse_validate(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let validate_fn = validate.map(|path| {
        quote! {
            fn validate(&self) -> ::core::result::Result<(), ::std::string::String> {
                #path(self)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::routerific::framework::Schema for #name #ty_generics #where_clause {
            #validate_fn
        }

        impl #impl_generics ::routerific::framework::Parameter for #name #ty_generics #where_clause {
            fn declared() -> ::routerific::framework::DeclaredType {
                ::routerific::framework::DeclaredType::schema::<Self>()
            }
        }
    })
}

/// Reads `#[schema(validate = path)]`.
fn parse_validate(input: &DeriveInput) -> syn::Result<Option<Path>> {
    let mut validate = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("schema") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("validate") {
                validate = Some(meta.value()?.parse::<Path>()?);
                Ok(())
            } else {
                Err(meta.error("unknown schema option, expected `validate`"))
            }
        })?;
    }
    Ok(validate)
}
