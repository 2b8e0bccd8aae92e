//! `#[route]` attribute implementation.
//!
//! The annotated function becomes a unit struct of the same name implementing
//! `IntoView<R>`, where `R` is the function's return type. The function body moves
//! into `into_view` unchanged; parameter names, `#[constraint]` and `#[rename]`
//! markers and every stacked `#[route]` are turned into `View` builder calls.
//!
//! | Attribute                       | Where      | Effect                              |
//! |---------------------------------|------------|-------------------------------------|
//! | `#[route("GET", "/p/<int:id>")]` | function   | one route; may be repeated          |
//! | `#[route("/p")]`                | function   | shorthand for `GET`                 |
//! | `#[constraint(expr)]`           | parameter  | `Expr` constraint, and-combined     |
//! | `#[rename("X-Token")]`          | parameter  | name used for lookup                |

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, FnArg, ItemFn, LitStr, Pat, ReturnType, Token};

// ============================================================================
// Parsed input
// ============================================================================

struct RouteArgs {
    method: LitStr,
    template: LitStr,
}

struct Param {
    name: String,
    constraints: Vec<syn::Expr>,
}

// ============================================================================
// Entry point
// ============================================================================

pub fn expand(args: TokenStream, mut item: ItemFn) -> syn::Result<TokenStream> {
    if let Some(asyncness) = &item.sig.asyncness {
        return Err(syn::Error::new(
            asyncness.span(),
            "#[route] handlers are synchronous functions",
        ));
    }
    if !item.sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.sig.generics.span(),
            "#[route] handlers cannot be generic",
        ));
    }

    let mut routes = vec![parse_route_args(args)?];
    let mut kept = Vec::new();
    for attr in std::mem::take(&mut item.attrs) {
        if is_route_attr(&attr) {
            routes.push(attr.parse_args_with(parse_route_tokens)?);
        } else {
            kept.push(attr);
        }
    }
    item.attrs = kept;

    let params = item
        .sig
        .inputs
        .iter_mut()
        .map(take_param)
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(generate(item, &routes, &params))
}

fn is_route_attr(attr: &Attribute) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "route")
}

fn parse_route_args(args: TokenStream) -> syn::Result<RouteArgs> {
    syn::parse::Parser::parse2(parse_route_tokens, args)
}

fn parse_route_tokens(input: syn::parse::ParseStream) -> syn::Result<RouteArgs> {
    let span = input.span();
    let lits: Punctuated<LitStr, Token![,]> = Punctuated::parse_terminated(input)?;
    let mut lits = lits.into_iter();
    match (lits.next(), lits.next(), lits.next()) {
        (Some(template), None, None) => Ok(RouteArgs {
            method: LitStr::new("GET", template.span()),
            template,
        }),
        (Some(method), Some(template), None) => Ok(RouteArgs { method, template }),
        _ => Err(syn::Error::new(
            span,
            "expected #[route(\"METHOD\", \"/template\")] or #[route(\"/template\")]",
        )),
    }
}

/// Reads a parameter's name and strips the helper attributes from it.
fn take_param(arg: &mut FnArg) -> syn::Result<Param> {
    let FnArg::Typed(typed) = arg else {
        return Err(syn::Error::new(
            arg.span(),
            "#[route] handlers cannot take `self`",
        ));
    };

    let mut rename = None;
    let mut constraints = Vec::new();
    let mut kept = Vec::new();
    for attr in std::mem::take(&mut typed.attrs) {
        if attr.path().is_ident("constraint") {
            constraints.push(attr.parse_args::<syn::Expr>()?);
        } else if attr.path().is_ident("rename") {
            rename = Some(attr.parse_args::<LitStr>()?.value());
        } else {
            kept.push(attr);
        }
    }
    typed.attrs = kept;

    let name = match rename {
        Some(name) => name,
        None => binding_name(&typed.pat)?,
    };
    Ok(Param { name, constraints })
}

/// `id` in `id: i64` or in `Header(id): Header<String>`.
fn binding_name(pat: &Pat) -> syn::Result<String> {
    match pat {
        Pat::Ident(ident) => Ok(ident.ident.unraw().to_string()),
        Pat::TupleStruct(tuple) if tuple.elems.len() == 1 => binding_name(&tuple.elems[0]),
        Pat::Paren(paren) => binding_name(&paren.pat),
        _ => Err(syn::Error::new(
            pat.span(),
            "cannot infer a parameter name from this pattern, add #[rename(\"name\")]",
        )),
    }
}

// ============================================================================
// Code generation
// ============================================================================

fn generate(item: ItemFn, routes: &[RouteArgs], params: &[Param]) -> TokenStream {
    let ItemFn {
        attrs,
        vis,
        mut sig,
        block,
    } = item;

    let name = sig.ident.clone();
    let view_name = name.unraw().to_string();
    let handler = format_ident!("__routerific_{}", view_name);
    sig.ident = handler.clone();

    let ret = match &sig.output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => quote! { #ty },
    };

    let (docs, fn_attrs): (Vec<_>, Vec<_>) =
        attrs.into_iter().partition(|attr| attr.path().is_ident("doc"));

    let count = params.len();
    let names = params.iter().map(|param| &param.name);
    let constraints = params.iter().flat_map(|param| {
        let name = &param.name;
        param.constraints.iter().map(move |expr| {
            quote! {
                .constrain(#name, {
                    #[allow(unused_imports)]
                    use ::routerific::core::Expr;
                    #expr
                })
            }
        })
    });
    let route_calls = routes.iter().map(|route| {
        let method = &route.method;
        let template = &route.template;
        quote! { .route(#method, #template) }
    });

    quote! {
        #(#docs)*
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy)]
        #vis struct #name;

        impl ::routerific::framework::IntoView<#ret> for #name {
            fn into_view(self) -> ::routerific::framework::View<#ret> {
                #(#fn_attrs)*
                #sig #block

                let names: [&str; #count] = [#(#names),*];
                ::routerific::framework::View::new(#view_name, #handler)
                    .params(names)
                    #(#constraints)*
                    #(#route_calls)*
            }
        }
    }
}
