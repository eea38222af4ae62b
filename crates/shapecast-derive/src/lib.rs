// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, Attribute, Data, DataEnum, DeriveInput, Expr, ExprLit, Fields, Generics,
    Ident, Lit, LitInt, LitStr, Member, Path,
};

/// Container-level `#[inspect(...)]` options.
#[derive(Default)]
struct ContainerAttrs {
    version: Option<u32>,
    describe: Option<Path>,
    legacy: Option<Path>,
    construct: Option<Path>,
    construct_latest: Option<Path>,
    default: bool,
    after_construct: Option<Path>,
}

impl ContainerAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("inspect")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("version") {
                    let lit: LitInt = meta.value()?.parse()?;
                    parsed.version = Some(lit.base10_parse()?);
                } else if meta.path.is_ident("describe") {
                    parsed.describe = Some(parse_path(&meta)?);
                } else if meta.path.is_ident("legacy") {
                    parsed.legacy = Some(parse_path(&meta)?);
                } else if meta.path.is_ident("construct") {
                    parsed.construct = Some(parse_path(&meta)?);
                } else if meta.path.is_ident("construct_latest") {
                    parsed.construct_latest = Some(parse_path(&meta)?);
                } else if meta.path.is_ident("default") {
                    parsed.default = true;
                } else if meta.path.is_ident("after_construct") {
                    parsed.after_construct = Some(parse_path(&meta)?);
                } else {
                    return Err(meta.error("unknown inspect container attribute"));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }

    fn is_empty(&self) -> bool {
        self.version.is_none()
            && self.describe.is_none()
            && self.legacy.is_none()
            && self.construct.is_none()
            && self.construct_latest.is_none()
            && !self.default
            && self.after_construct.is_none()
    }

    fn self_describing(&self) -> bool {
        self.version.is_some() || self.describe.is_some() || self.legacy.is_some()
    }

    /// Builder calls for the declared hooks, in a fixed order.
    fn hooks(&self) -> TokenStream2 {
        let mut hooks = TokenStream2::new();
        if let Some(version) = self.version {
            hooks.extend(quote! { .self_describing(#version) });
        }
        if let Some(path) = &self.describe {
            hooks.extend(quote! { .describe_with(#path) });
        }
        if let Some(path) = &self.legacy {
            hooks.extend(quote! { .legacy_with(#path) });
        }
        if let Some(path) = &self.construct {
            hooks.extend(quote! { .construct_with(#path) });
        }
        if let Some(path) = &self.construct_latest {
            hooks.extend(quote! { .construct_latest_with(#path) });
        }
        if self.default {
            hooks.extend(quote! { .default_with(<Self as ::core::default::Default>::default) });
        }
        if let Some(path) = &self.after_construct {
            hooks.extend(quote! { .after_construct(#path) });
        }
        hooks
    }
}

/// Attribute values are written as strings: `describe = "Self::walk"`.
fn parse_path(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<Path> {
    let lit: LitStr = meta.value()?.parse()?;
    lit.parse()
}

/// Field-level `#[inspect(...)]` options.
#[derive(Default)]
struct FieldAttrs {
    readonly: bool,
    rename: Option<String>,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("inspect")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("readonly") || meta.path.is_ident("skip") {
                    parsed.readonly = true;
                } else if meta.path.is_ident("rename") {
                    let lit: LitStr = meta.value()?.parse()?;
                    parsed.rename = Some(lit.value());
                } else {
                    return Err(meta.error("unknown inspect field attribute"));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

/// `#[derive(Inspect)]`: generates the `shapecast::Inspect` shape of a type.
///
/// Supports:
/// - Structs with named, tuple or no fields: a record shape with one member
///   per field in declaration order
/// - Fieldless enums: an integral shape over the `#[repr]` type (default `i32`).
///   Discriminants travel as `i64`, so a `#[repr(u64)]` variant above
///   `i64::MAX` is rejected at compile time.
///
/// Container attributes: `version = N`, `describe = "path"`,
/// `legacy = "path"`, `construct = "path"`, `construct_latest = "path"`,
/// `default`, `after_construct = "path"`.
///
/// Field attributes: `readonly` (alias `skip`), `rename = "name"`.
///
/// Example:
/// ```ignore
/// use shapecast::Inspect;
///
/// #[derive(Inspect)]
/// struct Frame {
///     seq: u64,
///     #[inspect(rename = "payload")]
///     data: Vec<u8>,
///     #[inspect(readonly)]
///     checksum: u32,
/// }
/// ```
#[proc_macro_derive(Inspect, attributes(inspect))]
pub fn derive_inspect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let expanded = match &input.data {
        Data::Struct(data) => expand_struct(&input, &data.fields),
        Data::Enum(data) => expand_enum(&input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "unions cannot derive Inspect",
        )),
    };
    expanded
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Generics with an `Inspect` bound added to every type parameter.
fn bounded(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    let params: Vec<Ident> = generics.type_params().map(|p| p.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause
            .predicates
            .push(syn::parse_quote!(#param: ::shapecast::Inspect));
    }
    generics
}

fn expand_struct(input: &DeriveInput, fields: &Fields) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let container = ContainerAttrs::parse(&input.attrs)?;
    let generics = bounded(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut members = Vec::new();
    let mut assembled = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let attrs = FieldAttrs::parse(&field.attrs)?;
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(syn::Index::from(index)),
        };
        let label = attrs.rename.unwrap_or_else(|| match &field.ident {
            Some(ident) => ident.to_string().trim_start_matches("r#").to_string(),
            None => index.to_string(),
        });
        let ty = &field.ty;

        if attrs.readonly {
            members.push(quote! { .readonly_field(#label) });
            assembled.push(quote! { #member: ::core::default::Default::default() });
        } else {
            members.push(quote! { .field::<#ty>(#label, |value: &mut Self| &mut value.#member) });
            assembled.push(quote! { #member: inspector.create_member::<#ty>(#label)? });
        }
    }

    let hooks = container.hooks();
    // Field-wise assembly only applies to records walked structurally.
    let assemble = if container.self_describing() {
        TokenStream2::new()
    } else {
        quote! {
            .assemble_with(|inspector: &mut dyn ::shapecast::Inspector, _version: u32| {
                ::core::result::Result::Ok(Self { #(#assembled),* })
            })
        }
    };

    Ok(quote! {
        impl #impl_generics ::shapecast::Inspect for #name #ty_generics #where_clause {
            fn shape() -> ::shapecast::TypeShape<Self> {
                ::shapecast::TypeShape::Record(
                    ::shapecast::RecordShape::<Self>::new()
                        #(#members)*
                        #hooks
                        #assemble
                )
            }
        }
    })
}

/// Integral `#[repr]` of an enum, as a `ScalarKind` variant name.
fn repr_kind(attrs: &[Attribute]) -> syn::Result<Ident> {
    let mut kind = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("repr")) {
        attr.parse_nested_meta(|meta| {
            let variant = match meta.path.get_ident().map(ToString::to_string).as_deref() {
                Some("i8") => Some("I8"),
                Some("i16") => Some("I16"),
                Some("i32") => Some("I32"),
                Some("i64") => Some("I64"),
                Some("u8") => Some("U8"),
                Some("u16") => Some("U16"),
                Some("u32") => Some("U32"),
                Some("u64") => Some("U64"),
                Some("isize" | "usize" | "i128" | "u128") => {
                    return Err(meta.error("enum repr must be an integer of at most 64 bits"))
                }
                _ => {
                    // repr(align(N)) and friends
                    if meta.input.peek(syn::token::Paren) {
                        let _args;
                        syn::parenthesized!(_args in meta.input);
                    }
                    None
                }
            };
            if let Some(variant) = variant {
                kind = Some(format_ident!("{}", variant));
            }
            Ok(())
        })?;
    }
    Ok(kind.unwrap_or_else(|| format_ident!("I32")))
}

/// Reject a literal discriminant that cannot be carried as `i64`.
fn check_u64_discriminant(variant: &syn::Variant) -> syn::Result<()> {
    if let Some((
        _,
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }),
    )) = &variant.discriminant
    {
        let value: u64 = lit.base10_parse()?;
        if value > i64::MAX as u64 {
            return Err(syn::Error::new_spanned(
                lit,
                "repr(u64) discriminants above i64::MAX are not supported",
            ));
        }
    }
    Ok(())
}

fn expand_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !ContainerAttrs::parse(&input.attrs)?.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "enums cannot be self-describing or carry construction hooks",
        ));
    }
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "enums without variants cannot derive Inspect",
        ));
    }
    let kind = repr_kind(&input.attrs)?;
    let unsigned_wide = kind == "U64";
    let mut variants = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "only fieldless enum variants are supported",
            ));
        }
        if unsigned_wide {
            check_u64_discriminant(variant)?;
        }
        variants.push(&variant.ident);
    }
    let generics = bounded(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    // Computed or implicit discriminants are only known to the compiler.
    let range_checks = if unsigned_wide {
        quote! {
            #(
                const _: () = ::core::assert!(
                    (#name::#variants as u64) <= i64::MAX as u64,
                    "repr(u64) discriminant does not fit in i64",
                );
            )*
        }
    } else {
        TokenStream2::new()
    };

    Ok(quote! {
        #range_checks
        impl #impl_generics ::shapecast::Inspect for #name #ty_generics #where_clause {
            fn shape() -> ::shapecast::TypeShape<Self> {
                ::shapecast::TypeShape::Enum(::shapecast::EnumShape::new(
                    ::shapecast::ScalarKind::#kind,
                    |value| match value {
                        #(Self::#variants => Self::#variants as i64,)*
                    },
                    |raw| {
                        #(
                            if raw == Self::#variants as i64 {
                                return ::core::option::Option::Some(Self::#variants);
                            }
                        )*
                        ::core::option::Option::None
                    },
                ))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn enum_error(input: DeriveInput) -> Option<String> {
        let Data::Enum(data) = &input.data else {
            panic!("enum input expected");
        };
        expand_enum(&input, data).err().map(|err| err.to_string())
    }

    #[test]
    fn test_u64_discriminant_above_i64_max_is_rejected() {
        let input: DeriveInput = parse_quote! {
            #[repr(u64)]
            enum Wide {
                Low = 1,
                High = 18446744073709551615,
            }
        };
        let message = enum_error(input).expect("High does not fit in i64");
        assert!(message.contains("i64::MAX"));
    }

    #[test]
    fn test_u64_discriminant_at_i64_max_is_accepted() {
        let input: DeriveInput = parse_quote! {
            #[repr(u64)]
            enum Wide {
                Low = 0,
                Top = 9223372036854775807,
            }
        };
        assert_eq!(enum_error(input), None);
    }

    #[test]
    fn test_narrow_repr_skips_range_check() {
        let input: DeriveInput = parse_quote! {
            #[repr(u32)]
            enum Narrow {
                A = 4294967295,
            }
        };
        assert_eq!(enum_error(input), None);
    }
}
