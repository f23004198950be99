//! `#[derive(Record)]`.
//!
//! Struct attribute:
//! - `#[record(name = "...")]` - resource name (defaults to the snake-cased type name)
//!
//! Field attributes:
//! - `#[record(id)]` - the identifier; an `Option<T>` field yields `Id = T`
//! - `#[record(status)]` - status column, enables `UpdateStatus`
//! - `#[record(locked)]` - `bool` lock flag, enables `UpdateLock`
//! - `#[record(yn)]` - `Yn` flag, enables `UpdateYn`
//! - `#[record(audit)]` - `AuditStatus` column, enables `UpdateAuditStatus`
//! - `#[record(remark)]` - `Option<String>` receiving audit remarks
//! - `#[record(skip)]` - left out of the field list

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Field, Fields, GenericArgument, Ident, LitStr, PathArguments, Type,
    parse_macro_input,
};

#[derive(Default)]
struct Columns<'a> {
    id: Option<&'a Field>,
    status: Option<&'a Field>,
    locked: Option<&'a Field>,
    yn: Option<&'a Field>,
    audit: Option<&'a Field>,
    remark: Option<&'a Field>,
    names: Vec<String>,
}

impl<'a> Columns<'a> {
    fn assign(slot: &mut Option<&'a Field>, field: &'a Field, role: &Ident) -> syn::Result<()> {
        if slot.is_some() {
            return Err(syn::Error::new(
                role.span(),
                format!("more than one field marked `#[record({role})]`"),
            ));
        }
        *slot = Some(field);
        Ok(())
    }

    fn collect(fields: &'a Fields) -> syn::Result<Self> {
        let mut columns = Columns::default();
        for field in fields {
            let mut skip = false;
            for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("record")) {
                attr.parse_nested_meta(|meta| {
                    let Some(role) = meta.path.get_ident() else {
                        return Err(meta.error("expected a field role"));
                    };
                    match role.to_string().as_str() {
                        "id" => Self::assign(&mut columns.id, field, role),
                        "status" => Self::assign(&mut columns.status, field, role),
                        "locked" => Self::assign(&mut columns.locked, field, role),
                        "yn" => Self::assign(&mut columns.yn, field, role),
                        "audit" => Self::assign(&mut columns.audit, field, role),
                        "remark" => Self::assign(&mut columns.remark, field, role),
                        "skip" => {
                            skip = true;
                            Ok(())
                        }
                        other => Err(meta.error(format!("unknown field role: {other}"))),
                    }
                })?;
            }
            match &field.ident {
                Some(ident) if !skip => columns.names.push(ident.to_string()),
                _ => {}
            }
        }
        Ok(columns)
    }
}

fn record_name(input: &DeriveInput) -> syn::Result<String> {
    let mut name = None;
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unknown record attribute"))
            }
        })?;
    }
    Ok(name.unwrap_or_else(|| snake_case(&input.ident.to_string())))
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `T` when `ty` is `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

pub fn derive_record_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "`Record` cannot be derived for generic types",
        ));
    }
    let fields = match &input.data {
        Data::Struct(data) if matches!(data.fields, Fields::Named(_)) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "`Record` can only be derived for structs with named fields",
            ));
        }
    };

    let name = record_name(input)?;
    let columns = Columns::collect(fields)?;
    let names = &columns.names;

    let (id_type, id_fn, with_id) = match columns.id {
        Some(field) => {
            let member = &field.ident;
            let field_name = member.as_ref().map(Ident::to_string).unwrap_or_default();
            match option_inner(&field.ty) {
                Some(inner) => (
                    quote!(#inner),
                    quote!(self.#member.as_ref()),
                    quote!(.with_id(#field_name)),
                ),
                None => {
                    let ty = &field.ty;
                    (
                        quote!(#ty),
                        quote!(::core::option::Option::Some(&self.#member)),
                        quote!(.with_id(#field_name)),
                    )
                }
            }
        }
        None => (quote!(()), quote!(::core::option::Option::None), quote!()),
    };

    let mut capabilities = Vec::new();
    let mut setters = Vec::new();

    let status_type = match columns.status {
        Some(field) => {
            let member = &field.ident;
            let ty = &field.ty;
            capabilities.push(quote!(::phasegate::Capabilities::STATUS));
            setters.push(quote! {
                fn set_status(&mut self, status: #ty) {
                    self.#member = status;
                }
            });
            quote!(#ty)
        }
        None => quote!(()),
    };

    if let Some(field) = columns.locked {
        let member = &field.ident;
        capabilities.push(quote!(::phasegate::Capabilities::LOCK));
        setters.push(quote! {
            fn set_locked(&mut self, locked: bool) {
                self.#member = locked;
            }
        });
    }

    if let Some(field) = columns.yn {
        let member = &field.ident;
        capabilities.push(quote!(::phasegate::Capabilities::YN));
        setters.push(quote! {
            fn set_yn(&mut self, yn: ::phasegate::Yn) {
                self.#member = yn;
            }
        });
    }

    match (columns.audit, columns.remark) {
        (Some(field), remark) => {
            let member = &field.ident;
            let remark = remark.map(|field| {
                let member = &field.ident;
                quote!(self.#member = audit.remark.clone();)
            });
            capabilities.push(quote!(::phasegate::Capabilities::AUDIT));
            setters.push(quote! {
                fn set_audit(&mut self, audit: &::phasegate::AuditValue) {
                    self.#member = audit.status;
                    #remark
                }

                fn audit_status(&self) -> ::core::option::Option<::phasegate::AuditStatus> {
                    ::core::option::Option::Some(self.#member)
                }
            });
        }
        (None, Some(field)) => {
            return Err(syn::Error::new_spanned(
                field,
                "`#[record(remark)]` requires a field marked `#[record(audit)]`",
            ));
        }
        (None, None) => {}
    }

    let capabilities = quote!(::phasegate::Capabilities::empty()#(.union(#capabilities))*);

    Ok(quote! {
        impl ::phasegate::Record for #ident {
            type Id = #id_type;
            type Status = #status_type;

            const DESCRIPTOR: ::phasegate::RecordDescriptor =
                ::phasegate::RecordDescriptor::new(#name)
                    #with_id
                    .with_fields(&[#(#names),*])
                    .with_capabilities(#capabilities);

            fn id(&self) -> ::core::option::Option<&Self::Id> {
                #id_fn
            }

            #(#setters)*
        }
    })
}
