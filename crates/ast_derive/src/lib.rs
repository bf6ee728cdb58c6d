use proc_macro::TokenStream;
use quote::{format_ident, quote, quote_spanned};
use syn::{
    parse_macro_input, spanned::Spanned, Attribute, Data, DeriveInput, Field, Fields, Index,
};

/// Derives `crate::walk::Walk` for an AST node.
///
/// Every field (or variant payload) is walked in declaration order. Leaf data
/// that carries no children (spans, symbols, identifier lists) is excluded
/// with `#[walk(skip)]`, either on a single field or on a whole variant.
#[proc_macro_derive(WalkAst, attributes(walk))]
pub fn derive_walk_ast(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let span = input.span();

    let walk_body = match generate_walk_body(&input.data) {
        Ok(body) => body,
        Err(err) => return err.into_compile_error().into(),
    };

    let expanded = quote_spanned! {span =>
        impl<'ast> crate::walk::Walk<'ast> for #name {
            #[inline]
            fn walk<V: crate::walk::Visitor<'ast> + ?Sized>(
                &self,
                a: &'ast crate::ast::AstArena,
                v: &mut V
            ) {
                #walk_body
            }
        }
    };

    expanded.into()
}

fn is_skipped(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut skip = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("walk")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}

fn walked_fields(fields: &Fields) -> syn::Result<Vec<(usize, &Field)>> {
    let mut out = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        if !is_skipped(&field.attrs)? {
            out.push((i, field));
        }
    }
    Ok(out)
}

fn generate_walk_body(data: &Data) -> syn::Result<proc_macro2::TokenStream> {
    match data {
        Data::Struct(data_struct) => generate_struct_walk(&data_struct.fields),
        Data::Enum(data_enum) => {
            let mut arms = Vec::with_capacity(data_enum.variants.len());
            for variant in &data_enum.variants {
                let skip_all = is_skipped(&variant.attrs)?;
                arms.push(generate_variant_arm(&variant.ident, &variant.fields, skip_all)?);
            }

            Ok(quote! {
                match self {
                    #(#arms)*
                }
            })
        }
        Data::Union(u) => Err(syn::Error::new_spanned(
            u.union_token,
            "WalkAst cannot be derived for unions",
        )),
    }
}

fn generate_struct_walk(fields: &Fields) -> syn::Result<proc_macro2::TokenStream> {
    let walk_calls = walked_fields(fields)?.into_iter().map(|(i, field)| {
        let access = match &field.ident {
            Some(ident) => quote! { &self.#ident },
            None => {
                let index = Index::from(i);
                quote! { &self.#index }
            }
        };
        quote! { crate::walk::Walk::walk(#access, a, v); }
    });

    Ok(quote! { #(#walk_calls)* })
}

fn generate_variant_arm(
    variant_name: &syn::Ident,
    fields: &Fields,
    skip_all: bool,
) -> syn::Result<proc_macro2::TokenStream> {
    if skip_all {
        return Ok(match fields {
            Fields::Unit => quote! { Self::#variant_name => {} },
            Fields::Named(_) => quote! { Self::#variant_name { .. } => {} },
            Fields::Unnamed(_) => quote! { Self::#variant_name(..) => {} },
        });
    }

    match fields {
        Fields::Unit => Ok(quote! { Self::#variant_name => {} }),
        Fields::Named(_) => {
            let walked = walked_fields(fields)?;
            let bindings: Vec<_> = walked
                .iter()
                .filter_map(|(_, f)| f.ident.as_ref())
                .collect();

            Ok(quote! {
                Self::#variant_name { #(#bindings,)* .. } => {
                    #(crate::walk::Walk::walk(#bindings, a, v);)*
                }
            })
        }
        Fields::Unnamed(unnamed) => {
            let mut patterns = Vec::with_capacity(unnamed.unnamed.len());
            let mut walk_calls = Vec::new();
            for (i, field) in unnamed.unnamed.iter().enumerate() {
                if is_skipped(&field.attrs)? {
                    patterns.push(quote! { _ });
                } else {
                    let var = format_ident!("f{}", i);
                    walk_calls.push(quote! { crate::walk::Walk::walk(#var, a, v); });
                    patterns.push(quote! { #var });
                }
            }

            Ok(quote! {
                Self::#variant_name(#(#patterns),*) => {
                    #(#walk_calls)*
                }
            })
        }
    }
}
