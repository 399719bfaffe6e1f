use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitStr, parse_macro_input};

/* ────────────────────────── the derive macro ───────────────────────── */

/// Implements `sheetmap_common::Record` for a struct with named fields.
///
/// Attributes:
/// - `#[record(display_name = "...")]` on the struct: table / sheet name.
/// - `#[record(display = "...")]` on a field: header label.
/// - `#[record(skip)]` on a field: not projected; filled with `Default` when
///   reading.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct FieldSpec {
    ident: Ident,
    name: String,
    label: String,
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    /* -------- 1 · type-level attributes -------- */
    let ident = &input.ident;
    let table_name = type_display_name(&input.attrs)?.unwrap_or_else(|| ident.to_string());

    /* -------- 2 · fields -------- */
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "#[derive(Record)] only supports structs with named fields",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ident,
            "#[derive(Record)] only supports structs with named fields",
        ));
    };

    let mut projected = Vec::<FieldSpec>::new();
    let mut skipped = Vec::<Ident>::new();
    for field in &named.named {
        let Some(field_ident) = field.ident.clone() else {
            continue;
        };
        let (display, skip) = field_attrs(&field.attrs)?;
        if skip {
            skipped.push(field_ident);
            continue;
        }
        let name = field_ident.to_string().trim_start_matches("r#").to_string();
        let label = display.unwrap_or_else(|| name.clone());
        projected.push(FieldSpec {
            ident: field_ident,
            name,
            label,
        });
    }

    /* -------- 3 · assemble expanded code -------- */
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let idents: Vec<&Ident> = projected.iter().map(|f| &f.ident).collect();
    let names = projected.iter().map(|f| &f.name);
    let labels = projected.iter().map(|f| &f.label);
    let indices: Vec<usize> = (0..projected.len()).collect();

    Ok(quote! {
        impl #impl_generics ::sheetmap_common::Record for #ident #ty_generics #where_clause {
            fn table_name() -> &'static str {
                #table_name
            }

            fn fields() -> &'static [::sheetmap_common::FieldInfo] {
                const FIELDS: &[::sheetmap_common::FieldInfo] = &[
                    #( ::sheetmap_common::FieldInfo::new(#names, #labels) ),*
                ];
                FIELDS
            }

            fn field_value(&self, index: usize) -> ::sheetmap_common::CellValue {
                match index {
                    #( #indices => ::sheetmap_common::ToCell::to_cell(&self.#idents), )*
                    _ => ::sheetmap_common::CellValue::Empty,
                }
            }

            fn from_row(
                row: &::sheetmap_common::Row,
            ) -> ::core::result::Result<Self, ::sheetmap_common::FieldError> {
                let fields = <Self as ::sheetmap_common::Record>::fields();
                ::core::result::Result::Ok(Self {
                    #( #idents: ::sheetmap_common::read_field(row, &fields[#indices])?, )*
                    #( #skipped: ::core::default::Default::default(), )*
                })
            }
        }
    })
}

fn type_display_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut display_name = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("display_name") {
                let lit: LitStr = meta.value()?.parse()?;
                display_name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected `display_name = \"...\"`"))
            }
        })?;
    }
    Ok(display_name)
}

fn field_attrs(attrs: &[Attribute]) -> syn::Result<(Option<String>, bool)> {
    let mut display = None;
    let mut skip = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("display") {
                let lit: LitStr = meta.value()?.parse()?;
                display = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `display = \"...\"` or `skip`"))
            }
        })?;
    }
    Ok((display, skip))
}
