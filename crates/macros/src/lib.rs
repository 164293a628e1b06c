/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Fields, ItemEnum, ItemStruct};

/// Adds an `inner()` accessor to a single field tuple struct.
///
/// ```ignore
/// #[macros::impl_getter]
/// pub struct SubjectId(pub String);
///
/// let id = SubjectId("alice".to_string());
/// assert_eq!(id.inner(), "alice");
/// ```
#[proc_macro_attribute]
pub fn impl_getter(_: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as ItemStruct);
    let struct_name = &input.ident;

    let inner_type = match &input.fields {
        Fields::Unnamed(fields) if fields.unnamed.len() == 1 => fields.unnamed.first().map(|field| &field.ty),
        _ => None,
    };

    let Some(inner_type) = inner_type else {
        return syn::Error::new_spanned(
            struct_name,
            "impl_getter can only be applied to a tuple struct with exactly one field",
        )
        .to_compile_error()
        .into();
    };

    let expanded = quote! {
        #input

        impl #struct_name {
            #[allow(clippy::clone_on_copy)]
            pub fn inner(&self) -> #inner_type {
                self.0.clone()
            }
        }
    };

    TokenStream::from(expanded)
}

/// Turns a plain enum into an error type. Every variant gets a `thiserror`
/// display string equal to its name in SCREAMING_SNAKE_CASE.
#[proc_macro_attribute]
pub fn add_error(_: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as ItemEnum);
    let enum_name = &input.ident;
    let visibility = &input.vis;
    let attrs = &input.attrs;

    let variants = input.variants.iter().map(|variant| {
        let variant_name = &variant.ident;
        let variant_screaming_snake_case = convert_to_screaming_snake_case(&variant_name.to_string());
        quote! {
            #[error(#variant_screaming_snake_case)]
            #variant,
        }
    });

    let expanded = quote! {
        #(#attrs)*
        #[derive(Debug, ::serde::Serialize, ::thiserror::Error)]
        #visibility enum #enum_name {
            #(#variants)*
        }
    };

    TokenStream::from(expanded)
}

fn convert_to_screaming_snake_case(input: &str) -> String {
    let mut result = String::new();
    let mut last_char_was_upper = false;

    for c in input.chars() {
        if c.is_uppercase() {
            if !last_char_was_upper && !result.is_empty() {
                result.push('_');
            }
            last_char_was_upper = true;
        } else {
            last_char_was_upper = false;
        }
        result.push(c.to_ascii_uppercase());
    }

    result
}
