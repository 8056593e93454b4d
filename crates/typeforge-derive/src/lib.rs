// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, LitStr, Path, Type};

/// Options read from `#[host_class(...)]`.
#[derive(Default)]
struct ClassOptions {
    name: Option<LitStr>,
    extends: Option<Type>,
    init: Option<Path>,
    class_assignment: bool,
    dict_assignment: bool,
}

impl ClassOptions {
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let mut opts = Self::default();
        for attr in input.attrs.iter().filter(|a| a.path().is_ident("host_class")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    opts.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("extends") {
                    opts.extends = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("init") {
                    opts.init = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("class_assignment") {
                    opts.class_assignment = true;
                    Ok(())
                } else if meta.path.is_ident("dict_assignment") {
                    opts.dict_assignment = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown host_class attribute"))
                }
            })?;
        }
        Ok(opts)
    }
}

/// `#[derive(HostObject)]` macro: crafts a host class for the type and
/// implements `NativeClass` + `HostObject` for it.
///
/// Attributes (all optional):
/// - `name = "pkg.Name"`: fully-qualified host class name (default: type name)
/// - `extends = Type`: superclass, another type with a `NativeClass` impl
/// - `init = path::to::fn`: static initializer, `fn(&HostClass) -> typeforge::Result<()>`
/// - `class_assignment`: the class implements `WithClassAssignment`; the
///   type must implement that trait itself
/// - `dict_assignment`: likewise for `WithDictAssignment`
///
/// Example:
/// ```ignore
/// use typeforge::{HostClass, HostObject, Result};
///
/// fn register(class: &HostClass) -> Result<()> {
///     typeforge::type_system().from_spec(typeforge::TypeSpec::new("point", class))?;
///     Ok(())
/// }
///
/// #[derive(HostObject)]
/// #[host_class(name = "demo.Point", init = register)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
/// ```
#[proc_macro_derive(HostObject, attributes(host_class))]
pub fn derive_host_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if let Data::Union(_) = input.data {
        return syn::Error::new_spanned(&input, "HostObject cannot be derived for unions")
            .to_compile_error()
            .into();
    }
    // The host class lives in a static, one per Rust type.
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "HostObject types cannot be generic")
            .to_compile_error()
            .into();
    }

    let opts = match ClassOptions::parse(&input) {
        Ok(opts) => opts,
        Err(e) => return e.to_compile_error().into(),
    };

    let ident = &input.ident;
    let class_name = opts
        .name
        .clone()
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

    let extends = opts.extends.as_ref().map(|ty| {
        quote! {
            .extends(<#ty as ::typeforge::host::NativeClass>::native_class())
        }
    });
    let init = opts.init.as_ref().map(|path| quote! { .initializer(#path) });

    let class_iface = opts.class_assignment.then(|| {
        quote! { .implements(::typeforge::host::class_assignment_interface()) }
    });
    let dict_iface = opts.dict_assignment.then(|| {
        quote! { .implements(::typeforge::host::dict_assignment_interface()) }
    });

    let as_with_class = opts.class_assignment.then(|| {
        quote! {
            fn as_with_class(&self) -> ::core::option::Option<&dyn ::typeforge::host::WithClassAssignment> {
                ::core::option::Option::Some(self)
            }
        }
    });
    let as_with_dict = opts.dict_assignment.then(|| {
        quote! {
            fn as_with_dict(&self) -> ::core::option::Option<&dyn ::typeforge::host::WithDictAssignment> {
                ::core::option::Option::Some(self)
            }
        }
    });

    let expanded = quote! {
        impl ::typeforge::host::NativeClass for #ident {
            fn native_class() -> &'static ::typeforge::host::HostClass {
                static CLASS: ::std::sync::OnceLock<::typeforge::host::HostClass> =
                    ::std::sync::OnceLock::new();
                CLASS.get_or_init(|| {
                    ::typeforge::host::HostClass::builder(#class_name)
                        #extends
                        #class_iface
                        #dict_iface
                        #init
                        .build()
                })
            }
        }

        impl ::typeforge::host::HostObject for #ident {
            fn host_class(&self) -> &::typeforge::host::HostClass {
                <#ident as ::typeforge::host::NativeClass>::native_class()
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            #as_with_class
            #as_with_dict
        }
    };

    TokenStream::from(expanded)
}
