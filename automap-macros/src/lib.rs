use heck::ToSnakeCase;
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    Attribute, FnArg, Ident, ImplItem, ImplItemConst, ImplItemFn, ItemImpl, LitStr, Pat,
    ReturnType, Type, Visibility, parse_macro_input,
};

/// Implements `automap::Exposable` for the type of an inherent `impl` block.
///
/// Public items become members:
///
/// - `pub fn` with a `&self` or `self` receiver, or no receiver, becomes a
///   function; its parameter names are the keyword names,
/// - `pub const` becomes a value,
/// - `pub fn` marked `#[expose(module)]` (no parameters) becomes a nested
///   module built from its return value.
///
/// Mark an item `#[expose(skip)]` to leave it out, or `#[expose(name = "x")]`
/// to rename it. On a module method, `name` only orders the member; the route
/// segment is the returned module's own name.
///
/// Any exposed method with a receiver, `&self` as well as `self`, requires
/// `Self: Clone`. `members()` clones the object into each generated function
/// and the function runs against that copy, so changes made to the original
/// after mapping are not seen by its endpoints. Share state through `Arc`
/// fields when endpoints must observe it. `self` methods clone the copy again
/// on every call.
///
/// On the block itself, `#[expose(name = "calc")]` sets the object name
/// (default: the type name in snake case) and `#[expose(discover)]` registers
/// `Self::default()` for `Mapper::discover()`.
#[proc_macro_attribute]
pub fn expose(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = BlockArgs::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            args.name = Some(meta.value()?.parse::<LitStr>()?.value());
            Ok(())
        } else if meta.path.is_ident("discover") {
            args.discover = true;
            Ok(())
        } else {
            Err(meta.error("expected `name = \"...\"` or `discover`"))
        }
    });
    parse_macro_input!(attr with parser);
    let item = parse_macro_input!(item as ItemImpl);

    match expand(args, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct BlockArgs {
    name: Option<String>,
    discover: bool,
}

#[derive(Default)]
struct ItemArgs {
    name: Option<String>,
    skip: bool,
    module: bool,
}

fn expand(args: BlockArgs, mut item: ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[expose] goes on an inherent impl block, not a trait impl",
        ));
    }

    let self_ty = item.self_ty.clone();
    let object_name = match args.name {
        Some(name) => name,
        None => type_name(&self_ty)?.to_snake_case(),
    };

    let mut members = Vec::new();
    for impl_item in &mut item.items {
        match impl_item {
            ImplItem::Fn(func) => {
                let opts = take_item_args(&mut func.attrs)?;
                if opts.skip || !matches!(func.vis, Visibility::Public(_)) {
                    continue;
                }
                members.push(function_member(func, &opts)?);
            }
            ImplItem::Const(constant) => {
                let opts = take_item_args(&mut constant.attrs)?;
                if opts.skip || !matches!(constant.vis, Visibility::Public(_)) {
                    continue;
                }
                members.push(const_member(constant, &opts)?);
            }
            _ => {}
        }
    }

    let (impl_generics, _, where_clause) = item.generics.split_for_impl();
    let discovery = if args.discover {
        discovery(&item, &self_ty, &object_name)?
    } else {
        TokenStream2::new()
    };

    Ok(quote! {
        #item

        impl #impl_generics ::automap::Exposable for #self_ty #where_clause {
            fn name(&self) -> &str {
                #object_name
            }

            fn members(&self) -> ::std::vec::Vec<::automap::Member> {
                let mut members = ::std::vec::Vec::new();
                #(#members)*
                members
            }
        }

        #discovery
    })
}

fn type_name(ty: &Type) -> syn::Result<String> {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.unraw().to_string())
            .ok_or_else(|| syn::Error::new_spanned(ty, "cannot name this type")),
        _ => Err(syn::Error::new_spanned(
            ty,
            "cannot derive a name for this type; use #[expose(name = \"...\")]",
        )),
    }
}

/// Removes `#[expose(...)]` from an item's attributes and parses it.
fn take_item_args(attrs: &mut Vec<Attribute>) -> syn::Result<ItemArgs> {
    let mut opts = ItemArgs::default();
    let mut result = Ok(());

    attrs.retain(|attr| {
        if !attr.path().is_ident("expose") {
            return true;
        }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                opts.skip = true;
                Ok(())
            } else if meta.path.is_ident("module") {
                opts.module = true;
                Ok(())
            } else if meta.path.is_ident("name") {
                opts.name = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("expected `skip`, `module` or `name = \"...\"`"))
            }
        });
        if let Err(err) = parsed {
            result = Err(err);
        }
        false
    });

    result.map(|()| opts)
}

enum Receiver {
    None,
    Ref,
    Owned,
}

fn receiver(func: &ImplItemFn) -> syn::Result<Receiver> {
    match func.sig.receiver() {
        None => Ok(Receiver::None),
        Some(recv) if recv.reference.is_some() && recv.mutability.is_none() => Ok(Receiver::Ref),
        Some(recv) if recv.reference.is_none() => Ok(Receiver::Owned),
        Some(recv) => Err(syn::Error::new_spanned(
            recv,
            "`&mut self` methods cannot be exposed; mark it #[expose(skip)]",
        )),
    }
}

fn function_member(func: &ImplItemFn, opts: &ItemArgs) -> syn::Result<TokenStream2> {
    let sig = &func.sig;
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "async methods cannot be exposed",
        ));
    }
    if sig.generics.type_params().next().is_some() || sig.generics.const_params().next().is_some()
    {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "generic methods cannot be exposed",
        ));
    }

    let ident = &sig.ident;
    let name = opts
        .name
        .clone()
        .unwrap_or_else(|| ident.unraw().to_string());
    let recv = receiver(func)?;

    if opts.module {
        return module_member(func, recv, &name);
    }

    let mut param_names = Vec::new();
    let mut bindings = Vec::new();
    let mut types = Vec::new();
    for (index, input) in sig.inputs.iter().enumerate() {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        if let Type::Reference(reference) = &*pat_type.ty {
            return Err(syn::Error::new_spanned(
                reference,
                "exposed parameters must be owned types (use String instead of &str)",
            ));
        }
        let (param, binding) = match &*pat_type.pat {
            Pat::Ident(pat) => (pat.ident.unraw().to_string(), pat.ident.clone()),
            _ => (
                format!("arg{index}"),
                Ident::new(&format!("__automap_arg{index}"), Span::call_site()),
            ),
        };
        param_names.push(param);
        bindings.push(binding);
        types.push(pat_type.ty.clone());
    }

    let closure = match recv {
        Receiver::None => quote! {
            move |#(#bindings: #types),*| Self::#ident(#(#bindings),*)
        },
        Receiver::Ref => quote! {{
            let __automap_self = ::std::clone::Clone::clone(self);
            move |#(#bindings: #types),*| __automap_self.#ident(#(#bindings),*)
        }},
        Receiver::Owned => quote! {{
            let __automap_self = ::std::clone::Clone::clone(self);
            move |#(#bindings: #types),*| {
                ::std::clone::Clone::clone(&__automap_self).#ident(#(#bindings),*)
            }
        }},
    };

    Ok(quote! {
        members.push(::automap::Member::function(
            #name,
            ::automap::Function::new(&[#(#param_names),*], #closure),
        ));
    })
}

fn module_member(func: &ImplItemFn, recv: Receiver, name: &str) -> syn::Result<TokenStream2> {
    let sig = &func.sig;
    let takes_args = sig
        .inputs
        .iter()
        .any(|input| matches!(input, FnArg::Typed(_)));
    if takes_args || matches!(sig.output, ReturnType::Default) {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "#[expose(module)] methods take no parameters and return the module",
        ));
    }

    let ident = &sig.ident;
    let build = match recv {
        Receiver::None => quote! { Self::#ident() },
        Receiver::Ref => quote! { self.#ident() },
        Receiver::Owned => quote! { ::std::clone::Clone::clone(self).#ident() },
    };

    Ok(quote! {
        members.push(::automap::Member::module(#name, #build));
    })
}

fn const_member(constant: &ImplItemConst, opts: &ItemArgs) -> syn::Result<TokenStream2> {
    if opts.module {
        return Err(syn::Error::new_spanned(
            &constant.ident,
            "#[expose(module)] applies to methods only",
        ));
    }
    let ident = &constant.ident;
    let name = opts
        .name
        .clone()
        .unwrap_or_else(|| ident.unraw().to_string());

    Ok(quote! {
        members.push(::automap::Member::value(#name, Self::#ident));
    })
}

fn discovery(item: &ItemImpl, self_ty: &Type, object_name: &str) -> syn::Result<TokenStream2> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "#[expose(discover)] does not support generic types",
        ));
    }

    let build_fn = format_ident!("__automap_build_{}", object_name.to_snake_case());

    Ok(quote! {
        #[doc(hidden)]
        fn #build_fn() -> ::std::sync::Arc<dyn ::automap::Exposable> {
            ::std::sync::Arc::new(<#self_ty as ::std::default::Default>::default())
        }

        ::automap::inventory::submit! {
            ::automap::discovery::ModuleDescriptor {
                name: #object_name,
                build: #build_fn,
            }
        }
    })
}
