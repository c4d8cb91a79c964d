use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_quote, Expr, FnArg, GenericArgument, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr,
    Meta, PathArguments, ReturnType, Token, Type,
};

struct ComponentArgs {
    handles: Option<Expr>,
}

impl Parse for ComponentArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            return Ok(ComponentArgs { handles: None });
        }

        let kw: Ident = input.parse()?;
        if kw != "handles" {
            return Err(syn::Error::new(kw.span(), "expected `handles`"));
        }

        // `handles` without a value declares a blank key
        let key = if input.peek(Token![=]) {
            input.parse::<Token![=]>()?;
            input.parse()?
        } else {
            parse_quote!("")
        };

        // Optional trailing comma
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }

        Ok(ComponentArgs { handles: Some(key) })
    }
}

/// A qualifying `#[handler(KEY)]` method.
struct Factory {
    key: Expr,
    method: Ident,
    handler_ty: Type,
    error_ty: Option<Type>,
    fallible: bool,
}

pub fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = syn::parse_macro_input!(attr as ComponentArgs);
    let mut item = syn::parse_macro_input!(item as ItemImpl);

    match expand_impl(args, &mut item) {
        Ok(component_impl) => TokenStream::from(quote! {
            #item
            #component_impl
        }),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_impl(args: ComponentArgs, item: &mut ItemImpl) -> syn::Result<proc_macro2::TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[component] must be placed on an inherent impl block",
        ));
    }

    let mut factories = Vec::new();
    for impl_item in &mut item.items {
        if let ImplItem::Fn(method) = impl_item {
            if let Some(key) = take_handler_key(method)? {
                if let Some(factory) = qualify(key, method) {
                    factories.push(factory);
                }
            }
        }
    }

    let self_ty = &item.self_ty;
    let mut generics = item.generics.clone();
    generics.params.push(parse_quote!(__S: 'static));
    {
        let where_clause = generics.make_where_clause();
        where_clause
            .predicates
            .push(parse_quote!(#self_ty: ::core::marker::Send + ::core::marker::Sync + 'static));
        if args.handles.is_some() {
            where_clause
                .predicates
                .push(parse_quote!(#self_ty: ::routed_rust::MessageHandler<__S>));
        }
        for factory in &factories {
            let handler_ty = &factory.handler_ty;
            where_clause
                .predicates
                .push(parse_quote!(#handler_ty: ::routed_rust::MessageHandler<__S> + 'static));
            if let Some(error_ty) = &factory.error_ty {
                where_clause
                    .predicates
                    .push(parse_quote!(#error_ty: ::core::convert::Into<::routed_rust::BoxError>));
            }
        }
    }
    let (impl_generics, _, where_clause) = generics.split_for_impl();

    let factory_registrations = factories.iter().map(|factory| {
        let key = &factory.key;
        let method = &factory.method;
        let method_name = LitStr::new(&method.to_string(), method.span());
        let produce = if factory.fallible {
            quote! {
                component
                    .#method()
                    .map_err(::core::convert::Into::<::routed_rust::BoxError>::into)?
            }
        } else {
            quote! { component.#method() }
        };

        quote! {
            {
                let component = ::std::sync::Arc::clone(&self);
                ::routed_rust::Registration::factory(#key, #method_name, move || {
                    let handler = #produce;
                    ::core::result::Result::Ok(
                        ::std::sync::Arc::new(handler) as ::routed_rust::HandlerRef<__S>
                    )
                })
            }
        }
    });

    let direct_registration = args.handles.as_ref().map(|key| {
        quote! {
            ::routed_rust::Registration::direct(
                #key,
                self as ::routed_rust::HandlerRef<__S>,
            )
        }
    });

    Ok(quote! {
        impl #impl_generics ::routed_rust::Component<__S> for #self_ty #where_clause {
            fn registrations(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<::routed_rust::Registration<__S>> {
                ::std::vec![
                    #(#factory_registrations,)*
                    #direct_registration
                ]
            }
        }
    })
}

/// Remove every `#[handler(..)]` attribute from `method`, returning the key
/// of the first one.
fn take_handler_key(method: &mut ImplItemFn) -> syn::Result<Option<Expr>> {
    let mut key = None;
    let mut kept = Vec::with_capacity(method.attrs.len());

    for attr in std::mem::take(&mut method.attrs) {
        if !attr.path().is_ident("handler") {
            kept.push(attr);
            continue;
        }
        if key.is_none() {
            key = Some(match &attr.meta {
                Meta::Path(_) => parse_quote!(""),
                _ => attr.parse_args::<Expr>()?,
            });
        }
    }

    method.attrs = kept;
    Ok(key)
}

/// Only `fn name(&self) -> H` (sync, shared receiver, non-unit return)
/// becomes a factory.
fn qualify(key: Expr, method: &ImplItemFn) -> Option<Factory> {
    let sig = &method.sig;
    if sig.asyncness.is_some() || sig.inputs.len() != 1 {
        return None;
    }
    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => return None,
    }

    let ReturnType::Type(_, ty) = &sig.output else {
        return None;
    };
    if matches!(&**ty, Type::Tuple(tuple) if tuple.elems.is_empty()) {
        return None;
    }

    let (handler_ty, error_ty, fallible) = match result_args(ty) {
        Some((ok, err)) => (ok, err, true),
        None => ((**ty).clone(), None, false),
    };
    if matches!(&handler_ty, Type::Tuple(tuple) if tuple.elems.is_empty()) {
        return None;
    }

    Some(Factory {
        key,
        method: sig.ident.clone(),
        handler_ty,
        error_ty,
        fallible,
    })
}

/// Split `Result<H, E>` (or a one-argument `Result<H>` alias) into its parts.
fn result_args(ty: &Type) -> Option<(Type, Option<Type>)> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };

    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty.clone()),
        _ => None,
    });
    let ok = types.next()?;
    Some((ok, types.next()))
}
