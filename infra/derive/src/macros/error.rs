use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, FieldsNamed, GenericArgument, Ident};
use syn::{PathArguments, Type, Variant};

const CONTEXT_FIELD: &str = "context";
const SOURCE_FIELD: &str = "source";
const INTERNAL_VARIANT: &str = "Internal";

/// Parsed shape of a single error variant.
struct ErrorVariant<'a> {
    ident: &'a Ident,
    source: Option<(&'a Ident, &'a Type)>,
    has_context: bool,
    cfg_attrs: Vec<&'a Attribute>,
}

impl ErrorVariant<'_> {
    fn is_internal(&self) -> bool {
        self.ident == INTERNAL_VARIANT
    }
}

/// The whole annotated enum, validated and ready for expansion.
struct ErrorEnum<'a> {
    input: &'a DeriveInput,
    variants: Vec<ErrorVariant<'a>>,
}

pub fn expand(input: DeriveInput) -> TokenStream {
    match ErrorEnum::parse(&input) {
        Ok(error) => error.expand(),
        Err(err) => err.to_compile_error(),
    }
}

impl<'a> ErrorEnum<'a> {
    fn parse(input: &'a DeriveInput) -> syn::Result<Self> {
        let Data::Enum(data) = &input.data else {
            return Err(syn::Error::new_spanned(&input.ident, "spire_error can only be applied to enums"));
        };

        let variants = data.variants.iter().map(parse_variant).collect::<syn::Result<Vec<_>>>()?;

        if let Some(v) = variants.iter().find(|v| v.source.is_some() && !v.has_context) {
            return Err(syn::Error::new_spanned(
                v.ident,
                "spire_error requires `context: Option<Cow<'static, str>>` next to a source field",
            ));
        }

        Ok(Self { input, variants })
    }

    fn expand(&self) -> TokenStream {
        let input = self.input;
        let name = &input.ident;
        let ext = format_ident!("{}Ext", name);

        let derives = self.missing_derives();
        let context_trait = self.context_trait(&ext);
        let context_note = self.context_note();
        let from_impls = self.variants.iter().filter_map(|v| source_impls(name, &ext, v));
        let internal_impls = self.internal_impls();

        quote! {
            #[allow(non_shorthand_field_patterns)]
            #derives
            #input

            #context_trait
            #context_note
            #(#from_impls)*
            #internal_impls

            #[allow(dead_code)]
            fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
                context.as_ref().map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
            }
        }
    }

    fn missing_derives(&self) -> TokenStream {
        let present = derived_trait_names(&self.input.attrs);
        let mut tokens = Vec::new();
        if !present.contains("Debug") {
            tokens.push(quote! { Debug });
        }
        if !present.contains("Error") {
            tokens.push(quote! { ::thiserror::Error });
        }
        if tokens.is_empty() { quote! {} } else { quote! { #[derive(#(#tokens),*)] } }
    }

    fn context_trait(&self, ext: &Ident) -> TokenStream {
        let name = &self.input.ident;
        let arms = self.variants.iter().filter(|v| v.has_context).map(|v| {
            let cfg_attrs = &v.cfg_attrs;
            let ident = v.ident;
            quote! { #(#cfg_attrs)* #name::#ident { context: c, .. } => *c = Some(context.into()), }
        });

        quote! {
            pub trait #ext<T> {
                fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
            }

            #[automatically_derived]
            impl<T> #ext<T> for Result<T, #name> {
                #[inline]
                fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                    self.map_err(|mut e| {
                        match &mut e {
                            #( #arms )*
                            _ => {}
                        }
                        e
                    })
                }
            }
        }
    }

    fn context_note(&self) -> TokenStream {
        let name = &self.input.ident;
        let arms = self.variants.iter().filter(|v| v.has_context).map(|v| {
            let cfg_attrs = &v.cfg_attrs;
            let ident = v.ident;
            quote! { #(#cfg_attrs)* Self::#ident { context, .. } => context.as_deref(), }
        });

        quote! {
            #[automatically_derived]
            impl #name {
                /// Returns the context attached through `.context(...)`, if any.
                #[must_use]
                #[allow(unreachable_patterns)]
                pub fn context_note(&self) -> Option<&str> {
                    match self {
                        #( #arms )*
                        _ => None,
                    }
                }
            }
        }
    }

    fn internal_impls(&self) -> TokenStream {
        let Some(internal) = self.variants.iter().find(|v| v.is_internal()) else {
            return quote!();
        };
        let name = &self.input.ident;
        let cfg_attrs = &internal.cfg_attrs;

        quote! {
            #(#cfg_attrs)*
            impl From<&'static str> for #name {
                #[inline]
                fn from(s: &'static str) -> Self { Self::Internal { message: std::borrow::Cow::Borrowed(s), context: None } }
            }
            #(#cfg_attrs)*
            impl From<String> for #name {
                #[inline]
                fn from(s: String) -> Self { Self::Internal { message: std::borrow::Cow::Owned(s), context: None } }
            }
        }
    }
}

fn parse_variant(v: &Variant) -> syn::Result<ErrorVariant<'_>> {
    let Fields::Named(fields) = &v.fields else {
        return Err(syn::Error::new_spanned(
            v,
            "spire_error requires named fields for source/context handling",
        ));
    };

    let has_context = context_field(fields)?.is_some();
    let source = source_field(fields).and_then(|f| f.ident.as_ref().map(|ident| (ident, &f.ty)));
    let cfg_attrs = v.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).collect();

    Ok(ErrorVariant { ident: &v.ident, source, has_context, cfg_attrs })
}

fn context_field(fields: &FieldsNamed) -> syn::Result<Option<&Field>> {
    let Some(field) =
        fields.named.iter().find(|f| f.ident.as_ref().is_some_and(|i| i == CONTEXT_FIELD))
    else {
        return Ok(None);
    };

    if is_cow_option(&field.ty) {
        Ok(Some(field))
    } else {
        Err(syn::Error::new_spanned(&field.ty, "context field must be Option<Cow<'static, str>>"))
    }
}

fn source_field(fields: &FieldsNamed) -> Option<&Field> {
    fields.named.iter().find(|field| {
        field.ident.as_ref().is_some_and(|ident| ident == SOURCE_FIELD)
            || field.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from"))
    })
}

fn source_impls(name: &Ident, ext: &Ident, v: &ErrorVariant<'_>) -> Option<TokenStream> {
    if v.is_internal() {
        return None;
    }
    let (field, ty) = v.source?;
    let ident = v.ident;
    let cfg_attrs = &v.cfg_attrs;

    Some(quote! {
        #(#cfg_attrs)*
        #[automatically_derived]
        impl From<#ty> for #name {
            #[inline]
            fn from(#field: #ty) -> Self { Self::#ident { #field, context: None } }
        }

        #(#cfg_attrs)*
        impl<T> #ext<T> for std::result::Result<T, #ty> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
            }
        }
    })
}

fn derived_trait_names(attrs: &[Attribute]) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                traits.insert(segment.ident.to_string());
            }
            Ok(())
        });
    }

    traits
}

/// Matches `Option<Cow<'static, str>>` by its last path segments.
fn is_cow_option(ty: &Type) -> bool {
    let Some(inner) = single_type_arg(ty, "Option") else {
        return false;
    };
    let Type::Path(path) = inner else {
        return false;
    };
    let Some(cow) = path.path.segments.last().filter(|s| s.ident == "Cow") else {
        return false;
    };
    let PathArguments::AngleBracketed(args) = &cow.arguments else {
        return false;
    };

    let mut args = args.args.iter();
    let static_lifetime =
        matches!(args.next(), Some(GenericArgument::Lifetime(lt)) if lt.ident == "static");
    let str_type = matches!(
        args.next(),
        Some(GenericArgument::Type(Type::Path(p)))
            if p.path.segments.last().is_some_and(|s| s.ident == "str")
    );

    static_lifetime && str_type
}

fn single_type_arg<'t>(ty: &'t Type, wrapper: &str) -> Option<&'t Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last().filter(|s| s.ident == wrapper)?;
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
