// vim: tw=80
use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{
    *,
    ext::IdentExt,
    spanned::Spanned
};

/// Prefix of the generated names of a mock method's parameters.
const PARAM_NAME: &str = "p";

/// One parameter of a mocked method.
pub(crate) struct Param {
    /// Name used inside the generated method, like `p0`
    pub name: Ident,
    /// Type as declared by the trait
    pub ty: Type,
    /// Type that the handler receives.  Shared references are replaced by
    /// the owned form of their referent.
    pub owned_ty: Type,
}

impl Param {
    fn new(index: usize, ty: &Type) -> Result<Self> {
        let name = format_ident!("{}{}", PARAM_NAME, index);
        let owned_ty = match ty {
            Type::Reference(r) => {
                if let Some(m) = &r.mutability {
                    return Err(Error::new(m.span(),
                        "amock does not support mutable reference arguments"));
                }
                let elem = &r.elem;
                parse_quote!(<#elem as ::std::borrow::ToOwned>::Owned)
            },
            Type::ImplTrait(_) => {
                return Err(Error::new(ty.span(),
                    "amock does not support `impl Trait` arguments"));
            },
            _ => ty.clone()
        };
        Ok(Param{name, ty: ty.clone(), owned_ty})
    }

    /// Expression that converts the parameter into the handler's argument
    fn to_arg(&self) -> TokenStream {
        let name = &self.name;
        if let Type::Reference(_) = self.ty {
            quote!(::std::borrow::ToOwned::to_owned(#name))
        } else {
            name.to_token_stream()
        }
    }
}

/// Descriptor of one mocked method, and the code it generates.
pub(crate) struct MockFunction {
    /// `#[cfg]` attributes, repeated on everything generated for the method
    cfg_attrs: Vec<Attribute>,
    /// Name of the method as the registry knows it
    pub method_name: String,
    pub params: Vec<Param>,
    /// Return type, `()` if the method doesn't declare one
    pub output: Type,
    /// The trait's signature, with parameters renamed
    sig: Signature,
}

impl MockFunction {
    pub fn new(item: &TraitItemFn) -> Result<Self> {
        let sig = &item.sig;
        if let Some(a) = &sig.asyncness {
            return Err(Error::new(a.span(),
                "amock does not support async methods"));
        }
        if let Some(v) = &sig.variadic {
            return Err(Error::new(v.span(),
                "amock does not support variadic methods"));
        }
        for gp in sig.generics.params.iter() {
            if !matches!(gp, GenericParam::Lifetime(_)) {
                return Err(Error::new(gp.span(),
                    "amock does not support generic methods"));
            }
        }
        if sig.receiver().is_none() {
            return Err(Error::new(sig.ident.span(),
                "amock does not support methods without a self receiver"));
        }
        let output = match &sig.output {
            ReturnType::Default => parse_quote!(()),
            ReturnType::Type(_, ty) => match ty.as_ref() {
                Type::Reference(_) => {
                    return Err(Error::new(ty.span(),
                        "amock does not support returning references"));
                },
                Type::ImplTrait(_) => {
                    return Err(Error::new(ty.span(),
                        "amock does not support returning `impl Trait`"));
                },
                _ => ty.as_ref().clone()
            }
        };

        let mut renamed = sig.clone();
        let mut params = Vec::new();
        for fn_arg in renamed.inputs.iter_mut() {
            if let FnArg::Typed(pat_type) = fn_arg {
                let param = Param::new(params.len(), &pat_type.ty)?;
                *pat_type.pat = Pat::Ident(PatIdent {
                    attrs: Vec::new(),
                    by_ref: None,
                    mutability: None,
                    ident: param.name.clone(),
                    subpat: None
                });
                params.push(param);
            }
        }
        let cfg_attrs = item.attrs.iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .cloned()
            .collect();
        Ok(MockFunction {
            cfg_attrs,
            method_name: sig.ident.unraw().to_string(),
            params,
            output,
            sig: renamed
        })
    }

    /// Names of the registration methods: `register_`, `register_n_` and
    /// `unregister_` followed by the method's name
    pub fn register_idents(&self) -> [Ident; 3] {
        let ident = &self.sig.ident;
        [
            format_ident!("register_{}", ident),
            format_ident!("register_n_{}", ident),
            format_ident!("unregister_{}", ident)
        ]
    }

    /// The registration methods that go in the mock struct's inherent impl
    pub fn register_fns(&self, vis: &Visibility) -> TokenStream {
        let cfg_attrs = &self.cfg_attrs;
        let method_name = &self.method_name;
        let [register, register_n, unregister] = self.register_idents();
        let names = self.params.iter().map(|p| &p.name).collect::<Vec<_>>();
        let owned_tys = self.params.iter()
            .map(|p| &p.owned_ty)
            .collect::<Vec<_>>();
        let output = &self.output;
        let register_doc = format!(
            "Register a function as a single `{}()` call.", method_name);
        let register_n_doc = format!(
            "Register a function as `n` `{}()` calls.", method_name);
        let unregister_doc = format!(
            "Forget every registered `{}()` call.", method_name);
        quote!(
            #(#cfg_attrs)*
            #[doc = #register_doc]
            #vis fn #register<AmockF>(&self, f: AmockF) -> &Self
                where AmockF: Fn(#(#owned_tys),*) -> #output
                                + Send + Sync + 'static
            {
                self.mock.register(#method_name,
                    move |#(#names: #owned_tys),*| (f(#(#names),*),));
                self
            }
            #(#cfg_attrs)*
            #[doc = #register_n_doc]
            #vis fn #register_n<AmockF>(&self, n: usize, f: AmockF)
                -> &Self
                where AmockF: Fn(#(#owned_tys),*) -> #output
                                + Send + Sync + 'static
            {
                self.mock.register_n(#method_name, n,
                    move |#(#names: #owned_tys),*| (f(#(#names),*),));
                self
            }
            #(#cfg_attrs)*
            #[doc = #unregister_doc]
            #vis fn #unregister(&self) -> &Self {
                self.mock.unregister(#method_name);
                self
            }
        )
    }

    /// The method's body in the mock struct's trait impl
    pub fn call(&self) -> TokenStream {
        let cfg_attrs = &self.cfg_attrs;
        let sig = &self.sig;
        let method_name = &self.method_name;
        let args = self.params.iter().map(Param::to_arg);
        let output = &self.output;
        quote!(
            #(#cfg_attrs)*
            #sig {
                match self.mock.call_typed::<_, (#output,)>(#method_name,
                    (#(#args,)*))
                {
                    ::std::result::Result::Ok((r,)) => r,
                    ::std::result::Result::Err(e) => ::std::panic!("{}", e)
                }
            }
        )
    }
}
