// vim: tw=80
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::collections::HashSet;
use syn::{
    *,
    spanned::Spanned
};

use crate::{
    attrs::Attrs,
    mock_function::MockFunction
};

/// Descriptor of a mocked trait
pub(crate) struct MockTrait {
    /// Name of the trait being mocked
    pub trait_ident: Ident,
    /// Name of the generated struct, like `MockReader`
    pub mock_ident: Ident,
    /// Name of the mock in diagnostics
    pub mock_name: LitStr,
    pub methods: Vec<MockFunction>,
    pub unsafety: Option<Token![unsafe]>,
    pub vis: Visibility,
}

/// Generate a mock identifier from the regular one: eg "Foo" => "MockFoo"
fn gen_mock_ident(ident: &Ident) -> Ident {
    format_ident!("Mock{}", ident)
}

impl MockTrait {
    pub fn new(attrs: Attrs, item: &ItemTrait) -> Result<Self> {
        if !item.generics.params.is_empty() {
            return Err(Error::new(item.generics.span(),
                "amock does not support generic traits"));
        }
        if !item.supertraits.is_empty() {
            return Err(Error::new(item.supertraits.span(),
                "amock does not support supertraits"));
        }
        let mut methods = Vec::new();
        let mut register_idents = HashSet::new();
        for ti in item.items.iter() {
            match ti {
                TraitItem::Fn(tif) => {
                    let mf = MockFunction::new(tif)?;
                    for ident in mf.register_idents() {
                        if !register_idents.insert(ident.to_string()) {
                            return Err(Error::new(tif.sig.ident.span(),
                                format!("amock would generate `{}` twice",
                                        ident)));
                        }
                    }
                    methods.push(mf);
                },
                TraitItem::Const(_) | TraitItem::Type(_) => {
                    return Err(Error::new(ti.span(),
                        "amock does not support associated items"));
                },
                _ => {
                    return Err(Error::new(ti.span(),
                        "amock does not support this trait item"));
                }
            }
        }
        let trait_ident = item.ident.clone();
        let mock_ident = attrs.name
            .unwrap_or_else(|| gen_mock_ident(&trait_ident));
        let mock_name = attrs.mock_name.unwrap_or_else(||
            LitStr::new(&trait_ident.to_string(), trait_ident.span()));
        Ok(MockTrait {
            trait_ident,
            mock_ident,
            mock_name,
            methods,
            unsafety: item.unsafety,
            vis: item.vis.clone()
        })
    }

    /// Generate the mock struct and its impls
    pub fn gen(&self) -> TokenStream {
        let trait_ident = &self.trait_ident;
        let mock_ident = &self.mock_ident;
        let mock_name = &self.mock_name;
        let unsafety = &self.unsafety;
        let vis = &self.vis;
        let register_fns = self.methods.iter()
            .map(|meth| meth.register_fns(vis));
        let calls = self.methods.iter().map(MockFunction::call);
        let struct_doc = format!("Mock implementation of [`{}`].",
                                 trait_ident);
        quote!(
            #[doc = #struct_doc]
            #[derive(Debug)]
            #vis struct #mock_ident {
                mock: ::amock::Mock,
            }
            impl #mock_ident {
                /// Create a mock with no registered calls.
                #vis fn new() -> Self {
                    Self {
                        mock: ::amock::Mock::new(#mock_name),
                    }
                }
                /// Report every method whose registered calls were not all
                /// made.
                #vis fn check_calls(&self)
                    -> ::std::vec::Vec<::amock::CallReport>
                {
                    self.mock.check_calls()
                }
                #(#register_fns)*
            }
            impl ::std::default::Default for #mock_ident {
                fn default() -> Self {
                    Self::new()
                }
            }
            impl ::std::convert::AsRef<::amock::Mock> for #mock_ident {
                fn as_ref(&self) -> &::amock::Mock {
                    &self.mock
                }
            }
            #unsafety impl #trait_ident for #mock_ident {
                #(#calls)*
            }
        )
    }
}
