// vim: tw=80
use syn::{
    *,
    parse::{Parse, ParseStream},
    punctuated::Punctuated
};

/// A single `#[amock(...)]` option
enum Attr {
    /// Name of the generated struct
    Name(Ident),
    /// Name of the mock in diagnostics
    MockName(LitStr),
}

impl Parse for Attr {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        input.parse::<Token![=]>()?;
        if key == "name" {
            input.parse().map(Attr::Name)
        } else if key == "mock_name" {
            input.parse().map(Attr::MockName)
        } else {
            Err(Error::new(key.span(),
                format!("unknown amock option `{}`", key)))
        }
    }
}

/// amock attributes
#[derive(Debug, Default)]
pub(crate) struct Attrs {
    pub name: Option<Ident>,
    pub mock_name: Option<LitStr>,
}

impl Parse for Attrs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attrs = Attrs::default();
        let items = Punctuated::<Attr, Token![,]>::parse_terminated(input)?;
        for item in items {
            match item {
                Attr::Name(ident) => {
                    if attrs.name.replace(ident.clone()).is_some() {
                        return Err(Error::new(ident.span(),
                            "duplicate amock option `name`"));
                    }
                },
                Attr::MockName(lit) => {
                    if attrs.mock_name.replace(lit.clone()).is_some() {
                        return Err(Error::new(lit.span(),
                            "duplicate amock option `mock_name`"));
                    }
                }
            }
        }
        Ok(attrs)
    }
}
