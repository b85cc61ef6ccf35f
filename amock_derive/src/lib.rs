// vim: tw=80
//! Proc Macros for use with Amock
//!
//! You probably don't want to use this crate directly.  Instead, you use its
//! reexports via the [`amock`](../amock/index.html) crate.

extern crate proc_macro;

use proc_macro2::TokenStream;
use syn::{
    Error,
    Item,
    parse2,
    spanned::Spanned
};

mod attrs;
mod mock_function;
mod mock_trait;
use crate::attrs::Attrs;
use crate::mock_trait::MockTrait;

fn do_amock(attrs: TokenStream, input: TokenStream) -> TokenStream {
    let attrs: Attrs = match parse2(attrs) {
        Ok(a) => a,
        Err(err) => return err.to_compile_error()
    };
    let item: Item = match parse2(input) {
        Ok(item) => item,
        Err(err) => return err.to_compile_error()
    };
    let result = match item {
        Item::Trait(item_trait) => MockTrait::new(attrs, &item_trait),
        other => Err(Error::new(other.span(),
            "#[amock] can only be applied to traits"))
    };
    match result {
        Ok(mock) => mock.gen(),
        Err(err) => err.to_compile_error()
    }
}

/// Automatically generate a mock struct for a trait.
///
/// For a trait `Foo`, it generates a struct `MockFoo` that implements `Foo` by
/// delegating every method to an [`amock::Mock`](../amock/struct.Mock.html).
/// For each method `bar`, `MockFoo` also gets:
///
/// * `register_bar(f)`: register `f` as the next expected call.  `f` has the
///   same signature as `bar`, except that shared reference arguments are
///   passed to it as their owned equivalents, e.g. `String` for `&str`.
/// * `register_n_bar(n, f)`: register `f` as the next `n` expected calls.
/// * `unregister_bar()`: forget every registered call.
///
/// The registration methods return `&Self`, so they may be chained.  Calling a
/// method more times than it has registered calls, or calling a method that
/// has none registered, panics.
///
/// # Options
///
/// * `name = Ident`: name of the generated struct instead of `MockFoo`.
/// * `mock_name = "str"`: name used in error messages and
///   [`CallReport`](../amock/struct.CallReport.html)s instead of `Foo`.
///
/// # Examples
///
/// ```ignore
/// # use amock::amock;
/// #[amock(name = FakeClock)]
/// trait Clock {
///     fn now(&self) -> u64;
///     fn sleep(&self, millis: u64);
/// }
///
/// let clock = FakeClock::new();
/// clock.register_n_now(2, || 7)
///     .register_sleep(|millis| assert_eq!(millis, 5));
/// assert_eq!(clock.now(), 7);
/// clock.sleep(5);
/// assert_eq!(clock.check_calls().len(), 1);
/// ```
///
/// # Limitations
///
/// The trait must not be generic, have supertraits, or have associated types
/// or constants.  Two methods must not map to the same registration method,
/// as `read` and `n_read` both would to `register_n_read`.
/// Every method must take `self` in some form, must not be `async` or
/// generic over types, must not take `&mut` or `impl Trait` arguments, and
/// must not return references.  Argument and return types must be
/// `'static + Send`.
#[proc_macro_attribute]
pub fn amock(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    let input: TokenStream = input.into();
    let mut output = input.clone();
    output.extend(do_amock(attrs.into(), input));
    output.into()
}

/// Test cases for `#[amock]`.
#[cfg(test)]
mod t {
    use super::*;
    use quote::quote;

    #[test]
    fn not_a_trait() {
        let output = do_amock(quote!(), quote!(struct Reader;)).to_string();
        assert!(output.contains("compile_error"), "{}", output);
        assert!(output.contains("#[amock] can only be applied to traits"),
                "{}", output);
    }

    #[test]
    fn bad_attrs() {
        let output = do_amock(quote!(path = "gen"), quote!(trait Reader {}))
            .to_string();
        assert!(output.contains("unknown amock option `path`"), "{}", output);
    }

    #[test]
    fn trait_is_mocked() {
        let output = do_amock(quote!(), quote!(
            trait Reader {
                fn read(&self) -> u8;
            }
        )).to_string();
        assert!(!output.contains("compile_error"), "{}", output);
        assert!(output.contains("MockReader"), "{}", output);
    }
}
