// vim: tw=80
//! Call-order mock objects for Rust.
//!
//! Amock lets a test stand in for a real dependency by declaring, per method,
//! an ordered list of expected calls and the results each one produces.  At
//! the end of the test it verifies that every declared call actually
//! happened.
//!
//! # Usage
//!
//! There are two ways to use Amock.  The easiest is [`#[amock]`](macro@amock),
//! which turns a trait definition into a mock struct with typed registration
//! methods.  For anything it can't handle, a [`Mock`] can be driven by hand.
//!
//! Whichever method is used, the basic idea is the same.
//! * Register one handler per expected call.  Handlers for the same method
//!   are consumed in the order they were registered, regardless of their
//!   arguments.
//! * Supply the mock object to the code that you're testing.  Each call it
//!   makes consumes the next handler and returns whatever that handler
//!   returns.
//! * When the test is done, check that no handler was left over with
//!   [`Mock::check_calls`], or with [`check_calls`] across several mocks.
//!
//! # Generated mocks
//!
//! ```
//! use amock::amock;
//!
//! #[amock]
//! pub trait Store {
//!     fn get(&self, key: &str) -> Option<u32>;
//!     fn put(&self, key: String, value: u32);
//! }
//!
//! fn bump(store: &dyn Store, key: &str) {
//!     let v = store.get(key).unwrap_or(0);
//!     store.put(key.to_owned(), v + 1);
//! }
//!
//! let mock = MockStore::new();
//! mock.register_get(|key| {
//!         assert_eq!(key, "hits");
//!         Some(41)
//!     })
//!     .register_put(|key, value| {
//!         assert_eq!(key, "hits");
//!         assert_eq!(value, 42);
//!     });
//! bump(&mock, "hits");
//! assert!(mock.check_calls().is_empty());
//! ```
//!
//! A generated mock panics if it is called more times than it has handlers,
//! or if a method was never registered at all.
//!
//! # Hand-written mocks
//!
//! A [`Mock`] is only a registry.  A wrapper type decides how each method of
//! the mocked trait maps onto it.  Handlers are ordinary closures; the
//! returned tuple holds the results.
//!
//! ```
//! use amock::Mock;
//!
//! trait Clock {
//!     fn now(&self) -> u64;
//! }
//!
//! struct MockClock(Mock);
//!
//! impl Clock for MockClock {
//!     fn now(&self) -> u64 {
//!         match self.0.call_typed("now", ()) {
//!             Ok((t,)) => t,
//!             Err(e) => panic!("{}", e)
//!         }
//!     }
//! }
//!
//! let clock = MockClock(Mock::new("Clock"));
//! clock.0.register_n("now", 2, || (1_000u64,));
//! assert_eq!(clock.now(), 1_000);
//! let reports = clock.0.check_calls();
//! assert_eq!(reports[0].to_string(),
//!            "Clock.now() calls count: want 2, actual 1");
//! ```
//!
//! # Concurrency
//!
//! Any number of threads may call the same mock.  Each call claims exactly
//! one handler, and the k-th claim on a method always gets its k-th handler.
//! When calls race, which thread receives which handler is unspecified.
//! Handlers run outside of any lock, so a handler may call back into its own
//! mock.
//!
//! # Errors and panics
//!
//! [`Mock::call`] returns [`Error::UnknownMethodCall`] and
//! [`Error::UnexpectedMethodCall`] as values.  Everything that can only be a
//! defect in the test itself panics instead: registering a value that isn't a
//! [`Handler`], or a handler whose argument or result types disagree with the
//! caller's.  Verification never panics, except through the opt-in
//! [`Mock::assert_calls`].

use std::{
    borrow::Borrow,
    collections::BTreeMap,
    fmt
};

mod error;
mod invoke;
mod mock;
pub mod queue;

pub use amock_derive::amock;
pub use crate::error::Error;
pub use crate::invoke::{
    AnyValue,
    Handler,
    IntoHandler,
    IntoLocalHandler,
    Mismatch,
    Value,
    Values
};
pub use crate::mock::{CallReport, Mock};
pub use crate::queue::{CallQueue, ConsumeError};

macro_rules! name_type {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    }
}

name_type!{
    /// Identity of one mock object.  Only used in diagnostics.
    MockName
}

name_type!{
    /// Identity of one method of a mocked trait.
    MethodName
}

/// Verify several mocks at once.
///
/// Returns a map from each mock's position in `mocks` to its
/// [`CallReport`]s.  Mocks whose expectations were all met are left out, so
/// the map is empty when everything is fine.
///
/// # Examples
///
/// ```
/// use amock::{Mock, check_calls};
///
/// let a = Mock::new("A");
/// let b = Mock::new("B");
/// b.register("run", || ());
///
/// let unmet = check_calls([&a, &b]);
/// assert_eq!(unmet.len(), 1);
/// assert_eq!(unmet[&1][0].expected_calls, 1);
/// ```
pub fn check_calls<'a, I, M>(mocks: I) -> BTreeMap<usize, Vec<CallReport>>
    where I: IntoIterator<Item = &'a M>,
          M: AsRef<Mock> + ?Sized + 'a
{
    mocks.into_iter()
        .enumerate()
        .filter_map(|(i, mock)| {
            let reports = mock.as_ref().check_calls();
            (!reports.is_empty()).then_some((i, reports))
        }).collect()
}
