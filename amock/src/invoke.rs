// vim: tw=80
//! Type-erased handler invocation.
//!
//! Every call handler is stored behind one calling convention: a list of boxed
//! arguments goes in, a list of boxed results comes out.  Typed closures are
//! adapted to that convention by [`IntoHandler`], which unboxes each argument
//! before the call and boxes the returned tuple afterwards.  Neither the
//! [`CallQueue`](crate::CallQueue) nor the [`Mock`](crate::Mock) ever learns
//! the concrete types involved.
//!
//! # Examples
//!
//! ```
//! use amock::{Handler, IntoHandler, Values};
//!
//! let h: Handler = (|x: u32, y: u32| (x + y,)).into_handler();
//! let results = h.invoke((2u32, 3u32).into_values()).unwrap();
//! let (sum,) = <(u32,)>::from_values(results).unwrap();
//! assert_eq!(sum, 5);
//! ```

use downcast::*;
use fragile::Fragile;
use std::{
    any::type_name,
    fmt,
    sync::Arc,
    vec
};
use thiserror::Error;

/// A `'static` value that can cross the type-erasure boundary.
///
/// Implemented for every `'static + Send` type.
pub trait AnyValue: Any + Send {
    /// Name of the concrete type, for diagnostics.
    fn value_type(&self) -> &'static str;
}
downcast!(dyn AnyValue);

impl<T: Any + Send> AnyValue for T {
    fn value_type(&self) -> &'static str {
        type_name::<T>()
    }
}

/// One opaque argument or result.
pub type Value = Box<dyn AnyValue>;

/// A handler's arguments or results did not fit its signature.
///
/// This is never an expected mocking condition.  It means that the test that
/// registered the handler disagrees with the code that called it.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Mismatch {
    #[error("expected {expected} values, found {found}")]
    Arity {
        expected: usize,
        found: usize
    },
    #[error("value {position} has type {found}, expected {expected}")]
    Type {
        position: usize,
        expected: &'static str,
        found: &'static str
    },
}

/// A fixed-arity group of values that can be boxed and unboxed as a whole.
///
/// Implemented for tuples of up to eight `'static + Send` elements, including
/// the empty tuple.
pub trait Values: Sized {
    /// Box each element, in order.
    fn into_values(self) -> Vec<Value>;

    /// Unbox a list of values produced by [`into_values`](Self::into_values),
    /// checking its length and each element's type.
    fn from_values(values: Vec<Value>) -> Result<Self, Mismatch>;
}

fn take<T: AnyValue>(values: &mut vec::IntoIter<Value>, position: &mut usize)
    -> Result<T, Mismatch>
{
    let index = *position;
    *position += 1;
    let value = values.next()
        .ok_or(Mismatch::Arity{expected: index + 1, found: index})?;
    let found = (*value).value_type();
    <dyn AnyValue>::downcast::<T>(value)
        .map(|boxed| *boxed)
        .map_err(|_| Mismatch::Type {
            position: index,
            expected: type_name::<T>(),
            found
        })
}

type ErasedFn = dyn Fn(Vec<Value>) -> Result<Vec<Value>, Mismatch>
    + Send + Sync;

/// A call handler erased to the `Vec<Value> -> Vec<Value>` convention.
///
/// Cloning is cheap; clones share the same closure.
#[derive(Clone)]
pub struct Handler(Arc<ErasedFn>);

impl Handler {
    /// Wrap a closure that already speaks the erased convention.
    ///
    /// Any [`Mismatch`] that `f` returns is reported by
    /// [`Mock::call`](crate::Mock::call) as bad arguments for the call,
    /// whatever the closure's reason for returning it.
    pub fn new<F>(f: F) -> Self
        where F: Fn(Vec<Value>) -> Result<Vec<Value>, Mismatch>
                 + Send + Sync + 'static
    {
        Handler(Arc::new(f))
    }

    /// Apply the handler to `args`.
    pub fn invoke(&self, args: Vec<Value>) -> Result<Vec<Value>, Mismatch> {
        (self.0)(args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// Conversion of a typed closure into a [`Handler`].
///
/// The `Marker` parameter only disambiguates the per-arity implementations;
/// callers never name it.  A closure qualifies when it is
/// `Fn(A0, .., An) -> R + Send + Sync + 'static` with at most eight
/// `'static + Send` arguments and `R` a tuple of results.
pub trait IntoHandler<Marker> {
    fn into_handler(self) -> Handler;
}

impl IntoHandler<Handler> for Handler {
    fn into_handler(self) -> Handler {
        self
    }
}

/// Like [`IntoHandler`], for closures that are neither `Send` nor `Sync`.
///
/// The closure is pinned to the thread that converts it.  Invoking the
/// resulting handler from any other thread panics.
pub trait IntoLocalHandler<Marker> {
    fn into_local_handler(self) -> Handler;
}

macro_rules! values_impls {
    ($($T:ident $v:ident)*) => {
        impl<$($T: AnyValue,)*> Values for ($($T,)*) {
            fn into_values(self) -> Vec<Value> {
                let ($($v,)*) = self;
                vec![$(Box::new($v) as Value,)*]
            }

            #[allow(unused_mut, unused_variables)]
            fn from_values(values: Vec<Value>) -> Result<Self, Mismatch> {
                let expected = <[&str]>::len(&[$(stringify!($T),)*]);
                if values.len() != expected {
                    return Err(Mismatch::Arity {
                        expected,
                        found: values.len()
                    });
                }
                let mut values = values.into_iter();
                let mut position = 0;
                Ok(($(take::<$T>(&mut values, &mut position)?,)*))
            }
        }

        impl<Func, R, $($T: AnyValue,)*> IntoHandler<fn($($T,)*) -> R> for Func
            where Func: Fn($($T,)*) -> R + Send + Sync + 'static,
                  R: Values
        {
            fn into_handler(self) -> Handler {
                Handler::new(move |args| {
                    let ($($v,)*) = <($($T,)*)>::from_values(args)?;
                    Ok((self)($($v,)*).into_values())
                })
            }
        }

        impl<Func, R, $($T: AnyValue,)*> IntoLocalHandler<fn($($T,)*) -> R>
            for Func
            where Func: Fn($($T,)*) -> R + 'static,
                  R: Values
        {
            fn into_local_handler(self) -> Handler {
                let fragile = Fragile::new(self);
                Handler::new(move |args| {
                    let ($($v,)*) = <($($T,)*)>::from_values(args)?;
                    Ok((fragile.get())($($v,)*).into_values())
                })
            }
        }
    }
}

values_impls!{}
values_impls!{A0 a0}
values_impls!{A0 a0 A1 a1}
values_impls!{A0 a0 A1 a1 A2 a2}
values_impls!{A0 a0 A1 a1 A2 a2 A3 a3}
values_impls!{A0 a0 A1 a1 A2 a2 A3 a3 A4 a4}
values_impls!{A0 a0 A1 a1 A2 a2 A3 a3 A4 a4 A5 a5}
values_impls!{A0 a0 A1 a1 A2 a2 A3 a3 A4 a4 A5 a5 A6 a6}
values_impls!{A0 a0 A1 a1 A2 a2 A3 a3 A4 a4 A5 a5 A6 a6 A7 a7}
