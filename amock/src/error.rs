// vim: tw=80
use std::fmt::Display;
use thiserror::Error;

use crate::{MethodName, MockName};

/// Recoverable mocking conditions.
///
/// `call` returns the last two variants as ordinary values; it never retries.
/// What to do with them (return them, or panic like a generated mock does) is
/// up to the caller.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// A value registered as a call handler cannot be invoked.
    #[error("not a function")]
    NotCallable,
    /// The method has no handlers: it was never registered, or it was
    /// unregistered.
    #[error("unknown {mock}.{method}() method call")]
    UnknownMethodCall {
        mock: MockName,
        method: MethodName
    },
    /// Every handler registered for the method has already been consumed.
    #[error("unexpected {mock}.{method}() method call")]
    UnexpectedMethodCall {
        mock: MockName,
        method: MethodName
    },
}

impl Error {
    /// Name of the mock that rejected the call, if this is a call error.
    pub fn mock_name(&self) -> Option<&MockName> {
        match self {
            Error::NotCallable => None,
            Error::UnknownMethodCall{mock, ..} |
            Error::UnexpectedMethodCall{mock, ..} => Some(mock)
        }
    }

    /// Name of the rejected method, if this is a call error.
    pub fn method_name(&self) -> Option<&MethodName> {
        match self {
            Error::NotCallable => None,
            Error::UnknownMethodCall{method, ..} |
            Error::UnexpectedMethodCall{method, ..} => Some(method)
        }
    }
}

/// Abort the current thread because the test's own setup is broken.
///
/// Used for conditions outside of [`Error`]: values that cannot be called and
/// handlers whose signature disagrees with the call site.
#[cold]
#[track_caller]
pub(crate) fn fatal(mock: &MockName, method: &str, reason: impl Display) -> ! {
    panic!("{}.{}(): {}", mock, method, reason)
}
