// vim: tw=80
use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError}
};
use tracing::{debug, trace, trace_span};

use crate::{
    error::{Error, fatal},
    invoke::{AnyValue, Handler, IntoHandler, IntoLocalHandler, Value, Values},
    queue::{CallQueue, ConsumeError},
    MethodName,
    MockName
};

/// Outcome of verifying one method whose handlers were not all consumed.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CallReport {
    pub mock_name: MockName,
    pub method_name: MethodName,
    /// How many handlers were registered.
    pub expected_calls: usize,
    /// How many of them were consumed.
    pub actual_calls: usize,
}

impl fmt::Display for CallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}() calls count: want {}, actual {}",
               self.mock_name, self.method_name, self.expected_calls,
               self.actual_calls)
    }
}

/// The registry behind one mock object.
///
/// A `Mock` maps each method name to a [`CallQueue`] of handlers.  Every call
/// consumes the oldest unconsumed handler of its method.  Arguments never
/// influence which handler is chosen; only call order does.
///
/// All methods take `&self`, and a `Mock` is `Send + Sync`, so the object
/// under test may call it from as many threads as it likes.
///
/// # Examples
///
/// ```
/// use amock::{Error, Mock};
///
/// let mock = Mock::new("Counter");
/// mock.register("next", || (1u32,))
///     .register("next", || (2u32,));
///
/// let (a,): (u32,) = mock.call_typed("next", ()).unwrap();
/// let (b,): (u32,) = mock.call_typed("next", ()).unwrap();
/// assert_eq!((a, b), (1, 2));
///
/// let e = mock.call_typed::<(), (u32,)>("next", ()).unwrap_err();
/// assert_eq!(e.to_string(), "unexpected Counter.next() method call");
/// assert!(mock.check_calls().is_empty());
/// ```
pub struct Mock {
    name: MockName,
    methods: Mutex<BTreeMap<MethodName, Arc<CallQueue>>>
}

impl Mock {
    /// Create an empty registry.  `name` only shows up in diagnostics.
    pub fn new(name: impl Into<MockName>) -> Self {
        Mock {
            name: name.into(),
            methods: Mutex::default()
        }
    }

    pub fn name(&self) -> &MockName {
        &self.name
    }

    fn methods(&self) -> MutexGuard<'_, BTreeMap<MethodName, Arc<CallQueue>>> {
        self.methods.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the queue for `method`, creating it if necessary.
    fn queue(&self, method: MethodName) -> Arc<CallQueue> {
        self.methods()
            .entry(method)
            .or_default()
            .clone()
    }

    fn lookup(&self, method: &str) -> Option<Arc<CallQueue>> {
        self.methods().get(method).cloned()
    }

    fn append(&self, method: MethodName, n: usize, handler: Handler) -> &Self {
        trace!(mock = %self.name, method = %method, n, "registering call");
        self.queue(method).append_n(n, handler);
        self
    }

    /// Register `f` as the next expected call of `method`.
    ///
    /// Calls may be chained:
    /// ```
    /// # use amock::Mock;
    /// let mock = Mock::new("Handler");
    /// mock.register("handle", |x: i32| (x,))
    ///     .register("handle", |x: i32| (-x,));
    /// # assert_eq!(mock.check_calls().len(), 1);
    /// ```
    pub fn register<F, M>(&self, method: impl Into<MethodName>, f: F) -> &Self
        where F: IntoHandler<M>
    {
        self.append(method.into(), 1, f.into_handler())
    }

    /// Register `f` as the next `n` expected calls of `method`.
    ///
    /// Registering zero calls does nothing at all.
    pub fn register_n<F, M>(&self, method: impl Into<MethodName>, n: usize,
                            f: F) -> &Self
        where F: IntoHandler<M>
    {
        if n == 0 {
            return self;
        }
        self.append(method.into(), n, f.into_handler())
    }

    /// Single-threaded version of [`register`](Self::register), for closures
    /// that are not `Send` or `Sync`.
    ///
    /// It is a runtime error to consume the handler from a different thread
    /// than the one that registered it, or to drop the `Mock` there.
    pub fn register_st<F, M>(&self, method: impl Into<MethodName>, f: F)
        -> &Self
        where F: IntoLocalHandler<M>
    {
        self.append(method.into(), 1, f.into_local_handler())
    }

    /// Register an already type-erased value as the next call of `method`.
    ///
    /// # Panics
    ///
    /// If `value` is not a [`Handler`].  That is a defect in the test, not a
    /// mocking condition.
    pub fn register_dyn(&self, method: impl Into<MethodName>, value: Value)
        -> &Self
    {
        let method = method.into();
        match <dyn AnyValue>::downcast::<Handler>(value) {
            Ok(handler) => self.append(method, 1, *handler),
            Err(_) => fatal(&self.name, method.as_str(), Error::NotCallable)
        }
    }

    /// Forget every handler of `method`, consumed or not.
    pub fn unregister(&self, method: &str) -> &Self {
        if self.methods().remove(method).is_some() {
            trace!(mock = %self.name, method, "unregistered method");
        }
        self
    }

    /// Invoke the next handler of `method` with `args`.
    ///
    /// # Panics
    ///
    /// If the handler's signature does not fit `args`.
    pub fn call(&self, method: &str, args: Vec<Value>)
        -> Result<Vec<Value>, Error>
    {
        let _span = trace_span!("call", mock = %self.name, method).entered();
        let Some(queue) = self.lookup(method) else {
            debug!("call to unknown method");
            return Err(Error::UnknownMethodCall {
                mock: self.name.clone(),
                method: method.into()
            });
        };
        match queue.consume(args) {
            Ok(results) => Ok(results),
            Err(ConsumeError::Exhausted) => {
                debug!("call after all handlers were consumed");
                Err(Error::UnexpectedMethodCall {
                    mock: self.name.clone(),
                    method: method.into()
                })
            },
            Err(ConsumeError::Mismatch(m)) =>
                fatal(&self.name, method, format_args!("bad arguments: {}", m))
        }
    }

    /// Typed version of [`call`](Self::call).  Boxes the `args` tuple and
    /// unboxes the handler's results as an `R` tuple.
    ///
    /// # Panics
    ///
    /// If the handler's signature does not fit `A` and `R`.
    pub fn call_typed<A, R>(&self, method: &str, args: A) -> Result<R, Error>
        where A: Values, R: Values
    {
        let results = self.call(method, args.into_values())?;
        match R::from_values(results) {
            Ok(r) => Ok(r),
            Err(m) =>
                fatal(&self.name, method, format_args!("bad results: {}", m))
        }
    }

    /// Report every method whose registered handlers were not consumed
    /// exactly.  Returns an empty `Vec` when all expectations were met.
    ///
    /// Reports are sorted by method name.
    pub fn check_calls(&self) -> Vec<CallReport> {
        let queues = self.methods()
            .iter()
            .map(|(method, queue)| (method.clone(), queue.clone()))
            .collect::<Vec<_>>();
        let reports = queues.into_iter()
            .filter_map(|(method_name, queue)| {
                let (expected_calls, actual_calls) = queue.snapshot();
                (expected_calls != actual_calls).then(|| CallReport {
                    mock_name: self.name.clone(),
                    method_name,
                    expected_calls,
                    actual_calls
                })
            }).collect::<Vec<_>>();
        if !reports.is_empty() {
            debug!(mock = %self.name, unmet = reports.len(),
                   "unmet call expectations");
        }
        reports
    }

    /// Panic if [`check_calls`](Self::check_calls) reports anything.
    #[track_caller]
    pub fn assert_calls(&self) {
        let reports = self.check_calls();
        if !reports.is_empty() {
            let lines = reports.iter()
                .map(|r| format!("\n    {}", r))
                .collect::<String>();
            panic!("{}: unmet call expectations:{}", self.name, lines);
        }
    }
}

impl AsRef<Mock> for Mock {
    fn as_ref(&self) -> &Mock {
        self
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mock")
            .field("name", &self.name)
            .field("methods", &self.methods().keys().collect::<Vec<_>>())
            .finish()
    }
}
