//! Function invocation bridge
//!
//! Wraps Rust closures so script can call them with a loose argument list:
//!
//! - each positional argument is converted with the declared parameter type
//! - a trailing [`Variadic<T>`] collects every remaining argument
//! - missing trailing parameters receive their zero value
//! - extra arguments are ignored (or rejected with `strict_arity`)
//! - a `Result` return is the error-as-last-return convention: `Err`
//!   becomes a script exception, `Ok` is unwrapped
//! - zero results push `undefined`, one pushes the value, several push an
//!   array

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use hostlink_sdk::ScriptValue;
use tracing::trace;

use crate::bridge::CallContext;
use crate::convert::{FromScript, IntoHost};
use crate::descriptor::Bridged;
use crate::error::{BridgeError, BridgeResult};
use crate::host::{HostValue, Shared};
use crate::marshal;

// ============================================================================
// Signatures
// ============================================================================

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamType {
    /// Host type name
    pub type_name: &'static str,
    /// Whether this parameter collects the remaining arguments
    pub variadic: bool,
}

/// Declared shape of a function's results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnShape {
    /// Number of results, including the trailing error slot
    pub arity: usize,
    /// Whether the last result is the error slot
    pub fallible: bool,
}

/// Parameter and return shape of a wrapped function, computed once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<ParamType>,
    returns: ReturnShape,
}

impl Signature {
    /// Create a signature
    pub fn new(params: Vec<ParamType>, returns: ReturnShape) -> Self {
        Self { params, returns }
    }

    /// Declared parameters
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Declared parameter count (a variadic tail counts once)
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Check if the last parameter is variadic
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.variadic)
    }

    /// Declared return shape
    pub fn returns(&self) -> ReturnShape {
        self.returns
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Trailing parameter collecting every remaining argument
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Variadic<T>(pub Vec<T>);

impl<T> Variadic<T> {
    /// Unwrap the collected arguments
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Deref for Variadic<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> IntoIterator for Variadic<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A type that can appear in a wrapped function's parameter list
pub trait Param: Sized + Send + 'static {
    /// Declared type, for the signature
    fn param_type() -> ParamType;

    /// Read this parameter from the argument list at `index`
    fn extract(cx: &mut CallContext<'_>, args: &[ScriptValue], index: usize) -> BridgeResult<Self>;
}

impl<T: FromScript> Param for T {
    fn param_type() -> ParamType {
        ParamType {
            type_name: T::type_name(),
            variadic: false,
        }
    }

    fn extract(cx: &mut CallContext<'_>, args: &[ScriptValue], index: usize) -> BridgeResult<Self> {
        match args.get(index) {
            Some(arg) => T::from_script(cx, arg),
            None => T::zero(),
        }
    }
}

impl<T: FromScript> Param for Variadic<T> {
    fn param_type() -> ParamType {
        ParamType {
            type_name: T::type_name(),
            variadic: true,
        }
    }

    fn extract(cx: &mut CallContext<'_>, args: &[ScriptValue], index: usize) -> BridgeResult<Self> {
        let rest = args.get(index..).unwrap_or_default();
        let mut items = Vec::with_capacity(rest.len());
        for arg in rest {
            items.push(T::from_script(cx, arg)?);
        }
        Ok(Variadic(items))
    }
}

// ============================================================================
// Results
// ============================================================================

/// State of the trailing error slot after a call
#[derive(Debug)]
pub enum TrailingError {
    /// The function has no error slot
    Absent,
    /// The error slot was nil
    Nil,
    /// The function failed
    Raised(anyhow::Error),
}

/// Raw results of a host call, before the error slot is inspected
#[derive(Debug)]
pub struct ReturnList {
    values: Vec<HostValue>,
    error: TrailingError,
}

impl ReturnList {
    /// Results of an infallible call
    pub fn new(values: Vec<HostValue>) -> Self {
        Self {
            values,
            error: TrailingError::Absent,
        }
    }

    /// Results of a failed call
    pub fn raised(error: anyhow::Error) -> Self {
        Self {
            values: Vec::new(),
            error: TrailingError::Raised(error),
        }
    }

    /// Non-error results
    pub fn values(&self) -> &[HostValue] {
        &self.values
    }

    /// Trailing error slot
    pub fn error(&self) -> &TrailingError {
        &self.error
    }

    /// Strip a nil error or fail with the raised one
    pub fn settle(self) -> BridgeResult<Vec<HostValue>> {
        match self.error {
            TrailingError::Raised(e) => Err(BridgeError::Host(e)),
            TrailingError::Absent | TrailingError::Nil => Ok(self.values),
        }
    }
}

/// A type that can be returned from a wrapped function
pub trait IntoReturns {
    /// Declared shape
    fn shape() -> ReturnShape;

    /// Convert into the raw result list
    fn into_returns(self) -> ReturnList;
}

impl IntoReturns for () {
    fn shape() -> ReturnShape {
        ReturnShape {
            arity: 0,
            fallible: false,
        }
    }

    fn into_returns(self) -> ReturnList {
        ReturnList::new(Vec::new())
    }
}

impl<T: IntoHost> IntoReturns for T {
    fn shape() -> ReturnShape {
        ReturnShape {
            arity: 1,
            fallible: false,
        }
    }

    fn into_returns(self) -> ReturnList {
        ReturnList::new(vec![self.into_host()])
    }
}

macro_rules! impl_into_returns_tuple {
    ($arity:literal; $($t:ident),+) => {
        impl<$($t: IntoHost),+> IntoReturns for ($($t,)+) {
            fn shape() -> ReturnShape {
                ReturnShape {
                    arity: $arity,
                    fallible: false,
                }
            }

            #[allow(non_snake_case)]
            fn into_returns(self) -> ReturnList {
                let ($($t,)+) = self;
                ReturnList::new(vec![$($t.into_host()),+])
            }
        }
    };
}

impl_into_returns_tuple!(2; R1, R2);
impl_into_returns_tuple!(3; R1, R2, R3);
impl_into_returns_tuple!(4; R1, R2, R3, R4);

impl<R, E> IntoReturns for Result<R, E>
where
    R: IntoReturns,
    E: Into<anyhow::Error>,
{
    fn shape() -> ReturnShape {
        ReturnShape {
            arity: R::shape().arity + 1,
            fallible: true,
        }
    }

    fn into_returns(self) -> ReturnList {
        match self {
            Ok(values) => {
                let mut list = values.into_returns();
                list.error = TrailingError::Nil;
                list
            }
            Err(e) => ReturnList::raised(e.into()),
        }
    }
}

// ============================================================================
// HostFunction
// ============================================================================

type Invoker =
    dyn Fn(&mut CallContext<'_>, &[ScriptValue]) -> BridgeResult<ReturnList> + Send + Sync;

struct FunctionInner {
    name: String,
    signature: Signature,
    invoke: Box<Invoker>,
}

/// A host callable with its cached signature
#[derive(Clone)]
pub struct HostFunction {
    inner: Arc<FunctionInner>,
}

impl HostFunction {
    /// Wrap a closure or fn item
    pub fn new<M, F>(name: impl Into<String>, f: F) -> Self
    where
        F: IntoHostFunction<M>,
    {
        f.into_host_function(name.into())
    }

    /// Wrap a raw invoker with an explicit signature
    pub fn from_invoker<I>(name: impl Into<String>, signature: Signature, invoke: I) -> Self
    where
        I: Fn(&mut CallContext<'_>, &[ScriptValue]) -> BridgeResult<ReturnList>
            + Send
            + Sync
            + 'static,
    {
        HostFunction {
            inner: Arc::new(FunctionInner {
                name: name.into(),
                signature,
                invoke: Box::new(invoke),
            }),
        }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Cached signature
    pub fn signature(&self) -> &Signature {
        &self.inner.signature
    }

    /// Check if both wrap the same callable
    pub fn ptr_eq(&self, other: &HostFunction) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Call with script arguments; returns the results with the error slot
    /// settled
    pub fn call(
        &self,
        cx: &mut CallContext<'_>,
        args: &[ScriptValue],
    ) -> BridgeResult<Vec<HostValue>> {
        let signature = &self.inner.signature;
        let config = cx.config();
        if args.len() > config.max_arguments {
            return Err(BridgeError::Argument(format!(
                "{}: {} arguments exceed the limit of {}",
                self.inner.name,
                args.len(),
                config.max_arguments
            )));
        }
        if config.strict_arity && !signature.is_variadic() && args.len() > signature.param_count()
        {
            return Err(BridgeError::Argument(format!(
                "{} takes {} arguments but {} were given",
                self.inner.name,
                signature.param_count(),
                args.len()
            )));
        }

        trace!(
            target: "hostlink::invoke",
            function = %self.inner.name,
            argc = args.len(),
            params = signature.param_count(),
            "invoking host function"
        );
        (self.inner.invoke)(cx, args)?.settle()
    }

    /// Call and push the results back to script
    pub(crate) fn call_from_script(
        &self,
        cx: &mut CallContext<'_>,
        args: &[ScriptValue],
    ) -> BridgeResult<ScriptValue> {
        let values = self.call(cx, args)?;
        marshal::push_returns(cx, values)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.inner.name)
            .field("signature", &self.inner.signature)
            .finish()
    }
}

// ============================================================================
// Callable traits
// ============================================================================

/// A free function that can be wrapped as a [`HostFunction`].
///
/// Implemented for `Fn(A1..An) -> R` up to eight parameters where every
/// `Ai: Param` and `R: IntoReturns`.
pub trait IntoHostFunction<Marker>: Send + Sync + 'static {
    /// Wrap under `name`
    fn into_host_function(self, name: String) -> HostFunction;
}

impl IntoHostFunction<HostFunction> for HostFunction {
    fn into_host_function(self, _name: String) -> HostFunction {
        self
    }
}

/// A method with a value receiver (`&T`)
pub trait ValueMethod<T, Marker>: Send + Sync + 'static {
    /// Declared signature, receiver excluded
    fn signature() -> Signature;

    /// Call on `this` with script arguments
    fn invoke(
        &self,
        this: &Shared<T>,
        cx: &mut CallContext<'_>,
        args: &[ScriptValue],
    ) -> BridgeResult<ReturnList>;
}

/// A method with a pointer receiver (`&mut T`)
pub trait PointerMethod<T, Marker>: Send + Sync + 'static {
    /// Declared signature, receiver excluded
    fn signature() -> Signature;

    /// Call on `this` with script arguments
    fn invoke(
        &self,
        this: &Shared<T>,
        cx: &mut CallContext<'_>,
        args: &[ScriptValue],
    ) -> BridgeResult<ReturnList>;
}

macro_rules! impl_callables {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg,)*> IntoHostFunction<fn($($arg,)*) -> Ret> for Func
        where
            Func: Fn($($arg),*) -> Ret + Send + Sync + 'static,
            Ret: IntoReturns,
            $($arg: Param,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn into_host_function(self, name: String) -> HostFunction {
                let signature = Signature::new(vec![$(<$arg as Param>::param_type()),*], Ret::shape());
                HostFunction::from_invoker(name, signature, move |cx, args| {
                    let mut index = 0usize;
                    $(
                        let $arg = <$arg as Param>::extract(cx, args, index)?;
                        index += 1;
                    )*
                    Ok((self)($($arg),*).into_returns())
                })
            }
        }

        impl<T, Func, Ret, $($arg,)*> ValueMethod<T, fn(&T, $($arg,)*) -> Ret> for Func
        where
            T: Bridged,
            Func: Fn(&T, $($arg),*) -> Ret + Send + Sync + 'static,
            Ret: IntoReturns,
            $($arg: Param,)*
        {
            fn signature() -> Signature {
                Signature::new(vec![$(<$arg as Param>::param_type()),*], Ret::shape())
            }

            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn invoke(
                &self,
                this: &Shared<T>,
                cx: &mut CallContext<'_>,
                args: &[ScriptValue],
            ) -> BridgeResult<ReturnList> {
                let mut index = 0usize;
                $(
                    let $arg = <$arg as Param>::extract(cx, args, index)?;
                    index += 1;
                )*
                let ret = {
                    let guard = this.try_read()?;
                    (self)(&*guard, $($arg),*)
                };
                Ok(ret.into_returns())
            }
        }

        impl<T, Func, Ret, $($arg,)*> PointerMethod<T, fn(&mut T, $($arg,)*) -> Ret> for Func
        where
            T: Bridged,
            Func: Fn(&mut T, $($arg),*) -> Ret + Send + Sync + 'static,
            Ret: IntoReturns,
            $($arg: Param,)*
        {
            fn signature() -> Signature {
                Signature::new(vec![$(<$arg as Param>::param_type()),*], Ret::shape())
            }

            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn invoke(
                &self,
                this: &Shared<T>,
                cx: &mut CallContext<'_>,
                args: &[ScriptValue],
            ) -> BridgeResult<ReturnList> {
                let mut index = 0usize;
                $(
                    let $arg = <$arg as Param>::extract(cx, args, index)?;
                    index += 1;
                )*
                let ret = {
                    let mut guard = this.try_write()?;
                    (self)(&mut *guard, $($arg),*)
                };
                Ok(ret.into_returns())
            }
        }
    };
}

impl_callables!();
impl_callables!(A1);
impl_callables!(A1, A2);
impl_callables!(A1, A2, A3);
impl_callables!(A1, A2, A3, A4);
impl_callables!(A1, A2, A3, A4, A5);
impl_callables!(A1, A2, A3, A4, A5, A6);
impl_callables!(A1, A2, A3, A4, A5, A6, A7);
impl_callables!(A1, A2, A3, A4, A5, A6, A7, A8);
