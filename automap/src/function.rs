//! Callables that can be exposed as endpoints.
//!
//! [`Function::new`] wraps an ordinary Rust closure with typed parameters.
//! The parameter names given alongside it are what keyword arguments bind
//! against:
//!
//! ```
//! use automap::function::Function;
//! use automap::{Arguments, Callable, Value};
//!
//! let pow = Function::new(&["base", "exp"], |base: f64, exp: i32| base.powi(exp));
//! let args = Arguments::new()
//!     .arg(Value::Float(2.0))
//!     .kwarg("exp", Value::Int(10));
//! assert_eq!(pow.call(args), Ok(Value::Float(1024.0)));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::args::Arguments;
use crate::error::CallError;
use crate::value::{FromArg, IntoOutput, Value};

/// Anything that can be invoked with [`Arguments`].
pub trait Callable: Send + Sync + 'static {
    fn call(&self, args: Arguments) -> Result<Value, CallError>;

    /// Declared parameter names, or `None` when the callable takes its
    /// arguments as-is.
    fn params(&self) -> Option<&[String]> {
        None
    }
}

/// A closure whose parameters are all [`FromArg`] and whose return value is
/// [`IntoOutput`].
///
/// Implemented for `Fn` closures of up to eight parameters; `Args` is the
/// tuple of parameter types.
pub trait TypedFn<Args>: Send + Sync + 'static {
    const ARITY: usize;

    fn invoke(&self, slots: Vec<Option<Value>>, params: &[String]) -> Result<Value, CallError>;
}

macro_rules! impl_typed_fn {
    ($arity:literal; $($ty:ident $var:ident),*) => {
        impl<F, R, $($ty,)*> TypedFn<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            R: IntoOutput,
            $($ty: FromArg,)*
        {
            const ARITY: usize = $arity;

            #[allow(unused_mut, unused_variables)]
            fn invoke(&self, slots: Vec<Option<Value>>, params: &[String]) -> Result<Value, CallError> {
                let mut slots = slots.into_iter().zip(params);
                $(
                    let $var = match slots.next() {
                        Some((slot, param)) => $ty::from_arg(param, slot)?,
                        None => $ty::from_arg("", None)?,
                    };
                )*
                (self)($($var),*).into_output()
            }
        }
    };
}

impl_typed_fn!(0;);
impl_typed_fn!(1; A a);
impl_typed_fn!(2; A a, B b);
impl_typed_fn!(3; A a, B b, C c);
impl_typed_fn!(4; A a, B b, C c, D d);
impl_typed_fn!(5; A a, B b, C c, D d, E e);
impl_typed_fn!(6; A a, B b, C c, D d, E e, G g);
impl_typed_fn!(7; A a, B b, C c, D d, E e, G g, H h);
impl_typed_fn!(8; A a, B b, C c, D d, E e, G g, H h, I i);

type ErasedFn = dyn Fn(Arguments) -> Result<Value, CallError> + Send + Sync;

/// A type-erased exposed function.
#[derive(Clone)]
pub struct Function {
    params: Option<Vec<String>>,
    inner: Arc<ErasedFn>,
}

impl Function {
    /// Wraps a typed closure. `params` names its parameters in order; names
    /// past the closure's arity are ignored and missing ones become `arg<N>`.
    pub fn new<F, Args>(params: &[&str], f: F) -> Self
    where
        F: TypedFn<Args>,
    {
        let params: Vec<String> = (0..F::ARITY)
            .map(|i| {
                params
                    .get(i)
                    .map_or_else(|| format!("arg{i}"), |name| (*name).to_string())
            })
            .collect();
        let names = params.clone();

        Self {
            params: Some(params),
            inner: Arc::new(move |args| {
                let slots = bind(&names, args)?;
                f.invoke(slots, &names)
            }),
        }
    }

    /// Wraps a closure that receives the parsed [`Arguments`] unbound, for
    /// callables taking any number of arguments.
    pub fn variadic<F, R>(f: F) -> Self
    where
        F: Fn(Arguments) -> R + Send + Sync + 'static,
        R: IntoOutput,
    {
        Self {
            params: None,
            inner: Arc::new(move |args| f(args).into_output()),
        }
    }
}

impl Callable for Function {
    fn call(&self, args: Arguments) -> Result<Value, CallError> {
        (self.inner)(args)
    }

    fn params(&self) -> Option<&[String]> {
        self.params.as_deref()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Assigns positional arguments to parameters in order, then keywords by name.
pub fn bind(params: &[String], args: Arguments) -> Result<Vec<Option<Value>>, CallError> {
    let given = args.positional.len();
    if given > params.len() {
        return Err(CallError::TooManyPositional {
            expected: params.len(),
            given,
        });
    }

    let mut slots: Vec<Option<Value>> = args.positional.into_iter().map(Some).collect();
    slots.resize_with(params.len(), || None);

    for (key, value) in args.keyword {
        let index = params
            .iter()
            .position(|param| *param == key)
            .ok_or_else(|| CallError::UnexpectedKeyword(key.clone()))?;
        if slots[index].is_some() {
            return Err(CallError::DuplicateArgument(key));
        }
        slots[index] = Some(value);
    }

    Ok(slots)
}
