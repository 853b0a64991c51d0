//! Constructor metadata for registrable types.
//!
//! Rust has no runtime reflection over constructors, so each registrable type lists its public
//! constructors explicitly as [Constructor] values. A constructor is built from a plain function:
//! its parameter types are captured as [ServiceKey]s when it is wrapped, which is all the
//! constructor selector needs to score it.
//!
//! ```
//! # use std::sync::Arc;
//! # use wirebox::*;
//! trait Clock: Send + Sync {}
//!
//! struct Scheduler {
//!     clock: Arc<dyn Clock>,
//!     retries: u32,
//! }
//!
//! impl Scheduler {
//!     fn new(clock: Arc<dyn Clock>, retries: u32) -> Self {
//!         Self { clock, retries }
//!     }
//! }
//!
//! activate!(Scheduler, Scheduler::new);
//!
//! let info = TypeInfo::of::<Scheduler>();
//! assert_eq!(
//!     info.constructors()[0].parameters(),
//!     &[ServiceKey::of::<dyn Clock>(), ServiceKey::of::<u32>()]
//! );
//! ```

use std::sync::Arc;

use crate::{BoxError, Dispose, Instance, ResolveError, ServiceKey};

/// A type that the container can construct.
pub trait Activate: Send + Sync + Sized + 'static {
    /// Public constructors, in declaration order.
    fn constructors() -> Vec<Constructor<Self>>;

    /// Disposal hook for a freshly constructed instance.
    fn disposer(_instance: &Arc<Self>) -> Option<Arc<dyn Dispose>> {
        None
    }
}

/// Declare that a concrete type can be provided as the (usually unsized) service type `S`.
///
/// Every type implements it for itself; use [implements!](crate::implements) for trait objects.
pub trait Implements<S: ?Sized> {
    fn upcast(self: Arc<Self>) -> Arc<S>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// A constructor parameter type.
///
/// Implemented for `Arc<T>` (a required service), `Option<P>` (an optional one) and for the
/// primitive-with-default types taken by value.
pub trait Injectable: Sized + 'static {
    /// Key declared by the parameter.
    fn key() -> ServiceKey;

    /// Whether the parameter can be bound to nothing.
    fn accepts_absent() -> bool {
        false
    }

    /// Convert a bound slot into the parameter value.
    fn extract(
        target: ServiceKey,
        index: usize,
        slot: Option<&Instance>,
    ) -> Result<Self, ResolveError>;
}

impl<T: ?Sized + Send + Sync + 'static> Injectable for Arc<T> {
    fn key() -> ServiceKey {
        ServiceKey::of::<T>()
    }

    fn extract(
        target: ServiceKey,
        index: usize,
        slot: Option<&Instance>,
    ) -> Result<Self, ResolveError> {
        let Some(slot) = slot else {
            return Err(ResolveError::UnresolvableParameter {
                parameter: Self::key().name(),
                target: target.name(),
            });
        };
        slot.downcast::<T>()
            .ok_or_else(|| ResolveError::ArgumentMismatch {
                target: target.name(),
                index,
                expected: Self::key().name(),
            })
    }
}

impl<P: Injectable> Injectable for Option<P> {
    fn key() -> ServiceKey {
        P::key()
    }

    fn accepts_absent() -> bool {
        true
    }

    fn extract(
        target: ServiceKey,
        index: usize,
        slot: Option<&Instance>,
    ) -> Result<Self, ResolveError> {
        match slot {
            None => Ok(None),
            Some(_) => P::extract(target, index, slot).map(Some),
        }
    }
}

/*
 * Wrap functions with up to 10 parameters into constructors
 * inspired by https://nickbryan.co.uk/software/using-a-type-map-for-dependency-injection-in-rust/
 */

/// A Callable has a ```call``` function with a single argument and a single return type.
///
/// This trait is implemented for all functions with up to 10 arguments, using a tuple to
/// wrap them all in a single type.
pub trait Callable<Args, Ret> {
    fn call(&self, args: Args) -> Ret;
}

/// Parameter list of a constructor, as a tuple of [Injectable] types.
pub trait Signature: Sized {
    fn parameters() -> Vec<ServiceKey>;
    fn accepts_absent() -> Vec<bool>;
    fn extract(target: ServiceKey, slots: &[Option<Instance>]) -> Result<Self, ResolveError>;
}

macro_rules! callable_tuple ({ $($param:ident)* } => {
    impl<Func, Ret, $($param,)*> Callable<($($param,)*), Ret> for Func
    where
        Func: Fn($($param),*) -> Ret,
    {
        #[inline]
        #[allow(non_snake_case)]
        fn call(&self, ($($param,)*): ($($param,)*)) -> Ret {
            (self)($($param,)*)
        }
    }

    #[allow(clippy::unused_unit)]
    impl<$($param: Injectable,)*> Signature for ($($param,)*) {
        fn parameters() -> Vec<ServiceKey> {
            vec![$(<$param as Injectable>::key(),)*]
        }

        fn accepts_absent() -> Vec<bool> {
            vec![$(<$param as Injectable>::accepts_absent(),)*]
        }

        #[allow(unused_variables, unused_mut, unused_assignments)]
        fn extract(target: ServiceKey, slots: &[Option<Instance>]) -> Result<Self, ResolveError> {
            let mut index = 0;
            Ok(($({
                let slot = slots.get(index).and_then(Option::as_ref);
                let value = <$param as Injectable>::extract(target, index, slot)?;
                index += 1;
                value
            },)*))
        }
    }
});

callable_tuple! {}
callable_tuple! { A }
callable_tuple! { A B }
callable_tuple! { A B C }
callable_tuple! { A B C D }
callable_tuple! { A B C D E }
callable_tuple! { A B C D E F }
callable_tuple! { A B C D E F G }
callable_tuple! { A B C D E F G H }
callable_tuple! { A B C D E F G H I }
callable_tuple! { A B C D E F G H I J }

type Invoke<T> = Arc<dyn Fn(&[Option<Instance>]) -> Result<T, ResolveError> + Send + Sync>;

/// One public constructor of `T`: its parameter keys and a way to call it.
pub struct Constructor<T> {
    parameters: Vec<ServiceKey>,
    accepts_absent: Vec<bool>,
    invoke: Invoke<T>,
}

impl<T: 'static> Constructor<T> {
    /// Wrap an infallible function.
    pub fn new<Args, F>(f: F) -> Self
    where
        Args: Signature + 'static,
        F: Callable<Args, T> + Send + Sync + 'static,
    {
        let target = ServiceKey::of::<T>();
        Self {
            parameters: Args::parameters(),
            accepts_absent: Args::accepts_absent(),
            invoke: Arc::new(move |slots: &[Option<Instance>]| -> Result<T, ResolveError> {
                Ok(f.call(Args::extract(target, slots)?))
            }),
        }
    }

    /// Wrap a function returning a `Result`.
    ///
    /// Its error reaches the caller of the container untouched, as [ResolveError::Constructor].
    pub fn fallible<Args, E, F>(f: F) -> Self
    where
        Args: Signature + 'static,
        E: Into<BoxError> + 'static,
        F: Callable<Args, Result<T, E>> + Send + Sync + 'static,
    {
        let target = ServiceKey::of::<T>();
        Self {
            parameters: Args::parameters(),
            accepts_absent: Args::accepts_absent(),
            invoke: Arc::new(move |slots: &[Option<Instance>]| -> Result<T, ResolveError> {
                f.call(Args::extract(target, slots)?)
                    .map_err(|e| ResolveError::Constructor(e.into()))
            }),
        }
    }

    pub fn parameters(&self) -> &[ServiceKey] {
        &self.parameters
    }
}

/// A constructor whose result is already erased into an [Instance] of the service type.
#[derive(Clone)]
pub struct ErasedConstructor {
    parameters: Vec<ServiceKey>,
    accepts_absent: Vec<bool>,
    invoke: Invoke<Instance>,
}

impl ErasedConstructor {
    pub fn parameters(&self) -> &[ServiceKey] {
        &self.parameters
    }

    /// Per parameter, whether it can be bound to nothing (an `Option`, or a primitive by value).
    pub fn accepts_absent(&self) -> &[bool] {
        &self.accepts_absent
    }

    pub(crate) fn invoke(&self, slots: &[Option<Instance>]) -> Result<Instance, ResolveError> {
        (self.invoke)(slots)
    }
}

/// Constructor metadata of a concrete type, viewed as a given service type.
#[derive(Clone)]
pub struct TypeInfo {
    key: ServiceKey,
    constructors: Arc<[ErasedConstructor]>,
}

impl TypeInfo {
    /// Metadata of `T`, producing instances of `T` itself.
    pub fn of<T: Activate>() -> Self {
        Self::implementing::<T, T>()
    }

    /// Metadata of `T`, producing instances of the service type `S`.
    pub fn implementing<S, T>() -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        let constructors = T::constructors()
            .into_iter()
            .map(|constructor| {
                let Constructor {
                    parameters,
                    accepts_absent,
                    invoke,
                } = constructor;
                let erase = move |slots: &[Option<Instance>]| -> Result<Instance, ResolveError> {
                    let value = Arc::new(invoke(slots)?);
                    let disposer = T::disposer(&value);
                    let instance = Instance::new::<S>(<T as Implements<S>>::upcast(value));
                    Ok(match disposer {
                        Some(disposer) => instance.with_disposer(disposer),
                        None => instance,
                    })
                };
                ErasedConstructor {
                    parameters,
                    accepts_absent,
                    invoke: Arc::new(erase),
                }
            })
            .collect();
        Self {
            key: ServiceKey::of::<T>(),
            constructors,
        }
    }

    /// Key of the concrete type.
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    pub fn constructors(&self) -> &[ErasedConstructor] {
        &self.constructors
    }
}

/// Implement [Activate] for a type from a list of constructor functions, in declaration order.
///
/// Prefix the type with ```disposable``` to run its [Dispose] implementation at teardown.
#[macro_export]
macro_rules! activate {
    (disposable $Type:ty $(, $constructor:expr)* $(,)?) => {
        impl $crate::Activate for $Type {
            fn constructors() -> Vec<$crate::Constructor<Self>> {
                vec![$($crate::Constructor::new($constructor),)*]
            }

            fn disposer(
                instance: &::std::sync::Arc<Self>,
            ) -> Option<::std::sync::Arc<dyn $crate::Dispose>> {
                Some(instance.clone())
            }
        }
    };
    ($Type:ty $(, $constructor:expr)* $(,)?) => {
        impl $crate::Activate for $Type {
            fn constructors() -> Vec<$crate::Constructor<Self>> {
                vec![$($crate::Constructor::new($constructor),)*]
            }
        }
    };
}

/// Declare that a concrete type can be provided as one or more trait objects.
///
/// ```
/// # use wirebox::*;
/// trait Greeter: Send + Sync {}
/// struct English;
/// impl Greeter for English {}
/// implements!(English => dyn Greeter);
/// ```
#[macro_export]
macro_rules! implements {
    ($Concrete:ty => $($Service:ty),+ $(,)?) => {
        $(
        impl $crate::Implements<$Service> for $Concrete {
            fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$Service> {
                self
            }
        }
        )+
    };
}
