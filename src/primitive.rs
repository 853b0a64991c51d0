//! The primitive-with-default set.
//!
//! Constructor parameters of these types do not need a registration: when the registry-driven
//! resolver meets an unregistered one, it binds the zero value of value types and leaves
//! reference-like types absent. Absent slots become `None` for `Option<_>` parameters and the
//! empty value for by-value `String` or collection parameters. A shared `Arc<String>` or
//! `Arc<dyn Any>` cannot be absent, so it still needs a registration.

use std::any::Any;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::activate::Injectable;
use crate::{Instance, ResolveError, ServiceKey};

type DefaultFn = fn() -> Option<Instance>;

static PRIMITIVES: Lazy<HashMap<ServiceKey, DefaultFn>> = Lazy::new(|| {
    let mut table: HashMap<ServiceKey, DefaultFn> = value_defaults().into_iter().collect();
    table.insert(ServiceKey::of::<String>(), || None);
    table.insert(ServiceKey::of::<Vec<Instance>>(), || None);
    table.insert(ServiceKey::of::<Box<[Instance]>>(), || None);
    table.insert(ServiceKey::of::<dyn Any + Send + Sync>(), || None);
    table
});

/// Check if a parameter type can be bound without a registration.
pub fn is_primitive(key: &ServiceKey) -> bool {
    PRIMITIVES.contains_key(key)
}

/// Default binding for a primitive parameter.
///
/// The outer option tells if the key is primitive at all, the inner one is the bound value.
pub(crate) fn default_for(key: &ServiceKey) -> Option<Option<Instance>> {
    PRIMITIVES.get(key).map(|default| default())
}

fn mismatch<T: ?Sized + 'static>(target: ServiceKey, index: usize) -> ResolveError {
    ResolveError::ArgumentMismatch {
        target: target.name(),
        index,
        expected: std::any::type_name::<T>(),
    }
}

macro_rules! value_primitives {
    ($($ty:ty => $zero:expr),* $(,)?) => {
        fn value_defaults() -> Vec<(ServiceKey, DefaultFn)> {
            vec![$((ServiceKey::of::<$ty>(), (|| Some(Instance::of::<$ty>($zero))) as DefaultFn),)*]
        }

        $(
        impl Injectable for $ty {
            fn key() -> ServiceKey {
                ServiceKey::of::<$ty>()
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
                    None => Ok($zero),
                    Some(value) => value
                        .downcast::<$ty>()
                        .map(|v| *v)
                        .ok_or_else(|| mismatch::<$ty>(target, index)),
                }
            }
        }
        )*
    };
}

value_primitives! {
    bool => false,
    char => '\0',
    i8 => 0,
    i16 => 0,
    i32 => 0,
    i64 => 0,
    i128 => 0,
    isize => 0,
    u8 => 0,
    u16 => 0,
    u32 => 0,
    u64 => 0,
    u128 => 0,
    usize => 0,
    f32 => 0.0,
    f64 => 0.0,
    Uuid => Uuid::nil(),
    Duration => Duration::ZERO,
    SystemTime => SystemTime::UNIX_EPOCH,
    DateTime<Utc> => DateTime::<Utc>::default(),
}

macro_rules! reference_primitives {
    ($($ty:ty),* $(,)?) => {
        $(
        impl Injectable for $ty {
            fn key() -> ServiceKey {
                ServiceKey::of::<$ty>()
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
                    None => Ok(<$ty>::default()),
                    Some(value) => value
                        .downcast::<$ty>()
                        .map(|v| (*v).clone())
                        .ok_or_else(|| mismatch::<$ty>(target, index)),
                }
            }
        }
        )*
    };
}

reference_primitives!(String, Vec<Instance>, Box<[Instance]>);
