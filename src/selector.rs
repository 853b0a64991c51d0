//! Constructor selection.
//!
//! Two strategies coexist, each with its own scoring and tie-break rules:
//!
//! * [RegistryMatcher] picks a constructor when the container builds a registered type on its own.
//! * [ArgumentMatcher] picks a constructor when a caller forces some argument values, see
//!   [crate::activator::create_instance].

use std::collections::HashSet;

use tracing::trace;

use crate::activate::{ErasedConstructor, TypeInfo};
use crate::primitive::default_for;
use crate::{Instance, ResolveError, ServiceKey, ServiceResolver};

/// Select the constructor with the most parameters that the registry can satisfy.
pub(crate) struct RegistryMatcher;

impl RegistryMatcher {
    /// Every parameter of the selected constructor is either registered or a primitive it can
    /// bind without registration: one with a zero value, or one accepting to be left absent.
    ///
    /// Two constructors with the same number of parameters make the type ambiguous, whatever
    /// their parameter types.
    pub(crate) fn select<'t>(
        info: &'t TypeInfo,
        is_registered: impl Fn(&ServiceKey) -> bool,
    ) -> Result<&'t ErasedConstructor, ResolveError> {
        let target = info.key().name();
        let constructors = info.constructors();
        if constructors.is_empty() {
            return Err(ResolveError::NoSuitableConstructor { target });
        }

        let mut counts = HashSet::new();
        for constructor in constructors {
            let count = constructor.parameters().len();
            if !counts.insert(count) {
                return Err(ResolveError::AmbiguousConstructor { target, count });
            }
        }

        let resolvable = |key: &ServiceKey, accepts_absent: bool| match default_for(key) {
            Some(Some(_)) => true,
            Some(None) => accepts_absent || is_registered(key),
            None => is_registered(key),
        };
        let unresolvable = |constructor: &'t ErasedConstructor| {
            constructor
                .parameters()
                .iter()
                .zip(constructor.accepts_absent())
                .find(|(key, accepts_absent)| !resolvable(*key, **accepts_absent))
                .map(|(key, _)| *key)
        };
        let mut best_score = -1;
        let mut best = None;
        for constructor in constructors {
            let parameters = constructor.parameters();
            let score = if unresolvable(constructor).is_none() {
                parameters.len() as isize
            } else {
                -1
            };
            trace!(ty = target, parameters = parameters.len(), score, "scored constructor");
            if best_score < score {
                best_score = score;
                best = Some(constructor);
            }
        }

        best.ok_or_else(|| {
            // Report the first missing parameter of the longest constructor
            let parameter = constructors
                .iter()
                .max_by_key(|c| c.parameters().len())
                .and_then(&unresolvable)
                .map_or("<unknown>", |key| key.name());
            ResolveError::UnresolvableParameter { parameter, target }
        })
    }
}

/// Align caller-supplied values with the parameters of one constructor.
pub(crate) struct ArgumentMatcher<'t> {
    target: ServiceKey,
    constructor: &'t ErasedConstructor,
    slots: Vec<Option<Instance>>,
}

impl<'t> ArgumentMatcher<'t> {
    fn new(target: ServiceKey, constructor: &'t ErasedConstructor) -> Self {
        Self {
            target,
            constructor,
            slots: vec![None; constructor.parameters().len()],
        }
    }

    /// Place every given value in the first free slot declaring exactly its type.
    ///
    /// Return `None` if a value found no slot, otherwise the number of values that landed on
    /// their own position while the filled slots were contiguous from the start.
    fn matches(&mut self, given: &[Instance]) -> Option<usize> {
        let parameters = self.constructor.parameters();
        let mut start = 0;
        let mut exact = 0;
        for (given_index, value) in given.iter().enumerate() {
            let slot = (start..parameters.len())
                .find(|&i| self.slots[i].is_none() && parameters[i] == value.key())?;
            self.slots[slot] = Some(value.clone());
            if slot == start {
                start += 1;
                if slot == given_index {
                    exact += 1;
                }
            }
        }
        Some(exact)
    }

    /// Select the best matching constructor for the given values.
    ///
    /// The highest score wins; on equal scores the first declared constructor is kept.
    pub(crate) fn select(info: &'t TypeInfo, given: &[Instance]) -> Result<Self, ResolveError> {
        let mut best_score = -1;
        let mut best = None;
        for constructor in info.constructors() {
            let mut matcher = ArgumentMatcher::new(info.key(), constructor);
            let score = matcher.matches(given).map_or(-1, |exact| exact as isize);
            trace!(ty = info.key().name(), score, "matched constructor arguments");
            if best_score < score {
                best_score = score;
                best = Some(matcher);
            }
        }
        best.ok_or(ResolveError::NoSuitableConstructor {
            target: info.key().name(),
        })
    }

    /// Fill the remaining slots from the resolver and call the constructor.
    pub(crate) fn create_instance<R: ServiceResolver + ?Sized>(
        mut self,
        resolver: &R,
    ) -> Result<Instance, ResolveError> {
        for (slot, parameter) in self.slots.iter_mut().zip(self.constructor.parameters()) {
            if slot.is_none() {
                let value = resolver
                    .get_service(parameter)?
                    .ok_or(ResolveError::UnresolvableParameter {
                        parameter: parameter.name(),
                        target: self.target.name(),
                    })?;
                *slot = Some(value);
            }
        }
        self.constructor.invoke(&self.slots)
    }
}
