
use {
    crate::report::{self, ReportComponent, ReportLevel, prefix},
    std::{
        fmt::{Debug, Formatter},
        mem,
        ops::{Deref, DerefMut},
        panic::Location,
    },
    thiserror::Error,
};

const EMPTY_ACCESS: &str = "Optional::value() was called with undefined value!";

#[derive(Debug, Error)]
pub enum OptionalError {
    #[error("The optional does not hold a value")]
    Empty,
}

/// A slot that either holds a `T` or is empty.
///
/// Storage for the payload always exists. While the optional is empty the
/// payload is a default or stale `T` that must not be treated as a value.
///
/// [`value`](Self::value) reports misuse through [`report`] but still returns
/// the payload. `Deref` performs no check at all.
pub struct Optional<T> {
    has_value: bool,
    value: T,
}

impl<T: Default> Default for Optional<T> {
    fn default() -> Self {
        Self {
            has_value: false,
            value: T::default(),
        }
    }
}

impl<T> Optional<T> {
    pub const fn new(value: T) -> Self {
        Self {
            has_value: true,
            value,
        }
    }

    pub fn new_empty() -> Self
    where
        T: Default,
    {
        Self::default()
    }

    pub fn from_ref(value: &T) -> Self
    where
        T: Clone,
    {
        Self::new(value.clone())
    }

    /// Moves the payload of `other` into a new optional.
    ///
    /// `other` keeps its flag: if it held a value it still reports
    /// `has_value() == true` while its payload has been replaced by
    /// `T::default()`.
    pub fn move_from(other: &mut Self) -> Self
    where
        T: Default,
    {
        let value = match other.has_value {
            true => mem::take(&mut other.value),
            false => T::default(),
        };
        Self {
            has_value: other.has_value,
            value,
        }
    }

    /// Takes over the flag of `other` and, if it is set, its payload.
    ///
    /// Assigning from an empty optional leaves the current payload in place
    /// but marks `self` as empty. `other` keeps its flag.
    pub fn assign_move_from(&mut self, other: &mut Self)
    where
        T: Default,
    {
        self.has_value = other.has_value;
        if self.has_value {
            self.value = mem::take(&mut other.value);
        }
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.has_value = true;
    }

    pub fn set_cloned(&mut self, value: &T)
    where
        T: Clone,
    {
        self.value.clone_from(value);
        self.has_value = true;
    }

    #[inline(always)]
    pub fn has_value(&self) -> bool {
        self.has_value
    }

    /// Drops the payload and marks the optional as empty.
    ///
    /// An empty optional can still carry a stale payload, e.g. after
    /// assignment from an empty optional, so the payload is always replaced
    /// by `T::default()`.
    pub fn reset(&mut self)
    where
        T: Default,
    {
        self.has_value = false;
        drop(mem::take(&mut self.value));
    }

    #[track_caller]
    pub fn value(&self) -> &T {
        if !self.has_value {
            report_empty_access(Location::caller());
        }
        &self.value
    }

    #[track_caller]
    pub fn value_mut(&mut self) -> &mut T {
        if !self.has_value {
            report_empty_access(Location::caller());
        }
        &mut self.value
    }

    pub fn try_value(&self) -> Result<&T, OptionalError> {
        match self.has_value {
            true => Ok(&self.value),
            false => Err(OptionalError::Empty),
        }
    }

    pub fn try_value_mut(&mut self) -> Result<&mut T, OptionalError> {
        match self.has_value {
            true => Ok(&mut self.value),
            false => Err(OptionalError::Empty),
        }
    }

    pub fn as_option(&self) -> Option<&T> {
        self.has_value.then_some(&self.value)
    }

    pub fn as_option_mut(&mut self) -> Option<&mut T> {
        match self.has_value {
            true => Some(&mut self.value),
            false => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        self.has_value.then_some(self.value)
    }

    /// Moves the payload out and marks the optional as empty.
    ///
    /// A stale payload of an empty optional is dropped.
    pub fn take(&mut self) -> Option<T>
    where
        T: Default,
    {
        let value = mem::take(&mut self.value);
        mem::take(&mut self.has_value).then_some(value)
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        &self.value
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        &mut self.value
    }
}

#[cold]
#[inline(never)]
fn report_empty_access(location: &Location<'_>) {
    let msg = format!("{}{}", prefix::report_prefix(location), EMPTY_ACCESS);
    report::report_message(&msg, ReportLevel::Critical, ReportComponent::CoreHelper);
}

impl<T: Clone + Default> Clone for Optional<T> {
    fn clone(&self) -> Self {
        match self.has_value {
            true => Self::new(self.value.clone()),
            false => Self::default(),
        }
    }

    /// Copy assignment.
    ///
    /// Unlike `*self = source.clone()`, assigning from an empty optional only
    /// clears the flag and leaves the current payload in place.
    fn clone_from(&mut self, source: &Self) {
        self.has_value = source.has_value;
        if self.has_value {
            self.value.clone_from(&source.value);
        }
    }
}

impl<T> Deref for Optional<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> DerefMut for Optional<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}

impl<T> From<T> for Optional<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Default> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::new(v),
            None => Self::default(),
        }
    }
}

impl<T> From<Optional<T>> for Option<T> {
    fn from(value: Optional<T>) -> Self {
        value.into_option()
    }
}

#[cfg(feature = "bool-cast")]
impl<T> From<&Optional<T>> for bool {
    fn from(value: &Optional<T>) -> Self {
        value.has_value
    }
}

impl<T: Debug> Debug for Optional<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.has_value {
            true => write!(f, "Some({:?})", self.value),
            false => write!(f, "None"),
        }
    }
}
