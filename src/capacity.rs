use std::collections::TryReserveError;
use std::mem;
use thiserror::Error;

/// Capacity used when the requested one is zero or negative.
pub const DEFAULT_CAPACITY: usize = 16;

/// Largest power of two in `usize`, where the rounding in [`effective`] stops.
/// Buffers are further limited per element type by [`limit_for`].
pub const MAX_CAPACITY: usize = 1 << (usize::BITS - 1);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot allocate a buffer of {capacity} slots (requested {requested})")]
pub struct CapacityError {
    pub requested: usize,
    pub capacity:  usize,
    #[source]
    pub source:    TryReserveError,
}

/// Normalize a requested capacity: 0 → `DEFAULT_CAPACITY`, anything else is
/// rounded up to the next power of two (saturating at `MAX_CAPACITY`).
pub fn effective(requested: usize) -> usize {
    if requested == 0 {
        return DEFAULT_CAPACITY;
    }
    requested.checked_next_power_of_two().unwrap_or(MAX_CAPACITY)
}

/// Same as [`effective`] for signed input, e.g. from a config file or CLI.
pub fn from_signed(requested: i64) -> usize {
    if requested <= 0 {
        return DEFAULT_CAPACITY;
    }
    effective(usize::try_from(requested).unwrap_or(MAX_CAPACITY))
}

/// Largest power-of-two slot count whose storage stays within `isize::MAX`
/// bytes for elements of type `T`.
pub fn limit_for<T>() -> usize {
    let slot = mem::size_of::<Option<T>>();
    if slot == 0 {
        return MAX_CAPACITY;
    }
    let max = isize::MAX as usize / slot;
    1 << (usize::BITS - 1 - max.leading_zeros())
}

/// [`effective`] capped at [`limit_for`], the slot count a buffer of `T` is built with.
pub fn for_type<T>(requested: usize) -> usize {
    effective(requested).min(limit_for::<T>())
}

#[inline]
pub fn is_power_of_two(cap: usize) -> bool {
    cap != 0 && cap & (cap - 1) == 0
}
