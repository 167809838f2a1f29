use crate::capacity::{self, CapacityError};
use crate::iter::{Drain, IntoIter, Iter};
use crate::policy::OverwritePolicy;
use crate::render;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};
use tracing::{debug, trace};

/// Result of a [`CircularBuffer::push`].
///
/// Callers that don't care can drop it; the buffer behaves the same either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome<T> {
    /// Written into a free slot.
    Stored,
    /// Written after evicting the oldest element, which is returned.
    Overwrote(T),
    /// Buffer was full under [`OverwritePolicy::Ignore`]; the incoming element is handed back.
    Rejected(T),
}

impl<T> PushOutcome<T> {
    /// True when the pushed element ended up in the buffer.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    /// The element that did not make it into (or fell out of) the buffer, if any.
    pub fn into_displaced(self) -> Option<T> {
        match self {
            Self::Stored                           => None,
            Self::Overwrote(v) | Self::Rejected(v) => Some(v),
        }
    }
}

/// Fixed-capacity ring buffer. Capacity is always a power of two.
///
/// `storage` is allocated once for `capacity` slots. It grows by appending
/// until every slot has been written once, after which writes happen in place.
pub struct CircularBuffer<T> {
    storage: Vec<Option<T>>,
    head:    usize,
    tail:    usize,
    len:     usize,
    mask:    usize,
    policy:  OverwritePolicy,
}

impl<T> CircularBuffer<T> {
    /// Buffer with the [`OverwritePolicy::Overwrite`] policy.
    ///
    /// `capacity` is normalized by [`capacity::effective`]: 0 selects
    /// [`capacity::DEFAULT_CAPACITY`], anything else rounds up to a power of two.
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, OverwritePolicy::Overwrite)
    }

    /// Buffer that applies `policy` when a push finds it full.
    ///
    /// The capacity is normalized like [`new`](Self::new) and capped at
    /// [`capacity::limit_for`]. Aborts like `Vec::with_capacity` when the
    /// allocator cannot provide it; [`try_with_policy`](Self::try_with_policy)
    /// reports that instead.
    pub fn with_policy(requested: usize, policy: OverwritePolicy) -> Self {
        let cap = Self::slots_for(requested);
        Self::from_storage(Vec::with_capacity(cap), cap, policy)
    }

    /// Fallible [`with_policy`](Self::with_policy) for untrusted capacities.
    pub fn try_with_policy(requested: usize, policy: OverwritePolicy) -> Result<Self, CapacityError> {
        let cap = Self::slots_for(requested);
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(cap)
            .map_err(|source| CapacityError { requested, capacity: cap, source })?;
        Ok(Self::from_storage(storage, cap, policy))
    }

    fn slots_for(requested: usize) -> usize {
        let cap = capacity::for_type::<T>(requested);
        if cap != requested {
            debug!(requested, capacity = cap, "adjusted buffer capacity");
        }
        debug_assert!(capacity::is_power_of_two(cap));
        cap
    }

    fn from_storage(storage: Vec<Option<T>>, cap: usize, policy: OverwritePolicy) -> Self {
        Self {
            storage,
            head: 0,
            tail: 0,
            len:  0,
            mask: cap - 1,
            policy,
        }
    }

    /// Empty buffer of `size` capacity, then every item pushed in order.
    /// With more items than slots only the newest ones survive.
    pub fn from_sequence<I: IntoIterator<Item = T>>(items: I, size: usize) -> Self {
        Self::from_sequence_with_policy(items, size, OverwritePolicy::Overwrite)
    }

    /// [`from_sequence`](Self::from_sequence) with `policy` applied once the
    /// buffer fills, so under `Ignore` the oldest items are the ones kept.
    pub fn from_sequence_with_policy<I: IntoIterator<Item = T>>(
        items: I,
        size: usize,
        policy: OverwritePolicy,
    ) -> Self {
        let mut buf = Self::with_policy(size, policy);
        for item in items {
            buf.push(item);
        }
        buf
    }

    pub fn capacity(&self) -> usize { self.mask + 1 }
    pub fn len(&self) -> usize { self.len }
    pub fn policy(&self) -> OverwritePolicy { self.policy }
    pub fn is_empty(&self) -> bool { self.len == 0 }
    pub fn is_full(&self) -> bool { self.len == self.capacity() }

    #[inline]
    fn wrap(&self, index: usize) -> usize {
        index & self.mask
    }

    /// Physical slot of the logical position `index` (0 = head).
    #[inline]
    fn slot(&self, index: usize) -> usize {
        self.wrap(self.head.wrapping_add(index))
    }

    /// Append `element` at the tail, applying the policy when full.
    pub fn push(&mut self, element: T) -> PushOutcome<T> {
        let mut evicted = None;
        if self.is_full() {
            match self.policy {
                OverwritePolicy::Ignore => {
                    trace!(capacity = self.capacity(), "buffer full, dropping incoming element");
                    return PushOutcome::Rejected(element);
                }
                OverwritePolicy::Overwrite => {
                    evicted = self.pop();
                    trace!(capacity = self.capacity(), "buffer full, evicted oldest element");
                }
            }
        }

        if self.storage.len() < self.capacity() {
            // Slots past storage.len() were never written, so tail sits right at the end.
            debug_assert_eq!(self.tail, self.storage.len());
            self.storage.push(Some(element));
        } else {
            self.storage[self.tail] = Some(element);
        }
        self.tail = self.wrap(self.tail + 1);
        self.len += 1;

        match evicted {
            Some(old) => PushOutcome::Overwrote(old),
            None      => PushOutcome::Stored,
        }
    }

    /// Remove and return the oldest element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.storage[self.head].take();
        self.head = self.wrap(self.head + 1);
        self.len -= 1;
        item
    }

    /// Oldest element, without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.get(0)
    }

    /// Newest element, without removing it.
    pub fn peek_back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Logical position `index` counted from the oldest element.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.storage[self.slot(index)].as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let slot = self.slot(index);
        self.storage[slot].as_mut()
    }

    /// Drop every element. The allocation is kept.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }

    /// The occupied slots in logical order: one run when contiguous, two when
    /// the elements wrap past the end of storage.
    fn runs(&self) -> (&[Option<T>], &[Option<T>]) {
        if self.len == 0 {
            return (&[], &[]);
        }
        let end = self.head + self.len;
        if end <= self.storage.len() {
            (&self.storage[self.head..end], &[])
        } else {
            (&self.storage[self.head..], &self.storage[..self.tail])
        }
    }

    /// Elements oldest to newest. Calling it again starts over.
    pub fn iter(&self) -> Iter<'_, T> {
        let (front, back) = self.runs();
        Iter::new(front, back)
    }

    /// Up to `n` most recently pushed elements, oldest first.
    pub fn recent(&self, n: usize) -> std::iter::Skip<Iter<'_, T>> {
        let n = n.min(self.len);
        self.iter().skip(self.len - n)
    }

    /// Remove every element, yielding them oldest first. Whatever the iterator
    /// doesn't yield is dropped; the buffer is empty afterwards.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain::new(self)
    }
}

impl<T> Default for CircularBuffer<T> {
    fn default() -> Self {
        Self::new(capacity::DEFAULT_CAPACITY)
    }
}

impl<T: Clone> Clone for CircularBuffer<T> {
    fn clone(&self) -> Self {
        let mut storage = Vec::with_capacity(self.capacity());
        storage.extend(self.storage.iter().cloned());
        Self {
            storage,
            head:   self.head,
            tail:   self.tail,
            len:    self.len,
            mask:   self.mask,
            policy: self.policy,
        }
    }
}

impl<T> Index<usize> for CircularBuffer<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(v) => v,
            None    => panic!("index out of range: the len is {} but the index is {}", self.len, index),
        }
    }
}

impl<T> IndexMut<usize> for CircularBuffer<T> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(v) => v,
            None    => panic!("index out of range: the len is {} but the index is {}", len, index),
        }
    }
}

impl<T> Extend<T> for CircularBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: Copy + 'a> Extend<&'a T> for CircularBuffer<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

/// Sized to hold every item, so nothing is evicted.
impl<T> FromIterator<T> for CircularBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Vec<T> = iter.into_iter().collect();
        let size = items.len();
        Self::from_sequence(items, size)
    }
}

impl<'a, T> IntoIterator for &'a CircularBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for CircularBuffer<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

/// Equal when the logical contents match; capacity and policy are ignored.
impl<T: PartialEq> PartialEq for CircularBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for CircularBuffer<T> {}

impl<T: fmt::Debug> fmt::Debug for CircularBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("capacity", &self.capacity())
            .field("policy", &self.policy)
            .field("items", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: fmt::Display> fmt::Display for CircularBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render::write_listing(f, self.iter(), ", ")
    }
}

impl<T: Serialize> Serialize for CircularBuffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents<T: Clone>(buf: &CircularBuffer<T>) -> Vec<T> {
        buf.iter().cloned().collect()
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let buf: CircularBuffer<i32> = CircularBuffer::new(4);
        assert!(buf.is_empty());
        assert!(!buf.is_full());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.policy(), OverwritePolicy::Overwrite);
        assert_eq!(buf.peek(), None);
    }

    #[test]
    fn test_capacity_rounding() {
        assert_eq!(CircularBuffer::<u8>::new(3).capacity(), 4);
        assert_eq!(CircularBuffer::<u8>::new(5).capacity(), 8);
        assert_eq!(CircularBuffer::<u8>::new(9).capacity(), 16);
        assert_eq!(CircularBuffer::<u8>::new(0).capacity(), capacity::DEFAULT_CAPACITY);
        assert_eq!(CircularBuffer::<u8>::default().capacity(), capacity::DEFAULT_CAPACITY);
    }

    #[test]
    fn test_fifo_order() {
        let mut buf = CircularBuffer::new(4);
        for v in [1, 2, 3] {
            assert_eq!(buf.push(v), PushOutcome::Stored);
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.pop(), Some(1));
        assert_eq!(buf.pop(), Some(2));
        assert_eq!(buf.pop(), Some(3));
        assert_eq!(buf.pop(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_overwrite_evicts_oldest() {
        let mut buf = CircularBuffer::new(4);
        for v in [100, 120, 125, 130] {
            buf.push(v);
        }
        assert!(buf.is_full());
        assert_eq!(buf.push(150), PushOutcome::Overwrote(100));
        assert_eq!(contents(&buf), vec![120, 125, 130, 150]);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_ignore_drops_incoming() {
        let mut buf = CircularBuffer::with_policy(4, OverwritePolicy::Ignore);
        for v in [100, 120, 125, 130] {
            buf.push(v);
        }
        assert_eq!(buf.push(150), PushOutcome::Rejected(150));
        assert_eq!(contents(&buf), vec![100, 120, 125, 130]);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_wrapped_iteration() {
        let mut buf = CircularBuffer::new(4);
        for v in [100, 120, 125, 130] {
            buf.push(v);
        }
        assert_eq!(buf.pop(), Some(100));
        assert_eq!(buf.pop(), Some(120));
        buf.push(150);
        buf.push(155);
        assert_eq!(contents(&buf), vec![125, 130, 150, 155]);
        assert_eq!(buf.iter().rev().copied().collect::<Vec<_>>(), vec![155, 150, 130, 125]);
        assert_eq!(buf.iter().len(), 4);
        // restartable
        assert_eq!(contents(&buf), vec![125, 130, 150, 155]);
    }

    #[test]
    fn test_peek_is_idempotent() {
        let mut buf = CircularBuffer::new(2);
        buf.push("a");
        buf.push("b");
        assert_eq!(buf.peek(), Some(&"a"));
        assert_eq!(buf.peek(), Some(&"a"));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.peek_back(), Some(&"b"));
    }

    #[test]
    fn test_clear_resets_and_keeps_allocation() {
        let mut buf: CircularBuffer<i32> = CircularBuffer::new(8);
        buf.extend(0..11);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 8);
        assert!(buf.storage.capacity() >= 8);
        buf.push(42);
        assert_eq!(buf.pop(), Some(42));
    }

    #[test]
    fn test_index_access() {
        let mut buf: CircularBuffer<i32> = CircularBuffer::new(4);
        buf.extend([1, 2, 3, 4, 5, 6]);
        assert_eq!(buf[0], 3);
        assert_eq!(buf[3], 6);
        buf[1] = 40;
        assert_eq!(contents(&buf), vec![3, 40, 5, 6]);
        assert_eq!(buf.get(4), None);
    }

    #[test]
    #[should_panic(expected = "index out of range: the len is 2 but the index is 2")]
    fn test_index_out_of_range_panics() {
        let mut buf = CircularBuffer::new(4);
        buf.push(1);
        buf.push(2);
        let _value = buf[2];
    }

    #[test]
    fn test_from_sequence_keeps_newest() {
        let buf = CircularBuffer::from_sequence(1..=6, 4);
        assert_eq!(contents(&buf), vec![3, 4, 5, 6]);

        let buf = CircularBuffer::from_sequence_with_policy(1..=6, 4, OverwritePolicy::Ignore);
        assert_eq!(contents(&buf), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_collect_sizes_to_fit() {
        let buf: CircularBuffer<i32> = (1..=5).collect();
        assert_eq!(buf.capacity(), 8);
        assert_eq!(contents(&buf), vec![1, 2, 3, 4, 5]);

        let empty: CircularBuffer<i32> = std::iter::empty().collect();
        assert_eq!(empty.capacity(), capacity::DEFAULT_CAPACITY);
    }

    #[test]
    fn test_recent_returns_newest_oldest_first() {
        let buf = CircularBuffer::from_sequence(1..=10, 8);
        assert_eq!(buf.recent(3).copied().collect::<Vec<_>>(), vec![8, 9, 10]);
        assert_eq!(buf.recent(100).count(), 8);
        assert_eq!(buf.recent(0).count(), 0);
    }

    #[test]
    fn test_drain_empties_buffer() {
        let mut buf: CircularBuffer<i32> = CircularBuffer::from_sequence(1..=6, 4);
        let drained: Vec<_> = buf.drain().collect();
        assert_eq!(drained, vec![3, 4, 5, 6]);
        assert!(buf.is_empty());

        buf.extend([7, 8, 9]);
        let first = buf.drain().next();
        assert_eq!(first, Some(7));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_into_iter_yields_owned_in_order() {
        let buf = CircularBuffer::from_sequence(vec![String::from("x"), "y".into(), "z".into()], 2);
        let owned: Vec<String> = buf.into_iter().collect();
        assert_eq!(owned, vec!["y", "z"]);
    }

    #[test]
    fn test_equality_ignores_layout() {
        let mut wrapped: CircularBuffer<i32> = CircularBuffer::new(4);
        wrapped.extend([0, 0, 1, 2]);
        wrapped.pop();
        wrapped.pop();
        wrapped.extend([3, 4]);
        let straight = CircularBuffer::from_sequence([1, 2, 3, 4], 4);
        assert_eq!(wrapped, straight);
    }

    #[test]
    fn test_display_and_serialize() {
        let buf = CircularBuffer::from_sequence([125, 130, 150, 155], 4);
        assert_eq!(buf.to_string(), "[125, 130, 150, 155]");
        assert_eq!(serde_json::to_string(&buf).unwrap(), "[125,130,150,155]");
        assert_eq!(CircularBuffer::<i32>::new(2).to_string(), "[]");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = CircularBuffer::from_sequence([1, 2, 3], 4);
        let b = a.clone();
        a.push(4);
        a.push(5);
        assert_eq!(contents(&b), vec![1, 2, 3]);
        assert_eq!(b.capacity(), 4);
        assert_eq!(contents(&a), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_push_outcome_helpers() {
        assert!(PushOutcome::<i32>::Stored.is_accepted());
        assert!(PushOutcome::Overwrote(1).is_accepted());
        assert!(!PushOutcome::Rejected(1).is_accepted());
        assert_eq!(PushOutcome::Overwrote(7).into_displaced(), Some(7));
        assert_eq!(PushOutcome::<i32>::Stored.into_displaced(), None);
    }

    #[test]
    fn test_try_with_policy_reports_unallocatable_capacity() {
        let requested = capacity::from_signed(i64::MAX);
        let err = CircularBuffer::<i64>::try_with_policy(requested, OverwritePolicy::Overwrite).unwrap_err();
        assert_eq!(err.requested, requested);
        assert_eq!(err.capacity, capacity::limit_for::<i64>());
        assert!(err.to_string().starts_with("cannot allocate a buffer of"));

        let buf = CircularBuffer::<i64>::try_with_policy(5, OverwritePolicy::Ignore).unwrap();
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.policy(), OverwritePolicy::Ignore);
    }

    #[test]
    fn test_largest_request_builds_for_zero_sized_slots() {
        use std::convert::Infallible;
        assert_eq!(std::mem::size_of::<Option<Infallible>>(), 0);
        let buf = CircularBuffer::<Infallible>::with_policy(usize::MAX, OverwritePolicy::Overwrite);
        assert_eq!(buf.capacity(), capacity::MAX_CAPACITY);
        assert!(buf.is_empty());
        assert!(!buf.is_full());
    }

    #[test]
    fn test_capacity_one() {
        let mut buf = CircularBuffer::new(1);
        assert_eq!(buf.push('a'), PushOutcome::Stored);
        assert_eq!(buf.push('b'), PushOutcome::Overwrote('a'));
        assert_eq!(buf.peek(), Some(&'b'));
        assert_eq!(buf.pop(), Some('b'));
        assert!(buf.is_empty());
    }
}
