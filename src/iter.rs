use crate::buffer::CircularBuffer;
use std::iter::FusedIterator;
use std::slice;

/// Borrowing iterator over a [`CircularBuffer`], oldest to newest.
///
/// Walks the run starting at `head` first, then the run that wrapped around to
/// the start of storage (empty when the elements are contiguous).
pub struct Iter<'a, T> {
    front: slice::Iter<'a, Option<T>>,
    back:  slice::Iter<'a, Option<T>>,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(front: &'a [Option<T>], back: &'a [Option<T>]) -> Self {
        Self { front: front.iter(), back: back.iter() }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { front: self.front.clone(), back: self.back.clone() }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        match self.front.next() {
            Some(slot) => slot.as_ref(),
            None       => self.back.next().and_then(Option::as_ref),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.front.len() + self.back.len();
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        let in_front = self.front.len();
        if n < in_front {
            return self.front.nth(n).and_then(Option::as_ref);
        }
        self.front = Default::default();
        self.back.nth(n - in_front).and_then(Option::as_ref)
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self.back.next_back() {
            Some(slot) => slot.as_ref(),
            None       => self.front.next_back().and_then(Option::as_ref),
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Owning iterator; pops until the buffer is empty.
pub struct IntoIter<T> {
    buf: CircularBuffer<T>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(buf: CircularBuffer<T>) -> Self {
        Self { buf }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.buf.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.buf.len(), Some(self.buf.len()))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

/// Removing iterator returned by [`CircularBuffer::drain`].
pub struct Drain<'a, T> {
    buf: &'a mut CircularBuffer<T>,
}

impl<'a, T> Drain<'a, T> {
    pub(crate) fn new(buf: &'a mut CircularBuffer<T>) -> Self {
        Self { buf }
    }
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.buf.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.buf.len(), Some(self.buf.len()))
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}
impl<T> FusedIterator for Drain<'_, T> {}

impl<T> Drop for Drain<'_, T> {
    fn drop(&mut self) {
        self.buf.clear();
    }
}
