// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-capacity circular buffer.
//!
//! Storage is an inline array, a write cursor and an item count; the oldest item sits at
//! `(write - count) mod N`. Two push flavours cover the two ways a full queue can be handled:
//!
//! - [`Ring::push_overwrite`] drops the oldest item. Used where the producer is an interrupt
//!   handler and cannot wait.
//! - [`Ring::try_push`] hands the item back. Used where the producer can wait for the consumer.
//!
//! The ring itself is not synchronized. Share it through [`IrqCell`](super::IrqCell).

use crate::protocol::Command;

pub struct Ring<T, const N: usize> {
    slots: [T; N],
    /// Index of the next slot to write.
    write: usize,
    /// Number of queued items, `0..=N`.
    count: usize,
}

/// Queue of commands, as used in both directions of the link.
pub type CommandQueue<const N: usize> = Ring<Command, N>;

impl<T: Copy, const N: usize> Ring<T, N> {
    const NON_EMPTY: () = assert!(N > 0, "ring capacity must be non-zero");

    /// Create an empty ring. `fill` only initializes unused storage.
    pub const fn new(fill: T) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            slots: [fill; N],
            write: 0,
            count: 0,
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == N
    }

    #[inline]
    fn oldest(&self) -> usize {
        (self.write + N - self.count) % N
    }

    /// Append `item`, dropping and returning the oldest item if the ring was full.
    pub fn push_overwrite(&mut self, item: T) -> Option<T> {
        let dropped = if self.is_full() {
            // The oldest item lives in the slot about to be written.
            Some(self.slots[self.write])
        } else {
            self.count += 1;
            None
        };
        self.slots[self.write] = item;
        self.write = (self.write + 1) % N;
        dropped
    }

    /// Append `item`, or give it back if the ring is full.
    pub fn try_push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.slots[self.write] = item;
        self.write = (self.write + 1) % N;
        self.count += 1;
        Ok(())
    }

    /// Oldest item, without removing it.
    pub fn peek(&self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            Some(self.slots[self.oldest()])
        }
    }

    /// Remove and return the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        let item = self.peek()?;
        self.count -= 1;
        Some(item)
    }

    pub fn clear(&mut self) {
        self.write = 0;
        self.count = 0;
    }
}

impl<T: Copy + Default, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_ring() {
        let mut ring: Ring<u8, 4> = Ring::new(0);
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 4);
        assert_eq!(ring.peek(), None);
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn fifo_across_wraparound() {
        let mut ring: Ring<u8, 3> = Ring::new(0);
        for round in 0..5u8 {
            ring.try_push(round).unwrap();
            ring.try_push(round + 100).unwrap();
            assert_eq!(ring.pop(), Some(round));
            assert_eq!(ring.pop(), Some(round + 100));
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn try_push_rejects_when_full() {
        let mut ring: Ring<u8, 2> = Ring::new(0);
        assert_eq!(ring.try_push(1), Ok(()));
        assert_eq!(ring.try_push(2), Ok(()));
        assert!(ring.is_full());
        assert_eq!(ring.try_push(3), Err(3));
        assert_eq!(ring.len(), 2);

        assert_eq!(ring.pop(), Some(1));
        assert_eq!(ring.try_push(3), Ok(()));
        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.pop(), Some(3));
    }

    #[test]
    fn overwrite_drops_oldest_first() {
        let mut ring: CommandQueue<8> = Ring::default();
        for raw in 0..8u16 {
            assert_eq!(ring.push_overwrite(Command::from_raw(raw)), None);
        }
        assert_eq!(ring.push_overwrite(Command::from_raw(8)), Some(Command::from_raw(0)));
        assert_eq!(ring.len(), 8);

        let drained: Vec<u16> = core::iter::from_fn(|| ring.pop()).map(|c| c.raw()).collect();
        assert_eq!(drained, (1..=8).collect::<Vec<u16>>());
    }

    #[test]
    fn clear_empties() {
        let mut ring: Ring<u8, 2> = Ring::new(0);
        ring.push_overwrite(1);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.pop(), None);
    }

    proptest! {
        #[test]
        fn round_trip_preserves_order(items in proptest::collection::vec(any::<u16>(), 0..=8)) {
            let mut ring: Ring<u16, 8> = Ring::new(0);
            for &item in &items {
                prop_assert!(ring.try_push(item).is_ok());
            }
            let drained: Vec<u16> = core::iter::from_fn(|| ring.pop()).collect();
            prop_assert_eq!(drained, items);
        }

        #[test]
        fn overwrite_keeps_newest(items in proptest::collection::vec(any::<u16>(), 0..64)) {
            let mut ring: Ring<u16, 8> = Ring::new(0);
            for &item in &items {
                ring.push_overwrite(item);
            }
            let keep = items.len().saturating_sub(8);
            let drained: Vec<u16> = core::iter::from_fn(|| ring.pop()).collect();
            prop_assert_eq!(drained, items[keep..].to_vec());
        }

        #[test]
        fn interleaved_ops_match_model(ops in proptest::collection::vec(any::<Option<u8>>(), 0..128)) {
            let mut ring: Ring<u8, 5> = Ring::new(0);
            let mut model = std::collections::VecDeque::new();
            for op in ops {
                match op {
                    Some(v) => {
                        let accepted = ring.try_push(v).is_ok();
                        prop_assert_eq!(accepted, model.len() < 5);
                        if accepted {
                            model.push_back(v);
                        }
                    }
                    None => prop_assert_eq!(ring.pop(), model.pop_front()),
                }
                prop_assert_eq!(ring.len(), model.len());
            }
        }
    }
}
