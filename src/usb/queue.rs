//! Lock-free single-producer/single-consumer report ring.
//!
//! The USB class callback (interrupt context) pushes raw host reports;
//! the application loop pops them. The producer only ever writes
//! `head` and reads `tail`, the consumer only ever writes `tail` and
//! reads `head`, and each index is published with a single release
//! store, so no lock is needed.
//!
//! Overflow drops the NEW item (the in-flight ones are older and more
//! likely to complete a frame) and counts the loss.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::config::RX_ITEM_MAX;

struct Slot {
    len: u16,
    data: [u8; RX_ITEM_MAX],
}

impl Slot {
    const EMPTY: Slot = Slot {
        len: 0,
        data: [0; RX_ITEM_MAX],
    };
}

/// Outcome of a [`InboundQueue::try_pop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pop {
    /// Nothing queued.
    Empty,
    /// The destination is smaller than the queued item; nothing was
    /// consumed. Retry with at least `needed` bytes.
    TooSmall { needed: usize },
    /// An item of this length was copied out.
    Popped(usize),
}

/// Fixed-capacity SPSC ring of raw host reports.
///
/// `N` is the slot count; one slot stays unused to tell full from
/// empty, so up to `N - 1` items queue at once.
///
/// Exactly one context may push and exactly one may pop. The type is
/// `Sync` so a `static` instance can be shared between the USB
/// interrupt and the main loop under that discipline.
pub struct InboundQueue<const N: usize> {
    head: AtomicUsize,
    tail: AtomicUsize,
    dropped: AtomicU32,
    slots: [UnsafeCell<Slot>; N],
}

// SAFETY: head/tail are atomics; each slot is written only by the
// producer before the head release-store and read only by the consumer
// after an acquire-load observes it, so no slot is accessed from both
// sides at once.
unsafe impl<const N: usize> Sync for InboundQueue<N> {}

impl<const N: usize> InboundQueue<N> {
    pub const fn new() -> Self {
        Self {
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicU32::new(0),
            slots: [const { UnsafeCell::new(Slot::EMPTY) }; N],
        }
    }

    /// Usable capacity (slots minus the full/empty sentinel).
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Queue one report. Producer context only; never blocks.
    ///
    /// Returns `false` when the ring was full; the item is discarded
    /// and the drop counter incremented. Oversized input is truncated
    /// to [`RX_ITEM_MAX`].
    pub fn push(&self, bytes: &[u8]) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next == self.tail.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let len = bytes.len().min(RX_ITEM_MAX);
        // SAFETY: slot `head` is outside tail..head, so the consumer
        // will not touch it until the release store below.
        unsafe {
            let slot = &mut *self.slots[head].get();
            slot.len = len as u16;
            slot.data[..len].copy_from_slice(&bytes[..len]);
        }
        self.head.store(next, Ordering::Release);
        true
    }

    /// Dequeue one report into `dst`. Consumer context only; never
    /// blocks.
    ///
    /// A too-small destination consumes nothing and reports the
    /// required size, so the caller can retry.
    pub fn try_pop(&self, dst: &mut [u8]) -> Pop {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return Pop::Empty;
        }

        // SAFETY: slot `tail` was published by the producer's release
        // store and will not be rewritten before our own release below.
        let len = unsafe {
            let slot = &*self.slots[tail].get();
            let len = slot.len as usize;
            if dst.len() < len {
                return Pop::TooSmall { needed: len };
            }
            dst[..len].copy_from_slice(&slot.data[..len]);
            len
        };
        self.tail.store((tail + 1) % N, Ordering::Release);
        Pop::Popped(len)
    }

    /// Items currently queued.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports lost to overflow since power-up.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for InboundQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RX_RING_SLOTS;

    #[test]
    fn fifo_order_round_trip() {
        let q: InboundQueue<RX_RING_SLOTS> = InboundQueue::new();
        for i in 0..q.capacity() as u8 {
            assert!(q.push(&[0x06, i, i.wrapping_mul(3)]));
        }
        assert_eq!(q.len(), q.capacity());

        let mut dst = [0u8; RX_ITEM_MAX];
        for i in 0..q.capacity() as u8 {
            assert_eq!(q.try_pop(&mut dst), Pop::Popped(3));
            assert_eq!(&dst[..3], &[0x06, i, i.wrapping_mul(3)]);
        }
        assert_eq!(q.try_pop(&mut dst), Pop::Empty);
        assert_eq!(q.dropped(), 0);
    }

    #[test]
    fn overflow_drops_newest_and_counts() {
        let q: InboundQueue<RX_RING_SLOTS> = InboundQueue::new();
        for i in 0..q.capacity() as u8 {
            assert!(q.push(&[i]));
        }
        assert!(!q.push(&[0xEE]));
        assert_eq!(q.dropped(), 1);

        // The queued items are the old ones, unharmed.
        let mut dst = [0u8; RX_ITEM_MAX];
        assert_eq!(q.try_pop(&mut dst), Pop::Popped(1));
        assert_eq!(dst[0], 0);

        // One slot freed, pushes work again.
        assert!(q.push(&[0x55]));
    }

    #[test]
    fn short_destination_is_a_recoverable_no_op() {
        let q: InboundQueue<RX_RING_SLOTS> = InboundQueue::new();
        q.push(&[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut small = [0u8; 4];
        assert_eq!(q.try_pop(&mut small), Pop::TooSmall { needed: 8 });
        assert_eq!(q.len(), 1);

        let mut big = [0u8; 8];
        assert_eq!(q.try_pop(&mut big), Pop::Popped(8));
        assert_eq!(big, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn oversized_push_is_truncated() {
        let q: InboundQueue<RX_RING_SLOTS> = InboundQueue::new();
        let big = [0xABu8; RX_ITEM_MAX + 16];
        assert!(q.push(&big));

        let mut dst = [0u8; RX_ITEM_MAX];
        assert_eq!(q.try_pop(&mut dst), Pop::Popped(RX_ITEM_MAX));
    }

    #[test]
    fn wraps_across_the_slot_boundary() {
        let q: InboundQueue<4> = InboundQueue::new();
        let mut dst = [0u8; RX_ITEM_MAX];

        // Push/pop more items than there are slots.
        for i in 0..20u8 {
            assert!(q.push(&[i, i + 1]));
            assert_eq!(q.try_pop(&mut dst), Pop::Popped(2));
            assert_eq!(&dst[..2], &[i, i + 1]);
        }
        assert_eq!(q.dropped(), 0);
    }
}
