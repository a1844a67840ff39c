//! Lock-free SPSC ring buffer
//!
//! Fixed-capacity circular queue shared by exactly one producer and one
//! consumer that may live in different execution contexts (another core, an
//! interrupt handler). Neither side ever blocks:
//! - Producer owns `head` (next free slot), consumer owns `tail` (next valid slot)
//! - Empty iff `head == tail`, full iff advancing `head` would hit `tail`
//!   (one slot is sacrificed, so `N` slots hold `N - 1` items)
//! - Slots are 64-bit atomics; the release store of a cursor publishes the
//!   slot written before it

use super::packet::Packet;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Default number of slots in the command queue
pub const QUEUE_CAPACITY: usize = 256;

/// Values that fit in one 64-bit ring slot
pub trait Word: Copy {
    /// Pack into a slot word
    fn into_word(self) -> u64;
    /// Unpack from a slot word
    fn from_word(word: u64) -> Self;
}

impl Word for Packet {
    #[inline]
    fn into_word(self) -> u64 {
        u64::from_le_bytes(self.to_bytes())
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        Packet::from_bytes(word.to_le_bytes())
    }
}

/// Shared ring storage
///
/// Use [`channel`] to obtain the producer and consumer endpoints; the
/// endpoints are not `Clone`, which is what keeps each cursor single-writer.
#[derive(Debug)]
pub struct SpscRing<T: Word, const N: usize = QUEUE_CAPACITY> {
    slots: [AtomicU64; N],
    head: AtomicUsize,
    tail: AtomicUsize,
    _marker: PhantomData<T>,
}

impl<T: Word, const N: usize> SpscRing<T, N> {
    const MASK: usize = {
        assert!(N.is_power_of_two() && N >= 2, "ring capacity must be a power of two");
        N - 1
    };

    /// Create an empty ring
    pub fn new() -> Self {
        SpscRing {
            slots: std::array::from_fn(|_| AtomicU64::new(0)),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    /// Maximum number of queued items (`N - 1`)
    pub const fn capacity(&self) -> usize {
        Self::MASK
    }

    /// Number of queued items as seen from the calling side
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail) & Self::MASK
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, item: T) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) & Self::MASK;
        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }
        self.slots[head].store(item.into_word(), Ordering::Relaxed);
        self.head.store(next, Ordering::Release);
        true
    }

    fn peek(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        Some(T::from_word(self.slots[tail].load(Ordering::Relaxed)))
    }

    fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        let item = T::from_word(self.slots[tail].load(Ordering::Relaxed));
        self.tail.store((tail + 1) & Self::MASK, Ordering::Release);
        Some(item)
    }
}

impl<T: Word, const N: usize> Default for SpscRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer endpoint
#[derive(Debug)]
pub struct Producer<T: Word, const N: usize = QUEUE_CAPACITY> {
    ring: Arc<SpscRing<T, N>>,
}

impl<T: Word, const N: usize> Producer<T, N> {
    /// Enqueue `item`; returns `false` and drops it when the ring is full
    #[inline]
    pub fn push(&mut self, item: T) -> bool {
        self.ring.push(item)
    }

    /// Free slots as seen by the producer
    pub fn free(&self) -> usize {
        self.ring.capacity() - self.ring.len()
    }

    /// Shared ring storage
    pub fn ring(&self) -> &SpscRing<T, N> {
        &self.ring
    }
}

/// Consumer endpoint
#[derive(Debug)]
pub struct Consumer<T: Word, const N: usize = QUEUE_CAPACITY> {
    ring: Arc<SpscRing<T, N>>,
}

impl<T: Word, const N: usize> Consumer<T, N> {
    /// Read the oldest item without consuming it
    #[inline]
    pub fn peek(&self) -> Option<T> {
        self.ring.peek()
    }

    /// Consume the oldest item
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.ring.pop()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.ring.len()
    }
}

/// Create a ring and split it into its two endpoints
pub fn channel<T: Word, const N: usize>() -> (Producer<T, N>, Consumer<T, N>) {
    let ring = Arc::new(SpscRing::new());
    (
        Producer {
            ring: Arc::clone(&ring),
        },
        Consumer { ring },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_creation() {
        let (producer, consumer) = channel::<Packet, 16>();
        assert_eq!(producer.ring().capacity(), 15);
        assert!(consumer.is_empty());
        assert_eq!(producer.free(), 15);
    }

    #[test]
    fn test_fifo_order() {
        let (mut tx, mut rx) = channel::<Packet, 8>();
        let packets: Vec<Packet> = (0..7)
            .map(|i| Packet::register_write(i * 3, i as u8, 0x10 + i as u8))
            .collect();
        for &p in &packets {
            assert!(tx.push(p));
        }
        let popped: Vec<Packet> = std::iter::from_fn(|| rx.pop()).collect();
        assert_eq!(popped, packets);
    }

    #[test]
    fn test_capacity_sacrifices_one_slot() {
        let (mut tx, mut rx) = channel::<Packet, 16>();
        for i in 0..15 {
            assert!(tx.push(Packet::register_write(i, 0, 0)), "push {i} should fit");
        }
        assert!(!tx.push(Packet::register_write(99, 0, 0)), "16th push must fail");
        assert_eq!(rx.len(), 15);

        assert_eq!(rx.pop().map(|p| p.tick), Some(0));
        assert!(tx.push(Packet::register_write(100, 0, 0)));
        assert!(!tx.push(Packet::register_write(101, 0, 0)));
    }

    #[test]
    fn test_overflow_drops_newest() {
        let (mut tx, mut rx) = channel::<Packet, 4>();
        for i in 0..5 {
            tx.push(Packet::register_write(i, 0, 0));
        }
        let ticks: Vec<u16> = std::iter::from_fn(|| rx.pop()).map(|p| p.tick).collect();
        assert_eq!(ticks, vec![0, 1, 2]);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let (mut tx, mut rx) = channel::<Packet, 4>();
        assert_eq!(rx.peek(), None);
        tx.push(Packet::pan(7, 1, 3));
        assert_eq!(rx.peek(), Some(Packet::pan(7, 1, 3)));
        assert_eq!(rx.peek(), Some(Packet::pan(7, 1, 3)));
        assert_eq!(rx.pop(), Some(Packet::pan(7, 1, 3)));
        assert_eq!(rx.peek(), None);
    }

    #[test]
    fn test_wraps_many_times() {
        let (mut tx, mut rx) = channel::<Packet, 4>();
        for i in 0..1000u16 {
            assert!(tx.push(Packet::register_write(i, 1, i as u8)));
            assert_eq!(rx.pop(), Some(Packet::register_write(i, 1, i as u8)));
        }
        assert!(rx.is_empty());
    }
}
