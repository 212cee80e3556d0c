//! Lock-free single-producer/single-consumer float channel
//!
//! Moves rendered audio from the real-time render thread to a non-real-time
//! consumer (typically a UI visualizer polling on a timer). Exactly one
//! thread may push and exactly one thread may pop; the two sides touch
//! disjoint regions of the buffer identified by two monotonically
//! increasing atomic cursors, so no mutex is needed.
//!
//! The overflow policy differs from a blocking queue and is part of the
//! contract: `push` never blocks and never overwrites unread data. When a
//! batch is larger than the free space, the *oldest* samples of the batch
//! are dropped and only the newest ones are written, so the reader always
//! sees the most recent audio the channel could hold.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default capacity, sized for a visualizer consumer (~93 ms at 44.1 kHz)
pub const DEFAULT_CAPACITY: usize = 4096;

/// Fixed-capacity SPSC float ring.
///
/// Safe to share as `Arc<RingChannel>` between one writer thread and one
/// reader thread. Using more than one of either breaks the cursor
/// discipline and is not supported.
pub struct RingChannel {
    buffer: Box<[UnsafeCell<f32>]>,
    capacity: usize,
    /// Total samples ever written; slot index is `pos % capacity`
    write_pos: AtomicU64,
    /// Total samples ever read
    read_pos: AtomicU64,
}

// The writer only touches slots in [read, read + free) and the reader only
// touches [read, write); the Acquire/Release pairing on the cursors orders
// the slot accesses.
unsafe impl Send for RingChannel {}
unsafe impl Sync for RingChannel {}

impl RingChannel {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingChannel capacity must be non-zero");
        Self {
            buffer: (0..capacity).map(|_| UnsafeCell::new(0.0)).collect(),
            capacity,
            write_pos: AtomicU64::new(0),
            read_pos: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples ready for the reader right now
    pub fn ready(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        (write - read) as usize
    }

    /// Write a batch of samples, truncating to the free space.
    ///
    /// If `samples` is larger than the free space, the oldest part of the
    /// batch is dropped and the newest `free` samples are written. Unread
    /// data is never overwritten. Never blocks. Returns the number of
    /// samples actually written.
    pub fn push(&self, samples: &[f32]) -> usize {
        let write = self.write_pos.load(Ordering::Relaxed);
        let read = self.read_pos.load(Ordering::Acquire);
        let free = self.capacity - (write - read) as usize;

        let src = if samples.len() > free {
            &samples[samples.len() - free..]
        } else {
            samples
        };
        if src.is_empty() {
            return 0;
        }

        // Wrap-split copy: at most two contiguous regions.
        let start = (write % self.capacity as u64) as usize;
        let first = src.len().min(self.capacity - start);
        for (i, &s) in src[..first].iter().enumerate() {
            unsafe { *self.buffer[start + i].get() = s };
        }
        for (i, &s) in src[first..].iter().enumerate() {
            unsafe { *self.buffer[i].get() = s };
        }

        self.write_pos.store(write + src.len() as u64, Ordering::Release);
        src.len()
    }

    /// Drain every currently ready sample into `dest` (appended, FIFO
    /// order). Never blocks; returns the number of samples drained, zero
    /// if nothing was ready.
    pub fn pop(&self, dest: &mut Vec<f32>) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Relaxed);
        let ready = (write - read) as usize;
        if ready == 0 {
            return 0;
        }

        let start = (read % self.capacity as u64) as usize;
        let first = ready.min(self.capacity - start);
        dest.reserve(ready);
        for i in 0..first {
            dest.push(unsafe { *self.buffer[start + i].get() });
        }
        for i in 0..ready - first {
            dest.push(unsafe { *self.buffer[i].get() });
        }

        self.read_pos.store(read + ready as u64, Ordering::Release);
        ready
    }
}

impl Default for RingChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_pop_returns_samples_in_order() {
        let ring = RingChannel::new(64);
        let input: Vec<f32> = (0..48).map(|i| i as f32).collect();
        assert_eq!(ring.push(&input), 48);

        let mut out = Vec::new();
        assert_eq!(ring.pop(&mut out), 48);
        assert_eq!(out, input, "pop should return exactly the pushed samples");
        assert_eq!(ring.ready(), 0, "channel should be empty after pop");
    }

    #[test]
    fn test_pop_on_empty_returns_zero() {
        let ring = RingChannel::new(16);
        let mut out = Vec::new();
        assert_eq!(ring.pop(&mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_overflow_keeps_the_newest_samples() {
        let capacity = 32;
        let ring = RingChannel::new(capacity);
        let input: Vec<f32> = (0..capacity + 10).map(|i| i as f32).collect();

        let written = ring.push(&input);
        assert_eq!(written, capacity, "write should be truncated to capacity");

        let mut out = Vec::new();
        assert_eq!(ring.pop(&mut out), capacity);
        assert_eq!(
            out,
            input[10..],
            "reader should see the tail of the oversized batch"
        );
    }

    #[test]
    fn test_overflow_never_corrupts_unread_data() {
        let ring = RingChannel::new(8);
        ring.push(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        // Only 2 slots free: the batch is truncated to its newest 2 samples.
        assert_eq!(ring.push(&[7.0, 8.0, 9.0, 10.0]), 2);

        let mut out = Vec::new();
        ring.pop(&mut out);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_wraparound_preserves_fifo_order() {
        let ring = RingChannel::new(8);
        let mut out = Vec::new();

        // Fill, half-drain, and refill repeatedly so the cursors wrap.
        let mut next = 0.0f32;
        let mut expected = Vec::new();
        for _ in 0..10 {
            let batch: Vec<f32> = (0..5).map(|_| {
                next += 1.0;
                next
            }).collect();
            let written = ring.push(&batch);
            expected.extend_from_slice(&batch[batch.len() - written..]);
            ring.pop(&mut out);
        }
        assert_eq!(out, expected);
    }

    #[test]
    fn test_concurrent_writer_and_reader() {
        use std::sync::Arc;

        let ring = Arc::new(RingChannel::new(256));
        let writer_ring = ring.clone();

        let writer = std::thread::spawn(move || {
            let mut n = 0.0f32;
            for _ in 0..200 {
                let batch: Vec<f32> = (0..16).map(|_| {
                    n += 1.0;
                    n
                }).collect();
                // Wait for room so nothing is truncated and the sequence
                // stays contiguous for the assertion below.
                while writer_ring.capacity() - writer_ring.ready() < batch.len() {
                    std::thread::yield_now();
                }
                assert_eq!(writer_ring.push(&batch), batch.len());
            }
        });

        let mut out = Vec::new();
        while out.len() < 200 * 16 {
            ring.pop(&mut out);
        }
        writer.join().unwrap();

        for (i, &s) in out.iter().enumerate() {
            assert_eq!(s, (i + 1) as f32, "sample {} out of order", i);
        }
    }
}
