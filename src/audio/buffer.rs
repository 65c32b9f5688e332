//! Lock-free sample buffer between device callbacks and pipeline threads
//!
//! Single-producer single-consumer: the cpal callback is one side, the
//! blocking pipeline loop the other. Samples cross interleaved so the
//! blocking side can reassemble exact codec frames.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::queue::ArrayQueue;

/// SPSC ring of interleaved PCM16 samples
pub struct SampleRing {
    queue: ArrayQueue<i16>,
    closed: AtomicBool,
    overflow_count: AtomicUsize,
    underrun_count: AtomicUsize,
}

impl SampleRing {
    /// Create a new ring with the specified capacity in samples
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            closed: AtomicBool::new(false),
            overflow_count: AtomicUsize::new(0),
            underrun_count: AtomicUsize::new(0),
        }
    }

    /// Push samples into the ring until it fills up.
    /// Returns the number of samples accepted.
    pub fn push_slice(&self, samples: &[i16]) -> usize {
        let mut accepted = 0;
        for &sample in samples {
            if self.queue.push(sample).is_err() {
                break;
            }
            accepted += 1;
        }
        accepted
    }

    /// Record samples a producer had to drop because the ring was full
    pub fn record_overflow(&self, dropped: usize) {
        self.overflow_count.fetch_add(dropped, Ordering::Relaxed);
    }

    /// Pop up to `out.len()` samples. Returns the number of samples
    /// written; a short count means the ring ran dry.
    pub fn pop_slice(&self, out: &mut [i16]) -> usize {
        let mut filled = 0;
        while filled < out.len() {
            match self.queue.pop() {
                Some(sample) => {
                    out[filled] = sample;
                    filled += 1;
                }
                None => break,
            }
        }
        filled
    }

    /// Record an underrun observed by the consumer
    pub fn record_underrun(&self) {
        self.underrun_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark the ring closed. The producer side is gone; a drained closed
    /// ring reads as end-of-stream.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Samples dropped because the ring was full
    pub fn overflow_count(&self) -> usize {
        self.overflow_count.load(Ordering::Relaxed)
    }

    /// Consumer-side dry reads
    pub fn underrun_count(&self) -> usize {
        self.underrun_count.load(Ordering::Relaxed)
    }
}

/// Thread-safe handle to a sample ring
pub type SharedSampleRing = Arc<SampleRing>;

/// Create a new shared sample ring
pub fn shared_ring(capacity: usize) -> SharedSampleRing {
    Arc::new(SampleRing::new(capacity))
}
