// Scratch buffer pool for the encoding hash path.

use crossbeam_queue::ArrayQueue;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

/// Initial capacity of a freshly allocated scratch buffer.
pub const INITIAL_BUFFER_SIZE: usize = 256;

/// Buffers that grew beyond this are dropped instead of pooled.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 4096;

/// Default number of pooled buffers, scaled by available cores.
pub fn default_capacity() -> usize {
    num_cpus::get().max(1) * 4
}

/// Counters describing how the pool has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Checkouts served from a pooled buffer.
    pub reused: u64,
    /// Checkouts that had to allocate.
    pub allocated: u64,
    /// Returns that were dropped (pool full or buffer oversized).
    pub discarded: u64,
}

/// Bounded lock-free pool of reusable encode buffers.
///
/// Checkout never blocks: an empty pool allocates a new buffer, and a full
/// pool drops returned buffers.
#[derive(Debug)]
pub struct EncoderPool {
    buffers: ArrayQueue<Vec<u8>>,
    max_buffer_size: usize,
    reused: AtomicU64,
    allocated: AtomicU64,
    discarded: AtomicU64,
}

impl EncoderPool {
    /// Creates a pool holding at most `capacity` idle buffers.
    pub fn new(capacity: usize, max_buffer_size: usize) -> Self {
        Self {
            buffers: ArrayQueue::new(capacity.max(1)),
            max_buffer_size: max_buffer_size.max(INITIAL_BUFFER_SIZE),
            reused: AtomicU64::new(0),
            allocated: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Checks out a cleared buffer. It goes back to the pool when the guard drops.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = match self.buffers.pop() {
            Some(buf) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Vec::with_capacity(INITIAL_BUFFER_SIZE)
            }
        };

        PooledBuffer {
            inner: Some(buf),
            pool: self,
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.buffers.len()
    }

    /// Maximum number of idle buffers.
    pub fn capacity(&self) -> usize {
        self.buffers.capacity()
    }

    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            reused: self.reused.load(Ordering::Relaxed),
            allocated: self.allocated.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > self.max_buffer_size {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }
        buf.clear();
        if self.buffers.push(buf).is_err() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for EncoderPool {
    fn default() -> Self {
        Self::new(default_capacity(), DEFAULT_MAX_BUFFER_SIZE)
    }
}

/// Buffer checked out of an [`EncoderPool`].
///
/// Dropping the guard clears the buffer and returns it, including during
/// unwinding.
pub struct PooledBuffer<'a> {
    inner: Option<Vec<u8>>,
    pool: &'a EncoderPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        // Only `Drop` takes the buffer out.
        match self.inner.as_ref() {
            Some(buf) => buf,
            None => unreachable!("pooled buffer used after release"),
        }
    }
}

impl DerefMut for PooledBuffer<'_> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self.inner.as_mut() {
            Some(buf) => buf,
            None => unreachable!("pooled buffer used after release"),
        }
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.inner.take() {
            self.pool.release(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_allocates_then_reuses() {
        let pool = EncoderPool::new(2, DEFAULT_MAX_BUFFER_SIZE);

        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"abc");
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire();
        assert!(buf.is_empty(), "returned buffers must come back cleared");
        assert!(buf.capacity() >= INITIAL_BUFFER_SIZE);
        drop(buf);

        let stats = pool.stats();
        assert_eq!(stats.allocated, 1);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.discarded, 0);
    }

    #[test]
    fn test_full_pool_discards_returns() {
        let pool = EncoderPool::new(1, DEFAULT_MAX_BUFFER_SIZE);

        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);

        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_oversized_buffer_is_not_pooled() {
        let pool = EncoderPool::new(4, INITIAL_BUFFER_SIZE);

        {
            let mut buf = pool.acquire();
            buf.resize(INITIAL_BUFFER_SIZE * 8, 0);
        }

        assert_eq!(pool.idle(), 0);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_buffer_returned_on_unwind() {
        let pool = EncoderPool::new(2, DEFAULT_MAX_BUFFER_SIZE);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut buf = pool.acquire();
            buf.push(1);
            panic!("boom");
        }));

        assert!(result.is_err());
        assert_eq!(pool.idle(), 1);
        assert!(pool.acquire().is_empty());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let pool = EncoderPool::new(0, 0);
        assert_eq!(pool.capacity(), 1);
        assert_eq!(pool.max_buffer_size(), INITIAL_BUFFER_SIZE);
    }
}
