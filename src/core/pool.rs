// Buffer pool: hands out fixed-size transfer buffers and takes them back for reuse.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{DEFAULT_BUFFER_SIZE, check_buffer_size};

const DEFAULT_MAX_IDLE: usize = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolOptions {
    pub buffer_size: usize,
    /// Released buffers beyond this count are freed instead of kept.
    pub max_idle: usize,
}

impl PoolOptions {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            max_idle: DEFAULT_MAX_IDLE,
        }
    }

    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

struct PoolInner {
    options: PoolOptions,
    idle: Mutex<Vec<Box<[u8]>>>,
    allocated: AtomicUsize,
}

impl PoolInner {
    fn idle(&self) -> MutexGuard<'_, Vec<Box<[u8]>>> {
        // A poisoned free list still holds valid buffers.
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn release(&self, buffer: Box<[u8]>) {
        let mut idle = self.idle();
        if idle.len() < self.options.max_idle {
            idle.push(buffer);
            tracing::debug!(idle = idle.len(), "buffer returned to pool");
        } else {
            self.allocated.fetch_sub(1, Ordering::Relaxed);
            tracing::debug!(idle = idle.len(), "pool full; buffer freed");
        }
    }
}

/// Shared free list of transfer buffers. Cloning shares the same pool.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    pub fn new(options: PoolOptions) -> Result<Self, Error> {
        check_buffer_size(options.buffer_size)?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                options,
                idle: Mutex::new(Vec::new()),
                allocated: AtomicUsize::new(0),
            }),
        })
    }

    pub fn options(&self) -> PoolOptions {
        self.inner.options
    }

    pub fn buffer_size(&self) -> usize {
        self.inner.options.buffer_size
    }

    /// Buffers currently parked in the free list.
    pub fn idle_count(&self) -> usize {
        self.inner.idle().len()
    }

    /// Buffers owned by this pool, idle or claimed.
    pub fn allocated_count(&self) -> usize {
        self.inner.allocated.load(Ordering::Relaxed)
    }

    /// Claims a buffer, reusing an idle one when available.
    ///
    /// Reused buffers are not cleared; the producer overwrites what it needs.
    pub fn acquire(&self) -> BufferHandle {
        let reused = self.inner.idle().pop();
        let buffer = match reused {
            Some(buffer) => {
                tracing::debug!(size = buffer.len(), "reusing pooled buffer");
                buffer
            }
            None => {
                let size = self.inner.options.buffer_size;
                self.inner.allocated.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(size, "allocating transfer buffer");
                vec![0u8; size].into_boxed_slice()
            }
        };
        BufferHandle {
            buffer: Some(buffer),
            pool: Arc::clone(&self.inner),
        }
    }
}

/// One live claim on a pooled buffer.
///
/// `dispose` returns the buffer immediately. Dropping the handle does the same, so a
/// forgotten handle still feeds the pool.
pub struct BufferHandle {
    buffer: Option<Box<[u8]>>,
    pool: Arc<PoolInner>,
}

impl BufferHandle {
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or(&[])
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.buffer.as_deref_mut().unwrap_or(&mut [])
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address of the underlying storage; stable across reuse of the same buffer.
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes().as_ptr()
    }

    pub fn dispose(mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.release(buffer);
        }
    }

    /// Detaches the buffer from the pool; the pool forgets it.
    pub fn into_inner(mut self) -> Result<Box<[u8]>, Error> {
        let buffer = self
            .buffer
            .take()
            .ok_or_else(|| Error::new(ErrorKind::Internal).with_message("handle already released"))?;
        self.pool.allocated.fetch_sub(1, Ordering::Relaxed);
        Ok(buffer)
    }
}

impl Drop for BufferHandle {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            tracing::debug!("buffer handle dropped without dispose");
            self.pool.release(buffer);
        }
    }
}

impl std::fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferHandle")
            .field("len", &self.len())
            .field("live", &self.buffer.is_some())
            .finish()
    }
}
