//! Streams: ordered queues for asynchronous device operations
//!
//! Operations submitted to one stream retire in submission order. Work on
//! different streams has no ordering guarantee until the caller
//! synchronizes the streams (or the whole device).

use crate::array::ArrayInner;
use crate::device::Device;
use crate::error::TexResult;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use uuid::Uuid;

/// Stream creation flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFlags {
    /// Do not implicitly synchronize with the default stream
    pub non_blocking: bool,
    /// Skip timing bookkeeping for operations on this stream
    pub disable_timing: bool,
}

impl Default for StreamFlags {
    fn default() -> Self {
        Self {
            non_blocking: true,
            disable_timing: false,
        }
    }
}

/// Kind of operation a fence retires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpKind {
    /// Host buffer into a device array
    HostToArray,
    /// Device array into a host buffer
    ArrayToHost,
    /// Kernel grid execution
    KernelLaunch,
}

/// Completion fence for one submitted operation
#[derive(Debug)]
pub(crate) struct Fence {
    kind: OpKind,
    bytes: usize,
    /// Array whose in-flight count this fence retires, if any
    target: Option<Weak<ArrayInner>>,
}

impl Fence {
    pub(crate) fn copy(kind: OpKind, bytes: usize, target: Weak<ArrayInner>) -> Self {
        Self {
            kind,
            bytes,
            target: Some(target),
        }
    }

    pub(crate) fn kernel() -> Self {
        Self {
            kind: OpKind::KernelLaunch,
            bytes: 0,
            target: None,
        }
    }

    fn complete(self) {
        if let Some(target) = &self.target {
            if let Some(array) = target.upgrade() {
                array.retire_pending();
            }
        }
        tracing::trace!(kind = ?self.kind, bytes = self.bytes, "fence retired");
    }
}

#[derive(Debug)]
pub(crate) struct StreamInner {
    id: Uuid,
    name: String,
    /// Fake driver handle
    handle: u64,
    flags: StreamFlags,
    queue: Mutex<VecDeque<Fence>>,
    /// Total submitted operations (for tests)
    submitted: AtomicU64,
}

impl StreamInner {
    /// Retire every queued fence in submission order
    pub(crate) async fn drain(&self) -> TexResult<()> {
        loop {
            let fence = { self.queue.lock().pop_front() };
            let Some(fence) = fence else { break };
            // Simulated device latency per retired operation.
            tokio::time::sleep(Duration::from_micros(5)).await;
            fence.complete();
        }
        Ok(())
    }
}

/// Ordered queue of asynchronous device operations
///
/// Cheap to clone; every clone refers to the same queue.
#[derive(Debug, Clone)]
pub struct Stream {
    inner: Arc<StreamInner>,
}

impl Stream {
    /// Create a stream on the given device
    pub fn new(device: &Device, flags: StreamFlags) -> TexResult<Self> {
        Self::named(device, "stream", flags)
    }

    /// Create a named stream on the given device
    pub fn named(device: &Device, name: impl Into<String>, flags: StreamFlags) -> TexResult<Self> {
        let inner = Arc::new(StreamInner {
            id: Uuid::new_v4(),
            name: name.into(),
            handle: rand::random::<u64>(),
            flags,
            queue: Mutex::new(VecDeque::new()),
            submitted: AtomicU64::new(0),
        });
        device.register_stream(Arc::downgrade(&inner));
        tracing::debug!(id = %inner.id, name = %inner.name, "created stream");
        Ok(Self { inner })
    }

    /// Unique stream ID
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Stream name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Opaque driver handle
    pub fn handle(&self) -> u64 {
        self.inner.handle
    }

    /// Creation flags
    pub fn flags(&self) -> StreamFlags {
        self.inner.flags
    }

    /// Wait for all queued operations to retire, in submission order
    pub async fn synchronize(&self) -> TexResult<()> {
        self.inner.drain().await
    }

    /// Whether every submitted operation has retired
    pub fn is_complete(&self) -> bool {
        self.inner.queue.lock().is_empty()
    }

    /// Operations still queued on this stream
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Total operations submitted over the stream's lifetime (for tests)
    pub fn operation_count(&self) -> u64 {
        self.inner.submitted.load(Ordering::SeqCst)
    }

    pub(crate) fn submit(&self, fence: Fence) {
        self.inner.submitted.fetch_add(1, Ordering::SeqCst);
        self.inner.queue.lock().push_back(fence);
    }
}
