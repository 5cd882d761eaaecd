//! Device context handles
//!
//! A [`Device`] is an explicitly passed context object over one emulated
//! GPU: it carries the device properties, accounts for simulated memory,
//! and tracks the streams and texture objects created against it. Passing
//! the handle around (instead of relying on process-wide state) keeps
//! callers independent and reorderable.

use crate::error::{TexError, TexResult};
use crate::stream::StreamInner;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Number of emulated devices visible to the process
pub fn device_count() -> u32 {
    1
}

/// Static properties of an emulated device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProperties {
    /// Device name
    pub name: String,
    /// Total device memory in bytes
    pub total_memory: usize,
    /// Maximum 1D array extent in elements
    pub max_extent_1d: usize,
    /// Maximum 2D array extent [width, height]
    pub max_extent_2d: [usize; 2],
    /// Maximum 3D array extent [width, height, depth]
    pub max_extent_3d: [usize; 3],
    /// Maximum threads per block
    pub max_threads_per_block: u32,
    /// Maximum block dimensions [x, y, z]
    pub max_block_dims: [u32; 3],
    /// Maximum grid dimensions [x, y, z]
    pub max_grid_dims: [u32; 3],
    /// Warp size
    pub warp_size: u32,
    /// Required base-address alignment for texture resources
    pub texture_alignment: usize,
}

impl Default for DeviceProperties {
    fn default() -> Self {
        Self {
            name: "texgrid emulated device".to_string(),
            total_memory: 256 * 1024 * 1024,
            max_extent_1d: 131_072,
            max_extent_2d: [65_536, 65_536],
            max_extent_3d: [16_384, 16_384, 16_384],
            max_threads_per_block: 1024,
            max_block_dims: [1024, 1024, 64],
            max_grid_dims: [2_147_483_647, 65_535, 65_535],
            warp_size: 32,
            texture_alignment: 512,
        }
    }
}

#[derive(Debug)]
pub(crate) struct DeviceInner {
    /// Unique device context ID
    id: Uuid,
    /// Device ordinal
    ordinal: i32,
    properties: DeviceProperties,
    /// Reserved bytes (hot counter, Relaxed: independent accounting)
    used: AtomicUsize,
    /// Streams created against this device, drained by `synchronize`
    streams: Mutex<Vec<Weak<StreamInner>>>,
    /// Live texture objects bound to this device's resources
    texture_objects: AtomicU64,
}

/// Handle to an emulated device
///
/// Cheap to clone; every clone refers to the same device state.
#[derive(Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("ordinal", &self.inner.ordinal)
            .field("id", &self.inner.id)
            .finish()
    }
}

impl Device {
    /// Open the device with the given ordinal
    pub fn new(ordinal: i32) -> TexResult<Self> {
        Self::with_properties(ordinal, DeviceProperties::default())
    }

    /// Open a device with explicit properties
    ///
    /// Mostly useful for shrinking the simulated memory or extent limits
    /// under test.
    pub fn with_properties(ordinal: i32, properties: DeviceProperties) -> TexResult<Self> {
        if ordinal < 0 || ordinal >= device_count() as i32 {
            return Err(TexError::InvalidDevice { device: ordinal });
        }

        let device = Self {
            inner: Arc::new(DeviceInner {
                id: Uuid::new_v4(),
                ordinal,
                properties,
                used: AtomicUsize::new(0),
                streams: Mutex::new(Vec::new()),
                texture_objects: AtomicU64::new(0),
            }),
        };
        tracing::debug!(ordinal, id = %device.inner.id, "opened device");
        Ok(device)
    }

    /// Device ordinal
    pub fn ordinal(&self) -> i32 {
        self.inner.ordinal
    }

    /// Unique context ID
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Device properties
    pub fn properties(&self) -> &DeviceProperties {
        &self.inner.properties
    }

    /// Bytes currently reserved on the device
    pub fn memory_used(&self) -> usize {
        // Relaxed: approximate snapshot sufficient for reporting
        self.inner.used.load(Ordering::Relaxed)
    }

    /// Bytes still available on the device
    pub fn memory_free(&self) -> usize {
        self.inner.properties.total_memory - self.memory_used()
    }

    /// Number of live texture objects bound against this device
    pub fn texture_object_count(&self) -> u64 {
        self.inner.texture_objects.load(Ordering::SeqCst)
    }

    /// Wait for every stream created against this device to retire its
    /// queued operations, in registration order
    pub async fn synchronize(&self) -> TexResult<()> {
        let streams: Vec<Arc<StreamInner>> = {
            let mut registry = self.inner.streams.lock();
            registry.retain(|weak| weak.strong_count() > 0);
            registry.iter().filter_map(|weak| weak.upgrade()).collect()
        };

        for stream in streams {
            stream.drain().await?;
        }
        tracing::debug!(ordinal = self.inner.ordinal, "device synchronized");
        Ok(())
    }

    /// Reserve bytes against the simulated memory budget
    pub(crate) fn reserve(&self, bytes: usize) -> TexResult<()> {
        let total = self.inner.properties.total_memory;
        let mut used = self.inner.used.load(Ordering::Relaxed);
        loop {
            let available = total - used;
            if bytes > available {
                return Err(TexError::OutOfMemory {
                    requested: bytes,
                    available,
                });
            }
            match self.inner.used.compare_exchange_weak(
                used,
                used + bytes,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => used = actual,
            }
        }
    }

    /// Return bytes to the simulated memory budget
    pub(crate) fn release(&self, bytes: usize) {
        // Relaxed: independent counter tracking memory usage
        self.inner.used.fetch_sub(bytes, Ordering::Relaxed);
    }

    pub(crate) fn register_stream(&self, stream: Weak<StreamInner>) {
        self.inner.streams.lock().push(stream);
    }

    pub(crate) fn texture_object_created(&self) {
        self.inner.texture_objects.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn texture_object_released(&self) {
        self.inner.texture_objects.fetch_sub(1, Ordering::SeqCst);
    }
}
