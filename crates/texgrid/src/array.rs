//! Dimensioned device arrays
//!
//! A [`DeviceArray`] is an opaque 1D/2D/3D block of simulated device
//! memory with a fixed element layout taken from its channel format
//! descriptor. Rank follows the extent: `depth == 0` means at most 2D and
//! `height == 0` means 1D. Host transfers are contiguous and row-major,
//! synchronous by default and stream-ordered when a stream is supplied.

use crate::channel::{ChannelFormatDescriptor, ChannelFormatKind};
use crate::device::Device;
use crate::error::{TexError, TexResult};
use crate::stream::{Fence, OpKind, Stream};
use bitflags::bitflags;
use bytemuck::Pod;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

bitflags! {
    /// Flags which modify array creation
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ArrayFlags: u32 {
        /// Plain sampled array
        const DEFAULT = 0;
        /// Allow surface load/store access
        const SURFACE_LOAD_STORE = 0x02;
        /// Array will be used for texture gather (2D only)
        const TEXTURE_GATHER = 0x08;
    }
}

#[derive(Debug)]
pub(crate) struct ArrayInner {
    pub(crate) id: Uuid,
    desc: ChannelFormatDescriptor,
    width: usize,
    height: usize,
    depth: usize,
    flags: ArrayFlags,
    size_bytes: usize,
    /// Simulated device storage, row-major
    pub(crate) data: RwLock<Vec<u8>>,
    /// In-flight asynchronous operations touching this array
    pending: AtomicU64,
    device: Device,
}

impl ArrayInner {
    pub(crate) fn retire_pending(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Drop for ArrayInner {
    fn drop(&mut self) {
        self.device.release(self.size_bytes);
        tracing::trace!(id = %self.id, "released array");
    }
}

/// Opaque, dimensioned block of device memory with a fixed element layout
#[derive(Debug)]
pub struct DeviceArray {
    pub(crate) inner: Arc<ArrayInner>,
}

impl DeviceArray {
    /// Allocate an array for the given channel format and extent
    ///
    /// `height = 0` allocates a 1D array, `depth = 0` at most a 2D one.
    pub fn allocate(
        device: &Device,
        desc: ChannelFormatDescriptor,
        width: usize,
        height: usize,
        depth: usize,
    ) -> TexResult<Self> {
        Self::allocate_with_flags(device, desc, width, height, depth, ArrayFlags::DEFAULT)
    }

    /// Allocate an array with explicit creation flags
    pub fn allocate_with_flags(
        device: &Device,
        desc: ChannelFormatDescriptor,
        width: usize,
        height: usize,
        depth: usize,
        flags: ArrayFlags,
    ) -> TexResult<Self> {
        if desc.kind == ChannelFormatKind::None {
            return Err(TexError::InvalidChannelFormat {
                message: "arrays require a channel format with channels".to_string(),
            });
        }
        if width == 0 || (depth != 0 && height == 0) {
            return Err(TexError::InvalidDimensions {
                width,
                height,
                depth,
            });
        }

        let limits = device.properties();
        let within_limits = if depth != 0 {
            width <= limits.max_extent_3d[0]
                && height <= limits.max_extent_3d[1]
                && depth <= limits.max_extent_3d[2]
        } else if height != 0 {
            width <= limits.max_extent_2d[0] && height <= limits.max_extent_2d[1]
        } else {
            width <= limits.max_extent_1d
        };
        if !within_limits {
            return Err(TexError::InvalidDimensions {
                width,
                height,
                depth,
            });
        }

        if flags.contains(ArrayFlags::TEXTURE_GATHER) && (height == 0 || depth != 0) {
            return Err(TexError::InvalidValue {
                parameter: "ArrayFlags::TEXTURE_GATHER (2D arrays only)".to_string(),
            });
        }

        let size_bytes = width * height.max(1) * depth.max(1) * desc.element_size();
        device.reserve(size_bytes)?;

        let inner = Arc::new(ArrayInner {
            id: Uuid::new_v4(),
            desc,
            width,
            height,
            depth,
            flags,
            size_bytes,
            data: RwLock::new(vec![0u8; size_bytes]),
            pending: AtomicU64::new(0),
            device: device.clone(),
        });
        tracing::debug!(
            id = %inner.id,
            width,
            height,
            depth,
            size_bytes,
            "allocated array"
        );
        Ok(Self { inner })
    }

    /// Unique array ID
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Width in elements
    pub fn width(&self) -> usize {
        self.inner.width
    }

    /// Height in elements (0 for 1D arrays)
    pub fn height(&self) -> usize {
        self.inner.height
    }

    /// Depth in elements (0 for 1D and 2D arrays)
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    /// Dimensionality: 1, 2 or 3
    pub fn rank(&self) -> u32 {
        if self.inner.depth != 0 {
            3
        } else if self.inner.height != 0 {
            2
        } else {
            1
        }
    }

    /// Creation flags
    pub fn flags(&self) -> ArrayFlags {
        self.inner.flags
    }

    /// Channel format descriptor the array was allocated with
    pub fn channel_desc(&self) -> ChannelFormatDescriptor {
        self.inner.desc
    }

    /// Total size in bytes
    pub fn size_bytes(&self) -> usize {
        self.inner.size_bytes
    }

    /// Asynchronous operations still in flight against this array
    pub fn pending_operations(&self) -> u64 {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Copy a contiguous, row-major host buffer into the array
    ///
    /// Without a stream the copy is synchronous and immediately visible.
    /// With a stream it completes when the stream (or the device) is
    /// synchronized; until then synchronous access fails with
    /// [`TexError::Synchronization`].
    pub fn copy_from<T: Pod>(&self, host: &[T], stream: Option<&Stream>) -> TexResult<()> {
        self.check_shape(std::mem::size_of_val(host))?;
        match stream {
            None => {
                self.ensure_idle()?;
                self.inner
                    .data
                    .write()
                    .copy_from_slice(bytemuck::cast_slice(host));
            }
            Some(stream) => {
                self.inner
                    .data
                    .write()
                    .copy_from_slice(bytemuck::cast_slice(host));
                self.inner.pending.fetch_add(1, Ordering::SeqCst);
                stream.submit(Fence::copy(
                    OpKind::HostToArray,
                    self.inner.size_bytes,
                    Arc::downgrade(&self.inner),
                ));
            }
        }
        tracing::trace!(id = %self.inner.id, asynchronous = stream.is_some(), "copy in");
        Ok(())
    }

    /// Copy the array into a contiguous, row-major host buffer
    ///
    /// Stream semantics match [`DeviceArray::copy_from`]: after an
    /// asynchronous copy the caller must synchronize before reading the
    /// host buffer.
    pub fn copy_to<T: Pod>(&self, host: &mut [T], stream: Option<&Stream>) -> TexResult<()> {
        self.check_shape(std::mem::size_of_val(host))?;
        match stream {
            None => {
                self.ensure_idle()?;
                bytemuck::cast_slice_mut(host).copy_from_slice(&self.inner.data.read());
            }
            Some(stream) => {
                bytemuck::cast_slice_mut(host).copy_from_slice(&self.inner.data.read());
                self.inner.pending.fetch_add(1, Ordering::SeqCst);
                stream.submit(Fence::copy(
                    OpKind::ArrayToHost,
                    self.inner.size_bytes,
                    Arc::downgrade(&self.inner),
                ));
            }
        }
        tracing::trace!(id = %self.inner.id, asynchronous = stream.is_some(), "copy out");
        Ok(())
    }

    fn check_shape(&self, host_bytes: usize) -> TexResult<()> {
        if host_bytes != self.inner.size_bytes {
            return Err(TexError::ShapeMismatch {
                expected: self.inner.size_bytes,
                actual: host_bytes,
            });
        }
        Ok(())
    }

    fn ensure_idle(&self) -> TexResult<()> {
        let pending = self.inner.pending.load(Ordering::SeqCst);
        if pending != 0 {
            return Err(TexError::Synchronization {
                message: format!(
                    "array {} has {pending} in-flight operations, synchronize first",
                    self.inner.id
                ),
            });
        }
        Ok(())
    }
}
