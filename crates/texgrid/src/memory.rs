//! Linear device memory
//!
//! [`DeviceMemory`] is a typed, contiguous block of simulated device
//! storage. It backs linear texture resources and serves as the output
//! buffer software kernels write into.

use crate::device::Device;
use crate::error::{TexError, TexResult};
use bytemuck::{Pod, Zeroable};
use parking_lot::RwLock;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Typed linear block of device memory
#[derive(Debug)]
pub struct DeviceMemory<T: Pod> {
    /// Unique allocation ID
    id: Uuid,
    /// Fake device pointer (aligned)
    ptr: u64,
    /// Length in elements
    len: usize,
    data: Arc<RwLock<Vec<u8>>>,
    device: Device,
    _marker: PhantomData<T>,
}

impl<T: Pod> DeviceMemory<T> {
    /// Allocate a zero-initialized block of `len` elements
    pub fn allocate(device: &Device, len: usize) -> TexResult<Self> {
        if len == 0 {
            return Err(TexError::InvalidValue {
                parameter: "len".to_string(),
            });
        }

        let bytes = len * std::mem::size_of::<T>();
        device.reserve(bytes)?;

        let memory = Self {
            id: Uuid::new_v4(),
            ptr: rand::random::<u64>() & 0xFFFF_FFFF_FFFF_F000,
            len,
            data: Arc::new(RwLock::new(vec![0u8; bytes])),
            device: device.clone(),
            _marker: PhantomData,
        };
        tracing::debug!(id = %memory.id, bytes, "allocated linear memory");
        Ok(memory)
    }

    /// Unique allocation ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Fake device pointer
    pub fn ptr(&self) -> u64 {
        self.ptr
    }

    /// Length in elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the block holds no elements (never true once allocated)
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size in bytes
    pub fn size_bytes(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    /// Copy a host slice into device memory
    ///
    /// The host slice must hold exactly `len` elements.
    pub fn copy_from_host(&self, host: &[T]) -> TexResult<()> {
        if host.len() != self.len {
            return Err(TexError::ShapeMismatch {
                expected: self.size_bytes(),
                actual: std::mem::size_of_val(host),
            });
        }
        self.data.write().copy_from_slice(bytemuck::cast_slice(host));
        Ok(())
    }

    /// Copy device memory back into a host vector
    pub fn copy_to_host(&self) -> TexResult<Vec<T>> {
        let mut out = vec![T::zeroed(); self.len];
        bytemuck::cast_slice_mut(&mut out).copy_from_slice(&self.data.read());
        Ok(out)
    }

    /// Read one element
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds, like slice indexing.
    pub fn load(&self, index: usize) -> T {
        assert!(index < self.len, "index {index} out of bounds ({})", self.len);
        let size = std::mem::size_of::<T>();
        let data = self.data.read();
        bytemuck::pod_read_unaligned(&data[index * size..(index + 1) * size])
    }

    /// Write one element
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds, like slice indexing.
    pub fn store(&self, index: usize, value: T) {
        assert!(index < self.len, "index {index} out of bounds ({})", self.len);
        let size = std::mem::size_of::<T>();
        let mut data = self.data.write();
        data[index * size..(index + 1) * size].copy_from_slice(bytemuck::bytes_of(&value));
    }

    /// Shared handle to the raw bytes, for linear texture resources
    pub(crate) fn raw_data(&self) -> Arc<RwLock<Vec<u8>>> {
        Arc::clone(&self.data)
    }
}

impl<T: Pod> Drop for DeviceMemory<T> {
    fn drop(&mut self) {
        self.device.release(self.size_bytes());
        tracing::trace!(id = %self.id, "released linear memory");
    }
}
