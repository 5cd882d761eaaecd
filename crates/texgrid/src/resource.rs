//! Resource descriptors
//!
//! A resource descriptor names the memory a texture reads from: a
//! [`DeviceArray`] or a linear [`DeviceMemory`] block. Descriptors hold
//! non-owning references; the borrow checker keeps the backing alive for
//! as long as the descriptor (and any texture object built from it) lives.

use crate::array::DeviceArray;
use crate::channel::{ChannelFormatDescriptor, ChannelFormatKind};
use crate::error::{TexError, TexResult};
use crate::memory::DeviceMemory;
use bytemuck::Pod;
use parking_lot::RwLock;
use std::marker::PhantomData;
use std::sync::Arc;

/// Kind of memory backing a texture resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Backed by a dimensioned device array
    Array,
    /// Backed by linear device memory
    Linear,
}

#[derive(Debug, Clone)]
pub(crate) enum ResourceBacking<'a> {
    Array(&'a DeviceArray),
    Linear {
        data: Arc<RwLock<Vec<u8>>>,
        desc: ChannelFormatDescriptor,
        len: usize,
        _borrow: PhantomData<&'a ()>,
    },
}

/// Binds a device array or linear memory as the resource a texture reads
#[derive(Debug, Clone)]
pub struct ResourceDescriptor<'a> {
    pub(crate) backing: ResourceBacking<'a>,
}

impl<'a> ResourceDescriptor<'a> {
    /// Checked constructor mirroring the driver's tagged-union surface
    ///
    /// Array-kind resources require the array argument; linear-kind
    /// resources carry memory and a channel format instead, so they are
    /// built with [`ResourceDescriptor::from_linear`].
    pub fn new(kind: ResourceKind, array: Option<&'a DeviceArray>) -> TexResult<Self> {
        match kind {
            ResourceKind::Array => {
                let array = array.ok_or_else(|| TexError::InvalidResource {
                    message: "array-backed resource requires an array".to_string(),
                })?;
                Ok(Self::from_array(array))
            }
            ResourceKind::Linear => Err(TexError::InvalidResource {
                message: "linear-backed resources carry memory, use from_linear".to_string(),
            }),
        }
    }

    /// Bind a device array as the resource
    pub fn from_array(array: &'a DeviceArray) -> Self {
        Self {
            backing: ResourceBacking::Array(array),
        }
    }

    /// Bind linear device memory as a 1D resource
    ///
    /// The channel format's element size must match `T`.
    pub fn from_linear<T: Pod>(
        memory: &'a DeviceMemory<T>,
        desc: ChannelFormatDescriptor,
    ) -> TexResult<Self> {
        if desc.kind == ChannelFormatKind::None || desc.element_size() == 0 {
            return Err(TexError::InvalidResource {
                message: "linear resources require a channel format with channels".to_string(),
            });
        }
        if desc.element_size() != std::mem::size_of::<T>() {
            return Err(TexError::InvalidResource {
                message: format!(
                    "channel format element size {} does not match memory element size {}",
                    desc.element_size(),
                    std::mem::size_of::<T>()
                ),
            });
        }
        Ok(Self {
            backing: ResourceBacking::Linear {
                data: memory.raw_data(),
                desc,
                len: memory.len(),
                _borrow: PhantomData,
            },
        })
    }

    /// Resource kind tag
    pub fn kind(&self) -> ResourceKind {
        match self.backing {
            ResourceBacking::Array(_) => ResourceKind::Array,
            ResourceBacking::Linear { .. } => ResourceKind::Linear,
        }
    }

    /// Dimensionality of the backing memory (linear resources are 1D)
    pub fn rank(&self) -> u32 {
        match &self.backing {
            ResourceBacking::Array(array) => array.rank(),
            ResourceBacking::Linear { .. } => 1,
        }
    }

    /// Channel format of the backing memory
    pub fn channel_desc(&self) -> ChannelFormatDescriptor {
        match &self.backing {
            ResourceBacking::Array(array) => array.channel_desc(),
            ResourceBacking::Linear { desc, .. } => *desc,
        }
    }

    /// Extent of the backing memory in elements (unused ranks are zero)
    pub fn extent(&self) -> (usize, usize, usize) {
        match &self.backing {
            ResourceBacking::Array(array) => (array.width(), array.height(), array.depth()),
            ResourceBacking::Linear { len, .. } => (*len, 0, 0),
        }
    }
}
