//! Texture descriptors and sampling handles
//!
//! A [`TextureDescriptor`] carries the addressing, filtering and read-mode
//! configuration; [`TextureObject::create`] binds it to a resource and
//! yields the opaque handle kernels sample through. The sampling path
//! follows the driver's semantics: unnormalized or normalized coordinates,
//! point or tent (linear) filtering with sample positions shifted by -0.5,
//! and per-dimension clamp/wrap/mirror/border addressing.

use crate::channel::{ChannelFormatDescriptor, ChannelFormatKind};
use crate::device::Device;
use crate::error::{TexError, TexResult};
use crate::resource::{ResourceBacking, ResourceDescriptor, ResourceKind};
use uuid::Uuid;

/// Out-of-range coordinate handling, per dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Clamp to the edge texel
    Clamp,
    /// Repeat the texture (normalized coordinates only)
    Wrap,
    /// Reflect at the edges (normalized coordinates only)
    Mirror,
    /// Zero outside the texture
    Border,
}

/// Interpolation applied between texels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Nearest texel
    Point,
    /// Tent filter over neighboring texels
    Linear,
}

/// How stored elements surface to the sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Raw stored element values
    ElementType,
    /// Integer channels mapped into [0, 1] (signed: [-1, 1])
    NormalizedFloat,
}

/// Addressing, filtering and read-mode configuration for a texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    address_modes: Vec<AddressMode>,
    filter_mode: FilterMode,
    read_mode: ReadMode,
    normalized_coords: bool,
}

impl TextureDescriptor {
    /// Create a descriptor with one address mode per resource dimension
    pub fn new(address_modes: &[AddressMode], filter_mode: FilterMode, read_mode: ReadMode) -> Self {
        Self {
            address_modes: address_modes.to_vec(),
            filter_mode,
            read_mode,
            normalized_coords: false,
        }
    }

    /// Switch between raw and [0, 1) texture coordinates
    pub fn with_normalized_coords(mut self, normalized: bool) -> Self {
        self.normalized_coords = normalized;
        self
    }

    /// Configured address modes
    pub fn address_modes(&self) -> &[AddressMode] {
        &self.address_modes
    }

    /// Configured filter mode
    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    /// Configured read mode
    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    /// Whether coordinates are normalized to [0, 1)
    pub fn normalized_coords(&self) -> bool {
        self.normalized_coords
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self::new(&[AddressMode::Clamp], FilterMode::Point, ReadMode::ElementType)
    }
}

/// Opaque sampling handle over a bound resource
///
/// Holds a non-owning reference to its backing memory; the borrow checker
/// keeps the backing alive for the handle's lifetime. The driver-side
/// reference is taken at creation and released exactly once on drop.
#[derive(Debug)]
pub struct TextureObject<'a> {
    id: Uuid,
    /// Fake driver handle
    handle: u64,
    backing: ResourceBacking<'a>,
    desc: TextureDescriptor,
    channel: ChannelFormatDescriptor,
    extent: [usize; 3],
    rank: u32,
    device: Device,
}

impl<'a> TextureObject<'a> {
    /// Bind a resource and a texture descriptor into a sampling handle
    pub fn create(
        device: &Device,
        resource: &ResourceDescriptor<'a>,
        desc: &TextureDescriptor,
    ) -> TexResult<Self> {
        let rank = resource.rank();
        if desc.address_modes.len() as u32 != rank {
            return Err(TexError::InvalidResource {
                message: format!(
                    "{} address modes configured for a rank-{rank} resource",
                    desc.address_modes.len()
                ),
            });
        }

        let channel = resource.channel_desc();
        if desc.filter_mode == FilterMode::Linear
            && channel.kind != ChannelFormatKind::Float
            && desc.read_mode == ReadMode::ElementType
        {
            return Err(TexError::Binding {
                message: "linear filtering requires floating-point reads".to_string(),
            });
        }

        if resource.kind() == ResourceKind::Linear {
            if desc.filter_mode == FilterMode::Linear {
                return Err(TexError::Binding {
                    message: "linear resources support point filtering only".to_string(),
                });
            }
            if desc.normalized_coords {
                return Err(TexError::Binding {
                    message: "linear resources are fetched with raw coordinates".to_string(),
                });
            }
        }

        let folds = desc
            .address_modes
            .iter()
            .any(|m| matches!(m, AddressMode::Wrap | AddressMode::Mirror));
        if folds && !desc.normalized_coords {
            return Err(TexError::Binding {
                message: "wrap and mirror addressing require normalized coordinates".to_string(),
            });
        }

        let (width, height, depth) = resource.extent();
        let texture = Self {
            id: Uuid::new_v4(),
            handle: rand::random::<u64>(),
            backing: resource.backing.clone(),
            desc: desc.clone(),
            channel,
            extent: [width, height, depth],
            rank,
            device: device.clone(),
        };
        device.texture_object_created();
        tracing::debug!(id = %texture.id, rank, "created texture object");
        Ok(texture)
    }

    /// Unique texture object ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Opaque driver handle, the value kernels receive
    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Dimensionality of the bound resource
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Descriptor the handle was created with
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    /// Sample a 1D texture
    pub fn tex1d(&self, x: f32) -> [f32; 4] {
        self.sample([x, 0.0, 0.0])
    }

    /// Sample a 2D texture
    pub fn tex2d(&self, x: f32, y: f32) -> [f32; 4] {
        self.sample([x, y, 0.0])
    }

    /// Sample a 3D texture
    pub fn tex3d(&self, x: f32, y: f32, z: f32) -> [f32; 4] {
        self.sample([x, y, z])
    }

    /// Filtered, addressed fetch at the given coordinates
    ///
    /// Coordinates beyond the resource's rank are ignored; missing ones
    /// default to zero.
    fn sample(&self, mut coords: [f32; 3]) -> [f32; 4] {
        let dims = self.rank as usize;
        if self.desc.normalized_coords {
            for (coord, &size) in coords.iter_mut().zip(&self.extent).take(dims) {
                *coord *= size as f32;
            }
        }

        match self.desc.filter_mode {
            FilterMode::Point => {
                let mut idx = [0usize; 3];
                for dim in 0..dims {
                    match self.address(coords[dim].floor() as i64, dim) {
                        Some(i) => idx[dim] = i,
                        None => return [0.0; 4],
                    }
                }
                self.fetch(idx)
            }
            FilterMode::Linear => {
                // Sample positions sit at texel centers: shift by -0.5 and
                // blend the two neighbors per dimension by the fraction.
                let mut lo = [0i64; 3];
                let mut frac = [0.0f32; 3];
                for dim in 0..dims {
                    let shifted = coords[dim] - 0.5;
                    let floor = shifted.floor();
                    lo[dim] = floor as i64;
                    frac[dim] = shifted - floor;
                }

                let mut acc = [0.0f32; 4];
                for corner in 0..(1usize << dims) {
                    let mut weight = 1.0f32;
                    let mut idx = [0usize; 3];
                    let mut outside = false;
                    for dim in 0..dims {
                        let hi = (corner >> dim) & 1 == 1;
                        weight *= if hi { frac[dim] } else { 1.0 - frac[dim] };
                        match self.address(lo[dim] + hi as i64, dim) {
                            Some(i) => idx[dim] = i,
                            None => outside = true,
                        }
                    }
                    if outside || weight == 0.0 {
                        continue;
                    }
                    let texel = self.fetch(idx);
                    for (out, value) in acc.iter_mut().zip(&texel) {
                        *out += weight * value;
                    }
                }
                acc
            }
        }
    }

    /// Resolve one integer texel coordinate through the dimension's
    /// address mode; `None` means the border (zero) region
    fn address(&self, index: i64, dim: usize) -> Option<usize> {
        let size = self.extent[dim] as i64;
        match self.desc.address_modes[dim] {
            AddressMode::Clamp => Some(index.clamp(0, size - 1) as usize),
            AddressMode::Border => {
                if (0..size).contains(&index) {
                    Some(index as usize)
                } else {
                    None
                }
            }
            AddressMode::Wrap => Some(index.rem_euclid(size) as usize),
            AddressMode::Mirror => {
                let folded = index.rem_euclid(2 * size);
                if folded < size {
                    Some(folded as usize)
                } else {
                    Some((2 * size - 1 - folded) as usize)
                }
            }
        }
    }

    fn fetch(&self, idx: [usize; 3]) -> [f32; 4] {
        let width = self.extent[0];
        let height = self.extent[1].max(1);
        let linear = (idx[2] * height + idx[1]) * width + idx[0];
        let elem = self.channel.element_size();
        let offset = linear * elem;

        match &self.backing {
            ResourceBacking::Array(array) => {
                let data = array.inner.data.read();
                self.decode(&data[offset..offset + elem])
            }
            ResourceBacking::Linear { data, .. } => {
                let data = data.read();
                self.decode(&data[offset..offset + elem])
            }
        }
    }

    /// Decode one stored element into up to four f32 channel values
    fn decode(&self, bytes: &[u8]) -> [f32; 4] {
        let widths = [self.channel.x, self.channel.y, self.channel.z, self.channel.w];
        let mut out = [0.0f32; 4];
        let mut cursor = 0usize;
        for (channel, &bits) in widths.iter().enumerate() {
            if bits == 0 {
                break;
            }
            let size = (bits / 8) as usize;
            out[channel] = self.decode_scalar(&bytes[cursor..cursor + size], bits);
            cursor += size;
        }
        out
    }

    fn decode_scalar(&self, chunk: &[u8], bits: u32) -> f32 {
        let (raw, max) = match (self.channel.kind, bits) {
            (ChannelFormatKind::Float, _) => {
                return f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
            (ChannelFormatKind::Signed, 8) => (chunk[0] as i8 as f64, i8::MAX as f64),
            (ChannelFormatKind::Signed, 16) => (
                i16::from_ne_bytes([chunk[0], chunk[1]]) as f64,
                i16::MAX as f64,
            ),
            (ChannelFormatKind::Signed, 32) => (
                i32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
                i32::MAX as f64,
            ),
            (ChannelFormatKind::Unsigned, 8) => (chunk[0] as f64, u8::MAX as f64),
            (ChannelFormatKind::Unsigned, 16) => (
                u16::from_ne_bytes([chunk[0], chunk[1]]) as f64,
                u16::MAX as f64,
            ),
            (ChannelFormatKind::Unsigned, 32) => (
                u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
                u32::MAX as f64,
            ),
            // Kind None never binds; remaining widths are rejected at
            // descriptor construction.
            _ => (0.0, 1.0),
        };

        match self.desc.read_mode {
            ReadMode::ElementType => raw as f32,
            ReadMode::NormalizedFloat => ((raw / max) as f32).max(-1.0),
        }
    }
}

impl Drop for TextureObject<'_> {
    fn drop(&mut self) {
        self.device.texture_object_released();
        tracing::trace!(id = %self.id, "released texture object");
    }
}
