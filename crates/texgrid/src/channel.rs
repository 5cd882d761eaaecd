//! Channel format descriptors for texture elements
//!
//! A channel format describes the per-channel bit widths and numeric kind
//! of one texture element. Arrays and linear resources derive their element
//! size from it, and texture objects use it to decode sampled texels.

use crate::error::{TexError, TexResult};

/// Numeric kind of a texture channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelFormatKind {
    /// IEEE-754 floating point
    Float,
    /// Signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
    /// No channels (not allocatable)
    None,
}

/// Per-channel bit widths plus the numeric kind of a texture element
///
/// Channels fill left to right without gaps, every used channel carries the
/// same width, and only 1-, 2- and 4-channel layouts exist on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelFormatDescriptor {
    /// First channel width in bits
    pub x: u32,
    /// Second channel width in bits
    pub y: u32,
    /// Third channel width in bits
    pub z: u32,
    /// Fourth channel width in bits
    pub w: u32,
    /// Numeric kind shared by all channels
    pub kind: ChannelFormatKind,
}

/// Bit widths a channel may carry
const SUPPORTED_WIDTHS: [u32; 3] = [8, 16, 32];

impl ChannelFormatDescriptor {
    /// Create a descriptor, validating the width/kind combination
    pub fn new(x: u32, y: u32, z: u32, w: u32, kind: ChannelFormatKind) -> TexResult<Self> {
        let widths = [x, y, z, w];

        if kind == ChannelFormatKind::None {
            if widths.iter().any(|&b| b != 0) {
                return Err(TexError::InvalidChannelFormat {
                    message: "kind None cannot carry channel widths".to_string(),
                });
            }
            return Ok(Self { x, y, z, w, kind });
        }

        // Channels fill left to right with no gaps.
        let count = widths.iter().take_while(|&&b| b != 0).count();
        if widths.iter().skip(count).any(|&b| b != 0) {
            return Err(TexError::InvalidChannelFormat {
                message: format!("channel widths must be contiguous, got {widths:?}"),
            });
        }

        if !matches!(count, 1 | 2 | 4) {
            return Err(TexError::InvalidChannelFormat {
                message: format!("{count}-channel layouts are not supported"),
            });
        }

        let width = widths[0];
        if widths[..count].iter().any(|&b| b != width) {
            return Err(TexError::InvalidChannelFormat {
                message: format!("all channels must share one width, got {widths:?}"),
            });
        }

        if !SUPPORTED_WIDTHS.contains(&width) {
            return Err(TexError::InvalidChannelFormat {
                message: format!("unsupported channel width: {width} bits"),
            });
        }

        if kind == ChannelFormatKind::Float && width != 32 {
            return Err(TexError::InvalidChannelFormat {
                message: format!("float channels must be 32 bits wide, got {width}"),
            });
        }

        Ok(Self { x, y, z, w, kind })
    }

    /// Single 32-bit float channel
    pub fn float1() -> Self {
        Self {
            x: 32,
            y: 0,
            z: 0,
            w: 0,
            kind: ChannelFormatKind::Float,
        }
    }

    /// Two 32-bit float channels
    pub fn float2() -> Self {
        Self {
            x: 32,
            y: 32,
            z: 0,
            w: 0,
            kind: ChannelFormatKind::Float,
        }
    }

    /// Four 32-bit float channels
    pub fn float4() -> Self {
        Self {
            x: 32,
            y: 32,
            z: 32,
            w: 32,
            kind: ChannelFormatKind::Float,
        }
    }

    /// Signed integer channels of the given width
    pub fn signed(bits: u32, channels: u32) -> TexResult<Self> {
        Self::spread(bits, channels, ChannelFormatKind::Signed)
    }

    /// Unsigned integer channels of the given width
    pub fn unsigned(bits: u32, channels: u32) -> TexResult<Self> {
        Self::spread(bits, channels, ChannelFormatKind::Unsigned)
    }

    fn spread(bits: u32, channels: u32, kind: ChannelFormatKind) -> TexResult<Self> {
        let widths = match channels {
            1 => [bits, 0, 0, 0],
            2 => [bits, bits, 0, 0],
            4 => [bits, bits, bits, bits],
            _ => {
                return Err(TexError::InvalidChannelFormat {
                    message: format!("{channels}-channel layouts are not supported"),
                })
            }
        };
        Self::new(widths[0], widths[1], widths[2], widths[3], kind)
    }

    /// Number of channels carried by one element
    pub fn channel_count(&self) -> u32 {
        [self.x, self.y, self.z, self.w]
            .iter()
            .filter(|&&b| b != 0)
            .count() as u32
    }

    /// Size of one element in bytes
    pub fn element_size(&self) -> usize {
        ((self.x + self.y + self.z + self.w) / 8) as usize
    }
}
