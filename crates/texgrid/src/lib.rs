//! GPU texture and array bindings over a simulated device runtime
//!
//! This crate provides the binding surface of a GPU texture/array API:
//! - Channel format descriptors (per-channel bit widths and numeric kind)
//! - Dimensioned device arrays with host/device bulk copies
//! - Linear device memory for kernel outputs and linear resources
//! - Resource and texture descriptors composed into sampling handles
//! - Streams for submission-ordered asynchronous copies
//! - A software kernel-launch surface for texture-sampling round-trips
//!
//! The GPU driver itself stays out of scope: device state is emulated in
//! process, so copies and kernel-side sampling are fully testable without
//! hardware. Device and stream handles are explicit context objects passed
//! by the caller rather than process-wide state.

#![warn(missing_docs)]

pub mod array;
pub mod channel;
pub mod device;
pub mod error;
pub mod kernel;
pub mod memory;
pub mod resource;
pub mod stream;
pub mod texture;

pub use array::{ArrayFlags, DeviceArray};
pub use channel::{ChannelFormatDescriptor, ChannelFormatKind};
pub use device::{device_count, Device, DeviceProperties};
pub use error::{TexError, TexResult};
pub use kernel::{launch, LaunchConfig, LaunchConfigBuilder, ThreadIndex};
pub use memory::DeviceMemory;
pub use resource::{ResourceDescriptor, ResourceKind};
pub use stream::{Stream, StreamFlags};
pub use texture::{AddressMode, FilterMode, ReadMode, TextureDescriptor, TextureObject};

/// Re-export common types
pub mod prelude {
    pub use crate::{
        device_count, launch, AddressMode, ArrayFlags, ChannelFormatDescriptor,
        ChannelFormatKind, Device, DeviceArray, DeviceMemory, DeviceProperties, FilterMode,
        LaunchConfig, LaunchConfigBuilder, ReadMode, ResourceDescriptor, ResourceKind, Stream,
        StreamFlags, TexError, TexResult, TextureDescriptor, TextureObject, ThreadIndex,
    };
}

#[cfg(test)]
mod tests;
