//! Software kernel launches
//!
//! The device runtime's kernel engine stays opaque; what this module
//! provides is the launch surface: a grid/block configuration and a
//! deterministic walk that runs the kernel body once per thread. Kernel
//! bodies are host closures receiving their [`ThreadIndex`]; texture
//! handles and output buffers reach them by capture.

use crate::device::Device;
use crate::error::{TexError, TexResult};
use crate::stream::{Fence, Stream};

/// Grid/block configuration for one launch
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Grid dimensions in blocks
    pub grid_dim: (u32, u32, u32),
    /// Block dimensions in threads
    pub block_dim: (u32, u32, u32),
    /// Dynamic shared memory per block in bytes
    pub shared_memory_bytes: u32,
    /// Stream the launch completes on; `None` launches synchronously
    pub stream: Option<Stream>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            grid_dim: (1, 1, 1),
            block_dim: (1, 1, 1),
            shared_memory_bytes: 0,
            stream: None,
        }
    }
}

/// Builder for [`LaunchConfig`]
#[derive(Debug, Default)]
pub struct LaunchConfigBuilder {
    config: LaunchConfig,
}

impl LaunchConfigBuilder {
    /// Start from the default single-thread configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grid dimensions in blocks
    pub fn grid_dim(mut self, grid_dim: (u32, u32, u32)) -> Self {
        self.config.grid_dim = grid_dim;
        self
    }

    /// Set the block dimensions in threads
    pub fn block_dim(mut self, block_dim: (u32, u32, u32)) -> Self {
        self.config.block_dim = block_dim;
        self
    }

    /// Set the dynamic shared memory size
    pub fn shared_memory_bytes(mut self, bytes: u32) -> Self {
        self.config.shared_memory_bytes = bytes;
        self
    }

    /// Complete the launch on the given stream
    pub fn stream(mut self, stream: Stream) -> Self {
        self.config.stream = Some(stream);
        self
    }

    /// Finish the configuration
    pub fn build(self) -> LaunchConfig {
        self.config
    }
}

/// Coordinates of one thread within a launch
#[derive(Debug, Clone, Copy)]
pub struct ThreadIndex {
    /// Block coordinates within the grid
    pub block_idx: (u32, u32, u32),
    /// Thread coordinates within the block
    pub thread_idx: (u32, u32, u32),
    /// Block dimensions of the launch
    pub block_dim: (u32, u32, u32),
    /// Grid dimensions of the launch
    pub grid_dim: (u32, u32, u32),
}

impl ThreadIndex {
    /// Global x coordinate: `block_idx.x * block_dim.x + thread_idx.x`
    pub fn global_x(&self) -> u32 {
        self.block_idx.0 * self.block_dim.0 + self.thread_idx.0
    }

    /// Global y coordinate
    pub fn global_y(&self) -> u32 {
        self.block_idx.1 * self.block_dim.1 + self.thread_idx.1
    }

    /// Global z coordinate
    pub fn global_z(&self) -> u32 {
        self.block_idx.2 * self.block_dim.2 + self.thread_idx.2
    }
}

/// Run a kernel body once per thread of the configured grid
///
/// Execution is deterministic: blocks advance in z/y/x order, threads
/// within a block likewise. With a stream in the configuration the launch
/// also enqueues a completion fence on it.
pub fn launch<F>(device: &Device, config: &LaunchConfig, body: F) -> TexResult<()>
where
    F: Fn(ThreadIndex),
{
    let (gx, gy, gz) = config.grid_dim;
    let (bx, by, bz) = config.block_dim;

    if gx == 0 || gy == 0 || gz == 0 {
        return Err(TexError::InvalidLaunch {
            message: format!("grid dimensions must be nonzero, got ({gx}, {gy}, {gz})"),
        });
    }
    if bx == 0 || by == 0 || bz == 0 {
        return Err(TexError::InvalidLaunch {
            message: format!("block dimensions must be nonzero, got ({bx}, {by}, {bz})"),
        });
    }

    let limits = device.properties();
    let threads_per_block = bx as u64 * by as u64 * bz as u64;
    if threads_per_block > limits.max_threads_per_block as u64 {
        return Err(TexError::InvalidLaunch {
            message: format!(
                "block volume {threads_per_block} exceeds {} threads per block",
                limits.max_threads_per_block
            ),
        });
    }
    let block_ok = bx <= limits.max_block_dims[0]
        && by <= limits.max_block_dims[1]
        && bz <= limits.max_block_dims[2];
    let grid_ok = gx <= limits.max_grid_dims[0]
        && gy <= limits.max_grid_dims[1]
        && gz <= limits.max_grid_dims[2];
    if !block_ok || !grid_ok {
        return Err(TexError::InvalidLaunch {
            message: format!(
                "launch ({gx}, {gy}, {gz}) x ({bx}, {by}, {bz}) exceeds device limits"
            ),
        });
    }

    for block_z in 0..gz {
        for block_y in 0..gy {
            for block_x in 0..gx {
                for thread_z in 0..bz {
                    for thread_y in 0..by {
                        for thread_x in 0..bx {
                            body(ThreadIndex {
                                block_idx: (block_x, block_y, block_z),
                                thread_idx: (thread_x, thread_y, thread_z),
                                block_dim: config.block_dim,
                                grid_dim: config.grid_dim,
                            });
                        }
                    }
                }
            }
        }
    }

    if let Some(stream) = &config.stream {
        stream.submit(Fence::kernel());
    }
    tracing::debug!(
        grid = ?config.grid_dim,
        block = ?config.block_dim,
        asynchronous = config.stream.is_some(),
        "kernel launch"
    );
    Ok(())
}
