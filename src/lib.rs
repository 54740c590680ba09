//! Direct2D / Direct3D 11 rendering presented through a Direct3D 9Ex surface.
//!
//! Hosts that can only display D3D9 surfaces get content drawn with Direct2D
//! on a D3D11 device. Each frame is rendered into an offscreen texture created
//! with the shared-resource flag; the same memory is reopened on a process-wide
//! D3D9Ex device and its top surface is handed to the host.
//!
//! - [`legacy_device`]: reference-counted shared legacy device
//! - [`bridge`]: aliases one modern texture onto the legacy device
//! - [`pipeline`]: device, factory and offscreen target lifecycle plus frames
//! - [`host`]: drives a pipeline from a host surface's lifecycle events
//! - [`resources`]: drawing resources rebuilt for each new target
//!
//! Native calls go through the traits in [`backend`]; the Windows
//! implementations live in `graphics`.

pub mod backend;
pub mod bridge;
pub mod com_ptr;
pub mod config;
pub mod error;
pub mod format;
pub mod host;
pub mod legacy_device;
pub mod pipeline;
pub mod resources;

#[cfg(windows)]
pub mod graphics;

#[cfg(test)]
mod mock;

pub use backend::{LegacyApi, ModernApi, ShareableTexture};
pub use bridge::SurfaceBridge;
pub use config::PipelineConfig;
pub use error::{BridgeError, BridgeResult};
pub use format::{SharedHandle, SurfaceHandle, TextureDesc, TextureFormat};
pub use host::{FrontBuffer, InteropHost};
pub use legacy_device::{LegacyDeviceHost, LegacyDeviceLease};
pub use pipeline::{CompositePipeline, CompositePipelineBuilder};
pub use resources::ResourceCache;
