//! Windows graphics backends.
//!
//! - `d3d9`: Direct3D 9Ex device that reopens shared textures for the host
//! - `d3d11`: Direct3D 11 device, shareable textures and Direct2D targets
//!
//! All pipelines in a process share one 9Ex device through
//! [`shared_legacy_host`].

mod d3d11;
mod d3d9;

use lazy_static::lazy_static;
use std::sync::Arc;

pub use d3d11::{D3D11Api, D3D11Texture};
pub use d3d9::{D3D9Api, D3D9Context, D3D9Device};

use crate::host::InteropHost;
use crate::legacy_device::LegacyDeviceHost;
use crate::pipeline::CompositePipeline;

lazy_static! {
    /// Process-wide Direct3D 9Ex device host.
    ///
    /// The device is created by the first client and torn down when the last
    /// one goes away.
    static ref SHARED_LEGACY_HOST: Arc<LegacyDeviceHost<D3D9Api>> = LegacyDeviceHost::new(D3D9Api);
}

pub fn shared_legacy_host() -> Arc<LegacyDeviceHost<D3D9Api>> {
    Arc::clone(&SHARED_LEGACY_HOST)
}

/// Direct2D pipeline presented through Direct3D 9Ex.
pub type WindowsPipeline = CompositePipeline<D3D11Api, D3D9Api>;

/// Host driver over the Windows backends.
pub type WindowsInteropHost<R, F> = InteropHost<D3D11Api, D3D9Api, R, F>;
