//! Single-surface bridge between a modern texture and the legacy device.
//!
//! The bridge holds at most one legacy texture aliasing a caller-supplied
//! modern texture through its shared handle, and tells a consumer callback
//! which legacy surface to present. The consumer is told `None` before the
//! old alias is released, so it never holds a surface the bridge has dropped.

use std::sync::Arc;

use crate::backend::{LegacyApi, ShareableTexture};
use crate::com_ptr::ComPtr;
use crate::error::{BridgeError, BridgeResult, OptionExt};
use crate::format::{SharedTextureDesc, SurfaceHandle};
use crate::legacy_device::{LegacyDeviceHost, LegacyDeviceLease};

/// Receives the surface to present, or `None` when there is none.
pub type SurfaceSetter = Box<dyn FnMut(Option<SurfaceHandle>)>;

pub struct SurfaceBridge<L: LegacyApi> {
    host: Arc<LegacyDeviceHost<L>>,
    // Taken on the first texture that passes validation, held until drop.
    lease: Option<LegacyDeviceLease<L>>,
    texture: ComPtr<L::Texture>,
    surface_setter: SurfaceSetter,
}

impl<L: LegacyApi> SurfaceBridge<L> {
    pub fn new(
        host: Arc<LegacyDeviceHost<L>>,
        surface_setter: impl FnMut(Option<SurfaceHandle>) + 'static,
    ) -> Self {
        Self {
            host,
            lease: None,
            texture: ComPtr::new(),
            surface_setter: Box::new(surface_setter),
        }
    }

    /// Alias `texture` on the legacy device and publish its top surface.
    ///
    /// Any current surface is withdrawn first, so an error leaves the bridge
    /// without a surface rather than with a stale one.
    pub fn set_surface<T: ShareableTexture>(&mut self, texture: Option<&T>) -> BridgeResult<()> {
        self.clear_surface();

        let Some(texture) = texture else {
            return Ok(());
        };

        let desc = texture.desc();
        let format = desc
            .format
            .to_legacy()
            .ok_or(BridgeError::UnsupportedFormat(desc.format))?;
        if !desc.shared {
            return Err(BridgeError::NotShareable);
        }
        let shared_handle = texture.shared_handle()?;
        if shared_handle.is_null() {
            return Err(BridgeError::InvalidSharedHandle);
        }

        let lease = match self.lease.take() {
            Some(lease) => lease,
            None => self.host.acquire()?,
        };
        let lease = self.lease.insert(lease);

        let api = lease.api();
        let legacy_texture = api.open_shared_texture(
            lease.device(),
            &SharedTextureDesc {
                width: desc.width,
                height: desc.height,
                format,
            },
            shared_handle,
        )?;
        let surface = api.top_surface(&legacy_texture)?;
        let surface_handle = api
            .surface_handle(&surface)
            .context("legacy surface has no native pointer")?;

        log::debug!(
            "Aliased {}x{} {:?} texture on the legacy device",
            desc.width,
            desc.height,
            format
        );
        self.texture.replace(legacy_texture);
        (self.surface_setter)(Some(surface_handle));
        Ok(())
    }

    /// True while a legacy alias is held and published.
    pub fn has_surface(&self) -> bool {
        self.texture.is_valid()
    }

    pub fn legacy_texture(&self) -> Option<&L::Texture> {
        self.texture.get()
    }

    fn clear_surface(&mut self) {
        if self.texture.is_valid() {
            (self.surface_setter)(None);
            self.texture.release();
        }
    }
}

impl<L: LegacyApi> Drop for SurfaceBridge<L> {
    fn drop(&mut self) {
        self.clear_surface();
        drop(self.lease.take());
    }
}
