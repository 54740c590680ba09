//! Native seams of the bridge.
//!
//! The bridge and pipeline never call a graphics API directly. They go through
//! these traits, implemented for Direct3D 9Ex / Direct3D 11 / Direct2D in
//! [`crate::graphics`] on Windows.
//!
//! Handle types follow the COM convention: `clone` retains, `drop` releases.

use crate::error::BridgeResult;
use crate::format::{
    LegacyDeviceParams, RenderTargetProperties, SharedHandle, SharedTextureDesc, SurfaceHandle,
    TextureDesc, Viewport,
};

/// The legacy device API, used only to alias textures into a host surface.
pub trait LegacyApi: Send + Sync + 'static {
    type Context: Clone + Send;
    type Device: Clone + Send;
    type Texture: Clone;
    type Surface: Clone;

    fn create_context(&self) -> BridgeResult<Self::Context>;

    fn create_device(
        &self,
        context: &Self::Context,
        params: &LegacyDeviceParams,
    ) -> BridgeResult<Self::Device>;

    /// Create a render-target texture in the default pool that aliases the
    /// memory behind `handle`.
    fn open_shared_texture(
        &self,
        device: &Self::Device,
        desc: &SharedTextureDesc,
        handle: SharedHandle,
    ) -> BridgeResult<Self::Texture>;

    /// Top mip level of a texture.
    fn top_surface(&self, texture: &Self::Texture) -> BridgeResult<Self::Surface>;

    fn surface_handle(&self, surface: &Self::Surface) -> Option<SurfaceHandle>;
}

/// A modern-device texture the bridge can alias.
pub trait ShareableTexture {
    fn desc(&self) -> TextureDesc;

    fn shared_handle(&self) -> BridgeResult<SharedHandle>;
}

/// The modern device API plus its vector-graphics layer.
pub trait ModernApi {
    type Device: Clone;
    type Context: Clone;
    type Texture: Clone + ShareableTexture;
    type Factory: Clone;
    type RenderTarget: Clone + 'static;

    /// Hardware device with BGRA support, and its immediate context.
    fn create_device(&self) -> BridgeResult<(Self::Device, Self::Context)>;

    fn create_factory(&self) -> BridgeResult<Self::Factory>;

    fn create_texture(
        &self,
        device: &Self::Device,
        desc: &TextureDesc,
    ) -> BridgeResult<Self::Texture>;

    /// Wrap a texture's surface in a vector-graphics render target.
    fn create_surface_render_target(
        &self,
        factory: &Self::Factory,
        texture: &Self::Texture,
        props: &RenderTargetProperties,
    ) -> BridgeResult<Self::RenderTarget>;

    fn begin_draw(&self, target: &Self::RenderTarget);

    fn end_draw(&self, target: &Self::RenderTarget) -> BridgeResult<()>;

    fn flush(&self, context: &Self::Context);

    fn set_viewport(&self, context: &Self::Context, viewport: &Viewport);
}
