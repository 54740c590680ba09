//! Composite render pipeline.
//!
//! Owns the modern device, its vector-graphics factory and one offscreen
//! shareable render target, and pushes every new target through a
//! [`SurfaceBridge`] to the legacy-surface consumer.
//!
//! ```text
//! recreate_targets(w, h, sx, sy)
//!     |
//!     +-- withdraw old legacy surface, drop old target + texture
//!     +-- create shared texture (logical size x DPI scale)
//!     +-- wrap it in a vector-graphics render target
//!     +-- resources updater(target)
//!     +-- bridge.set_surface(texture)  --> surface setter(Some(handle))
//!     +-- viewport = logical size
//!
//! render_frame()
//!     +-- begin_draw / renderer(target) / end_draw / flush
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::backend::{LegacyApi, ModernApi};
use crate::bridge::{SurfaceBridge, SurfaceSetter};
use crate::com_ptr::ComPtr;
use crate::config::PipelineConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::format::{RenderTargetProperties, SurfaceHandle, TextureDesc, Viewport};
use crate::legacy_device::LegacyDeviceHost;

/// Draws one frame into the current render target.
pub type Renderer<T> = Box<dyn FnMut(&T) -> BridgeResult<()>>;

/// Rebuilds size- or DPI-dependent drawing resources for a new render target.
pub type ResourcesUpdater<T> = Box<dyn FnMut(&T) -> BridgeResult<()>>;

/// Collects the callbacks and settings a [`CompositePipeline`] needs.
pub struct CompositePipelineBuilder<M: ModernApi, L: LegacyApi> {
    renderer: Option<Renderer<M::RenderTarget>>,
    resources_updater: Option<ResourcesUpdater<M::RenderTarget>>,
    surface_setter: Option<SurfaceSetter>,
    config: PipelineConfig,
    _legacy: PhantomData<L>,
}

impl<M: ModernApi, L: LegacyApi> CompositePipelineBuilder<M, L> {
    pub fn new() -> Self {
        Self {
            renderer: None,
            resources_updater: None,
            surface_setter: None,
            config: PipelineConfig::default(),
            _legacy: PhantomData,
        }
    }

    pub fn renderer(
        mut self,
        renderer: impl FnMut(&M::RenderTarget) -> BridgeResult<()> + 'static,
    ) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn resources_updater(
        mut self,
        updater: impl FnMut(&M::RenderTarget) -> BridgeResult<()> + 'static,
    ) -> Self {
        self.resources_updater = Some(Box::new(updater));
        self
    }

    pub fn surface_setter(mut self, setter: impl FnMut(Option<SurfaceHandle>) + 'static) -> Self {
        self.surface_setter = Some(Box::new(setter));
        self
    }

    pub fn config(mut self, mut config: PipelineConfig) -> Self {
        config.validate();
        self.config = config;
        self
    }

    /// Validate the callbacks and create the device and factory.
    pub fn build(
        self,
        api: M,
        legacy_host: Arc<LegacyDeviceHost<L>>,
    ) -> BridgeResult<CompositePipeline<M, L>> {
        let renderer = self
            .renderer
            .ok_or(BridgeError::MissingCallback("renderer"))?;
        let resources_updater = self
            .resources_updater
            .ok_or(BridgeError::MissingCallback("resources_updater"))?;
        let surface_setter = self
            .surface_setter
            .ok_or(BridgeError::MissingCallback("surface_setter"))?;

        let (device, context) = api.create_device()?;
        let factory = api.create_factory()?;
        let bridge = SurfaceBridge::new(legacy_host, surface_setter);

        Ok(CompositePipeline {
            bridge,
            texture: ComPtr::new(),
            render_target: ComPtr::new(),
            api,
            device,
            context,
            factory,
            renderer,
            resources_updater,
            config: self.config,
            logical_size: None,
            pixel_size: None,
        })
    }
}

impl<M: ModernApi, L: LegacyApi> Default for CompositePipelineBuilder<M, L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Modern-device renderer whose output is presented through the legacy device.
///
/// The offscreen texture and its render target are either both present or
/// both absent, and the published legacy surface always aliases the current
/// texture.
pub struct CompositePipeline<M: ModernApi, L: LegacyApi> {
    bridge: SurfaceBridge<L>,
    texture: ComPtr<M::Texture>,
    render_target: ComPtr<M::RenderTarget>,
    api: M,
    device: M::Device,
    context: M::Context,
    factory: M::Factory,
    renderer: Renderer<M::RenderTarget>,
    resources_updater: ResourcesUpdater<M::RenderTarget>,
    config: PipelineConfig,
    logical_size: Option<(f64, f64)>,
    pixel_size: Option<(u32, u32)>,
}

impl<M: ModernApi, L: LegacyApi> CompositePipeline<M, L> {
    pub fn builder() -> CompositePipelineBuilder<M, L> {
        CompositePipelineBuilder::new()
    }

    /// Rebuild the offscreen target for a new size or DPI and publish it.
    ///
    /// The old surface is withdrawn first; if anything fails afterwards the
    /// pipeline is left with no published surface.
    pub fn recreate_targets(
        &mut self,
        width: f64,
        height: f64,
        dpi_scale_x: f64,
        dpi_scale_y: f64,
    ) -> BridgeResult<()> {
        self.bridge.set_surface::<M::Texture>(None)?;
        self.render_target.release();
        self.texture.release();
        self.logical_size = None;
        self.pixel_size = None;

        check_scale("dpi_scale_x", dpi_scale_x)?;
        check_scale("dpi_scale_y", dpi_scale_y)?;

        // f64::max also maps NaN sizes to the minimum
        let logical_width = width.max(self.config.min_logical_size);
        let logical_height = height.max(self.config.min_logical_size);
        let pixel_width = pixel_extent("width", logical_width * dpi_scale_x)?;
        let pixel_height = pixel_extent("height", logical_height * dpi_scale_y)?;

        let desc =
            TextureDesc::shared_render_target(pixel_width, pixel_height, self.config.render_format);
        let texture = self.api.create_texture(&self.device, &desc)?;
        let props =
            RenderTargetProperties::from_scale(dpi_scale_x, dpi_scale_y, self.config.reference_dpi);
        let render_target = self
            .api
            .create_surface_render_target(&self.factory, &texture, &props)?;

        self.texture.replace(texture);
        self.render_target.replace(render_target);
        self.pixel_size = Some((pixel_width, pixel_height));
        self.logical_size = Some((logical_width, logical_height));
        log::debug!(
            "Recreated render target {}x{} px ({}x{} logical)",
            pixel_width,
            pixel_height,
            logical_width,
            logical_height
        );

        if let Some(target) = self.render_target.get() {
            (self.resources_updater)(target)?;
        }
        self.bridge.set_surface(self.texture.get())?;

        self.api.set_viewport(
            &self.context,
            &Viewport::sized(logical_width as f32, logical_height as f32),
        );
        Ok(())
    }

    /// Draw one frame and flush it to the GPU.
    ///
    /// Does nothing until a render target exists.
    pub fn render_frame(&mut self) -> BridgeResult<()> {
        let Some(target) = self.render_target.get() else {
            log::trace!("No render target yet, skipping frame");
            return Ok(());
        };

        self.api.begin_draw(target);
        let rendered = (self.renderer)(target);
        // The batch is closed even when the renderer failed
        let ended = self.api.end_draw(target);
        rendered?;
        ended?;

        self.api.flush(&self.context);
        Ok(())
    }

    /// Whether a legacy surface is currently published and safe to present.
    pub fn has_render_target(&self) -> bool {
        self.bridge.has_surface()
    }

    /// Shared vector-graphics factory for creating drawing resources.
    pub fn factory(&self) -> &M::Factory {
        &self.factory
    }

    pub fn render_target(&self) -> Option<&M::RenderTarget> {
        self.render_target.get()
    }

    pub fn device(&self) -> &M::Device {
        &self.device
    }

    pub fn context(&self) -> &M::Context {
        &self.context
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Size of the offscreen texture in physical pixels.
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        self.pixel_size
    }

    /// Clamped logical size the current target was created for.
    pub fn logical_size(&self) -> Option<(f64, f64)> {
        self.logical_size
    }
}

impl<M: ModernApi, L: LegacyApi> Drop for CompositePipeline<M, L> {
    fn drop(&mut self) {
        // Withdraw the legacy alias before the texture it aliases goes away.
        let _ = self.bridge.set_surface::<M::Texture>(None);
        self.render_target.release();
        self.texture.release();
    }
}

fn check_scale(name: &str, scale: f64) -> BridgeResult<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(BridgeError::InvalidArgument(format!(
            "{} must be a positive finite number, got {}",
            name, scale
        )))
    }
}

/// Physical size of one texture edge, at least 1 pixel.
fn pixel_extent(name: &str, extent: f64) -> BridgeResult<u32> {
    if !extent.is_finite() || extent > u32::MAX as f64 {
        return Err(BridgeError::InvalidArgument(format!(
            "pixel {} {} does not fit a texture",
            name, extent
        )));
    }
    Ok((extent as u32).max(1))
}
