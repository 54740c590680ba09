//! Presentation driver for a host surface.
//!
//! Ties a [`CompositePipeline`] to a [`FrontBuffer`]: the host surface that
//! displays legacy-device surfaces. The driver follows the host's lifecycle
//! (load, resize, front-buffer availability, per-frame tick, unload) and
//! only asks the front buffer to present when a surface is published.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::backend::{LegacyApi, ModernApi};
use crate::config::PipelineConfig;
use crate::error::BridgeResult;
use crate::format::SurfaceHandle;
use crate::legacy_device::LegacyDeviceHost;
use crate::pipeline::CompositePipeline;
use crate::resources::ResourceCache;

/// Host surface that presents legacy-device surfaces.
pub trait FrontBuffer {
    /// Swap the presented surface; `None` detaches it.
    fn set_back_buffer(&mut self, surface: Option<SurfaceHandle>);

    /// Mark the whole back buffer dirty so the host picks up the new frame.
    fn present_dirty(&mut self, width: u32, height: u32);
}

/// Draws a frame using the target and its cached resources.
pub type Scene<T, R> = Box<dyn FnMut(&T, &ResourceCache<T, R>) -> BridgeResult<()>>;

pub struct InteropHost<M, L, R, F>
where
    M: ModernApi,
    L: LegacyApi,
    R: 'static,
    F: FrontBuffer + 'static,
{
    legacy_host: Arc<LegacyDeviceHost<L>>,
    config: PipelineConfig,
    front_buffer: Rc<RefCell<F>>,
    resources: Rc<RefCell<ResourceCache<M::RenderTarget, R>>>,
    scene: Rc<RefCell<Scene<M::RenderTarget, R>>>,
    pipeline: Option<CompositePipeline<M, L>>,
    rendering: bool,
}

impl<M, L, R, F> InteropHost<M, L, R, F>
where
    M: ModernApi,
    L: LegacyApi,
    R: 'static,
    F: FrontBuffer + 'static,
{
    pub fn new(
        legacy_host: Arc<LegacyDeviceHost<L>>,
        front_buffer: Rc<RefCell<F>>,
        scene: impl FnMut(&M::RenderTarget, &ResourceCache<M::RenderTarget, R>) -> BridgeResult<()>
            + 'static,
    ) -> Self {
        let scene: Scene<M::RenderTarget, R> = Box::new(scene);
        Self {
            legacy_host,
            config: PipelineConfig::default(),
            front_buffer,
            resources: Rc::new(RefCell::new(ResourceCache::new())),
            scene: Rc::new(RefCell::new(scene)),
            pipeline: None,
            rendering: false,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Resource cache shared with the scene; register generators here.
    pub fn resources(&self) -> &Rc<RefCell<ResourceCache<M::RenderTarget, R>>> {
        &self.resources
    }

    /// Create the pipeline and first target, then start rendering.
    ///
    /// A previously loaded pipeline is unloaded first.
    pub fn load(
        &mut self,
        api: M,
        width: f64,
        height: f64,
        dpi_scale_x: f64,
        dpi_scale_y: f64,
    ) -> BridgeResult<()> {
        self.unload();

        let resources = Rc::clone(&self.resources);
        let render_resources = Rc::clone(&self.resources);
        let scene = Rc::clone(&self.scene);
        let front_buffer = Rc::clone(&self.front_buffer);

        let pipeline = CompositePipeline::builder()
            .config(self.config.clone())
            .renderer(move |target: &M::RenderTarget| {
                let cache = render_resources.borrow();
                let mut scene = scene.borrow_mut();
                (*scene)(target, &cache)
            })
            .resources_updater(move |target: &M::RenderTarget| {
                resources.borrow_mut().update_resources(target)
            })
            .surface_setter(move |surface| front_buffer.borrow_mut().set_back_buffer(surface))
            .build(api, Arc::clone(&self.legacy_host))
            .and_then(|mut pipeline| {
                match pipeline.recreate_targets(width, height, dpi_scale_x, dpi_scale_y) {
                    Ok(()) => Ok(pipeline),
                    Err(err) => {
                        // The cache may already hold the half-built target
                        self.resources.borrow_mut().clear();
                        Err(err)
                    }
                }
            })?;

        self.pipeline = Some(pipeline);
        self.rendering = true;
        log::debug!("Interop host loaded at {}x{}", width, height);
        Ok(())
    }

    /// Recreate targets after a size or DPI change. Ignored until loaded.
    pub fn resize(
        &mut self,
        width: f64,
        height: f64,
        dpi_scale_x: f64,
        dpi_scale_y: f64,
    ) -> BridgeResult<()> {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Ok(());
        };

        let result = pipeline.recreate_targets(width, height, dpi_scale_x, dpi_scale_y);
        if result.is_err() {
            // Drop resources bound to a target the pipeline has released
            self.resources.borrow_mut().clear();
        }
        result
    }

    /// Start or stop frame ticks as the host's front buffer comes and goes.
    pub fn set_front_buffer_available(&mut self, available: bool) {
        self.rendering = available && self.pipeline.is_some();
    }

    /// Render one frame; returns whether it was presented.
    pub fn on_frame(&mut self) -> BridgeResult<bool> {
        if !self.rendering {
            return Ok(false);
        }
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Ok(false);
        };

        pipeline.render_frame()?;
        match pipeline.pixel_size() {
            Some((width, height)) if pipeline.has_render_target() => {
                self.front_buffer.borrow_mut().present_dirty(width, height);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Stop rendering and release the pipeline; the front buffer is detached.
    pub fn unload(&mut self) {
        self.rendering = false;
        // Cached resources hold the render target; release them first.
        self.resources.borrow_mut().clear();
        if self.pipeline.take().is_some() {
            log::debug!("Interop host unloaded");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn pipeline(&self) -> Option<&CompositePipeline<M, L>> {
        self.pipeline.as_ref()
    }
}

impl<M, L, R, F> Drop for InteropHost<M, L, R, F>
where
    M: ModernApi,
    L: LegacyApi,
    R: 'static,
    F: FrontBuffer + 'static,
{
    fn drop(&mut self) {
        self.unload();
    }
}
