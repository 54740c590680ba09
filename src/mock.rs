//! In-process fakes for both device APIs.
//!
//! Every fake object is an `Arc` whose last drop records a `Released` event,
//! mirroring COM reference counting. All calls append to one ordered log so
//! tests can assert on call sequences across both APIs and the callbacks.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::ffi::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::{LegacyApi, ModernApi, ShareableTexture};
use crate::error::{BridgeError, BridgeResult};
use crate::format::{
    LegacyDeviceParams, RenderTargetProperties, SharedHandle, SharedTextureDesc, SurfaceHandle,
    TextureDesc, Viewport,
};

const E_FAIL: i32 = 0x8000_4005u32 as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    LegacyContext,
    LegacyDevice,
    LegacyTexture,
    LegacySurface,
    ModernDevice,
    ModernContext,
    Factory,
    ModernTexture,
    RenderTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    CreateContext,
    CreateDevice,
    OpenSharedTexture,
    TopSurface,
    CreateModernDevice,
    CreateFactory,
    CreateTexture,
    CreateRenderTarget,
    EndDraw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Created(Kind, usize),
    Released(Kind, usize),
    DeviceParams(LegacyDeviceParams),
    SharedOpen {
        desc: SharedTextureDesc,
        handle: usize,
    },
    TextureDesc(TextureDesc),
    RenderTargetProps(RenderTargetProperties),
    BeginDraw(usize),
    EndDraw(usize),
    Flush,
    Viewport(Viewport),
    /// Recorded by test callbacks
    Note(String),
}

#[derive(Debug, Default)]
pub struct MockLog {
    events: Mutex<Vec<Event>>,
    // (created, released) per kind; kept across `clear`
    totals: Mutex<HashMap<Kind, (usize, usize)>>,
    next_id: AtomicUsize,
    failures: Mutex<HashSet<FailPoint>>,
}

impl MockLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, event: Event) {
        match &event {
            Event::Created(kind, _) => self.totals.lock().entry(*kind).or_default().0 += 1,
            Event::Released(kind, _) => self.totals.lock().entry(*kind).or_default().1 += 1,
            _ => {}
        }
        self.events.lock().push(event);
    }

    pub fn note(&self, text: impl Into<String>) {
        self.push(Event::Note(text.into()));
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn notes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Note(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded events. Object totals are kept.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn fail(&self, point: FailPoint) {
        self.failures.lock().insert(point);
    }

    pub fn heal(&self, point: FailPoint) {
        self.failures.lock().remove(&point);
    }

    /// Objects of `kind` created since the log was made.
    pub fn created(&self, kind: Kind) -> usize {
        self.totals.lock().get(&kind).map_or(0, |t| t.0)
    }

    pub fn released(&self, kind: Kind) -> usize {
        self.totals.lock().get(&kind).map_or(0, |t| t.1)
    }

    /// Objects of `kind` created and not yet released.
    pub fn live(&self, kind: Kind) -> usize {
        self.created(kind).saturating_sub(self.released(kind))
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }

    fn check(&self, point: FailPoint, call: &'static str) -> BridgeResult<()> {
        if self.failures.lock().contains(&point) {
            return Err(BridgeError::Native { call, code: E_FAIL });
        }
        Ok(())
    }

    fn object(self: &Arc<Self>, kind: Kind) -> MockObject {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.push(Event::Created(kind, id));
        MockObject(Arc::new(ObjectInner {
            id,
            kind,
            log: Arc::clone(self),
        }))
    }
}

#[derive(Debug)]
struct ObjectInner {
    id: usize,
    kind: Kind,
    log: Arc<MockLog>,
}

impl Drop for ObjectInner {
    fn drop(&mut self) {
        self.log.push(Event::Released(self.kind, self.id));
    }
}

/// Reference-counted fake native object.
#[derive(Debug, Clone)]
pub struct MockObject(Arc<ObjectInner>);

impl MockObject {
    pub fn id(&self) -> usize {
        self.0.id
    }
}

/// Surface pointer the fake legacy API hands out for a surface id.
pub fn surface_ptr(id: usize) -> *mut c_void {
    ((id + 1) << 4) as *mut c_void
}

/// Inverse of [`surface_ptr`].
pub fn surface_id(handle: SurfaceHandle) -> usize {
    ((handle.as_raw() as usize) >> 4) - 1
}

pub struct MockLegacy {
    log: Arc<MockLog>,
}

impl MockLegacy {
    pub fn new(log: &Arc<MockLog>) -> Self {
        Self {
            log: Arc::clone(log),
        }
    }
}

impl LegacyApi for MockLegacy {
    type Context = MockObject;
    type Device = MockObject;
    type Texture = MockObject;
    type Surface = MockObject;

    fn create_context(&self) -> BridgeResult<MockObject> {
        self.log.check(FailPoint::CreateContext, "Direct3DCreate9Ex")?;
        Ok(self.log.object(Kind::LegacyContext))
    }

    fn create_device(
        &self,
        _context: &MockObject,
        params: &LegacyDeviceParams,
    ) -> BridgeResult<MockObject> {
        self.log.check(FailPoint::CreateDevice, "CreateDeviceEx")?;
        self.log.push(Event::DeviceParams(*params));
        Ok(self.log.object(Kind::LegacyDevice))
    }

    fn open_shared_texture(
        &self,
        _device: &MockObject,
        desc: &SharedTextureDesc,
        handle: SharedHandle,
    ) -> BridgeResult<MockObject> {
        self.log.check(FailPoint::OpenSharedTexture, "CreateTexture")?;
        self.log.push(Event::SharedOpen {
            desc: *desc,
            handle: handle.0 as usize,
        });
        Ok(self.log.object(Kind::LegacyTexture))
    }

    fn top_surface(&self, _texture: &MockObject) -> BridgeResult<MockObject> {
        self.log.check(FailPoint::TopSurface, "GetSurfaceLevel")?;
        Ok(self.log.object(Kind::LegacySurface))
    }

    fn surface_handle(&self, surface: &MockObject) -> Option<SurfaceHandle> {
        SurfaceHandle::from_raw(surface_ptr(surface.id()))
    }
}

/// Fake modern texture with a controllable description and shared handle.
#[derive(Debug, Clone)]
pub struct MockTexture {
    pub object: MockObject,
    pub desc: TextureDesc,
    pub handle: usize,
}

impl MockTexture {
    pub fn new(log: &Arc<MockLog>, desc: TextureDesc, handle: usize) -> Self {
        Self {
            object: log.object(Kind::ModernTexture),
            desc,
            handle,
        }
    }
}

impl ShareableTexture for MockTexture {
    fn desc(&self) -> TextureDesc {
        self.desc
    }

    fn shared_handle(&self) -> BridgeResult<SharedHandle> {
        Ok(SharedHandle(self.handle as *mut c_void))
    }
}

pub struct MockModern {
    log: Arc<MockLog>,
}

impl MockModern {
    pub fn new(log: &Arc<MockLog>) -> Self {
        Self {
            log: Arc::clone(log),
        }
    }
}

impl ModernApi for MockModern {
    type Device = MockObject;
    type Context = MockObject;
    type Texture = MockTexture;
    type Factory = MockObject;
    type RenderTarget = MockObject;

    fn create_device(&self) -> BridgeResult<(MockObject, MockObject)> {
        self.log
            .check(FailPoint::CreateModernDevice, "D3D11CreateDevice")?;
        let device = self.log.object(Kind::ModernDevice);
        let context = self.log.object(Kind::ModernContext);
        Ok((device, context))
    }

    fn create_factory(&self) -> BridgeResult<MockObject> {
        self.log.check(FailPoint::CreateFactory, "D2D1CreateFactory")?;
        Ok(self.log.object(Kind::Factory))
    }

    fn create_texture(&self, _device: &MockObject, desc: &TextureDesc) -> BridgeResult<MockTexture> {
        self.log.check(FailPoint::CreateTexture, "CreateTexture2D")?;
        self.log.push(Event::TextureDesc(*desc));
        let texture = MockTexture::new(&self.log, *desc, 0);
        let handle = if desc.shared {
            0x7000 + texture.object.id()
        } else {
            0
        };
        Ok(MockTexture { handle, ..texture })
    }

    fn create_surface_render_target(
        &self,
        _factory: &MockObject,
        _texture: &MockTexture,
        props: &RenderTargetProperties,
    ) -> BridgeResult<MockObject> {
        self.log
            .check(FailPoint::CreateRenderTarget, "CreateDxgiSurfaceRenderTarget")?;
        self.log.push(Event::RenderTargetProps(*props));
        Ok(self.log.object(Kind::RenderTarget))
    }

    fn begin_draw(&self, target: &MockObject) {
        self.log.push(Event::BeginDraw(target.id()));
    }

    fn end_draw(&self, target: &MockObject) -> BridgeResult<()> {
        self.log.push(Event::EndDraw(target.id()));
        self.log.check(FailPoint::EndDraw, "EndDraw")
    }

    fn flush(&self, _context: &MockObject) {
        self.log.push(Event::Flush);
    }

    fn set_viewport(&self, _context: &MockObject, viewport: &Viewport) {
        self.log.push(Event::Viewport(*viewport));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_survive_clear() {
        let log = MockLog::new();
        let first = log.object(Kind::ModernTexture);
        let _second = log.object(Kind::ModernTexture);
        log.clear();
        drop(first);

        assert!(log.events().iter().all(|e| !matches!(e, Event::Created(..))));
        assert_eq!(log.created(Kind::ModernTexture), 2);
        assert_eq!(log.released(Kind::ModernTexture), 1);
        assert_eq!(log.live(Kind::ModernTexture), 1);
    }
}
