//! Direct3D 9Ex side of the bridge.
//!
//! The 9Ex device exists only to reopen shared D3D11 textures as render
//! targets whose top surface a D3D9-based host can present.

use std::ffi::c_void;

use windows::core::Interface;
use windows::Win32::Foundation::HANDLE;
use windows::Win32::Graphics::Direct3D9::{
    Direct3DCreate9Ex, IDirect3D9Ex, IDirect3DDevice9Ex, IDirect3DSurface9, IDirect3DTexture9,
    D3DCREATE_FPU_PRESERVE, D3DCREATE_HARDWARE_VERTEXPROCESSING, D3DCREATE_MULTITHREADED,
    D3DCREATE_SOFTWARE_VERTEXPROCESSING, D3DDEVTYPE_HAL, D3DFORMAT, D3DPOOL_DEFAULT,
    D3DPRESENT_INTERVAL_DEFAULT, D3DPRESENT_PARAMETERS, D3DSWAPEFFECT_DISCARD,
    D3DUSAGE_RENDERTARGET, D3D_SDK_VERSION,
};
use windows::Win32::UI::WindowsAndMessaging::GetDesktopWindow;

use crate::backend::LegacyApi;
use crate::error::{BridgeResult, HResultExt, OptionExt};
use crate::format::{LegacyDeviceParams, SharedHandle, SharedTextureDesc, SurfaceHandle};

/// Direct3D 9Ex entry object.
#[derive(Clone)]
pub struct D3D9Context(pub IDirect3D9Ex);

/// Direct3D 9Ex device.
#[derive(Clone)]
pub struct D3D9Device(pub IDirect3DDevice9Ex);

// SAFETY: D3D9Context and D3D9Device are Send because:
// - The device is always created with D3DCREATE_MULTITHREADED
// - The entry object is only used to create that device, under the host lock
// - COM reference counting on these interfaces is atomic
unsafe impl Send for D3D9Context {}
unsafe impl Send for D3D9Device {}

/// [`LegacyApi`] over Direct3D 9Ex.
#[derive(Debug, Clone, Copy, Default)]
pub struct D3D9Api;

impl LegacyApi for D3D9Api {
    type Context = D3D9Context;
    type Device = D3D9Device;
    type Texture = IDirect3DTexture9;
    type Surface = IDirect3DSurface9;

    fn create_context(&self) -> BridgeResult<D3D9Context> {
        let context = unsafe { Direct3DCreate9Ex(D3D_SDK_VERSION) }.native("Direct3DCreate9Ex")?;
        Ok(D3D9Context(context))
    }

    fn create_device(
        &self,
        context: &D3D9Context,
        params: &LegacyDeviceParams,
    ) -> BridgeResult<D3D9Device> {
        let mut behavior = if params.hardware_vertex_processing {
            D3DCREATE_HARDWARE_VERTEXPROCESSING as u32
        } else {
            D3DCREATE_SOFTWARE_VERTEXPROCESSING as u32
        };
        if params.multithreaded {
            behavior |= D3DCREATE_MULTITHREADED as u32;
        }
        if params.fpu_preserve {
            behavior |= D3DCREATE_FPU_PRESERVE as u32;
        }

        unsafe {
            // The device never presents; it only needs a window to bind to.
            let window = GetDesktopWindow();
            let mut present = D3DPRESENT_PARAMETERS {
                Windowed: params.windowed.into(),
                SwapEffect: D3DSWAPEFFECT_DISCARD,
                hDeviceWindow: window,
                PresentationInterval: D3DPRESENT_INTERVAL_DEFAULT as u32,
                ..Default::default()
            };

            let mut device: Option<IDirect3DDevice9Ex> = None;
            context
                .0
                .CreateDeviceEx(
                    0,
                    D3DDEVTYPE_HAL,
                    window,
                    behavior,
                    &mut present,
                    std::ptr::null_mut(),
                    &mut device,
                )
                .native("CreateDeviceEx")?;

            let device = device.context("CreateDeviceEx returned no device")?;
            Ok(D3D9Device(device))
        }
    }

    fn open_shared_texture(
        &self,
        device: &D3D9Device,
        desc: &SharedTextureDesc,
        handle: SharedHandle,
    ) -> BridgeResult<IDirect3DTexture9> {
        let mut texture: Option<IDirect3DTexture9> = None;
        let mut shared = HANDLE(handle.0 as _);

        unsafe {
            device
                .0
                .CreateTexture(
                    desc.width,
                    desc.height,
                    1,
                    D3DUSAGE_RENDERTARGET as u32,
                    D3DFORMAT(desc.format.to_d3dfmt() as _),
                    D3DPOOL_DEFAULT,
                    &mut texture,
                    &mut shared,
                )
                .native("CreateTexture")?;
        }

        texture.context("CreateTexture returned no texture")
    }

    fn top_surface(&self, texture: &IDirect3DTexture9) -> BridgeResult<IDirect3DSurface9> {
        unsafe { texture.GetSurfaceLevel(0) }.native("GetSurfaceLevel")
    }

    fn surface_handle(&self, surface: &IDirect3DSurface9) -> Option<SurfaceHandle> {
        SurfaceHandle::from_raw(surface.as_raw() as *mut c_void)
    }
}
