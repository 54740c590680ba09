//! Direct3D 11 and Direct2D side of the bridge.
//!
//! The D3D11 device owns the shareable offscreen texture; Direct2D draws into
//! it through a DXGI surface render target.

use std::ffi::c_void;

use windows::core::Interface;
use windows::Win32::Graphics::Direct2D::Common::{
    D2D1_ALPHA_MODE_IGNORE, D2D1_ALPHA_MODE_PREMULTIPLIED, D2D1_PIXEL_FORMAT,
};
use windows::Win32::Graphics::Direct2D::{
    D2D1CreateFactory, ID2D1Factory, ID2D1RenderTarget, D2D1_FACTORY_TYPE_SINGLE_THREADED,
    D2D1_FEATURE_LEVEL_DEFAULT, D2D1_RENDER_TARGET_PROPERTIES, D2D1_RENDER_TARGET_TYPE_DEFAULT,
    D2D1_RENDER_TARGET_USAGE_NONE,
};
use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE_HARDWARE;
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Texture2D,
    D3D11_BIND_RENDER_TARGET, D3D11_BIND_SHADER_RESOURCE, D3D11_CREATE_DEVICE_BGRA_SUPPORT,
    D3D11_RESOURCE_MISC_SHARED, D3D11_SDK_VERSION, D3D11_TEXTURE2D_DESC, D3D11_USAGE_DEFAULT,
    D3D11_VIEWPORT,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT, DXGI_FORMAT_UNKNOWN, DXGI_SAMPLE_DESC};
use windows::Win32::Graphics::Dxgi::{IDXGIResource, IDXGISurface};

use crate::backend::{ModernApi, ShareableTexture};
use crate::error::{BridgeResult, HResultExt, OptionExt};
use crate::format::{RenderTargetProperties, SharedHandle, TextureDesc, TextureFormat, Viewport};

/// D3D11 texture handed to the bridge.
#[derive(Clone)]
pub struct D3D11Texture(pub ID3D11Texture2D);

impl ShareableTexture for D3D11Texture {
    fn desc(&self) -> TextureDesc {
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { self.0.GetDesc(&mut desc) };

        let bind = desc.BindFlags;
        TextureDesc {
            width: desc.Width,
            height: desc.Height,
            format: TextureFormat::from_dxgi(desc.Format.0 as u32),
            render_target: bind & D3D11_BIND_RENDER_TARGET.0 as u32 != 0,
            shader_resource: bind & D3D11_BIND_SHADER_RESOURCE.0 as u32 != 0,
            shared: desc.MiscFlags & D3D11_RESOURCE_MISC_SHARED.0 as u32 != 0,
        }
    }

    fn shared_handle(&self) -> BridgeResult<SharedHandle> {
        let resource: IDXGIResource = self.0.cast().native("QueryInterface(IDXGIResource)")?;
        let handle = unsafe { resource.GetSharedHandle() }.native("GetSharedHandle")?;
        Ok(SharedHandle(handle.0 as *mut c_void))
    }
}

/// [`ModernApi`] over Direct3D 11 and Direct2D.
#[derive(Debug, Clone, Copy, Default)]
pub struct D3D11Api;

impl ModernApi for D3D11Api {
    type Device = ID3D11Device;
    type Context = ID3D11DeviceContext;
    type Texture = D3D11Texture;
    type Factory = ID2D1Factory;
    type RenderTarget = ID2D1RenderTarget;

    fn create_device(&self) -> BridgeResult<(ID3D11Device, ID3D11DeviceContext)> {
        let mut device: Option<ID3D11Device> = None;
        let mut context: Option<ID3D11DeviceContext> = None;

        unsafe {
            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                None,
                D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                None,
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            )
            .native("D3D11CreateDevice")?;
        }

        let device = device.context("D3D11CreateDevice returned no device")?;
        let context = context.context("D3D11CreateDevice returned no context")?;
        Ok((device, context))
    }

    fn create_factory(&self) -> BridgeResult<ID2D1Factory> {
        unsafe { D2D1CreateFactory::<ID2D1Factory>(D2D1_FACTORY_TYPE_SINGLE_THREADED, None) }
            .native("D2D1CreateFactory")
    }

    fn create_texture(
        &self,
        device: &ID3D11Device,
        desc: &TextureDesc,
    ) -> BridgeResult<D3D11Texture> {
        let mut bind_flags = 0;
        if desc.render_target {
            bind_flags |= D3D11_BIND_RENDER_TARGET.0 as u32;
        }
        if desc.shader_resource {
            bind_flags |= D3D11_BIND_SHADER_RESOURCE.0 as u32;
        }
        let misc_flags = if desc.shared {
            D3D11_RESOURCE_MISC_SHARED.0 as u32
        } else {
            0
        };

        let native_desc = D3D11_TEXTURE2D_DESC {
            Width: desc.width,
            Height: desc.height,
            MipLevels: 1,
            ArraySize: 1,
            Format: DXGI_FORMAT(desc.format.to_dxgi() as _),
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: bind_flags,
            CPUAccessFlags: 0,
            MiscFlags: misc_flags,
        };

        let mut texture: Option<ID3D11Texture2D> = None;
        unsafe { device.CreateTexture2D(&native_desc, None, Some(&mut texture)) }
            .native("CreateTexture2D")?;
        let texture = texture.context("CreateTexture2D returned no texture")?;
        Ok(D3D11Texture(texture))
    }

    fn create_surface_render_target(
        &self,
        factory: &ID2D1Factory,
        texture: &D3D11Texture,
        props: &RenderTargetProperties,
    ) -> BridgeResult<ID2D1RenderTarget> {
        let surface: IDXGISurface = texture.0.cast().native("QueryInterface(IDXGISurface)")?;
        let alpha_mode = if props.premultiplied_alpha {
            D2D1_ALPHA_MODE_PREMULTIPLIED
        } else {
            D2D1_ALPHA_MODE_IGNORE
        };

        let native_props = D2D1_RENDER_TARGET_PROPERTIES {
            r#type: D2D1_RENDER_TARGET_TYPE_DEFAULT,
            pixelFormat: D2D1_PIXEL_FORMAT {
                format: DXGI_FORMAT_UNKNOWN,
                alphaMode: alpha_mode,
            },
            dpiX: props.dpi_x,
            dpiY: props.dpi_y,
            usage: D2D1_RENDER_TARGET_USAGE_NONE,
            minLevel: D2D1_FEATURE_LEVEL_DEFAULT,
        };

        unsafe { factory.CreateDxgiSurfaceRenderTarget(&surface, &native_props) }
            .native("CreateDxgiSurfaceRenderTarget")
    }

    fn begin_draw(&self, target: &ID2D1RenderTarget) {
        unsafe { target.BeginDraw() };
    }

    fn end_draw(&self, target: &ID2D1RenderTarget) -> BridgeResult<()> {
        unsafe { target.EndDraw(None, None) }.native("EndDraw")
    }

    fn flush(&self, context: &ID3D11DeviceContext) {
        unsafe { context.Flush() };
    }

    fn set_viewport(&self, context: &ID3D11DeviceContext, viewport: &Viewport) {
        let native = D3D11_VIEWPORT {
            TopLeftX: viewport.x,
            TopLeftY: viewport.y,
            Width: viewport.width,
            Height: viewport.height,
            MinDepth: viewport.min_depth,
            MaxDepth: viewport.max_depth,
        };
        unsafe { context.RSSetViewports(Some(&[native])) };
    }
}
