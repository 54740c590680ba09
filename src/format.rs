//! Value types passed across the native seams.
//!
//! Formats and flags mirror the native constants of both device APIs; handles
//! are opaque pointers that are only ever forwarded, never dereferenced.

use serde::{Deserialize, Serialize};
use std::ffi::c_void;
use std::ptr::NonNull;

/// Reference DPI that a scale of 1.0 corresponds to.
pub const REFERENCE_DPI: f32 = 96.0;

/// Pixel format of a modern-device texture (DXGI numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    #[serde(rename = "B8G8R8A8_UNORM")]
    B8G8R8A8Unorm,
    #[serde(rename = "R10G10B10A2_UNORM")]
    R10G10B10A2Unorm,
    #[serde(rename = "R16G16B16A16_FLOAT")]
    R16G16B16A16Float,
    /// Any other DXGI format, by raw value
    Other(u32),
}

impl TextureFormat {
    pub const DXGI_B8G8R8A8_UNORM: u32 = 87;
    pub const DXGI_R10G10B10A2_UNORM: u32 = 24;
    pub const DXGI_R16G16B16A16_FLOAT: u32 = 10;

    pub fn from_dxgi(raw: u32) -> Self {
        match raw {
            Self::DXGI_B8G8R8A8_UNORM => TextureFormat::B8G8R8A8Unorm,
            Self::DXGI_R10G10B10A2_UNORM => TextureFormat::R10G10B10A2Unorm,
            Self::DXGI_R16G16B16A16_FLOAT => TextureFormat::R16G16B16A16Float,
            other => TextureFormat::Other(other),
        }
    }

    pub fn to_dxgi(self) -> u32 {
        match self {
            TextureFormat::B8G8R8A8Unorm => Self::DXGI_B8G8R8A8_UNORM,
            TextureFormat::R10G10B10A2Unorm => Self::DXGI_R10G10B10A2_UNORM,
            TextureFormat::R16G16B16A16Float => Self::DXGI_R16G16B16A16_FLOAT,
            TextureFormat::Other(raw) => raw,
        }
    }

    /// The legacy format that can alias this one through a shared handle.
    pub fn to_legacy(self) -> Option<LegacyFormat> {
        match self {
            TextureFormat::B8G8R8A8Unorm => Some(LegacyFormat::A8R8G8B8),
            TextureFormat::R10G10B10A2Unorm => Some(LegacyFormat::A2B10G10R10),
            TextureFormat::R16G16B16A16Float => Some(LegacyFormat::A16B16G16R16F),
            TextureFormat::Other(_) => None,
        }
    }
}

/// Pixel format of a legacy-device texture (D3DFORMAT numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyFormat {
    A8R8G8B8,
    A2B10G10R10,
    A16B16G16R16F,
}

impl LegacyFormat {
    pub fn to_d3dfmt(self) -> u32 {
        match self {
            LegacyFormat::A8R8G8B8 => 21,
            LegacyFormat::A2B10G10R10 => 31,
            LegacyFormat::A16B16G16R16F => 113,
        }
    }
}

/// Description of a modern-device 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Bindable as a render target
    pub render_target: bool,
    /// Bindable as a shader resource
    pub shader_resource: bool,
    /// Created with the cross-device shared flag
    pub shared: bool,
}

impl TextureDesc {
    /// Offscreen render target that another device can open.
    pub fn shared_render_target(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            render_target: true,
            shader_resource: true,
            shared: true,
        }
    }
}

/// Texture the legacy device creates on top of a shared handle.
///
/// Always a single-level render target in the default pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedTextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: LegacyFormat,
}

/// OS-level handle that lets a second device open a texture's memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedHandle(pub *mut c_void);

impl SharedHandle {
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

/// Opaque pointer to a legacy-device surface handed to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(NonNull<c_void>);

impl SurfaceHandle {
    /// Wrap a raw surface pointer; `None` for null.
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(SurfaceHandle)
    }

    pub fn as_raw(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Creation parameters for the legacy device.
///
/// The device never presents to a screen of its own, so it targets the
/// desktop window in windowed mode with a discard swap effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyDeviceParams {
    pub windowed: bool,
    pub hardware_vertex_processing: bool,
    pub multithreaded: bool,
    pub fpu_preserve: bool,
}

impl Default for LegacyDeviceParams {
    fn default() -> Self {
        Self {
            windowed: true,
            hardware_vertex_processing: true,
            multithreaded: true,
            fpu_preserve: true,
        }
    }
}

/// Properties of a vector-graphics target wrapping a texture surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTargetProperties {
    pub dpi_x: f32,
    pub dpi_y: f32,
    pub premultiplied_alpha: bool,
}

impl RenderTargetProperties {
    pub fn from_scale(scale_x: f64, scale_y: f64, reference_dpi: f32) -> Self {
        Self {
            dpi_x: (scale_x * reference_dpi as f64) as f32,
            dpi_y: (scale_y * reference_dpi as f64) as f32,
            premultiplied_alpha: true,
        }
    }
}

/// Rasterizer viewport in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}
