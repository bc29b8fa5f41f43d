//! GPU textures, sampler settings and uv transforms.
//!
//! [`Texture`] wraps a WGPU texture together with its view and sampler. Colour
//! maps are created from decoded images (see [`crate::resources::load_image`])
//! or from procedural images; depth textures back the render pass.

use cgmath::{Matrix3, Vector2, Vector3};
use image::RgbaImage;

/// How texture coordinates outside `0..1` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    Clamp,
    Mirror,
}

impl Wrap {
    pub const NAMES: [&'static str; 3] = ["repeat", "clamp", "mirror"];
    pub const ALL: [Wrap; 3] = [Wrap::Repeat, Wrap::Clamp, Wrap::Mirror];

    fn address_mode(&self) -> wgpu::AddressMode {
        match self {
            Wrap::Repeat => wgpu::AddressMode::Repeat,
            Wrap::Clamp => wgpu::AddressMode::ClampToEdge,
            Wrap::Mirror => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

impl Filter {
    pub const NAMES: [&'static str; 2] = ["nearest", "linear"];
    pub const ALL: [Filter; 2] = [Filter::Nearest, Filter::Linear];

    fn filter_mode(&self) -> wgpu::FilterMode {
        match self {
            Filter::Nearest => wgpu::FilterMode::Nearest,
            Filter::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// Everything about sampling a texture that needs a sampler rebuild to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SamplerSettings {
    pub wrap: Wrap,
    pub mag_filter: Filter,
    pub min_filter: Filter,
}

impl SamplerSettings {
    pub fn create_sampler(&self, device: &wgpu::Device) -> wgpu::Sampler {
        let address_mode = self.wrap.address_mode();
        device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: self.mag_filter.filter_mode(),
            min_filter: self.min_filter.filter_mode(),
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        })
    }
}

/// Offset, repeat and rotation applied to texture coordinates in the shader.
///
/// Rotation is in radians around `center`, all values in uv units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureTransform {
    pub repeat: Vector2<f32>,
    pub offset: Vector2<f32>,
    pub rotation: f32,
    pub center: Vector2<f32>,
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self {
            repeat: Vector2::new(1.0, 1.0),
            offset: Vector2::new(0.0, 0.0),
            rotation: 0.0,
            center: Vector2::new(0.0, 0.0),
        }
    }
}

impl TextureTransform {
    /// Matrix in the upward `v` convention used by the transform parameters.
    fn upward_matrix(&self) -> Matrix3<f32> {
        let (s, c) = self.rotation.sin_cos();
        let (sx, sy) = (self.repeat.x, self.repeat.y);
        let (cx, cy) = (self.center.x, self.center.y);
        Matrix3::from_cols(
            Vector3::new(sx * c, -sy * s, 0.0),
            Vector3::new(sx * s, sy * c, 0.0),
            Vector3::new(
                -sx * (c * cx + s * cy) + cx + self.offset.x,
                -sy * (-s * cx + c * cy) + cy + self.offset.y,
                1.0,
            ),
        )
    }

    /// Matrix applied to the stored (downward `v`) texture coordinates.
    pub fn matrix(&self) -> Matrix3<f32> {
        let flip = Matrix3::from_cols(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 1.0),
        );
        flip * self.upward_matrix() * flip
    }

    /// Column major and padded to the uniform layout of a WGSL `mat3x3<f32>`.
    pub fn to_raw(&self) -> [[f32; 4]; 3] {
        let m = self.matrix();
        [
            [m.x.x, m.x.y, m.x.z, 0.0],
            [m.y.x, m.y.y, m.y.z, 0.0],
            [m.z.x, m.z.y, m.z.z, 0.0],
        ]
    }

    pub fn apply(&self, uv: [f32; 2]) -> [f32; 2] {
        let p = self.matrix() * Vector3::new(uv[0], uv[1], 1.0);
        [p.x, p.y]
    }
}

#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub settings: SamplerSettings,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth attachment of `[width, height]`, zero sizes are bumped to one.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let settings = SamplerSettings::default();
        let sampler = settings.create_sampler(device);

        Self {
            texture,
            view,
            sampler,
            settings,
        }
    }

    /// Uploads an RGBA image. Colour maps use sRGB, data maps (gradients
    /// sampled by lighting) pass `srgb = false`.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &RgbaImage,
        label: &str,
        settings: SamplerSettings,
        srgb: bool,
    ) -> Self {
        let dimensions = rgba.dimensions();
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = settings.create_sampler(device);
        Self {
            texture,
            view,
            sampler,
            settings,
        }
    }

    /// 1x1 white texture bound where a material has no map.
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba(crate::resources::procedural::WHITE));
        Self::from_rgba(device, queue, &img, "white", SamplerSettings::default(), true)
    }

    /// Replaces the sampler; the bind groups using it must be rebuilt.
    pub fn set_sampler(&mut self, device: &wgpu::Device, settings: SamplerSettings) {
        self.sampler = settings.create_sampler(device);
        self.settings = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5
    }

    #[test]
    fn default_transform_should_be_identity() {
        let t = TextureTransform::default();
        assert!(close(t.apply([0.3, 0.7]), [0.3, 0.7]));
        assert_eq!(t.to_raw()[2], [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn repeat_should_scale_from_the_bottom_left() {
        let t = TextureTransform {
            repeat: Vector2::new(2.0, 3.0),
            ..Default::default()
        };
        // bottom left corner (0, 1 in stored coordinates) stays fixed
        assert!(close(t.apply([0.0, 1.0]), [0.0, 1.0]));
        assert!(close(t.apply([0.5, 1.0]), [1.0, 1.0]));
        assert!(close(t.apply([0.0, 0.0]), [0.0, -2.0]));
    }

    #[test]
    fn offset_should_shift_upwards() {
        let t = TextureTransform {
            offset: Vector2::new(0.25, 0.5),
            ..Default::default()
        };
        assert!(close(t.apply([0.0, 1.0]), [0.25, 0.5]));
    }

    #[test]
    fn rotation_should_turn_around_center() {
        let t = TextureTransform {
            rotation: std::f32::consts::FRAC_PI_2,
            center: Vector2::new(0.5, 0.5),
            ..Default::default()
        };
        assert!(close(t.apply([0.5, 0.5]), [0.5, 0.5]));
        assert!(close(t.apply([1.0, 0.5]), [0.5, 1.0]));
    }
}
