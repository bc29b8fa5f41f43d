//! Surface appearance: shading model, colour, maps and their uniform block.
//!
//! All shading models are evaluated by one shader that branches on
//! [`MaterialKind::shader_id`]. A [`Material`] owns its uniform buffer, its
//! textures and the bind group tying them together (group 0 of every
//! pipeline). Several meshes may draw with the same material.

use wgpu::util::DeviceExt;

use crate::data_structures::texture::{SamplerSettings, Texture, TextureTransform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialKind {
    #[default]
    Basic,
    Normal,
    Matcap,
    Depth,
    Lambert,
    Phong,
    Toon,
    Standard,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 8] = [
        MaterialKind::Basic,
        MaterialKind::Normal,
        MaterialKind::Matcap,
        MaterialKind::Depth,
        MaterialKind::Lambert,
        MaterialKind::Phong,
        MaterialKind::Toon,
        MaterialKind::Standard,
    ];

    pub const NAMES: [&'static str; 8] = [
        "basic", "normal", "matcap", "depth", "lambert", "phong", "toon", "standard",
    ];

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn name(&self) -> &'static str {
        Self::NAMES[self.index()]
    }

    /// Branch selector read by the fragment shader.
    pub fn shader_id(&self) -> u32 {
        self.index() as u32
    }

    /// Reacts to the light uniform.
    pub fn is_lit(&self) -> bool {
        matches!(
            self,
            MaterialKind::Lambert | MaterialKind::Phong | MaterialKind::Toon | MaterialKind::Standard
        )
    }

    /// Samples the second texture slot (matcap image or toon ramp).
    pub fn uses_aux_texture(&self) -> bool {
        matches!(self, MaterialKind::Matcap | MaterialKind::Toon)
    }
}

/// Everything that can change on a material without new GPU resources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub kind: MaterialKind,
    /// Linear RGB.
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub shininess: f32,
    pub wireframe: bool,
    pub double_sided: bool,
    pub flat_shading: bool,
    pub uv: TextureTransform,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Basic,
            color: [1.0, 1.0, 1.0],
            metalness: 0.0,
            roughness: 1.0,
            shininess: 30.0,
            wireframe: false,
            double_sided: false,
            flat_shading: false,
            uv: TextureTransform::default(),
        }
    }
}

impl MaterialParams {
    pub fn with_kind(kind: MaterialKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn uniform(&self, has_map: bool, has_aux: bool) -> MaterialUniform {
        let mut flags = 0;
        if has_map {
            flags |= MaterialUniform::HAS_MAP;
        }
        if has_aux {
            flags |= MaterialUniform::HAS_AUX;
        }
        if self.flat_shading {
            flags |= MaterialUniform::FLAT_SHADING;
        }
        MaterialUniform {
            color: [self.color[0], self.color[1], self.color[2], 1.0],
            uv_transform: self.uv.to_raw(),
            kind: self.kind.shader_id(),
            metalness: self.metalness.clamp(0.0, 1.0),
            roughness: self.roughness.clamp(0.0, 1.0),
            shininess: self.shininess.max(0.0),
            flags,
            _padding: [0; 3],
        }
    }
}

/// `0xRRGGBB` as sRGB components in `0..=1`.
pub fn rgb_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Panel colours are sRGB, the shader works in linear RGB.
pub fn srgb_to_linear(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(|c| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    })
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub uv_transform: [[f32; 4]; 3],
    pub kind: u32,
    pub metalness: f32,
    pub roughness: f32,
    pub shininess: f32,
    pub flags: u32,
    _padding: [u32; 3],
}

impl MaterialUniform {
    pub const HAS_MAP: u32 = 1;
    pub const HAS_AUX: u32 = 1 << 1;
    pub const FLAT_SHADING: u32 = 1 << 2;
}

pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    let sampler = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture(1),
            sampler(2),
            texture(3),
            sampler(4),
        ],
        label: Some("material_bind_group_layout"),
    })
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub params: MaterialParams,
    map: Option<Texture>,
    aux: Option<Texture>,
    placeholder: Texture,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        name: &str,
        params: MaterialParams,
        map: Option<Texture>,
        aux: Option<Texture>,
    ) -> Self {
        let placeholder = Texture::white(device, queue);
        let uniform = params.uniform(map.is_some(), aux.is_some());
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Material Buffer", name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = mk_bind_group(
            device,
            layout,
            name,
            &buffer,
            map.as_ref().unwrap_or(&placeholder),
            aux.as_ref().unwrap_or(&placeholder),
        );
        Self {
            name: name.to_string(),
            params,
            map,
            aux,
            placeholder,
            buffer,
            bind_group,
        }
    }

    /// Uploads `params` into the live uniform buffer; nothing is recreated.
    pub fn write(&self, queue: &wgpu::Queue) {
        let uniform = self.params.uniform(self.map.is_some(), self.aux.is_some());
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Replaces the colour map. The previous texture is dropped.
    pub fn set_map(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        map: Option<Texture>,
    ) {
        self.map = map;
        self.rebind(device, layout);
        self.write(queue);
    }

    /// Replaces the matcap image or toon ramp. The previous texture is dropped.
    pub fn set_aux(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        aux: Option<Texture>,
    ) {
        self.aux = aux;
        self.rebind(device, layout);
        self.write(queue);
    }

    /// Rebuilds the colour map sampler, e.g. after a wrap or filter change.
    pub fn set_map_sampler(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        settings: SamplerSettings,
    ) {
        if let Some(map) = self.map.as_mut() {
            map.set_sampler(device, settings);
            self.rebind(device, layout);
        }
    }

    fn rebind(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) {
        self.bind_group = mk_bind_group(
            device,
            layout,
            &self.name,
            &self.buffer,
            self.map.as_ref().unwrap_or(&self.placeholder),
            self.aux.as_ref().unwrap_or(&self.placeholder),
        );
    }
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    name: &str,
    buffer: &wgpu::Buffer,
    map: &Texture,
    aux: &Texture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&map.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&map.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&aux.view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(&aux.sampler),
            },
        ],
        label: Some(&format!("{:?} Material Bind Group", name)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours_should_convert_from_hex_and_srgb() {
        assert_eq!(rgb_from_hex(0xff8000), [1.0, 128.0 / 255.0, 0.0]);
        let linear = srgb_to_linear([0.0, 0.5, 1.0]);
        assert_eq!(linear[0], 0.0);
        assert!((linear[1] - 0.214).abs() < 1e-3);
        assert!((linear[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn uniform_should_match_the_wgsl_block_size() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 96);
    }

    #[test]
    fn every_kind_should_have_its_own_shader_branch() {
        for (i, kind) in MaterialKind::ALL.iter().enumerate() {
            assert_eq!(kind.shader_id(), i as u32);
            assert_eq!(MaterialKind::from_index(i), *kind);
            assert_eq!(kind.name(), MaterialKind::NAMES[i]);
            let uniform = MaterialParams::with_kind(*kind).uniform(false, false);
            assert_eq!(uniform.kind, i as u32);
        }
        assert_eq!(MaterialKind::from_index(99), MaterialKind::Standard);
    }

    #[test]
    fn uniform_should_carry_flags_and_clamped_values() {
        let params = MaterialParams {
            color: [0.5, 0.25, 1.0],
            metalness: 1.5,
            roughness: -1.0,
            flat_shading: true,
            ..MaterialParams::with_kind(MaterialKind::Standard)
        };
        let uniform = params.uniform(true, false);
        assert_eq!(uniform.color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(uniform.metalness, 1.0);
        assert_eq!(uniform.roughness, 0.0);
        assert_eq!(
            uniform.flags,
            MaterialUniform::HAS_MAP | MaterialUniform::FLAT_SHADING
        );
    }

    #[test]
    fn only_matcap_and_toon_sample_the_second_slot() {
        let aux: Vec<_> = MaterialKind::ALL
            .iter()
            .filter(|k| k.uses_aux_texture())
            .collect();
        assert_eq!(aux, vec![&MaterialKind::Matcap, &MaterialKind::Toon]);
        assert!(!MaterialKind::Basic.is_lit());
        assert!(MaterialKind::Standard.is_lit());
    }
}
