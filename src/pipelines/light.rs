//! The single point light (plus ambient term) bound at group 2.

use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub ambient_intensity: f32,
    pub ambient_color: [f32; 3],
    _pad: u32,
}

impl LightUniform {
    /// White light and white ambient.
    pub fn new(position: [f32; 3], intensity: f32, ambient_intensity: f32) -> Self {
        Self {
            position,
            intensity,
            color: [1.0; 3],
            ambient_intensity,
            ambient_color: [1.0; 3],
            _pad: 0,
        }
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self::new([2.0, 3.0, 4.0], 1.0, 0.5)
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(uniform: LightUniform, device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("light layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("light"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&self.uniform));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_should_be_three_vec4() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
        let light = LightUniform::new([1.0, 2.0, 3.0], 0.8, 0.2);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&light));
        assert_eq!(&floats[..4], &[1.0, 2.0, 3.0, 0.8]);
        assert_eq!(floats[7], 0.2);
    }
}
