//! Per-instance transforms.
//!
//! Every mesh is drawn instanced: a single object is a node with one instance,
//! the donut field of the text activity is one mesh with a hundred.

use cgmath::One;

use crate::data_structures::model;

/// Where one copy of a mesh sits in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Identity transformation.
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = cgmath::Vector3::new(scale, scale, scale);
        self
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// Instance buffer layout: model matrix and rotation-only normal matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
}

impl InstanceRaw {
    // model matrix columns at 5..=8, normal matrix columns at 9..=11
    const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x3,
        10 => Float32x3,
        11 => Float32x3,
    ];
}

impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3, Vector3, Vector4};

    #[test]
    fn should_scale_then_rotate_then_translate() {
        let instance = Instance {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: cgmath::Quaternion::from_angle_z(Deg(90.0)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let p = instance.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 4.0).abs() < 1e-5);
        assert!((p.z - 3.0).abs() < 1e-5);
    }

    #[test]
    fn raw_layout_should_match_the_vertex_attributes() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 25 * 4);
        let raw = Instance::from(Vector3::new(4.0, 5.0, 6.0)).to_raw();
        assert_eq!(raw.model[3], [4.0, 5.0, 6.0, 1.0]);
        assert_eq!(raw.normal, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
    }
}
