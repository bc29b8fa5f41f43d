use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        geometry::MeshData,
        instance::{Instance, InstanceRaw},
        material::Material,
        model::Mesh,
    },
    render::Drawable,
};

/**
 * A `MeshNode` is one mesh drawn once per instance.
 *
 * The material is not owned by the node so that several nodes can share a
 * single material and see its changes at the same time.
 */
#[derive(Debug)]
pub struct MeshNode {
    pub mesh: Mesh,
    pub instances: Vec<Instance>,
    pub instance_buffer: wgpu::Buffer,
}

impl MeshNode {
    pub fn new(device: &wgpu::Device, name: &str, data: &MeshData, instances: Vec<Instance>) -> Self {
        let mesh = Mesh::new(device, name, data);
        let instance_buffer = mk_instance_buffer(device, name, &instances);
        Self {
            mesh,
            instances,
            instance_buffer,
        }
    }

    pub fn single(device: &wgpu::Device, name: &str, data: &MeshData, instance: Instance) -> Self {
        Self::new(device, name, data, vec![instance])
    }

    /// Swaps the geometry, instances stay. The old buffers are dropped.
    pub fn set_geometry(&mut self, device: &wgpu::Device, data: &MeshData) {
        self.mesh = Mesh::new(device, &self.mesh.name, data);
    }

    /// Uploads the current `instances`; the buffer is reallocated if their count changed.
    pub fn write_to_buffer(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let raw = self.instances.iter().map(Instance::to_raw).collect::<Vec<_>>();
        let size = (raw.len() * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress;
        if size != self.instance_buffer.size() {
            self.instance_buffer = mk_instance_buffer(device, &self.mesh.name, &self.instances);
        } else {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&raw));
        }
    }

    pub fn drawable<'a>(&'a self, material: &'a Material) -> Drawable<'a> {
        Drawable {
            mesh: &self.mesh,
            material,
            instance: &self.instance_buffer,
            amount: self.instances.len(),
        }
    }
}

fn mk_instance_buffer(device: &wgpu::Device, name: &str, instances: &[Instance]) -> wgpu::Buffer {
    let instance_data = instances.iter().map(Instance::to_raw).collect::<Vec<_>>();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Instance Buffer", name)),
        contents: bytemuck::cast_slice(&instance_data),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}
