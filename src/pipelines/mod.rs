//! Render pipelines.
//!
//! Every mesh is drawn with the same shader and bind group layout
//! (material: group 0, camera: group 1, light: group 2). Pipelines only
//! differ in primitive state, see [`PipelineKind`].

pub mod basic;
pub mod light;

use crate::data_structures::material::MaterialParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Filled triangles, back faces culled.
    Fill,
    /// Filled triangles, both faces drawn.
    FillDoubleSided,
    /// Triangle edges as lines.
    Wireframe,
}

impl PipelineKind {
    pub fn for_material(params: &MaterialParams) -> Self {
        if params.wireframe {
            PipelineKind::Wireframe
        } else if params.double_sided {
            PipelineKind::FillDoubleSided
        } else {
            PipelineKind::Fill
        }
    }
}

#[derive(Debug)]
pub struct Pipelines {
    pub fill: wgpu::RenderPipeline,
    pub fill_double_sided: wgpu::RenderPipeline,
    pub wireframe: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        material_layout: &wgpu::BindGroupLayout,
        camera_layout: &wgpu::BindGroupLayout,
        light_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh pipeline layout"),
            bind_group_layouts: &[Some(material_layout), Some(camera_layout), Some(light_layout)],
            immediate_size: 0,
        });
        let shader = basic::mk_shader(device);
        let mk = |kind| basic::mk_mesh_pipeline(device, &shader, &layout, format, kind);
        Self {
            fill: mk(PipelineKind::Fill),
            fill_double_sided: mk(PipelineKind::FillDoubleSided),
            wireframe: mk(PipelineKind::Wireframe),
        }
    }

    pub fn get(&self, kind: PipelineKind) -> &wgpu::RenderPipeline {
        match kind {
            PipelineKind::Fill => &self.fill,
            PipelineKind::FillDoubleSided => &self.fill_double_sided,
            PipelineKind::Wireframe => &self.wireframe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wireframe_should_win_over_double_sided() {
        let mut params = MaterialParams::default();
        assert_eq!(PipelineKind::for_material(&params), PipelineKind::Fill);
        params.double_sided = true;
        assert_eq!(PipelineKind::for_material(&params), PipelineKind::FillDoubleSided);
        params.wireframe = true;
        assert_eq!(PipelineKind::for_material(&params), PipelineKind::Wireframe);
    }
}
