//! Render composition and pipeline batching.
//!
//! Activities describe what to draw each frame with a [`Render`]. The engine
//! flattens it and sorts every [`Drawable`] into the batch of the pipeline its
//! material asks for (see [`PipelineKind::for_material`]).

use crate::{
    data_structures::{material::Material, model::Mesh},
    pipelines::PipelineKind,
};

/// A mesh drawn `amount` times with one material.
pub struct Drawable<'a> {
    pub mesh: &'a Mesh,
    pub material: &'a Material,
    pub instance: &'a wgpu::Buffer,
    pub amount: usize,
}

impl Drawable<'_> {
    pub fn pipeline_kind(&self) -> PipelineKind {
        PipelineKind::for_material(&self.material.params)
    }
}

/// Specifies what a flow renders.
///
/// - `None` renders nothing
/// - `Mesh(Drawable)` renders a single mesh
/// - `Meshes(Vec<Drawable>)` renders a batch of meshes
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Mesh(Drawable<'a>),
    Meshes(Vec<Drawable<'a>>),
    Composed(Vec<Render<'a>>),
}

/// Drawables sorted by pipeline.
#[derive(Default)]
pub(crate) struct Batches<'a> {
    pub fill: Vec<Drawable<'a>>,
    pub fill_double_sided: Vec<Drawable<'a>>,
    pub wireframe: Vec<Drawable<'a>>,
}

impl<'a> Batches<'a> {
    fn push(&mut self, drawable: Drawable<'a>) {
        match drawable.pipeline_kind() {
            PipelineKind::Fill => self.fill.push(drawable),
            PipelineKind::FillDoubleSided => self.fill_double_sided.push(drawable),
            PipelineKind::Wireframe => self.wireframe.push(drawable),
        }
    }

    pub fn by_pipeline(self) -> impl Iterator<Item = (PipelineKind, Vec<Drawable<'a>>)> {
        [
            (PipelineKind::Fill, self.fill),
            (PipelineKind::FillDoubleSided, self.fill_double_sided),
            (PipelineKind::Wireframe, self.wireframe),
        ]
        .into_iter()
    }
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(self, batches: &mut Batches<'a>) {
        match self {
            Render::Mesh(drawable) => batches.push(drawable),
            Render::Meshes(vec) => vec.into_iter().for_each(|d| batches.push(d)),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(batches)),
            Render::None => (),
        }
    }
}

impl<'a> From<Drawable<'a>> for Render<'a> {
    fn from(drawable: Drawable<'a>) -> Self {
        Render::Mesh(drawable)
    }
}

impl<'a> From<Vec<Drawable<'a>>> for Render<'a> {
    fn from(drawables: Vec<Drawable<'a>>) -> Self {
        Render::Meshes(drawables)
    }
}
