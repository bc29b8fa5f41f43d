//! Scene data: CPU geometry, GPU meshes, materials, textures and instances.
//!
//! - `geometry` holds CPU-side meshes and the procedural shape generators
//! - `triangulate` fills polygons with holes (glyph outlines)
//! - `text` extrudes glyph shapes into 3D text
//! - `model` contains the vertex layout and GPU meshes
//! - `material` describes surface appearance and owns its bind group
//! - `texture` contains the GPU texture wrapper, samplers and uv transforms
//! - `instance` holds per-instance transformation data
//! - `node` bundles a mesh with its instances

pub mod geometry;
pub mod instance;
pub mod material;
pub mod model;
pub mod node;
pub mod text;
pub mod texture;
pub mod triangulate;
