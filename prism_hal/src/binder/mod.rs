/// Pipeline state binding: reflection, resolved layouts, attribute and raster tracking

mod reflection;
mod pipeline_layout;
mod attribute_tracker;
mod raster_binder;

pub use reflection::{
    BufferKind, ReflectedAttribute, ReflectedBuffer, ReflectedTexture, ReflectedUniform,
    ShaderReflection, INDEX_NOT_FOUND,
};
pub use pipeline_layout::{
    AttributeBinding, DescriptorBinding, DescriptorKind, LayoutSources, PipelineLayout,
    ShaderStages, UniformBlockBinding,
};
pub use attribute_tracker::{AttributeTransition, VertexAttributeTracker};
pub use raster_binder::{RasterBinder, RasterChanges};
