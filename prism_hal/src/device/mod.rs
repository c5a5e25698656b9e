/// Device-level API: backend identification, resources, pipelines and command recording

pub mod backend;
pub mod types;
pub mod format;
pub mod resources;
pub mod pipeline;
pub mod render_pass;
pub mod bind_group;
pub mod command;

pub use backend::*;
pub use types::*;
pub use format::*;
pub use resources::*;
pub use pipeline::*;
pub use render_pass::*;
pub use bind_group::*;
pub use command::*;

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
