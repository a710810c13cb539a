mod registry;
mod selectors;

pub use registry::{GenerationMode, ModelRegistry, ModelSpec, DRYRUN_MODEL};
pub use selectors::{ModelSelection, ModelSelector};
