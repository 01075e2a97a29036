//! Level-of-detail management for a celestial body: screen-size mesh LOD
//! selection and the texture-resolution strategy state machine.

mod error;
mod machine;
mod table;

pub use error::LodError;
pub use machine::{LodEvent, LodMachine, LodState, TextureFamily};
pub use orrery_config::TextureLodStrategy;
pub use table::{ResolutionTable, ScreenSizeThresholds, StepTable, normalize_metric};
