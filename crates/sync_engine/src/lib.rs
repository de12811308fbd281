//! Sync engine: socket I/O, timers and REST hydration for the sync core's effects.
mod engine;
mod hydrate;
mod settings;
mod transport;
mod types;

pub use engine::EngineHandle;
pub use hydrate::{Hydrator, ReqwestHydrator};
pub use settings::EngineSettings;
pub use types::{EngineError, EngineEvent, HydrateError, Resource};
