
pub mod bot;
pub mod gate;
pub mod generation;
pub mod poll;

// Ré-exports pour faciliter l'import
pub use gate::CreditGate;
pub use generation::{GenerationService, GenerationSettings, ImageRequest, VideoRequest};
pub use poll::PollConfig;
