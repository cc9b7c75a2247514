pub mod controller;
pub mod encoder;
pub mod error;
pub mod sample;
pub mod session;

pub use controller::SessionController;
pub use error::AvatarError;
pub use sample::{HttpSampleSource, SampleSource};
pub use session::{GenerationResult, SessionState, SessionStatus, SourceImage};
