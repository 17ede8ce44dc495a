//! Pipeline stage implementations.
//!
//! One module per stage, in pipeline order: script, audio, analysis,
//! prompts, visuals, captions, render.

mod analysis;
mod audio;
mod captions;
mod prompts;
mod render;
mod script;
mod visuals;

pub use analysis::AnalysisStage;
pub use audio::AudioStage;
pub use captions::CaptionsStage;
pub use prompts::PromptsStage;
pub use render::RenderStage;
pub use script::ScriptStage;
pub use visuals::VisualsStage;
