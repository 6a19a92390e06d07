// Animagen Infrastructure - Remote Model Adapter
// Implements: CodeGenerationProvider (Gemini generateContent over HTTP)

mod config;
mod prompt;
mod provider;
mod response;

pub use config::{GeminiConfig, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
pub use prompt::build_prompt;
pub use provider::GeminiProvider;
pub use response::clean_code;
