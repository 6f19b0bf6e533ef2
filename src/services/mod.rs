pub mod extractor;
pub mod gemini_client;
pub mod openai_client;
pub mod prompt;
pub mod provider;

pub use extractor::extract_json;
pub use gemini_client::GeminiClient;
pub use openai_client::{ChatCompletionRequest, OpenAIClient};
pub use prompt::build_prompt;
pub use provider::{TextGenerator, DEFAULT_TIMEOUT};
