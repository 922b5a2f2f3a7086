pub mod gemini_client;
pub mod groq_client;
pub mod ollama_client;
pub mod provider;
pub mod structured;

#[cfg(test)]
mod stub_server;

pub use gemini_client::GeminiClient;
pub use groq_client::GroqClient;
pub use ollama_client::OllamaClient;
pub use provider::{ProviderAdapter, ProviderConfig, ProviderMode, StructuredChat};
