pub mod demo;
pub mod gemini;
pub mod yahoo;

pub use gemini::{GeminiClient, GeminiResponse, DEFAULT_GEMINI_MODEL};
pub use yahoo::{YahooAdapter, YahooAuthManager};
