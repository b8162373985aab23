pub mod factory;
pub mod gemini;
pub mod mock;

pub use factory::create_provider;
pub use gemini::{GeminiProvider, GeminiSession};
pub use mock::ScriptedProvider;
