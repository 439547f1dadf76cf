pub mod openai_compatible;
pub mod schema;
pub mod traits;

pub use openai_compatible::OpenAICompatibleProvider;
pub use traits::{ClassificationProvider, ModelConfig, ProviderError, TabSummary};
