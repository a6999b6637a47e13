pub mod enhancer;
pub mod providers;

pub use enhancer::PromptEnhancer;
