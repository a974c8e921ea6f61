//! # Rebut LLM
//!
//! External collaborators used by the debate agents.
//!
//! ## Supported Backends
//!
//! | Service | Provider | Key Required |
//! |---------|----------|--------------|
//! | Text completion | Groq (OpenAI-compatible) | `GROQ_API_KEY` |
//! | Evidence search | Tavily | `TAVILY_API_KEY` |
//! | Both | Mock | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use rebut_llm::{LlmProvider, MockProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = MockProvider::constant("Counter-argument");
//!     let response = llm.ask("Argue against school uniforms").await.unwrap();
//!     assert_eq!(response, "Counter-argument");
//! }
//! ```
//!
//! ## From the environment
//!
//! ```rust,no_run
//! use rebut_llm::LlmConfig;
//!
//! let config = LlmConfig::from_env();
//! let llm = config.build_llm();
//! let search = config.build_search();
//! ```

pub mod config;
pub mod groq;
pub mod metered;
pub mod metrics;
pub mod mock;
pub mod provider;
pub mod search;
pub mod tavily;

pub use config::LlmConfig;
pub use groq::GroqProvider;
pub use metered::{MeteredProvider, MeteredSearchProvider};
pub use metrics::{global_metrics, Metrics, MetricsSnapshot};
pub use mock::{MockProvider, MockSearchProvider};
pub use provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};
pub use search::{SearchDepth, SearchError, SearchHit, SearchProvider, SearchRequest};
pub use tavily::TavilyProvider;
