//! Client for the DadDeck trading card game API.
//!
//! ```no_run
//! use dadddeck_api::{CardListParams, Config, DadDeckClient, RetryPolicy};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let client = DadDeckClient::new(Config::new("ddpk_live_abc123"))?;
//! let params = CardListParams::default();
//! let resp = RetryPolicy::default().run(|| client.list_cards(&params)).await?;
//! if let Some(rl) = &resp.rate_limit {
//!     println!("{}/{} requests left", rl.remaining, rl.limit);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod output;
pub mod pagination;
pub mod resources;
pub mod retry;
pub mod types;

pub use client::DadDeckClient;
pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use pagination::{Page, Paginator};
pub use resources::{
    CardFilters, CardListParams, CollectionParams, CreateKeyParams, PackParams, RandomCardsParams,
};
pub use retry::{run_with_retry, RetryPolicy};
pub use types::{ApiResponse, ApiTier, RateLimitInfo};
