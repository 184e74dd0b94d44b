//! # Affinity Module
//!
//! Pins every request of one player to one executor so handler code never
//! needs per-player locks.
//!
//! ## Executors
//!
//! The pool is a fixed array of single-consumer executors created at startup.
//! Its size is the largest power of two not above the hardware parallelism
//! (or the configured count, rounded down the same way). Each executor owns an
//! unbounded `may` channel and processes jobs strictly in arrival order.
//!
//! ## Affinity key
//!
//! | Caller | Key |
//! |---|---|
//! | identified player | `actor_id` |
//! | anonymous, with a channel | `abs(channel_hash(channel_id))` |
//! | anonymous, no channel | the route's `CmdMerge` value |
//!
//! The executor index is `key & (N - 1)`. Jobs with equal keys therefore run
//! on the same executor in submission order. No ordering holds across keys.
//!
//! ## Configuration
//!
//! See [`AffinityConfig::from_env`] for the `CMDR_*` variables.

mod config;
mod key;
mod router;

pub use config::{AffinityConfig, ExecutorMode, DEFAULT_NAME_PREFIX, DEFAULT_STACK_SIZE};
pub use key::{affinity_key, available_processors_2n, channel_hash, round_down_pow2};
pub(crate) use router::panic_message;
pub use router::{AffinityRouter, ExecutorClosed, ExecutorMetrics};
