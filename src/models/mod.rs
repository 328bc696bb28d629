//! Core data models for the leaderboard engine.

mod filter;
mod ids;
mod rollup;
mod scope;
mod session;
mod tenant;
mod view;

pub use filter::*;
pub use ids::*;
pub use rollup::*;
pub use scope::*;
pub use session::*;
pub use tenant::*;
pub use view::*;
