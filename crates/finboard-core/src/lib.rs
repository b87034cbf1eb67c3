pub mod actions;
pub mod config;
pub mod error;
pub mod payloads;
pub mod record;
pub mod reducer;
pub mod selector;
pub mod state;
pub mod store;
pub mod tool_registry;
pub mod turn;

pub use actions::*;
pub use config::*;
pub use error::*;
pub use reducer::*;
pub use record::*;
pub use state::*;
pub use store::*;
