pub mod agent;
pub mod contracts;
pub mod executor;
pub mod replay;

pub use agent::*;
pub use contracts::*;
pub use executor::*;
pub use replay::*;
