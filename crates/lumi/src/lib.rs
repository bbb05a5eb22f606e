mod certification;
mod columns;
mod error;
mod mask;
mod range_set;


pub use certification::*;
pub use columns::*;
pub use error::*;
pub use mask::*;
pub use range_set::*;
pub use tnp_primitives::{LumiBlock, LumiRange, RunNumber};
