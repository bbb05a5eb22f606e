mod blacklist;
mod columns;
mod config;
mod efficiency;
mod expand;
mod filter;
mod predicate;


pub use blacklist::*;
pub use columns::{MissingColumn, StringColumn};
pub use config::*;
pub use efficiency::*;
pub use expand::*;
pub use filter::*;
pub use predicate::*;
