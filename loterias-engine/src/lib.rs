pub mod batch;
pub mod dedup;
pub mod error;
pub mod generator;
pub mod persistence;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod stats;
pub mod transfer;

pub use error::{LotoError, LotoResult};
pub use session::{Session, StatsScope};
