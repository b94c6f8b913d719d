pub mod classify;
pub mod prober;

pub use prober::{MongoProber, ProbeSettings};
