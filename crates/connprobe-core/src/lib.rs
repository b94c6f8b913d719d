pub mod descriptor;
pub mod env_file;
pub mod error;
pub mod event;
pub mod prober;
pub mod report;
pub mod stage;
