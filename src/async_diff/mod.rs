pub mod channel;
pub mod classifier;
pub mod worker;

pub use channel::{DiffRequest, SessionUpdate};
pub use classifier::{DiffClassifier, DiffSource};
pub use worker::DiffWorker;
