pub mod diff_session;

pub use diff_session::DiffSession;
