pub mod handler;
pub mod observer;

pub use handler::{FnHandler, TaskHandler};
pub use observer::{RunEvent, RunObserver};
