pub mod context;
pub mod mode;
pub mod result;
pub mod task;

pub use context::*;
pub use mode::*;
pub use result::*;
pub use task::*;
