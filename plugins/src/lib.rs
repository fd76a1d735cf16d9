pub mod ai;
pub mod extract;
pub mod factory;
pub mod http;
pub mod search;
