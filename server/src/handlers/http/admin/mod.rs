pub mod details;

#[allow(unused_imports)]
pub use details::*;
