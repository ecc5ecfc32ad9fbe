pub mod jobs;

#[allow(unused_imports)]
pub use jobs::*;
