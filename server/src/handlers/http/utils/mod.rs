pub mod headers;
pub mod json_response;

#[allow(unused_imports)]
pub use headers::*;
#[allow(unused_imports)]
pub use json_response::*;
