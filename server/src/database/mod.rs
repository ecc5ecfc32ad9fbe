pub mod accounts;
pub mod create;
pub mod details;
pub mod jobs;
#[allow(dead_code)]
pub mod utils;

#[allow(unused_imports)]
pub use accounts::*;
#[allow(unused_imports)]
pub use create::*;
#[allow(unused_imports)]
pub use details::*;
#[allow(unused_imports)]
pub use jobs::*;
#[allow(unused_imports)]
pub use utils::*;
