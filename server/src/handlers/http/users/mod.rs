pub mod details;
pub mod edit_profile;
pub mod load_data;
pub mod profile;

#[allow(unused_imports)]
pub use details::*;
#[allow(unused_imports)]
pub use edit_profile::*;
#[allow(unused_imports)]
pub use load_data::*;
#[allow(unused_imports)]
pub use profile::*;
