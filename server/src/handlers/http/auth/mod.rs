pub mod check;
pub mod login;
pub mod logout;
pub mod signup;
pub mod verify;

#[allow(unused_imports)]
pub use check::*;
#[allow(unused_imports)]
pub use login::*;
#[allow(unused_imports)]
pub use logout::*;
#[allow(unused_imports)]
pub use signup::*;
#[allow(unused_imports)]
pub use verify::*;
