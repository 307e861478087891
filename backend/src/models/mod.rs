pub mod feeding;
pub mod horse;
pub mod macros;
pub mod session;
pub mod time;
pub mod user;

pub use feeding::*;
pub use horse::*;
pub use session::*;
pub use time::*;
pub use user::*;
