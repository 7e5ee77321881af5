mod ids;
pub mod session;
pub mod store;

pub use session::*;
pub use store::*;
