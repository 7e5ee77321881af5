pub mod catalogue;
pub mod conversion;
pub mod definition;
pub mod validation_state;
pub mod value;

pub use catalogue::*;
pub use conversion::*;
pub use definition::*;
pub use validation_state::*;
pub use value::*;
