//! Pure projections of a fable into what the canvases render.

pub mod form;
pub mod layout;
pub mod projection;

pub use form::*;
pub use layout::*;
pub use projection::*;
