pub mod error;
pub mod kind;
pub mod result;
pub mod value;

pub use error::*;
pub use kind::*;
pub use result::*;
pub use value::*;
