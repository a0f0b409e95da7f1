pub mod accessor;
pub mod log;
pub mod value;

pub use accessor::{Accessor, ChainAccessor, MapAccessor};
pub use value::{NUMBER_EPSILON, Value};
