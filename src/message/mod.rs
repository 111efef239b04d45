mod control;
mod shared_object;
mod types;

pub use control::*;
pub use shared_object::*;
pub use types::*;
