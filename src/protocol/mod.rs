mod command;
mod data;
mod packet;
mod shared_object;
pub mod constants;
pub mod status;

pub use command::*;
pub use constants::*;
pub use data::*;
pub use packet::*;
pub use shared_object::{RemoteSharedObject, SharedObjectChange};
pub use status::RtmpStatus;
