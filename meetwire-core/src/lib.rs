pub mod codec;
pub mod model;

pub use codec::{CodecError, decode, encode};
pub use model::*;
