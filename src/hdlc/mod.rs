//! The hdlc module recovers push frames from the serial byte stream and
//! exposes the ciphering header fields carried inside them.

pub mod frame;
pub mod reader;

pub use frame::{compute_fcs, is_aligned, Frame};
pub use reader::read_frame;
