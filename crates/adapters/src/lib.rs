#![deny(unsafe_code)]

pub mod events;
pub mod sink;
