pub mod compiler;
pub mod entity;
pub mod enumeration;
pub mod error;
pub mod expander;
pub mod parser;
