pub mod image;
pub mod message;
pub mod session;
