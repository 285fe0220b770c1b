pub mod analyze;
pub mod api_key;
pub mod chat;
pub mod conversation;
pub mod gcode;
pub mod health;
pub mod page;
pub mod speak;
