pub mod inspector;
pub mod secure_message;
