pub mod health;
pub mod tables;
pub mod webhooks;
