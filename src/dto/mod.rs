/// Command request and response bodies.
pub mod command;
/// Gateway event bodies.
pub mod events;
/// Health check body.
pub mod health;
/// Custom field validators.
pub mod validation;
