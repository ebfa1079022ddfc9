/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Commands and gateway events.
pub mod pug_service;
/// Message and reaction diffing against the chat service.
pub mod reconciler;
/// Per-channel update chains.
pub mod scheduler;
