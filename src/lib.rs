// Adversary - adversarial critique for decisions
// Library exports

pub mod cli;
pub mod client;
pub mod config;
pub mod debate;
pub mod logging;
pub mod prompts;
pub mod providers;
pub mod server;
