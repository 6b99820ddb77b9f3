/*
 * Responsibility
 * - Public surface of the middleware collection
 * - The binary (main.rs) only calls app::run()
 */
pub mod api;
pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;
