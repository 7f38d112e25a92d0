pub mod api;
pub mod cli;
pub mod config;
pub mod models;
pub mod router;
pub mod session;
pub mod ui;
pub mod views;

#[cfg(test)]
mod test_support;
