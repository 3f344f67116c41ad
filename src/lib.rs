#[cfg(test)]
mod tests;

pub mod config;
pub mod paths;
pub mod record_core;
