pub mod errors;
pub mod event_scheduler;
pub mod execution;
pub mod primitives;
pub mod process;
pub mod types;

#[cfg(test)]
mod tests;
