pub mod ai;
pub mod calculators;
pub mod engine;
pub mod runner;
pub mod selection;
pub mod state;

#[cfg(test)]
pub(crate) mod tests;
