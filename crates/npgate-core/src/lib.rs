pub mod audit;
pub mod config;
pub mod document;
pub mod error;
pub mod gate;
pub mod ghost;
pub mod io;
pub mod paths;
pub mod taxonomy;
pub mod types;
pub mod validator;

#[cfg(test)]
mod test_fixtures;

pub use error::{GateError, Result};
