pub mod error;
pub mod parse;
pub mod payload;
pub mod registry;
pub mod run;
pub mod trace;
pub mod validate;
pub mod wasm;
