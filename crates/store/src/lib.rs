pub mod json;

pub use json::{JsonStore, StoreError};
