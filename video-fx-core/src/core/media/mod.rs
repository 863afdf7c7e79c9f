pub use errors::*;

pub mod resume;

mod errors;
