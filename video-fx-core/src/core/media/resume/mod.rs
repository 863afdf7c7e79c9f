pub use model::*;
pub use service::*;

mod model;
mod service;
