pub use application::*;
pub use settings::*;

mod application;
mod settings;
