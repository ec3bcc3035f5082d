//! Data types shared by the grid engine.

mod column;
mod record;
mod response;
mod settings;

pub use column::*;
pub use record::*;
pub use response::*;
pub use settings::*;
