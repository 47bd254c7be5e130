mod health_check;
mod persons;

pub use health_check::health_check;
pub use persons::*;
