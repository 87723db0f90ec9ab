mod patient;
mod setting;

pub use patient::*;
pub use setting::*;
