pub use crate::app::App;
pub use delego_types::prelude::*;

// vim: ts=4
