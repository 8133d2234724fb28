pub use crate::error::{DgResult, Error};
pub use crate::types::{Patch, Timestamp, now};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
