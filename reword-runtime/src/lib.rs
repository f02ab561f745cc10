//! Per-context runtime for Reword.
//!
//! This crate assembles the lower layers into a working context: a
//! [`Session`] owns the durable store, the MASTER-slot mirror, the live
//! document, and the detection/substitution pipeline, and exposes the
//! interactive API the host UI calls (rule CRUD, quick edit, site
//! blocking, import/export) plus the background loop that keeps every
//! open context converged.

mod error;
mod session;

pub use error::{RuntimeError, RuntimeResult};
pub use session::{Session, SessionConfig};
