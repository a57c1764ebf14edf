//! Event types serialised for host consumers.
//!
//! All types derive `serde::Serialize` + `serde::Deserialize` so hosts can
//! forward them over whatever IPC surface they expose (event bus, socket,
//! log sink) without redefining the shapes.

pub mod events;
