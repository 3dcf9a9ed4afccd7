// Thin re-export module: implementation lives in `blockchain/core.rs`, split
// into construction (`chain`), verification (`validation`) and the shared
// append target (`state`).

pub mod core;
pub use self::core::*;
