//! airlock-assembler: rebuilding a file from frames captured in any order
//!
//! Frames arrive one decoded barcode string at a time, possibly duplicated,
//! reordered, or mixed with unrelated barcodes. The [`Assembler`] keeps one
//! reception session:
//!
//! ```text
//!   Empty ──first valid frame──▶ Collecting ──all `total` indices──▶ Complete
//!     ▲                                                                 │
//!     └────────────── finalize (success or auth failure) / reset ───────┘
//! ```
//!
//! [`SharedAssembler`] serializes access when several capture threads feed
//! the same session.

pub mod assembler;
pub mod shared;

pub use assembler::{Assembler, AssemblyState, Observation, ReceivedFile};
pub use shared::SharedAssembler;
