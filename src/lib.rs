//! A variable-size, page-backed heap allocator.
//!
//! `pagepool` reserves large contiguous memory regions ("pages") from the
//! system allocator in bulk, then sub-allocates variable-length blocks
//! inside them using an intrusive free/used list with inline headers and a
//! worst-fit placement policy. It targets workloads that allocate and free
//! widely varying sizes in a tight loop (asset streaming, frame-scratch
//! buffers) where paying the system allocator's cost and jitter on every
//! request is unacceptable.
//!
//! The allocator is single-writer: `PagePool` is not `Sync`, and sharing one
//! across threads requires an external lock.

mod config;
mod dump;
mod error;
mod header;
mod manager;
mod os;
mod page;
pub mod units;

pub use config::PagePoolConfig;
pub use error::PagePoolError;
pub use manager::PagePool;
