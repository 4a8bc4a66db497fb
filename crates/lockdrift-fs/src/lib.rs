//! Read-only, async filesystem abstraction for lockdrift.
//!
//! Lockfiles, manifests and workspace configuration are all read through the
//! [`FileSystem`] trait so the same loading code runs against the real disk
//! ([`NativeFileSystem`]) or against pre-loaded contents ([`MemoryFileSystem`]).
//!
//! # Example
//!
//! ```no_run
//! use lockdrift_fs::{FileSystem, NativeFileSystem};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! let fs = NativeFileSystem::new(".")?;
//! if fs.exists(Path::new("pnpm-lock.yaml")).await? {
//!     let contents = fs.read_to_string(Path::new("pnpm-lock.yaml")).await?;
//!     println!("{} bytes", contents.len());
//! }
//! # Ok(())
//! # }
//! ```

mod file_system;
pub use file_system::FileSystem;

pub mod memory;
pub use memory::MemoryFileSystem;

#[cfg(feature = "native")]
pub mod native;
#[cfg(feature = "native")]
pub use native::NativeFileSystem;

#[cfg(feature = "native")]
pub use NativeFileSystem as DefaultFileSystem;

#[cfg(not(feature = "native"))]
pub use MemoryFileSystem as DefaultFileSystem;
