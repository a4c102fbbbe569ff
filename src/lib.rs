//! secache memoizes the answers of a wear-limited secure element, so asking
//! the same question twice only costs the hardware once. Answers live in a
//! per-user, owner-only directory and are integrity-checked on every read:
//! a corrupted or half-written entry is treated as a miss, never returned.
//!
//! ## Examples
//!
//! Data goes in, data comes out:
//!
//! ```no_run
//! fn main() -> secache::Result<()> {
//!   let cache = secache::Cache::for_current_user(std::env::temp_dir());
//!   secache::put::data(&cache, "k1", "abc")?;
//!   assert_eq!(secache::get::data(&cache, "k1")?, "abc");
//!   Ok(())
//! }
//! ```
//!
//! ### Lookup by input
//!
//! Keys are usually derived from the input itself, either a string or the
//! contents of a file. Both derive the same address from the same bytes:
//!
//! ```no_run
//! fn main() -> secache::Result<()> {
//!   let cache = secache::Cache::for_current_user(std::env::temp_dir());
//!   secache::put::by_string(&cache, "firmware image", "signature")?;
//!   std::fs::write("./image.bin", "firmware image").unwrap();
//!   assert_eq!(secache::get::by_file(&cache, "./image.bin")?, "signature");
//!   Ok(())
//! }
//! ```
//!
//! ### Memoized commands
//!
//! [`exec::run`] puts the cache in front of an external command. On a hit the
//! command never runs:
//!
//! ```no_run
//! use secache::exec::{self, KeySpace};
//!
//! fn main() -> secache::Result<()> {
//!   let cache = secache::Cache::for_current_user(std::env::temp_dir());
//!   let serial = exec::run(&cache, KeySpace::ByString("serial"), "atecc", ["serial"])?;
//!   println!("{}", serial);
//!   Ok(())
//! }
//! ```
//!
//! ## On-disk layout
//!
//! Each record is two files under the cache root: `key_<digest of input>`
//! and `hash_<digest of value>`, both holding the value. The hash-entry is
//! written first, and a key-entry only counts if a hash-entry with identical
//! content exists at the digest of its value. Scratch files are named
//! `temp_*` and never outlive their creator.
#![warn(missing_docs)]
#![allow(clippy::needless_doctest_main)]

mod content;
mod errors;

pub mod cache;
pub mod cli;
pub mod device;
pub mod digest;
pub mod exec;
pub mod get;
pub mod ls;
pub mod put;
pub mod rm;

pub use cache::{Cache, Principal, TempFile};
pub use device::{Device, Oracle};
pub use errors::{Error, Result};
pub use ls::Entry;
