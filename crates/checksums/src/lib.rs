#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the digest primitives used to fingerprint compressed
//! output. The compressor feeds every byte it persists into an incremental
//! [`strong::Md5`] so the final hash describes the file exactly as written,
//! independent of how often the output buffer was flushed.
//!
//! # Invariants
//!
//! - Digests are chunking-invariant: splitting the input differently across
//!   [`strong::Md5::update`] calls never changes the result.
//! - Finalisation happens at most once. Repeated calls to
//!   [`strong::Md5::finalize`] return the cached digest without reprocessing
//!   padding.
//!
//! # Examples
//!
//! ```
//! use checksums::strong::Md5;
//!
//! let mut hasher = Md5::new();
//! hasher.update(b"message ");
//! hasher.update(b"digest");
//! assert_eq!(hasher.to_hex_string(false), "f96b697d7cb7938d525a2f31aaf161d0");
//! ```

pub mod strong;

pub use strong::{Md5, to_hex};
