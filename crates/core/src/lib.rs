//! Core library for memo2epub
//!
//! This crate implements the **Functional Core** of the memo2epub application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! - **`memo2epub_core`** (this crate): content identity and EPUB assembly
//! - **`memo_pdf`**: geometry extraction and layout reconstruction
//! - **`memo2epub`**: argument parsing, file handling and orchestration
//!
//! Functions here take readers and writers rather than paths wherever they
//! can, so tests run against in-memory buffers. [`fingerprint::fingerprint_file`]
//! is the one convenience that opens a file itself.
//!
//! # Module Organization
//!
//! - [`fingerprint`]: SHA-256 content fingerprint used as the book identifier
//! - [`epub`]: EPUB 3 container assembly
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use std::io::Cursor;
//! use memo2epub_core::epub::EpubBook;
//!
//! let book = EpubBook::new("0f3a...", "<p>\nHello\n</p>\n");
//! let mut buffer = Cursor::new(Vec::new());
//! book.write_to(&mut buffer)?;
//! ```

pub mod epub;
pub mod fingerprint;
