//! # Domain Models
//!
//! Pure data types shared by every Spire crate: the application configuration tree
//! and the media types used on the wire. Dependencies stay at `serde` and `serde_json`.
//! No I/O, networking, or validation lives here; the kernel validates these models at startup.

pub mod config;
pub mod media;
