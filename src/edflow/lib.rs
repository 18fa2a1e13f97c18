//! # Edflow Architecture
//!
//! Edflow keeps two **ordered, user-editable collections** for an editorial
//! workflow: custom statuses and metadata fields. The storage engine
//! underneath only knows terms with a name, a slug and one free-text
//! description. Everything else (position, type, flags, storage key) is packed
//! into that description.
//!
//! Like any library with a CLI client, the core knows nothing about terminals.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, installs the logger    │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Trims names, strips tags, derives slugs, parses ids      │
//! │  - Returns CmdResult / ErrorResponse                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Registry (registry.rs + validation, cache, codec)          │
//! │  - Ordering, renumbering, reorder                           │
//! │  - Validation before every identity write                   │
//! │  - Per-kind cache, invalidated on every write               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - TermStore + ValueStore traits                            │
//! │  - File stores (production), memory stores (testing)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Testing Strategy
//!
//! 1. **Registry** and its helpers: unit tests against the memory stores,
//!    which count writes and can be told to fail.
//! 2. **API**: input normalization and result shapes.
//! 3. **CLI**: end-to-end runs of the binary in `tests/`.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`registry`]: Ordered CRUD over one collection per kind
//! - [`codec`]: Packs attributes into a term description and back
//! - [`cache`]: Decoded, ordered collections per kind
//! - [`validation`]: Naming policy checks, slugs, text sanitizing
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Core data types (`Record`, `Kind`, `MetadataType`)
//! - [`defaults`]: Stock statuses and fields
//! - [`config`]: Configuration management
//! - [`init`]: Data directory resolution and wiring
//! - [`error`]: Error types

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod defaults;
pub mod error;
pub mod init;
pub mod model;
pub mod registry;
pub mod store;
pub mod validation;
