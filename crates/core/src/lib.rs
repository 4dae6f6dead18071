//! Core link logic for Seclink.
//!
//! This crate contains the issuance/redemption pipeline with ZERO web
//! dependencies. The HTTP layer in `seclink-api` drives it.
//!
//! # Modules
//!
//! - `crypto` - Key derivation, token encryption, URL signing
//! - `link` - Payload model, link issuer, redemption-side validation
//! - `storage` - Named-disk registry over OpenDAL with streaming reads

pub mod crypto;
pub mod link;
pub mod storage;
