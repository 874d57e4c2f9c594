//! # permit-core
//!
//! Core types for the permit ledger.
//!
//! This crate provides the types shared by the store and the contract:
//! - Entity structs for permit records and their evidence entries
//! - The permit status enum with its transition table
//! - Caller identity parsing and the `IdentityResolver` collaborator trait
//! - Transaction headers issued by the ledger
//! - Contract events and history entries
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod events;
pub mod history;
pub mod identity;
pub mod tx;
