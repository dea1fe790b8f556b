//! Concrete enumeration modes.
//!
//! Each module implements [`burrow_common::plugin::Enumerator`] for one mode.

pub mod dns;
