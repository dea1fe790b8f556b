//! Wire formats spoken by the enumeration plugins.

pub mod dns;
