//! Fast numeric-text conversion
//!
//! Run reports are dominated by whitespace-separated decimal literals, so
//! the cost of the platform's general-purpose conversion routines is the
//! cost of the whole parse. These routines convert a bounded byte span
//! known to hold exactly one literal, with no allocation, no locale
//! lookups, and a single linear pass.
//!
//! Both functions are pure: the same span always yields the same output
//! or the same error, and there is no shared scratch state, so parsers
//! running on independent files never contend.

mod float;
mod int;

pub use float::parse_float;
pub use int::parse_int;
