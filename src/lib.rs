//! # dftxml - Streaming Numeric Extraction from DFT Run Reports
//!
//! `dftxml` pulls numeric arrays out of the XML run reports emitted by
//! plane-wave DFT codes (`vasprun.xml` and friends). These files are
//! routinely hundreds of megabytes of `<v>` rows, and general-purpose
//! XML libraries spend most of their time building document structure
//! the analysis never looks at. This crate replaces them with a
//! streaming tokenizer fused to specialized decimal conversion, so a
//! multi-gigabyte report parses in bounded memory at I/O-limited speed.
//!
//! ## Key Features
//!
//! - **Streaming, bounded memory**: Input is consumed in fixed-size
//!   chunks; peak memory is the current token plus the current array,
//!   never the document.
//!
//! - **Fast numeric conversion**: Single-pass integer and float
//!   decoding over raw byte spans, with an exact fast path for the
//!   short literals DFT codes emit and a correctly-rounded fallback
//!   for everything else.
//!
//! - **Declarative array extraction**: Callers declare which elements
//!   hold arrays with predicates over name and attributes; matching
//!   elements yield contiguous `Vec<i64>`/`Vec<f64>` buffers, text in
//!   undeclared elements is skipped without copying.
//!
//! - **Strict failure**: A malformed literal or mismatched tag is a
//!   hard error carrying line, column, and byte offset. No silently
//!   truncated datasets.
//!
//! - **Schema-agnostic**: Nothing about `vasprun.xml` element names is
//!   baked in; the same reader handles any report in the same dialect.
//!
//! ## Quick Start
//!
//! ```rust
//! use dftxml::prelude::*;
//!
//! let report = br#"<modeling>
//!   <calculation>
//!     <varray name="forces">
//!       <v> 0.00123400 -0.00123400  0.00000000 </v>
//!       <v>-0.00123400  0.00123400  0.00000000 </v>
//!     </varray>
//!   </calculation>
//! </modeling>"#;
//!
//! let mut reader = Reader::from_slice(report);
//! reader.declare_array(|name, _| name == "v", ArrayKind::Float);
//!
//! let mut total = 0;
//! while let Some(event) = reader.next_event()? {
//!     if let Event::Array(array) = event {
//!         assert_eq!(array.path.last().map(String::as_str), Some("varray"));
//!         total += array.values.len();
//!     }
//! }
//! assert_eq!(total, 6);
//! # Ok::<(), dftxml::error::ParseError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`tokenizer`]: Pull-based structural scanner over chunked byte
//!   input, yielding borrowed tag and text spans
//! - [`numeric`]: Integer and float conversion over raw byte spans
//! - [`array`]: Whitespace-run splitting and typed array building
//! - [`parser`]: Event reader fusing the above over a context stack
//! - [`error`]: Position-carrying error types

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod array;
pub mod error;
pub mod numeric;
pub mod parser;
pub mod tokenizer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::array::{ArrayKind, ArrayValues};
    pub use crate::error::{NumericError, ParseError, Position};
    pub use crate::numeric::{parse_float, parse_int};
    pub use crate::parser::{
        AttributeSet, CapturedText, Event, Events, NumericArray, Reader,
    };
}
