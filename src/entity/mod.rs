//! Entity layer modules.
//!
//! This module groups the immutable-after-construction records the matching
//! core reads: cell lines, categorical attribute terms, and cross-references.

pub mod cell_line;
pub mod term;
pub mod xref;

pub use cell_line::CellLine;
pub use term::{OntologyTerm, TermKind};
pub use xref::CrossReference;
