//! Foundation types shared by every pipeline stage.
//!
//! This module provides source coordinates:
//! - [`ParseLocation`] - line/column position recorded by the textformat parser
//! - [`Span`] - a half-open byte range within a source buffer
//!
//! This module has NO dependencies on other crate modules.

mod position;

pub use position::{ParseLocation, Span};
