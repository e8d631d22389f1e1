//! # Label Command Protocol
//!
//! This module implements the source side of the label command language:
//! turning raw text into parsed commands and reading their parameters.
//!
//! ## Command Structure
//!
//! ```text
//! ^FO20,30
//! │└┘└───┘
//! │ │   └── parameters (comma-separated)
//! │ └────── two-character code
//! └──────── prefix: ^ (format) or ~ (control)
//! ```
//!
//! ## Submodules
//!
//! - [`command`]: Segmentation and command parsing
//! - [`params`]: Partial-success numeric and flag parsing
//! - [`hex`]: Field hex escapes and hex graphic payloads
//! - [`table`]: The fixed command table

pub mod command;
pub mod hex;
pub mod params;
pub mod table;

pub use command::{Command, Prefix, commands};
pub use params::parse_integers;
pub use table::CommandKind;
