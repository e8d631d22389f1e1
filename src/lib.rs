//! # Etiqueta - Label Command Language Renderer
//!
//! Etiqueta interprets ZPL-style label source and rasterizes it into a
//! two-tone PNG at the print head's resolution. It provides:
//!
//! - **Protocol**: command tokenizer, parameter parsing, and the command table
//! - **Rendering**: the interpreter, block text layout, graphic primitives,
//!   downloaded graphics, and a `GrayImage` raster surface
//! - **Barcodes**: setup parsing, scaling, and encoding for 1D, PDF417,
//!   QR, and Data Matrix symbols
//! - **Fonts**: the identifier → font file fallback chain
//!
//! ## Quick Start
//!
//! ```no_run
//! use etiqueta::render::{RenderOptions, render};
//!
//! let source = "^XA^FO50,50^A0N,40^FDHello^FS^FO50,120^BCN,80^FD12345^FS^XZ";
//! let result = render(&RenderOptions::new(source).with_size(4.0, 2.0));
//!
//! if let Some(png) = result.image {
//!     std::fs::write("label.png", png)?;
//! }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Tokenizer, parameter helpers, command table |
//! | [`render`] | Interpreter, layout, primitives, graphics, raster surface |
//! | [`barcode`] | Symbologies, setup parameters, encoders |
//! | [`fonts`] | Font map and fallback resolution |
//! | [`printer`] | Print-head resolution presets |
//! | [`error`] | Error types |

pub mod barcode;
pub mod error;
pub mod fonts;
pub mod printer;
pub mod protocol;
pub mod render;

// Re-exports for convenience
pub use error::EtiquetaError;
pub use printer::PrinterConfig;
pub use render::{RenderOptions, RenderResult, Renderer, render};
