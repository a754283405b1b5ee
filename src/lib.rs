//! # pseudotex
//!
//! Converts a small, pseudocode-friendly subset of Python into colored
//! LaTeX pseudocode. Source text is parsed into a syntax tree, the tree is
//! rendered into a flat stream of macro invocations, and the stream is
//! re-indented and wrapped for output.
//!
//! ```no_run
//! use pseudotex::{convert_source, ColorTheme, MacroRegistry};
//! use pseudotex::assembler::Assembler;
//!
//! let macros = MacroRegistry::standard();
//! let body = convert_source("def f(x):\n    return x\n", &macros)?;
//! let document = Assembler::new(&macros, &ColorTheme::DEFAULT).document(&body)?;
//! # Ok::<(), pseudotex::ConvertError>(())
//! ```

use std::fs;
use std::path::Path;

use tracing::debug;

pub mod assembler;
pub mod error;
pub mod parser;
pub mod renderer;
pub mod theme;

#[cfg(test)]
mod tests;

pub use error::{ConvertError, Result, Span};
pub use renderer::{MacroRegistry, PseudocodeRenderer};
pub use theme::ColorTheme;

/// Reads a source file as UTF-8.
pub fn read_source(path: &Path) -> Result<String> {
    let source = fs::read_to_string(path).map_err(|source| ConvertError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = source.len(), "read source");
    Ok(source)
}

/// Renders an already-parsed module to the flat markup stream.
pub fn render_module(module: &parser::Module, macros: &MacroRegistry) -> Result<String> {
    PseudocodeRenderer::new(macros).render(module)
}

/// Parses and renders source text to the flat (not yet indented) stream.
pub fn convert_source(source: &str, macros: &MacroRegistry) -> Result<String> {
    let module = parser::parse(source)?;
    debug!(statements = module.body.len(), "parsed source");
    render_module(&module, macros)
}

pub fn convert_file(path: &Path, macros: &MacroRegistry) -> Result<String> {
    let source = read_source(path)?;
    convert_source(&source, macros)
}
