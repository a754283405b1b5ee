//! Wraps the rendered pseudocode in whatever surrounding LaTeX a given
//! output mode needs.

use crate::error::Result;
use crate::renderer::{indent, MacroRegistry};
use crate::theme::ColorTheme;

/// Packages the macro bodies and block templates depend on.
pub const PACKAGES: &str = concat!(
    r"\usepackage{amsmath}",
    "\n",
    r"\usepackage{xcolor, colortbl}",
    "\n",
    r"\usepackage{bigstrut}",
    "\n",
    r"\setlength{\parindent}{0pt}",
);

/// Builds the preamble pieces and final documents.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'a> {
    macros: &'a MacroRegistry,
    theme: &'a ColorTheme,
}

impl<'a> Assembler<'a> {
    pub fn new(macros: &'a MacroRegistry, theme: &'a ColorTheme) -> Self {
        Self { macros, theme }
    }

    /// Packages and macro definitions, for pasting into an existing preamble.
    pub fn prelude(&self) -> String {
        format!(
            "% pseudocode packages\n{}\n\n% pseudocode macro definitions\n{}\n",
            PACKAGES,
            self.macros.render()
        )
    }

    /// Color definitions for the selected theme.
    pub fn colors(&self) -> String {
        format!("% pseudocode colors\n{}\n", self.theme)
    }

    /// Pseudocode only, indented from depth 0.
    pub fn bare(&self, body: &str) -> Result<String> {
        indent(body, 0)
    }

    /// A complete, compilable article with the body indented one level
    /// inside the document environment.
    pub fn document(&self, body: &str) -> Result<String> {
        let indented = indent(body, 1)?;
        Ok(format!(
            "\\documentclass[letterpaper]{{article}}\n\n{}\n\n{}\n\n{}\n\n\\begin{{document}}\n{}\\end{{document}}\n",
            PACKAGES,
            self.theme,
            self.macros.render(),
            indented
        ))
    }
}
