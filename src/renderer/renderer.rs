use tracing::debug;

use crate::error::Result;
use crate::parser::*;
use crate::renderer::macros::MacroRegistry;
use crate::renderer::renders::render_statement;
use crate::renderer::traits::*;

/// Renders a whole parsed module into the flat (unindented) markup stream.
pub struct PseudocodeRenderer<'a> {
    macros: &'a MacroRegistry,
}

impl<'a> PseudocodeRenderer<'a> {
    pub fn new(macros: &'a MacroRegistry) -> Self {
        Self { macros }
    }

    pub fn render(&self, module: &Module) -> Result<String> {
        let mut output = String::new();
        let mut context = RenderContext::new(self.macros);

        for stmt in &module.body {
            let fragment = render_statement(&mut context, stmt)?;
            if fragment.is_empty() {
                continue;
            }
            output.push_str(&fragment);
            output.push('\n');

            // A blank line ends the paragraph so each procedure gets its own row.
            if matches!(stmt, Stmt::FunctionDef(_)) {
                output.push('\n');
            }
        }

        debug!(
            statements = module.body.len(),
            bytes = output.len(),
            "rendered module"
        );
        Ok(output)
    }
}
