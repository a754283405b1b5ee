use crate::error::Result;
use crate::renderer::macros::{Macro, MacroRegistry};

/// State threaded through one rendering pass.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    macros: &'a MacroRegistry,
    statements: usize,
    depth: usize,
    scope_depth: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(macros: &'a MacroRegistry) -> Self {
        Self {
            macros,
            statements: 0,
            depth: 0,
            scope_depth: 0,
        }
    }

    pub fn macros(&self) -> &'a MacroRegistry {
        self.macros
    }

    /// Invokes a registry macro by identifier.
    pub fn call(&self, mac: Macro, args: &[&str]) -> Result<String> {
        self.macros.call(mac, args)
    }

    /// Statements rendered so far directly in the innermost procedure body.
    pub fn statement_count(&self) -> usize {
        self.statements
    }

    /// Nesting depth of procedure definitions currently being rendered.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// True inside a procedure body or a scope block, where a procedure
    /// block has to close its own row.
    pub fn is_nested(&self) -> bool {
        self.depth > 0 || self.scope_depth > 0
    }

    /// Counts a statement unless it sits inside a nested scope block.
    pub(crate) fn count_statement(&mut self) {
        if self.scope_depth == 0 {
            self.statements += 1;
        }
    }

    pub(crate) fn with_scope<T>(&mut self, render: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scope_depth += 1;
        let result = render(self);
        self.scope_depth -= 1;
        result
    }

    /// Runs `render` with a fresh statement counter and returns what it
    /// produced together with the number of statements it counted. The
    /// enclosing procedure's counter is restored afterwards, on failure too.
    pub(crate) fn with_procedure<T>(
        &mut self,
        render: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<(T, usize)> {
        let saved = std::mem::replace(&mut self.statements, 0);
        let saved_scope = std::mem::replace(&mut self.scope_depth, 0);
        self.depth += 1;
        let result = render(self);
        self.depth -= 1;
        self.scope_depth = saved_scope;
        let counted = std::mem::replace(&mut self.statements, saved);
        result.map(|value| (value, counted))
    }
}

/// Statement-level rendering; may advance the procedure's statement counter.
pub trait Render {
    fn render(&self, context: &mut RenderContext<'_>) -> Result<String>;
}

/// Expression-level rendering; never touches counters.
pub trait RenderExpr {
    fn render_expr(&self, context: &RenderContext<'_>) -> Result<String>;
}
