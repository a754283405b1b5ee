pub mod components;
pub mod indent;
pub mod macros;
pub mod renderer;
pub mod renders;
pub mod traits;

pub use components::*;
pub use indent::indent;
pub use macros::{BlockTemplate, Macro, MacroDefinition, MacroRegistry};
pub use renderer::*;
pub use renders::{render_body, render_statement};
pub use traits::*;
