pub mod lexer;
pub mod parser;
pub mod types;

pub use parser::{parse, parse_expression};
pub use types::*;
