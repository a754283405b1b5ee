use crate::error::{ConvertError, Result};
use crate::renderer::macros::INDENT_UNIT;

/// Lines opening a block.
pub const BLOCK_BEGIN: &str = "\\begin{";
/// Lines closing a block.
pub const BLOCK_END: &str = "\\end{";

/// Re-indents a rendered stream by block structure, starting at
/// `base_depth`. Existing leading tabs are discarded; a line starting with
/// [`BLOCK_END`] is dedented before it is written and a line starting with
/// [`BLOCK_BEGIN`] indents the lines after it. Blank lines stay empty.
///
/// Fails if a close marker has no matching open marker or if any block is
/// left open at the end.
pub fn indent(text: &str, base_depth: usize) -> Result<String> {
    let mut output = String::with_capacity(text.len() + text.len() / 4);
    let mut depth = base_depth;
    let mut line_number = 0;

    for line in text.lines() {
        line_number += 1;
        let content = line.trim_start_matches('\t');

        if content.starts_with(BLOCK_END) {
            depth = match depth.checked_sub(1) {
                Some(d) if d >= base_depth => d,
                _ => return Err(ConvertError::UnbalancedBlocks { line: line_number }),
            };
        }

        if !content.is_empty() {
            output.push_str(&INDENT_UNIT.repeat(depth));
            output.push_str(content);
        }
        output.push('\n');

        if content.starts_with(BLOCK_BEGIN) {
            depth += 1;
        }
    }

    if depth != base_depth {
        return Err(ConvertError::UnbalancedBlocks { line: line_number });
    }
    Ok(output)
}
