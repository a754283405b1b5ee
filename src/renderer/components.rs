use crate::error::Result;
use crate::parser::*;
use crate::renderer::macros::Macro;
use crate::renderer::traits::*;

/// Terminates every rendered row.
pub const ROW_END: &str = "\\\\";

/// Callee name of the fixed-size array constructor.
pub const ARRAY_CONSTRUCTOR: &str = "Array";

/// Callee name that marks a counting loop.
pub const RANGE_FUNCTION: &str = "range";

/// Helper for turning source identifiers into display text
pub struct NameRenderer;

impl NameRenderer {
    /// `merge_sort` -> `Merge-Sort`. Empty segments from leading, trailing or
    /// doubled underscores are dropped.
    pub fn procedure_name(&self, name: &str) -> String {
        name.split('_')
            .filter(|segment| !segment.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Identifier text safe to place inside math mode.
    pub fn identifier(&self, name: &str) -> String {
        name.replace('_', "\\_")
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Helper for literal text: string contents and docstrings
pub struct TextRenderer;

impl TextRenderer {
    /// Escapes the characters LaTeX treats specially in text mode.
    pub fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '\\' => out.push_str("\\textbackslash{}"),
                '{' | '}' | '$' | '&' | '#' | '%' | '_' => {
                    out.push('\\');
                    out.push(c);
                }
                '~' => out.push_str("\\textasciitilde{}"),
                '^' => out.push_str("\\textasciicircum{}"),
                '\n' | '\r' | '\t' => out.push(' '),
                _ => out.push(c),
            }
        }
        out
    }

    /// Docstring as a single comment row: whitespace runs collapse to one
    /// space, so the comment never spans output lines.
    pub fn docstring(&self, context: &RenderContext<'_>, text: &str) -> Result<String> {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(format!(
            "{}{}",
            context.call(Macro::Comment, &[&self.escape(&collapsed)])?,
            ROW_END
        ))
    }
}

/// Helper for inclusive index ranges such as `[1…n]`
pub struct BoundsRenderer;

impl BoundsRenderer {
    /// The two elements of a `(lo, hi)` tuple.
    pub fn pair<'e>(&self, expr: &'e Expr) -> Option<(&'e Expr, &'e Expr)> {
        match expr {
            Expr::Tuple(items) => match items.as_slice() {
                [lo, hi] => Some((lo, hi)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Bounds of an `Array((lo, hi))` annotation.
    pub fn annotation<'e>(&self, expr: &'e Expr) -> Option<(&'e Expr, &'e Expr)> {
        match expr {
            Expr::Call { func, args } if matches!(func.as_ref(), Expr::Name(id) if id == ARRAY_CONSTRUCTOR) => {
                match args.as_slice() {
                    [bounds] => self.pair(bounds),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// `[lo$\dots$hi]`; compound bounds are parenthesized.
    pub fn range(&self, context: &RenderContext<'_>, lo: &Expr, hi: &Expr) -> Result<String> {
        Ok(format!(
            "[{}$\\dots${}]",
            self.bound(context, lo)?,
            self.bound(context, hi)?
        ))
    }

    fn bound(&self, context: &RenderContext<'_>, bound: &Expr) -> Result<String> {
        let rendered = bound.render_expr(context)?;
        Ok(match bound {
            Expr::BinOp { .. } => format!("({})", rendered),
            _ => rendered,
        })
    }
}

/// Constructor names recognized on the right-hand side of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStructure {
    Array,
    DynamicArray,
    Matrix,
    SinglyLinkedList,
    CircularLinkedList,
    DoublyLinkedList,
    Stack,
    Queue,
    Deque,
    BalancedSearchTree,
    HashSet,
    HashMap,
    MinHeap,
    MaxHeap,
}

impl DataStructure {
    pub fn from_constructor(name: &str) -> Option<Self> {
        Some(match name {
            ARRAY_CONSTRUCTOR => DataStructure::Array,
            "List" => DataStructure::DynamicArray,
            "Mat" => DataStructure::Matrix,
            "SLL" => DataStructure::SinglyLinkedList,
            "CSLL" => DataStructure::CircularLinkedList,
            "DLL" => DataStructure::DoublyLinkedList,
            "Stack" => DataStructure::Stack,
            "Queue" => DataStructure::Queue,
            "Deque" => DataStructure::Deque,
            "BST" => DataStructure::BalancedSearchTree,
            "Set" => DataStructure::HashSet,
            "Map" => DataStructure::HashMap,
            "MinHeap" => DataStructure::MinHeap,
            "MaxHeap" => DataStructure::MaxHeap,
            _ => return None,
        })
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DataStructure::Array => "array",
            DataStructure::DynamicArray => "dynamic array",
            DataStructure::Matrix => "2-D matrix",
            DataStructure::SinglyLinkedList => "singly linked list",
            DataStructure::CircularLinkedList => "circular singly linked list",
            DataStructure::DoublyLinkedList => "doubly linked list",
            DataStructure::Stack => "stack",
            DataStructure::Queue => "queue",
            DataStructure::Deque => "deque",
            DataStructure::BalancedSearchTree => "balanced search tree",
            DataStructure::HashSet => "hash set",
            DataStructure::HashMap => "hash map",
            DataStructure::MinHeap => "min-heap",
            DataStructure::MaxHeap => "max-heap",
        }
    }

    pub fn article(self) -> &'static str {
        match self.display_name().chars().next() {
            Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
            _ => "a",
        }
    }
}

/// Binding strength used to decide parentheses around nested arithmetic.
/// Lower binds tighter.
pub fn precedence(op: BinOp) -> Option<u8> {
    match op {
        BinOp::Pow => Some(0),
        BinOp::Mult | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => Some(1),
        BinOp::Add | BinOp::Sub => Some(2),
        _ => None,
    }
}
