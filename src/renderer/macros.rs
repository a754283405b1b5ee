//! Named, arity-checked LaTeX templates and the two block environments the
//! tree renderer emits through.
//!
//! A command invocation is `\name{arg1}{arg2}`; a zero-argument command is
//! invoked as `\name{}` so every invocation ends with a brace. Commands whose
//! natural name collides with a TeX primitive (`\if`, `\or`, `\null`, ...)
//! are *mangled*: their internal name is `c` followed by the title-cased
//! name, e.g. `\cIf`.

use std::collections::HashMap;
use std::fmt;

use crate::error::{ConvertError, Result};

/// Largest arity a command may declare.
pub const MAX_ARITY: usize = 3;

/// Prefix applied to every line of a block body.
pub const INDENT_UNIT: &str = "\t";

/// Stable identifiers for every macro the renderer invokes. The display text
/// lives in the registry, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Macro {
    Comment,
    Func,
    Method,
    Var,
    Con,
    Type,
    Op,
    Str,
    Num,
    LineNo,
    Gets,
    True,
    False,
    Null,
    Not,
    And,
    Or,
    Return,
    Break,
    Continue,
    Todo,
    While,
    If,
    Elif,
    Else,
    For,
    ForInc,
    ForDown,
    ForDec,
    ForChild,
    Print,
    Create,
    Gutter,
}

impl Macro {
    pub fn name(self) -> &'static str {
        match self {
            Macro::Comment => "comment",
            Macro::Func => "func",
            Macro::Method => "method",
            Macro::Var => "var",
            Macro::Con => "con",
            Macro::Type => "type",
            Macro::Op => "op",
            Macro::Str => "str",
            Macro::Num => "num",
            Macro::LineNo => "lineno",
            Macro::Gets => "gets",
            Macro::True => "true",
            Macro::False => "false",
            Macro::Null => "null",
            Macro::Not => "not",
            Macro::And => "and",
            Macro::Or => "or",
            Macro::Return => "return",
            Macro::Break => "break",
            Macro::Continue => "continue",
            Macro::Todo => "todo",
            Macro::While => "while",
            Macro::If => "if",
            Macro::Elif => "elif",
            Macro::Else => "else",
            Macro::For => "for",
            Macro::ForInc => "forinc",
            Macro::ForDown => "fordown",
            Macro::ForDec => "fordec",
            Macro::ForChild => "forchild",
            Macro::Print => "print",
            Macro::Create => "create",
            Macro::Gutter => "gutter",
        }
    }
}

/// One `\newcommand`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    name: String,
    internal_name: String,
    arity: usize,
    body: String,
}

impl MacroDefinition {
    pub fn new(name: &str, body: &str, arity: usize, mangle: bool) -> Result<Self> {
        if arity > MAX_ARITY {
            return Err(ConvertError::ArityMismatch {
                name: name.to_string(),
                expected: MAX_ARITY,
                got: arity,
            });
        }
        Ok(Self::build(name, body, arity, mangle))
    }

    fn build(name: &str, body: &str, arity: usize, mangle: bool) -> Self {
        let internal_name = if mangle {
            format!("c{}", title_case(name))
        } else {
            name.to_string()
        };
        MacroDefinition {
            name: name.to_string(),
            internal_name,
            arity,
            body: body.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Expands to an invocation, rejecting the wrong number of arguments
    /// before any text is produced.
    pub fn invoke(&self, args: &[&str]) -> Result<String> {
        if args.len() != self.arity {
            return Err(ConvertError::ArityMismatch {
                name: self.name.clone(),
                expected: self.arity,
                got: args.len(),
            });
        }
        let mut out = format!("\\{}", self.internal_name);
        if args.is_empty() {
            out.push_str("{}");
        }
        for arg in args {
            out.push('{');
            out.push_str(arg);
            out.push('}');
        }
        Ok(out)
    }
}

impl fmt::Display for MacroDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\\newcommand{{\\{}}}[{}]{{{}}}",
            self.internal_name, self.arity, self.body
        )
    }
}

/// One `\newenvironment` wrapping a multi-line body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    name: String,
    begin: String,
    end: String,
    arity: usize,
}

impl BlockTemplate {
    pub fn new(name: &str, begin: &str, end: &str, arity: usize) -> Self {
        BlockTemplate {
            name: name.to_string(),
            begin: begin.to_string(),
            end: end.to_string(),
            arity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Wraps `body` between the begin and end lines. Every body line gets one
    /// leading indent unit.
    pub fn invoke(&self, header: &[&str], body: &str) -> Result<String> {
        if header.len() != self.arity {
            return Err(ConvertError::ArityMismatch {
                name: self.name.clone(),
                expected: self.arity,
                got: header.len(),
            });
        }

        let mut out = format!("\\begin{{{}}}", self.name);
        for arg in header {
            out.push('{');
            out.push_str(arg);
            out.push('}');
        }
        out.push('\n');
        for line in body.lines() {
            if !line.is_empty() {
                out.push_str(INDENT_UNIT);
                out.push_str(line);
            }
            out.push('\n');
        }
        out.push_str(&format!("\\end{{{}}}", self.name));
        Ok(out)
    }
}

impl fmt::Display for BlockTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\\newenvironment{{{}}}[{}]{{%\n\t{}\n}}{{%\n\t{}\n}}%",
            self.name, self.arity, self.begin, self.end
        )
    }
}

/// Ordered set of command definitions plus the scope and procedure blocks.
#[derive(Debug, Clone)]
pub struct MacroRegistry {
    macros: Vec<MacroDefinition>,
    index: HashMap<String, usize>,
    scope: BlockTemplate,
    procedure: BlockTemplate,
}

impl MacroRegistry {
    /// An empty registry. `procedure` must take the name and parameter list.
    pub fn new(scope: BlockTemplate, procedure: BlockTemplate) -> Result<Self> {
        if scope.arity() != 0 {
            return Err(ConvertError::ArityMismatch {
                name: scope.name().to_string(),
                expected: 0,
                got: scope.arity(),
            });
        }
        if procedure.arity() != 2 {
            return Err(ConvertError::ArityMismatch {
                name: procedure.name().to_string(),
                expected: 2,
                got: procedure.arity(),
            });
        }
        Ok(MacroRegistry {
            macros: Vec::new(),
            index: HashMap::new(),
            scope,
            procedure,
        })
    }

    /// Registers a command. Redefining a name replaces it in place, keeping
    /// its original declaration position.
    pub fn define(&mut self, name: &str, body: &str, arity: usize, mangle: bool) -> Result<()> {
        let definition = MacroDefinition::new(name, body, arity, mangle)?;
        match self.index.get(name) {
            Some(&slot) => self.macros[slot] = definition,
            None => {
                self.index.insert(name.to_string(), self.macros.len());
                self.macros.push(definition);
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MacroDefinition> {
        self.index.get(name).map(|&slot| &self.macros[slot])
    }

    pub fn invoke(&self, name: &str, args: &[&str]) -> Result<String> {
        self.get(name)
            .ok_or_else(|| ConvertError::UnknownMacro(name.to_string()))?
            .invoke(args)
    }

    pub fn call(&self, mac: Macro, args: &[&str]) -> Result<String> {
        self.invoke(mac.name(), args)
    }

    pub fn scope(&self) -> &BlockTemplate {
        &self.scope
    }

    pub fn procedure(&self) -> &BlockTemplate {
        &self.procedure
    }

    pub fn definitions(&self) -> impl Iterator<Item = &MacroDefinition> {
        self.macros.iter()
    }

    /// Every definition in declaration order, then the two environments.
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = self.macros.iter().map(ToString::to_string).collect();
        lines.push(self.scope.to_string());
        lines.push(self.procedure.to_string());
        lines.join("\n")
    }

    /// The macro set the tree renderer is written against.
    pub fn standard() -> Self {
        let scope = BlockTemplate::new(
            "scope",
            r"\begin{tabular}{!{\color{laddercolor}\vline}@{\hskip 1em}l}%",
            r"\end{tabular}%",
            0,
        );
        let procedure = BlockTemplate::new(
            "pseudocode",
            concat!(
                r"\noindent\begin{tabular}[t]{|>{\columncolor{funcbodybgcolor}\color{textcolor}}l|}%",
                "\n\t",
                r"\hline%",
                "\n\t",
                r"\bigstrut[t]\cellcolor{funcnamebgcolor}\textcolor{funcnamecolor}{\textsc{#1}}(#2)\\%",
                "\n\t",
                r"\hline%",
                "\n\t",
                r"\bigstrut[t]%",
            ),
            concat!(r"\hline%", "\n\t", r"\end{tabular}%"),
            2,
        );

        let macros: Vec<MacroDefinition> = STANDARD_MACROS
            .iter()
            .map(|(name, body, arity, mangle)| MacroDefinition::build(name, body, *arity, *mangle))
            .collect();
        let index = macros
            .iter()
            .enumerate()
            .map(|(slot, definition)| (definition.name.clone(), slot))
            .collect();

        MacroRegistry {
            macros,
            index,
            scope,
            procedure,
        }
    }
}

impl Default for MacroRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// (name, body, arity, mangle) in declaration order.
const STANDARD_MACROS: &[(&str, &str, usize, bool)] = &[
    ("comment", r"\textcolor{red}{// #1}", 1, false),
    ("func", r"\textcolor{funcnamecolor}{\textsc{#1}}", 1, false),
    ("method", r"\textcolor{funcnamecolor}{#1}", 1, false),
    ("var", r"\textcolor{varcolor}{$#1$}", 1, false),
    ("con", r"\textcolor{controlcolor}{\textbf{#1}}", 1, false),
    ("type", r"\textcolor{classcolor}{#1}", 1, false),
    ("op", r"\textcolor{bluewordcolor}{#1}", 1, false),
    ("str", r"\textcolor{stringcolor}{``#1''}", 1, false),
    ("num", r"\textcolor{numbercolor}{#1}", 1, false),
    ("lineno", r"\textcolor{laddercolor}{\footnotesize #1}", 1, false),
    ("gets", r"$\leftarrow$", 0, true),
    ("true", r"\op{$true$}", 0, false),
    ("false", r"\op{$false$}", 0, false),
    ("null", r"\op{$null$}", 0, true),
    ("not", r"\op{not}", 0, true),
    ("and", r"\op{and}", 0, true),
    ("or", r"\op{or}", 0, true),
    ("return", r"\con{return}", 0, false),
    ("break", r"\con{break}", 0, true),
    ("continue", r"\con{continue}", 0, false),
    ("todo", r"\textcolor{red}{\textbf{TODO}}", 0, true),
    ("while", r"\con{while} #1 \con{do}", 1, false),
    ("if", r"\con{if} #1 \con{then}", 1, true),
    ("elif", r"\con{else if} #1 \con{then}", 1, true),
    ("else", r"\con{else}", 0, true),
    ("for", r"\con{for} #1 \con{to} #2 \con{do}", 2, false),
    ("forinc", r"\con{for} #1 \con{to} #2 \con{increment} #3 \con{do}", 3, false),
    ("fordown", r"\con{for} #1 \con{down to} #2 \con{do}", 2, false),
    ("fordec", r"\con{for} #1 \con{down to} #2 \con{decrement} #3 \con{do}", 3, false),
    ("forchild", r"\con{for each} \op{child} #1 \con{of} #2 \op{node} \con{do}", 2, false),
    ("print", r"\con{print} #1", 1, false),
    ("create", r"\op{Create #1} \type{#2} #3", 3, false),
    (
        "gutter",
        r"\begin{tabular}[t]{@{}r@{\hskip 0.5em}}\bigstrut[t]\\\bigstrut[t]#1\end{tabular}",
        1,
        false,
    ),
];

/// `null` -> `Null`.
fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
