use crate::error::{ConvertError, Result, Span};
use crate::parser::lexer::{tokenize, Token, TokenKind};
use crate::parser::types::*;

/// Python keywords outside the supported subset. They can never be
/// identifiers, so seeing one is always an unsupported construct.
const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "class", "try", "except", "finally", "with", "raise", "assert", "del", "global",
    "nonlocal", "lambda", "yield", "async", "await",
];

/// Parse a complete source file.
pub fn parse(source: &str) -> Result<Module> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_module()
}

/// Parse a single expression, e.g. one f-string field.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let tokens = tokenize(source.trim())?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_testlist()?;
    while parser.eat(&TokenKind::Newline) {}
    if !parser.check(&TokenKind::Eof) {
        return Err(parser.unexpected("end of expression"));
    }
    Ok(expr)
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    pub fn parse_module(&mut self) -> Result<Module> {
        let mut body = Vec::new();
        while !self.check(&TokenKind::Eof) {
            if self.eat(&TokenKind::Newline) {
                continue;
            }
            body.extend(self.parse_statement()?);
        }
        Ok(Module { body })
    }

    // ---- token helpers ----

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.kind() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<String> {
        match self.kind().clone() {
            TokenKind::Name(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn error(&self, message: impl Into<String>) -> ConvertError {
        ConvertError::syntax(self.span(), message)
    }

    fn unexpected(&self, what: &str) -> ConvertError {
        self.error(format!("expected {}, found {}", what, describe(self.kind())))
    }

    fn unsupported_keyword(&self) -> Option<ConvertError> {
        match self.kind() {
            TokenKind::Name(name) if UNSUPPORTED_KEYWORDS.contains(&name.as_str()) => {
                Some(self.error(format!("'{}' is not supported", name)))
            }
            _ => None,
        }
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> Result<Vec<Stmt>> {
        if let Some(err) = self.unsupported_keyword() {
            return Err(err);
        }
        match self.kind() {
            TokenKind::Def => Ok(vec![Stmt::FunctionDef(self.parse_function_def()?)]),
            TokenKind::If => Ok(vec![self.parse_if()?]),
            TokenKind::While => Ok(vec![self.parse_while()?]),
            TokenKind::For => Ok(vec![self.parse_for()?]),
            TokenKind::At => Err(self.error("decorators are not supported")),
            TokenKind::Indent => Err(self.error("unexpected indent")),
            _ => self.parse_simple_line(),
        }
    }

    /// One physical line of `;`-separated small statements.
    fn parse_simple_line(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = vec![self.parse_small_statement()?];
        while self.eat(&TokenKind::Semicolon) {
            if self.check(&TokenKind::Newline) {
                break;
            }
            stmts.push(self.parse_small_statement()?);
        }
        self.expect(TokenKind::Newline, "end of line")?;
        Ok(stmts)
    }

    fn parse_small_statement(&mut self) -> Result<Stmt> {
        if let Some(err) = self.unsupported_keyword() {
            return Err(err);
        }
        match self.kind() {
            TokenKind::Pass => {
                self.advance();
                Ok(Stmt::Pass)
            }
            TokenKind::Break => {
                self.advance();
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.advance();
                Ok(Stmt::Continue)
            }
            TokenKind::Return => {
                self.advance();
                if matches!(self.kind(), TokenKind::Newline | TokenKind::Semicolon) {
                    Ok(Stmt::Return(None))
                } else {
                    Ok(Stmt::Return(Some(self.parse_testlist()?)))
                }
            }
            TokenKind::Import => {
                self.advance();
                let mut names = vec![self.parse_import_name()?];
                while self.eat(&TokenKind::Comma) {
                    names.push(self.parse_import_name()?);
                }
                Ok(Stmt::Import(names))
            }
            TokenKind::From => self.parse_from_import(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_dotted_name(&mut self) -> Result<String> {
        let mut name = self.expect_name("module name")?;
        while self.eat(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_name("module name")?);
        }
        Ok(name)
    }

    fn parse_import_name(&mut self) -> Result<String> {
        let name = self.parse_dotted_name()?;
        if self.eat(&TokenKind::As) {
            self.expect_name("alias")?;
        }
        Ok(name)
    }

    fn parse_from_import(&mut self) -> Result<Stmt> {
        self.advance();
        let module = self.parse_dotted_name()?;
        self.expect(TokenKind::Import, "'import'")?;

        if self.eat(&TokenKind::Star) {
            return Ok(Stmt::Import(vec![format!("{}.*", module)]));
        }

        let parenthesized = self.eat(&TokenKind::LParen);
        let mut names = Vec::new();
        loop {
            let name = self.expect_name("imported name")?;
            if self.eat(&TokenKind::As) {
                self.expect_name("alias")?;
            }
            names.push(format!("{}.{}", module, name));
            if !self.eat(&TokenKind::Comma) || (parenthesized && self.check(&TokenKind::RParen)) {
                break;
            }
        }
        if parenthesized {
            self.expect(TokenKind::RParen, "')'")?;
        }
        Ok(Stmt::Import(names))
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt> {
        let span = self.span();
        let first = self.parse_testlist()?;

        match self.kind().clone() {
            TokenKind::AugAssign(op) => {
                self.advance();
                check_assignable(&first, span)?;
                if matches!(first, Expr::Tuple(_) | Expr::List(_)) {
                    return Err(ConvertError::syntax(
                        span,
                        "augmented assignment needs a single target",
                    ));
                }
                let value = self.parse_testlist()?;
                Ok(Stmt::AugAssign {
                    target: first,
                    op,
                    value,
                })
            }
            TokenKind::Colon => {
                self.advance();
                if !matches!(
                    first,
                    Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. }
                ) {
                    return Err(ConvertError::syntax(
                        span,
                        format!("cannot annotate a {}", first.kind_name()),
                    ));
                }
                let annotation = self.parse_test()?;
                let value = if self.eat(&TokenKind::Assign) {
                    Some(self.parse_testlist()?)
                } else {
                    None
                };
                Ok(Stmt::AnnAssign {
                    target: first,
                    annotation,
                    value,
                })
            }
            TokenKind::Assign => {
                let mut exprs = vec![first];
                while self.eat(&TokenKind::Assign) {
                    exprs.push(self.parse_testlist()?);
                }
                let value = exprs.pop().ok_or_else(|| self.unexpected("expression"))?;
                for target in &exprs {
                    check_assignable(target, span)?;
                }
                Ok(Stmt::Assign {
                    targets: exprs,
                    value,
                })
            }
            TokenKind::Walrus => Err(self.error("assignment expressions are not supported")),
            _ => Ok(Stmt::Expr(first)),
        }
    }

    fn parse_function_def(&mut self) -> Result<FunctionDef> {
        self.expect(TokenKind::Def, "'def'")?;
        let name = self.expect_name("function name")?;
        self.expect(TokenKind::LParen, "'('")?;

        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            if matches!(self.kind(), TokenKind::Star | TokenKind::DoubleStar | TokenKind::Slash) {
                return Err(self.error("only plain positional parameters are supported"));
            }
            let param = self.expect_name("parameter name")?;
            let annotation = if self.eat(&TokenKind::Colon) {
                Some(self.parse_test()?)
            } else {
                None
            };
            if self.check(&TokenKind::Assign) {
                return Err(self.error("default parameter values are not supported"));
            }
            params.push(Param {
                name: param,
                annotation,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        let returns = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_test()?)
        } else {
            None
        };
        self.expect(TokenKind::Colon, "':'")?;
        let body = self.parse_suite()?;

        Ok(FunctionDef {
            name,
            params,
            returns,
            body,
        })
    }

    /// Either an indented block or statements on the same line as the colon.
    fn parse_suite(&mut self) -> Result<Vec<Stmt>> {
        if !self.eat(&TokenKind::Newline) {
            return self.parse_simple_line();
        }
        self.expect(TokenKind::Indent, "an indented block")?;
        let mut body = Vec::new();
        while !matches!(self.kind(), TokenKind::Dedent | TokenKind::Eof) {
            body.extend(self.parse_statement()?);
        }
        self.expect(TokenKind::Dedent, "end of block")?;
        Ok(body)
    }

    /// Handles `if` and, recursively, each `elif` as a nested `If` in `orelse`.
    fn parse_if(&mut self) -> Result<Stmt> {
        self.advance();
        let test = self.parse_test()?;
        self.expect(TokenKind::Colon, "':'")?;
        let body = self.parse_suite()?;

        let orelse = match self.kind() {
            TokenKind::Elif => vec![self.parse_if()?],
            TokenKind::Else => {
                self.advance();
                self.expect(TokenKind::Colon, "':'")?;
                self.parse_suite()?
            }
            _ => Vec::new(),
        };

        Ok(Stmt::If { test, body, orelse })
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        self.advance();
        let test = self.parse_test()?;
        self.expect(TokenKind::Colon, "':'")?;
        let body = self.parse_suite()?;
        if self.check(&TokenKind::Else) {
            return Err(self.error("'while ... else' is not supported"));
        }
        Ok(Stmt::While { test, body })
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        self.advance();
        let span = self.span();
        let first = self.parse_bit_or()?;
        let target = if self.check(&TokenKind::Comma) {
            let mut items = vec![first];
            while self.eat(&TokenKind::Comma) {
                if self.check(&TokenKind::In) {
                    break;
                }
                items.push(self.parse_bit_or()?);
            }
            Expr::Tuple(items)
        } else {
            first
        };
        check_assignable(&target, span)?;

        self.expect(TokenKind::In, "'in'")?;
        let iter = self.parse_testlist()?;
        self.expect(TokenKind::Colon, "':'")?;
        let body = self.parse_suite()?;
        if self.check(&TokenKind::Else) {
            return Err(self.error("'for ... else' is not supported"));
        }
        Ok(Stmt::For { target, iter, body })
    }

    // ---- expressions ----

    fn ends_testlist(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::Semicolon
                | TokenKind::Assign
                | TokenKind::AugAssign(_)
                | TokenKind::Colon
                | TokenKind::RParen
                | TokenKind::RBracket
        )
    }

    /// Comma-separated expressions; more than one (or a trailing comma) makes a tuple.
    pub fn parse_testlist(&mut self) -> Result<Expr> {
        let first = self.parse_test()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.ends_testlist() {
                break;
            }
            items.push(self.parse_test()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_test(&mut self) -> Result<Expr> {
        let body = self.parse_or_test()?;
        if !self.eat(&TokenKind::If) {
            return Ok(body);
        }
        let test = self.parse_or_test()?;
        self.expect(TokenKind::Else, "'else' in conditional expression")?;
        let orelse = self.parse_test()?;
        Ok(Expr::IfExp {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn parse_or_test(&mut self) -> Result<Expr> {
        let first = self.parse_and_test()?;
        if !self.check(&TokenKind::Or) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(&TokenKind::Or) {
            values.push(self.parse_and_test()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::Or,
            values,
        })
    }

    fn parse_and_test(&mut self) -> Result<Expr> {
        let first = self.parse_not_test()?;
        if !self.check(&TokenKind::And) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(&TokenKind::And) {
            values.push(self.parse_not_test()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::And,
            values,
        })
    }

    fn parse_not_test(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::Not) {
            let operand = self.parse_not_test()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_bit_or()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();

        loop {
            let op = match self.kind() {
                TokenKind::EqEq => CmpOp::Eq,
                TokenKind::NotEq => CmpOp::NotEq,
                TokenKind::Lt => CmpOp::Lt,
                TokenKind::Le => CmpOp::LtE,
                TokenKind::Gt => CmpOp::Gt,
                TokenKind::Ge => CmpOp::GtE,
                TokenKind::In => CmpOp::In,
                TokenKind::Not if self.peek_kind(1) == Some(&TokenKind::In) => {
                    self.advance();
                    CmpOp::NotIn
                }
                TokenKind::Is if self.peek_kind(1) == Some(&TokenKind::Not) => {
                    self.advance();
                    CmpOp::IsNot
                }
                TokenKind::Is => CmpOp::Is,
                _ => break,
            };
            self.advance();
            ops.push(op);
            comparators.push(self.parse_bit_or()?);
        }

        if ops.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                ops,
                comparators,
            })
        }
    }

    /// Left-associative binary level: `next (op next)*`.
    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr>,
        op_for: fn(&TokenKind) -> Option<BinOp>,
    ) -> Result<Expr> {
        let mut left = next(self)?;
        while let Some(op) = op_for(self.kind()) {
            self.advance();
            let right = next(self)?;
            left = Expr::binop(left, op, right);
        }
        Ok(left)
    }

    fn parse_bit_or(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_bit_xor, |k| {
            (*k == TokenKind::Pipe).then_some(BinOp::BitOr)
        })
    }

    fn parse_bit_xor(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_bit_and, |k| {
            (*k == TokenKind::Caret).then_some(BinOp::BitXor)
        })
    }

    fn parse_bit_and(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_shift, |k| {
            (*k == TokenKind::Amp).then_some(BinOp::BitAnd)
        })
    }

    fn parse_shift(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_arith, |k| match k {
            TokenKind::LShift => Some(BinOp::LShift),
            TokenKind::RShift => Some(BinOp::RShift),
            _ => None,
        })
    }

    fn parse_arith(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_term, |k| match k {
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    fn parse_term(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_factor, |k| match k {
            TokenKind::Star => Some(BinOp::Mult),
            TokenKind::Slash => Some(BinOp::Div),
            TokenKind::DoubleSlash => Some(BinOp::FloorDiv),
            TokenKind::Percent => Some(BinOp::Mod),
            TokenKind::At => Some(BinOp::MatMult),
            _ => None,
        })
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        let op = match self.kind() {
            TokenKind::Plus => UnaryOp::UAdd,
            TokenKind::Minus => UnaryOp::USub,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_factor()?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    /// `**` binds tighter than unary minus on its left and is right-associative.
    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_atom_expr()?;
        if self.eat(&TokenKind::DoubleStar) {
            let exponent = self.parse_factor()?;
            return Ok(Expr::binop(base, BinOp::Pow, exponent));
        }
        Ok(base)
    }

    fn parse_atom_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_subscript()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let attr = self.expect_name("attribute name")?;
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        attr,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            if matches!(self.kind(), TokenKind::Star | TokenKind::DoubleStar) {
                return Err(self.error("starred arguments are not supported"));
            }
            if matches!(self.kind(), TokenKind::Name(_))
                && self.peek_kind(1) == Some(&TokenKind::Assign)
            {
                return Err(self.error("keyword arguments are not supported"));
            }
            args.push(self.parse_test()?);
            if self.check(&TokenKind::For) {
                return Err(self.error("generator expressions are not supported"));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }

    fn parse_subscript(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Colon) {
            return Err(self.error("slices are not supported"));
        }
        let first = self.parse_test()?;
        let index = if self.check(&TokenKind::Comma) {
            let mut items = vec![first];
            while self.eat(&TokenKind::Comma) {
                if self.check(&TokenKind::RBracket) {
                    break;
                }
                items.push(self.parse_test()?);
            }
            Expr::Tuple(items)
        } else {
            first
        };
        if self.check(&TokenKind::Colon) {
            return Err(self.error("slices are not supported"));
        }
        Ok(index)
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        if let Some(err) = self.unsupported_keyword() {
            return Err(err);
        }
        let token = self.current().clone();
        match token.kind {
            TokenKind::LParen => {
                self.advance();
                if self.eat(&TokenKind::RParen) {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let first = self.parse_test()?;
                if self.check(&TokenKind::For) {
                    return Err(self.error("generator expressions are not supported"));
                }
                if !self.check(&TokenKind::Comma) {
                    self.expect(TokenKind::RParen, "')'")?;
                    return Ok(first);
                }
                let mut items = vec![first];
                while self.eat(&TokenKind::Comma) {
                    if self.check(&TokenKind::RParen) {
                        break;
                    }
                    items.push(self.parse_test()?);
                }
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Tuple(items))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(&TokenKind::RBracket) {
                    items.push(self.parse_test()?);
                    if self.check(&TokenKind::For) {
                        return Err(self.error("list comprehensions are not supported"));
                    }
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Expr::List(items))
            }
            TokenKind::LBrace => Err(self.error("dict and set displays are not supported")),
            TokenKind::Name(name) => {
                self.advance();
                Ok(Expr::Name(name))
            }
            TokenKind::Int(text) => {
                self.advance();
                Ok(Expr::Constant(Constant::Int(text)))
            }
            TokenKind::Float(text) => {
                self.advance();
                Ok(Expr::Constant(Constant::Float(text)))
            }
            TokenKind::Imaginary(text) => {
                self.advance();
                Ok(Expr::Constant(Constant::Imaginary(text)))
            }
            TokenKind::Str(_) | TokenKind::FStr(_) | TokenKind::Bytes(_) => self.parse_strings(),
            TokenKind::True => {
                self.advance();
                Ok(Expr::Constant(Constant::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Constant(Constant::Bool(false)))
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::Constant(Constant::None))
            }
            TokenKind::Ellipsis => {
                self.advance();
                Ok(Expr::Constant(Constant::Ellipsis))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Adjacent string literals concatenate, as in Python.
    fn parse_strings(&mut self) -> Result<Expr> {
        let span = self.span();
        let mut pieces = Vec::new();
        while matches!(
            self.kind(),
            TokenKind::Str(_) | TokenKind::FStr(_) | TokenKind::Bytes(_)
        ) {
            let token = self.advance();
            pieces.push((token.kind, token.span));
        }

        let bytes = pieces
            .iter()
            .filter(|(k, _)| matches!(k, TokenKind::Bytes(_)))
            .count();
        if bytes > 0 {
            if bytes != pieces.len() {
                return Err(ConvertError::syntax(span, "cannot mix bytes and str literals"));
            }
            let joined = pieces
                .into_iter()
                .filter_map(|(k, _)| match k {
                    TokenKind::Bytes(raw) => Some(raw),
                    _ => None,
                })
                .collect();
            return Ok(Expr::Constant(Constant::Bytes(joined)));
        }

        if !pieces.iter().any(|(k, _)| matches!(k, TokenKind::FStr(_))) {
            let joined = pieces
                .into_iter()
                .filter_map(|(k, _)| match k {
                    TokenKind::Str(raw) => Some(raw),
                    _ => None,
                })
                .collect();
            return Ok(Expr::Constant(Constant::Str(joined)));
        }

        let mut parts: Vec<FStringPart> = Vec::new();
        for (kind, piece_span) in pieces {
            let piece_parts = match kind {
                TokenKind::FStr(raw) => parse_fstring(&raw, piece_span)?,
                TokenKind::Str(raw) => vec![FStringPart::Literal(raw)],
                _ => Vec::new(),
            };
            for part in piece_parts {
                if let FStringPart::Literal(text) = &part {
                    if let Some(FStringPart::Literal(prev)) = parts.last_mut() {
                        prev.push_str(text);
                        continue;
                    }
                }
                parts.push(part);
            }
        }
        Ok(Expr::FormattedString(parts))
    }
}

/// Split an f-string body into literal text and independently parsed fields.
/// Conversion (`!r`) and format (`:>8`) suffixes are dropped.
fn parse_fstring(raw: &str, span: Span) -> Result<Vec<FStringPart>> {
    let chars: Vec<char> = raw.chars().collect();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                literal.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                literal.push('}');
                i += 2;
            }
            '}' => return Err(ConvertError::syntax(span, "single '}' is not allowed in f-string")),
            '{' => {
                if !literal.is_empty() {
                    parts.push(FStringPart::Literal(std::mem::take(&mut literal)));
                }
                let (end, expr_end) = find_field_end(&chars, i + 1)
                    .ok_or_else(|| ConvertError::syntax(span, "unterminated f-string field"))?;
                let text: String = chars[i + 1..expr_end].iter().collect();
                if text.trim().is_empty() {
                    return Err(ConvertError::syntax(span, "empty f-string field"));
                }
                let expr = parse_expression(&text).map_err(|err| match err {
                    ConvertError::Syntax { message, .. } => {
                        ConvertError::syntax(span, format!("in f-string field '{}': {}", text.trim(), message))
                    }
                    other => other,
                })?;
                parts.push(FStringPart::Field(expr));
                i = end + 1;
            }
            '\\' => {
                literal.push('\\');
                if let Some(&next) = chars.get(i + 1) {
                    literal.push(next);
                }
                i += 2;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }
    if !literal.is_empty() {
        parts.push(FStringPart::Literal(literal));
    }
    Ok(parts)
}

/// Returns (index of the closing brace, end of the expression text).
fn find_field_end(chars: &[char], start: usize) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut expr_end = None;

    for (offset, &c) in chars[start..].iter().enumerate() {
        let i = start + offset;
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            '}' if depth == 0 => return Some((i, expr_end.unwrap_or(i))),
            '}' => depth -= 1,
            ':' if depth == 0 && expr_end.is_none() => expr_end = Some(i),
            '!' if depth == 0 && expr_end.is_none() && chars.get(i + 1) != Some(&'=') => {
                expr_end = Some(i)
            }
            _ => {}
        }
    }
    None
}

fn check_assignable(target: &Expr, span: Span) -> Result<()> {
    match target {
        Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. } => Ok(()),
        Expr::Tuple(items) | Expr::List(items) => {
            items.iter().try_for_each(|item| check_assignable(item, span))
        }
        other => Err(ConvertError::syntax(
            span,
            format!("cannot assign to {}", other.kind_name()),
        )),
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Name(name) => format!("name '{}'", name),
        TokenKind::Int(text) | TokenKind::Float(text) | TokenKind::Imaginary(text) => {
            format!("number {}", text)
        }
        TokenKind::Str(_) | TokenKind::FStr(_) | TokenKind::Bytes(_) => "string literal".to_string(),
        TokenKind::Newline => "end of line".to_string(),
        TokenKind::Indent => "indent".to_string(),
        TokenKind::Dedent => "dedent".to_string(),
        TokenKind::Eof => "end of file".to_string(),
        other => format!("{:?}", other).to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> Stmt {
        let module = parse(source).unwrap();
        assert_eq!(module.body.len(), 1, "expected one statement in {:?}", module);
        module.body.into_iter().next().unwrap()
    }

    #[test]
    fn test_precedence_of_arithmetic() {
        let Stmt::Expr(expr) = parse_one("a + b * c\n") else {
            panic!("expected expression statement");
        };
        assert_eq!(
            expr,
            Expr::binop(
                Expr::name("a"),
                BinOp::Add,
                Expr::binop(Expr::name("b"), BinOp::Mult, Expr::name("c"))
            )
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let Stmt::Expr(expr) = parse_one("a - b - c\n") else {
            panic!("expected expression statement");
        };
        assert_eq!(
            expr,
            Expr::binop(
                Expr::binop(Expr::name("a"), BinOp::Sub, Expr::name("b")),
                BinOp::Sub,
                Expr::name("c")
            )
        );
    }

    #[test]
    fn test_power_is_right_associative_and_binds_over_unary_minus() {
        let Stmt::Expr(expr) = parse_one("-a ** b ** c\n") else {
            panic!("expected expression statement");
        };
        let Expr::UnaryOp { op: UnaryOp::USub, operand } = expr else {
            panic!("expected unary minus at the root");
        };
        assert_eq!(
            *operand,
            Expr::binop(
                Expr::name("a"),
                BinOp::Pow,
                Expr::binop(Expr::name("b"), BinOp::Pow, Expr::name("c"))
            )
        );
    }

    #[test]
    fn test_elif_chain_nests_in_orelse() {
        let stmt = parse_one("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        let Stmt::If { orelse, .. } = stmt else {
            panic!("expected if");
        };
        assert_eq!(orelse.len(), 1);
        let Stmt::If { orelse: inner, .. } = &orelse[0] else {
            panic!("expected nested if for elif");
        };
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn test_function_with_annotated_parameter() {
        let Stmt::FunctionDef(def) = parse_one("def merge_sort(A: Array((1, n)), p):\n    pass\n") else {
            panic!("expected def");
        };
        assert_eq!(def.name, "merge_sort");
        assert_eq!(def.params.len(), 2);
        assert!(def.params[0].annotation.is_some());
        assert!(def.params[1].annotation.is_none());
        assert_eq!(def.body, vec![Stmt::Pass]);
    }

    #[test]
    fn test_tuple_assignment_and_chained_targets() {
        let Stmt::Assign { targets, value } = parse_one("a, b = b, a\n") else {
            panic!("expected assign");
        };
        assert_eq!(targets, vec![Expr::Tuple(vec![Expr::name("a"), Expr::name("b")])]);
        assert_eq!(value, Expr::Tuple(vec![Expr::name("b"), Expr::name("a")]));

        let Stmt::Assign { targets, .. } = parse_one("a = b = 0\n") else {
            panic!("expected assign");
        };
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn test_augmented_and_annotated_assignment() {
        assert!(matches!(
            parse_one("x //= 2\n"),
            Stmt::AugAssign { op: BinOp::FloorDiv, .. }
        ));
        assert!(matches!(
            parse_one("B: Array((1, n))\n"),
            Stmt::AnnAssign { value: None, .. }
        ));
    }

    #[test]
    fn test_comparison_operators() {
        let Stmt::Expr(Expr::Compare { ops, .. }) = parse_one("x is not None\n") else {
            panic!("expected comparison");
        };
        assert_eq!(ops, vec![CmpOp::IsNot]);
        let Stmt::Expr(Expr::Compare { ops, .. }) = parse_one("x not in s\n") else {
            panic!("expected comparison");
        };
        assert_eq!(ops, vec![CmpOp::NotIn]);
    }

    #[test]
    fn test_for_with_tuple_target() {
        let Stmt::For { target, iter, .. } = parse_one("for i, v in pairs(a):\n    pass\n") else {
            panic!("expected for");
        };
        assert!(matches!(target, Expr::Tuple(ref items) if items.len() == 2));
        assert_eq!(iter.call_name(), Some("pairs"));
    }

    #[test]
    fn test_fstring_fields_are_parsed() {
        let Stmt::Expr(Expr::Call { args, .. }) = parse_one("print(f\"sum = {a + b:>4}!\")\n") else {
            panic!("expected call");
        };
        assert_eq!(
            args[0],
            Expr::FormattedString(vec![
                FStringPart::Literal("sum = ".to_string()),
                FStringPart::Field(Expr::binop(Expr::name("a"), BinOp::Add, Expr::name("b"))),
                FStringPart::Literal("!".to_string()),
            ])
        );
    }

    #[test]
    fn test_imports_are_kept() {
        let module = parse("import math\nfrom random import randint, choice\n").unwrap();
        assert_eq!(
            module.body,
            vec![
                Stmt::Import(vec!["math".to_string()]),
                Stmt::Import(vec!["random.randint".to_string(), "random.choice".to_string()]),
            ]
        );
    }

    #[test]
    fn test_unsupported_syntax_is_rejected_with_location() {
        for source in [
            "class A:\n    pass\n",
            "x = [i for i in a]\n",
            "f(x, key=1)\n",
            "y = a[1:2]\n",
            "d = {}\n",
            "while x:\n    pass\nelse:\n    pass\n",
        ] {
            let err = parse(source).unwrap_err();
            assert!(
                matches!(err, ConvertError::Syntax { .. }),
                "expected syntax error for {:?}, got {:?}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_error_span_points_at_offending_token() {
        let err = parse("x = 1\ny = )\n").unwrap_err();
        match err {
            ConvertError::Syntax { span, .. } => assert_eq!(span, Span::new(2, 5)),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
