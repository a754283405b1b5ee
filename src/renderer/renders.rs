use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::parser::*;
use crate::renderer::components::*;
use crate::renderer::macros::Macro;
use crate::renderer::traits::*;

/// Which operand of a binary operation is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl RenderExpr for Expr {
    fn render_expr(&self, context: &RenderContext<'_>) -> Result<String> {
        match self {
            Expr::Constant(constant) => constant.render_expr(context),
            Expr::Name(id) => render_name(context, id),
            Expr::BinOp { left, op, right } => render_binop(context, left, *op, right),
            Expr::BoolOp { op, values } => render_bool_op(context, *op, values, false),
            Expr::UnaryOp { op, operand } => render_unary(context, *op, operand),
            Expr::Compare {
                left,
                ops,
                comparators,
            } => render_compare(context, left, ops, comparators),
            Expr::Call { func, args } => render_call(context, func, args),
            Expr::Attribute { value, attr } => Ok(format!(
                "{}.{}",
                value.render_expr(context)?,
                context.call(Macro::Var, &[&NameRenderer.identifier(attr)])?
            )),
            Expr::Subscript { value, index } => {
                let index = match index.as_ref() {
                    Expr::Tuple(items) => render_list(context, items)?,
                    other => other.render_expr(context)?,
                };
                Ok(format!("{}[{}]", value.render_expr(context)?, index))
            }
            Expr::Tuple(items) => Ok(format!("({})", render_list(context, items)?)),
            Expr::List(items) if items.is_empty() => Ok("[\\;]".to_string()),
            Expr::List(items) => Ok(format!(
                "$\\langle${}$\\rangle$",
                render_list(context, items)?
            )),
            Expr::IfExp { test, body, orelse } => Ok(format!(
                "({}) ? {} : {}",
                test.render_expr(context)?,
                body.render_expr(context)?,
                orelse.render_expr(context)?
            )),
            Expr::FormattedString(parts) => context.call(
                Macro::Str,
                &[&render_fstring_text(context, parts)?],
            ),
        }
    }
}

impl RenderExpr for Constant {
    fn render_expr(&self, context: &RenderContext<'_>) -> Result<String> {
        match self {
            Constant::None => context.call(Macro::Null, &[]),
            Constant::Bool(true) => context.call(Macro::True, &[]),
            Constant::Bool(false) => context.call(Macro::False, &[]),
            Constant::Int(text) | Constant::Float(text) => {
                context.call(Macro::Num, &[&text.replace('_', "")])
            }
            Constant::Str(text) => context.call(Macro::Str, &[&TextRenderer.escape(text)]),
            Constant::Bytes(_) | Constant::Imaginary(_) | Constant::Ellipsis => Err(
                ConvertError::UnsupportedLiteral(format!("{} literal", self.kind_name())),
            ),
        }
    }
}

fn render_list(context: &RenderContext<'_>, items: &[Expr]) -> Result<String> {
    Ok(items
        .iter()
        .map(|item| item.render_expr(context))
        .collect::<Result<Vec<_>>>()?
        .join(", "))
}

/// The discard name `_` renders as nothing.
fn render_name(context: &RenderContext<'_>, id: &str) -> Result<String> {
    if id == "_" {
        return Ok(String::new());
    }
    context.call(Macro::Var, &[&NameRenderer.identifier(id)])
}

fn render_binop(context: &RenderContext<'_>, left: &Expr, op: BinOp, right: &Expr) -> Result<String> {
    match op {
        BinOp::Pow => Ok(format!(
            "$\\text{{{}}}^\\text{{{}}}$",
            render_operand(context, left, op, Side::Left)?,
            render_operand(context, right, op, Side::Right)?
        )),
        BinOp::FloorDiv => Ok(format!(
            "$\\lfloor${} $/$ {}$\\rfloor$",
            render_operand(context, left, op, Side::Left)?,
            render_operand(context, right, op, Side::Right)?
        )),
        BinOp::Mult if juxtaposes(left, right) => Ok(format!(
            "{}{}",
            render_operand(context, left, op, Side::Left)?,
            right.render_expr(context)?
        )),
        _ => {
            let symbol = operator_symbol(context, op)?;
            Ok(format!(
                "{} {} {}",
                render_operand(context, left, op, Side::Left)?,
                symbol,
                render_operand(context, right, op, Side::Right)?
            ))
        }
    }
}

fn operator_symbol(context: &RenderContext<'_>, op: BinOp) -> Result<String> {
    match op {
        BinOp::Add => Ok("$+$".to_string()),
        BinOp::Sub => Ok("$-$".to_string()),
        BinOp::Mult => Ok("$\\times$".to_string()),
        BinOp::Div => Ok("$/$".to_string()),
        BinOp::Mod => context.call(Macro::Op, &["mod"]),
        _ => Err(ConvertError::UnsupportedOperator(op.symbol().to_string())),
    }
}

/// Renders one operand, parenthesizing a nested operation that binds more
/// loosely than its parent or equally. A left child repeating the parent's
/// operator stays bare, so `a - b - c` reads left to right. Floor division
/// is already delimited and never gets extra parentheses.
fn render_operand(context: &RenderContext<'_>, child: &Expr, parent: BinOp, side: Side) -> Result<String> {
    let rendered = child.render_expr(context)?;
    let Expr::BinOp { op: child_op, .. } = child else {
        return Ok(rendered);
    };
    if *child_op == BinOp::FloorDiv {
        return Ok(rendered);
    }

    let unsupported = |op: BinOp| ConvertError::UnsupportedOperator(op.symbol().to_string());
    let child_rank = precedence(*child_op).ok_or_else(|| unsupported(*child_op))?;
    let parent_rank = precedence(parent).ok_or_else(|| unsupported(parent))?;
    let wrap = match side {
        Side::Left => child_rank > parent_rank || (child_rank == parent_rank && *child_op != parent),
        Side::Right => child_rank >= parent_rank,
    };

    Ok(if wrap { format!("({})", rendered) } else { rendered })
}

/// `2 * x`, `a * b` and `2 * x * y` print as `2x`, `ab` and `2xy`.
fn juxtaposes(left: &Expr, right: &Expr) -> bool {
    let left_ok = matches!(left, Expr::Constant(Constant::Int(_) | Constant::Float(_)))
        || left.is_single_letter_name()
        || ends_with_letter(left);
    left_ok && (right.is_single_letter_name() || starts_with_letter(right))
}

fn ends_with_letter(expr: &Expr) -> bool {
    matches!(expr, Expr::BinOp { op: BinOp::Mult, right, .. } if right.is_single_letter_name())
}

fn starts_with_letter(expr: &Expr) -> bool {
    match expr {
        Expr::BinOp {
            op: BinOp::Mult,
            left,
            right,
        } => (left.is_single_letter_name() || starts_with_letter(left)) && juxtaposes(left, right),
        _ => false,
    }
}

/// AND-chains join with the `and` macro; a nested OR inside an AND is
/// bracketed. `brackets` applies one level only.
fn render_bool_op(context: &RenderContext<'_>, op: BoolOp, values: &[Expr], brackets: bool) -> Result<String> {
    match op {
        BoolOp::And => {
            let separator = format!(" {} ", context.call(Macro::And, &[])?);
            Ok(values
                .iter()
                .map(|value| match value {
                    Expr::BoolOp { op, values } => render_bool_op(context, *op, values, true),
                    other => other.render_expr(context),
                })
                .collect::<Result<Vec<_>>>()?
                .join(separator.as_str()))
        }
        BoolOp::Or => {
            let separator = format!(" {} ", context.call(Macro::Or, &[])?);
            let joined = values
                .iter()
                .map(|value| value.render_expr(context))
                .collect::<Result<Vec<_>>>()?
                .join(separator.as_str());
            Ok(if brackets { format!("({})", joined) } else { joined })
        }
    }
}

fn render_unary(context: &RenderContext<'_>, op: UnaryOp, operand: &Expr) -> Result<String> {
    match op {
        UnaryOp::Not => {
            let not = context.call(Macro::Not, &[])?;
            match operand {
                Expr::BoolOp { op, values } => Ok(format!(
                    "{} ({})",
                    not,
                    render_bool_op(context, *op, values, false)?
                )),
                other => Ok(format!("{} {}", not, other.render_expr(context)?)),
            }
        }
        UnaryOp::UAdd | UnaryOp::USub => {
            let sign = if op == UnaryOp::USub { "$-$" } else { "$+$" };
            let rendered = operand.render_expr(context)?;
            Ok(match operand {
                Expr::BinOp { .. } => format!("{}({})", sign, rendered),
                _ => format!("{}{}", sign, rendered),
            })
        }
        UnaryOp::Invert => Err(ConvertError::UnsupportedOperator("~".to_string())),
    }
}

fn render_compare(context: &RenderContext<'_>, left: &Expr, ops: &[CmpOp], comparators: &[Expr]) -> Result<String> {
    let (op, right) = match (ops, comparators) {
        ([op], [right]) => (op, right),
        _ => {
            return Err(ConvertError::MalformedStatement(
                "chained comparisons are not supported".to_string(),
            ))
        }
    };
    let symbol = match op {
        CmpOp::Eq | CmpOp::Is => "$=$",
        CmpOp::NotEq | CmpOp::IsNot => "$\\neq$",
        CmpOp::Lt => "$<$",
        CmpOp::LtE => "$\\leq$",
        CmpOp::Gt => "$>$",
        CmpOp::GtE => "$\\geq$",
        CmpOp::In => "$\\in$",
        CmpOp::NotIn => "$\\notin$",
    };
    Ok(format!(
        "{} {} {}",
        left.render_expr(context)?,
        symbol,
        right.render_expr(context)?
    ))
}

fn render_call(context: &RenderContext<'_>, func: &Expr, args: &[Expr]) -> Result<String> {
    if let Expr::Name(id) = func {
        match id.as_str() {
            ARRAY_CONSTRUCTOR => return render_array_reference(context, args),
            "print" => return render_print(context, args),
            _ => {}
        }
    }

    let rendered_args = render_list(context, args)?;
    let names = NameRenderer;
    match func {
        Expr::Name(id) => Ok(format!(
            "{}({})",
            context.call(Macro::Func, &[&names.procedure_name(id)])?,
            rendered_args
        )),
        Expr::Attribute { value, attr } => Ok(format!(
            "{}.{}({})",
            value.render_expr(context)?,
            context.call(Macro::Method, &[&names.procedure_name(attr)])?,
            rendered_args
        )),
        other => Ok(format!("{}({})", other.render_expr(context)?, rendered_args)),
    }
}

/// `Array((lo, hi))` or `Array(A, (lo, hi))` used as an expression.
fn render_array_reference(context: &RenderContext<'_>, args: &[Expr]) -> Result<String> {
    let bounds = BoundsRenderer;
    match args {
        [pair] => {
            if let Some((lo, hi)) = bounds.pair(pair) {
                return bounds.range(context, lo, hi);
            }
        }
        [target, pair] => {
            if let Some((lo, hi)) = bounds.pair(pair) {
                return Ok(format!(
                    "{}{}",
                    target.render_expr(context)?,
                    bounds.range(context, lo, hi)?
                ));
            }
        }
        _ => {}
    }
    Err(ConvertError::constructor(
        ARRAY_CONSTRUCTOR,
        "expected Array((lo, hi)) or Array(name, (lo, hi))",
    ))
}

/// String arguments print as bare text; everything else renders normally.
fn render_print(context: &RenderContext<'_>, args: &[Expr]) -> Result<String> {
    let text = args
        .iter()
        .map(|arg| match arg {
            Expr::Constant(Constant::Str(text)) => Ok(TextRenderer.escape(text)),
            Expr::FormattedString(parts) => render_fstring_text(context, parts),
            other => other.render_expr(context),
        })
        .collect::<Result<Vec<_>>>()?
        .join(" ");
    context.call(Macro::Print, &[&text])
}

fn render_fstring_text(context: &RenderContext<'_>, parts: &[FStringPart]) -> Result<String> {
    parts
        .iter()
        .map(|part| match part {
            FStringPart::Literal(text) => Ok(TextRenderer.escape(text)),
            FStringPart::Field(expr) => expr.render_expr(context),
        })
        .collect()
}

/// Renders one statement of a body, counting it toward the enclosing
/// procedure's line gutter when it sits directly in that procedure's body.
/// Nested procedure definitions are not counted.
pub fn render_statement(context: &mut RenderContext<'_>, stmt: &Stmt) -> Result<String> {
    if !matches!(stmt, Stmt::FunctionDef(_) | Stmt::Import(_)) {
        context.count_statement();
    }
    stmt.render(context)
}

/// Statements of a block body, one fragment per line group.
pub fn render_body(context: &mut RenderContext<'_>, body: &[Stmt]) -> Result<String> {
    let mut fragments = Vec::with_capacity(body.len());
    for stmt in body {
        let fragment = render_statement(context, stmt)?;
        if fragment.is_empty() {
            continue;
        }
        fragments.push(fragment);
    }
    Ok(fragments.join("\n"))
}

/// A body wrapped in the scope block, closed as a row.
fn render_scope(context: &mut RenderContext<'_>, body: &[Stmt]) -> Result<String> {
    let inner = context.with_scope(|context| render_body(context, body))?;
    Ok(format!(
        "{}{}",
        context.macros().scope().invoke(&[], &inner)?,
        ROW_END
    ))
}

impl Render for Stmt {
    fn render(&self, context: &mut RenderContext<'_>) -> Result<String> {
        match self {
            Stmt::FunctionDef(def) => def.render(context),
            Stmt::Return(None) => row(context.call(Macro::Return, &[])?),
            Stmt::Return(Some(value)) => row(format!(
                "{} {}",
                context.call(Macro::Return, &[])?,
                value.render_expr(context)?
            )),
            Stmt::Break => row(context.call(Macro::Break, &[])?),
            Stmt::Continue => row(context.call(Macro::Continue, &[])?),
            Stmt::Pass => row(context.call(Macro::Todo, &[])?),
            Stmt::Expr(Expr::Constant(Constant::Str(text))) => TextRenderer.docstring(context, text),
            Stmt::Expr(expr) => row(expr.render_expr(context)?),
            Stmt::Import(modules) => {
                debug!(modules = ?modules, "skipping import");
                Ok(String::new())
            }
            Stmt::Assign { targets, value } => render_assign(context, targets, value),
            Stmt::AnnAssign {
                target,
                annotation,
                value,
            } => render_annotated(context, target, annotation, value.as_ref()),
            Stmt::AugAssign { target, op, value } => {
                let combined = Expr::binop(target.clone(), *op, value.clone());
                row(format!(
                    "{} {} {}",
                    target.render_expr(context)?,
                    context.call(Macro::Gets, &[])?,
                    combined.render_expr(context)?
                ))
            }
            Stmt::If { test, body, orelse } => render_if(context, test, body, orelse, Macro::If),
            Stmt::While { test, body } => Ok(format!(
                "{}{}\n{}",
                context.call(Macro::While, &[&test.render_expr(context)?])?,
                ROW_END,
                render_scope(context, body)?
            )),
            Stmt::For { target, iter, body } => render_for(context, target, iter, body),
        }
    }
}

fn row(text: String) -> Result<String> {
    Ok(format!("{}{}", text, ROW_END))
}

impl Render for FunctionDef {
    fn render(&self, context: &mut RenderContext<'_>) -> Result<String> {
        let nested = context.is_nested();
        let name = NameRenderer.procedure_name(&self.name);
        let params = self
            .params
            .iter()
            .map(|param| render_param(context, param))
            .collect::<Result<Vec<_>>>()?
            .join(", ");

        let (body, statements) = context.with_procedure(|context| render_body(context, &self.body))?;
        debug!(procedure = %name, statements, "rendered procedure");

        let block = context.macros().procedure().invoke(&[&name, &params], &body)?;
        let numbers = (1..=statements)
            .map(|n| context.call(Macro::LineNo, &[&n.to_string()]))
            .collect::<Result<Vec<_>>>()?
            .join(ROW_END);
        let gutter = context.call(Macro::Gutter, &[&numbers])?;

        let row_end = if nested { ROW_END } else { "" };
        Ok(format!("{}%\n{}{}", gutter, block, row_end))
    }
}

fn render_param(context: &RenderContext<'_>, param: &Param) -> Result<String> {
    let name = render_name(context, &param.name)?;
    let Some(annotation) = &param.annotation else {
        return Ok(name);
    };
    let bounds = BoundsRenderer;
    let (lo, hi) = bounds
        .annotation(annotation)
        .ok_or_else(|| ConvertError::UnsupportedAnnotation {
            target: param.name.clone(),
        })?;
    Ok(format!("{}{}", name, bounds.range(context, lo, hi)?))
}

fn target_label(target: &Expr) -> String {
    match target {
        Expr::Name(id) => id.clone(),
        other => other.kind_name().to_string(),
    }
}

fn render_annotated(context: &RenderContext<'_>, target: &Expr, annotation: &Expr, value: Option<&Expr>) -> Result<String> {
    let bounds = BoundsRenderer;
    let (lo, hi) = bounds
        .annotation(annotation)
        .ok_or_else(|| ConvertError::UnsupportedAnnotation {
            target: target_label(target),
        })?;
    let declaration = format!(
        "{}{}",
        target.render_expr(context)?,
        bounds.range(context, lo, hi)?
    );
    match value {
        None => row(declaration),
        Some(value) => row(format!(
            "{} {} {}",
            declaration,
            context.call(Macro::Gets, &[])?,
            value.render_expr(context)?
        )),
    }
}

fn render_assign(context: &RenderContext<'_>, targets: &[Expr], value: &Expr) -> Result<String> {
    let gets = context.call(Macro::Gets, &[])?;

    if let ([Expr::Tuple(names)], Expr::Tuple(values)) = (targets, value) {
        if names.len() != values.len() {
            return Err(ConvertError::MalformedStatement(format!(
                "cannot assign {} values to {} targets",
                values.len(),
                names.len()
            )));
        }
        let pairs = names
            .iter()
            .zip(values)
            .map(|(name, value)| {
                let name = name.render_expr(context)?;
                if name.is_empty() {
                    return Ok(None);
                }
                Ok(Some(format!("{} {} {}", name, gets, value.render_expr(context)?)))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        if pairs.is_empty() {
            return Ok(String::new());
        }
        return row(pairs.join("; "));
    }

    if let ([target], Expr::Call { args, .. }) = (targets, value) {
        if let Some(kind) = value.call_name().and_then(DataStructure::from_constructor) {
            return render_creation(context, target, kind, args);
        }
    }

    let mut parts = targets
        .iter()
        .map(|target| target.render_expr(context))
        .collect::<Result<Vec<_>>>()?;
    parts.retain(|part| !part.is_empty());
    parts.push(value.render_expr(context)?);
    row(parts.join(format!(" {} ", gets).as_str()))
}

/// "Create a(n) <kind> <target>" plus any bounds or initializer.
fn render_creation(context: &RenderContext<'_>, target: &Expr, kind: DataStructure, args: &[Expr]) -> Result<String> {
    let sentence = context.call(
        Macro::Create,
        &[kind.article(), kind.display_name(), &target.render_expr(context)?],
    )?;
    let bounds = BoundsRenderer;
    let gets = context.call(Macro::Gets, &[])?;

    let suffix = match kind {
        DataStructure::Array => render_array_bounds(context, args)?,
        DataStructure::Matrix => {
            let pairs = match args {
                [rows, cols] => bounds.pair(rows).zip(bounds.pair(cols)),
                _ => None,
            };
            let ((r0, r1), (c0, c1)) = pairs.ok_or_else(|| {
                ConvertError::constructor("Mat", "expected two (lo, hi) bound pairs")
            })?;
            format!(
                "{}{}",
                bounds.range(context, r0, r1)?,
                bounds.range(context, c0, c1)?
            )
        }
        DataStructure::DynamicArray => match args {
            [] => format!(" {} [\\;]", gets),
            [initial] => format!(" {} {}", gets, initial.render_expr(context)?),
            _ => {
                return Err(ConvertError::constructor(
                    "List",
                    format!("expected at most 1 argument, got {}", args.len()),
                ))
            }
        },
        _ => String::new(),
    };

    row(format!("{}{}", sentence, suffix))
}

/// Bounds of an `Array(...)` creation:
///
/// - no arguments: `[1…n]`
/// - one `(lo, hi)` pair: `[lo…hi]`
/// - one `range(...)` call: the range bounds
/// - any other single expression `e`: `[1…e]`
/// - a pair plus a second pair or `Array(B, (lo, hi))`: copy from that range
fn render_array_bounds(context: &RenderContext<'_>, args: &[Expr]) -> Result<String> {
    let bounds = BoundsRenderer;
    let one = Expr::int(1);
    match args {
        [] => bounds.range(context, &one, &Expr::name("n")),
        [arg] => {
            if let Some((lo, hi)) = bounds.pair(arg) {
                return bounds.range(context, lo, hi);
            }
            if let Expr::Call { args: range_args, .. } = arg {
                if arg.call_name() == Some(RANGE_FUNCTION) {
                    return match range_args.as_slice() {
                        [end] => bounds.range(context, &one, end),
                        [start, end] => bounds.range(context, start, end),
                        _ => Err(ConvertError::constructor(
                            ARRAY_CONSTRUCTOR,
                            "range bounds take 1 or 2 arguments",
                        )),
                    };
                }
            }
            bounds.range(context, &one, arg)
        }
        [first, source] => {
            let (lo, hi) = bounds.pair(first).ok_or_else(|| {
                ConvertError::constructor(ARRAY_CONSTRUCTOR, "first argument must be a (lo, hi) pair")
            })?;
            let copied = match bounds.pair(source) {
                Some((src_lo, src_hi)) => bounds.range(context, src_lo, src_hi)?,
                None if source.call_name() == Some(ARRAY_CONSTRUCTOR) => source.render_expr(context)?,
                None => {
                    return Err(ConvertError::constructor(
                        ARRAY_CONSTRUCTOR,
                        "second argument must be a (lo, hi) pair or Array(name, (lo, hi))",
                    ))
                }
            };
            Ok(format!(
                "{} {} {}",
                bounds.range(context, lo, hi)?,
                context.call(Macro::Gets, &[])?,
                copied
            ))
        }
        _ => Err(ConvertError::constructor(
            ARRAY_CONSTRUCTOR,
            format!("expected at most 2 arguments, got {}", args.len()),
        )),
    }
}

fn render_if(context: &mut RenderContext<'_>, test: &Expr, body: &[Stmt], orelse: &[Stmt], keyword: Macro) -> Result<String> {
    let mut output = format!(
        "{}{}\n{}",
        context.call(keyword, &[&test.render_expr(context)?])?,
        ROW_END,
        render_scope(context, body)?
    );

    match orelse {
        [] => {}
        [Stmt::If { test, body, orelse }] => {
            output.push('\n');
            output.push_str(&render_if(context, test, body, orelse, Macro::Elif)?);
        }
        _ => {
            output.push_str(&format!(
                "\n{}{}\n{}",
                context.call(Macro::Else, &[])?,
                ROW_END,
                render_scope(context, orelse)?
            ));
        }
    }

    Ok(output)
}

fn render_for(context: &mut RenderContext<'_>, target: &Expr, iter: &Expr, body: &[Stmt]) -> Result<String> {
    let header = match iter {
        Expr::Call { args, .. } if iter.call_name() == Some(RANGE_FUNCTION) => {
            render_counting_loop(context, target, args)?
        }
        _ => context.call(
            Macro::ForChild,
            &[&target.render_expr(context)?, &iter.render_expr(context)?],
        )?,
    };
    Ok(format!("{}{}\n{}", header, ROW_END, render_scope(context, body)?))
}

/// `range(end)`, `range(start, end)` or `range(start, end, step)`. A
/// negated step counts down; a step of magnitude 1 is left implicit.
fn render_counting_loop(context: &RenderContext<'_>, target: &Expr, args: &[Expr]) -> Result<String> {
    let (start, end) = match args {
        [end] => (context.call(Macro::Num, &["1"])?, end),
        [start, end] | [start, end, _] => (start.render_expr(context)?, end),
        _ => {
            return Err(ConvertError::constructor(
                RANGE_FUNCTION,
                format!("expected 1 to 3 arguments, got {}", args.len()),
            ))
        }
    };
    let init = format!(
        "{} {} {}",
        target.render_expr(context)?,
        context.call(Macro::Gets, &[])?,
        start
    );
    let end = end.render_expr(context)?;

    let Some(step) = args.get(2) else {
        return context.call(Macro::For, &[&init, &end]);
    };
    let (descending, magnitude) = match step {
        Expr::UnaryOp {
            op: UnaryOp::USub,
            operand,
        } => (true, operand.as_ref()),
        Expr::UnaryOp {
            op: UnaryOp::UAdd,
            operand,
        } => (false, operand.as_ref()),
        other => (false, other),
    };
    let unit = matches!(magnitude, Expr::Constant(Constant::Int(text)) if text.replace('_', "") == "1");

    match (descending, unit) {
        (false, true) => context.call(Macro::For, &[&init, &end]),
        (true, true) => context.call(Macro::ForDown, &[&init, &end]),
        (false, false) => context.call(Macro::ForInc, &[&init, &end, &magnitude.render_expr(context)?]),
        (true, false) => context.call(Macro::ForDec, &[&init, &end, &magnitude.render_expr(context)?]),
    }
}
