#[cfg(test)]
mod expression_tests {
    use crate::error::ConvertError;
    use crate::parser::parse_expression;
    use crate::renderer::{MacroRegistry, RenderContext, RenderExpr};

    fn render(source: &str) -> String {
        try_render(source).unwrap()
    }

    fn try_render(source: &str) -> Result<String, ConvertError> {
        let macros = MacroRegistry::standard();
        let context = RenderContext::new(&macros);
        parse_expression(source)?.render_expr(&context)
    }

    #[test]
    fn test_tighter_child_is_not_parenthesized() {
        assert_eq!(
            render("alpha + beta * gamma"),
            r"\var{alpha} $+$ \var{beta} $\times$ \var{gamma}"
        );
    }

    #[test]
    fn test_looser_left_child_is_parenthesized() {
        assert_eq!(
            render("(alpha + beta) * gamma"),
            r"(\var{alpha} $+$ \var{beta}) $\times$ \var{gamma}"
        );
    }

    #[test]
    fn test_equal_precedence_right_child_is_parenthesized() {
        assert_eq!(
            render("alpha - (beta - gamma)"),
            r"\var{alpha} $-$ (\var{beta} $-$ \var{gamma})"
        );
        assert_eq!(
            render("alpha - beta - gamma"),
            r"\var{alpha} $-$ \var{beta} $-$ \var{gamma}"
        );
    }

    #[test]
    fn test_equal_precedence_left_child_with_other_operator_is_parenthesized() {
        assert_eq!(
            render("(a - b) + c"),
            r"(\var{a} $-$ \var{b}) $+$ \var{c}"
        );
        assert_eq!(
            render("(a + b) - c"),
            r"(\var{a} $+$ \var{b}) $-$ \var{c}"
        );
        assert_eq!(
            render("a / b * c"),
            r"(\var{a} $/$ \var{b}) $\times$ \var{c}"
        );
        assert_eq!(
            render("rows * cols % size"),
            r"(\var{rows} $\times$ \var{cols}) \op{mod} \var{size}"
        );
        assert_eq!(render("a + b + c"), r"\var{a} $+$ \var{b} $+$ \var{c}");
    }

    #[test]
    fn test_division_and_modulo() {
        assert_eq!(render("total / count"), r"\var{total} $/$ \var{count}");
        assert_eq!(render("n % 2"), r"\var{n} \op{mod} \num{2}");
        assert_eq!(
            render("total / (count * 2)"),
            r"\var{total} $/$ (\var{count} $\times$ \num{2})"
        );
    }

    #[test]
    fn test_floor_division_brackets() {
        assert_eq!(
            render("(lo + hi) // 2"),
            r"$\lfloor$(\var{lo} $+$ \var{hi}) $/$ \num{2}$\rfloor$"
        );
    }

    #[test]
    fn test_floor_division_never_gets_extra_parens() {
        assert_eq!(
            render("alpha * (beta // gamma)"),
            r"\var{alpha} $\times$ $\lfloor$\var{beta} $/$ \var{gamma}$\rfloor$"
        );
        assert_eq!(
            render("alpha - (beta // (gamma // delta))"),
            r"\var{alpha} $-$ $\lfloor$\var{beta} $/$ $\lfloor$\var{gamma} $/$ \var{delta}$\rfloor$$\rfloor$"
        );
    }

    #[test]
    fn test_power_is_stacked() {
        assert_eq!(render("x ** 2"), r"$\text{\var{x}}^\text{\num{2}}$");
        assert_eq!(
            render("(n + 1) ** 2"),
            r"$\text{(\var{n} $+$ \num{1})}^\text{\num{2}}$"
        );
    }

    #[test]
    fn test_juxtaposition() {
        assert_eq!(render("2 * x"), r"\num{2}\var{x}");
        assert_eq!(render("a * b"), r"\var{a}\var{b}");
        assert_eq!(render("2 * x * y"), r"\num{2}\var{x}\var{y}");
        assert_eq!(render("2 * (x * y)"), r"\num{2}\var{x}\var{y}");
    }

    #[test]
    fn test_no_juxtaposition_without_single_letter_operands() {
        assert_eq!(render("x * 2"), r"\var{x} $\times$ \num{2}");
        assert_eq!(render("alpha * x"), r"\var{alpha} $\times$ \var{x}");
        assert_eq!(render("2 * count"), r"\num{2} $\times$ \var{count}");
    }

    #[test]
    fn test_or_inside_and_is_bracketed() {
        assert_eq!(
            render("a and (b or c)"),
            r"\var{a} \cAnd{} (\var{b} \cOr{} \var{c})"
        );
    }

    #[test]
    fn test_and_inside_or_is_not_bracketed() {
        assert_eq!(
            render("a or b and c"),
            r"\var{a} \cOr{} \var{b} \cAnd{} \var{c}"
        );
    }

    #[test]
    fn test_bracket_flag_applies_one_level() {
        assert_eq!(
            render("a and (b or (c and d))"),
            r"\var{a} \cAnd{} (\var{b} \cOr{} \var{c} \cAnd{} \var{d})"
        );
    }

    #[test]
    fn test_not() {
        assert_eq!(render("not done"), r"\cNot{} \var{done}");
        assert_eq!(
            render("not (a or b)"),
            r"\cNot{} (\var{a} \cOr{} \var{b})"
        );
        assert_eq!(
            render("not (a and b)"),
            r"\cNot{} (\var{a} \cAnd{} \var{b})"
        );
    }

    #[test]
    fn test_unary_sign() {
        assert_eq!(render("-x"), r"$-$\var{x}");
        assert_eq!(render("+x"), r"$+$\var{x}");
        assert_eq!(render("-(a + b)"), r"$-$(\var{a} $+$ \var{b})");
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(render("i <= n"), r"\var{i} $\leq$ \var{n}");
        assert_eq!(render("i != j"), r"\var{i} $\neq$ \var{j}");
        assert_eq!(render("node is None"), r"\var{node} $=$ \cNull{}");
        assert_eq!(render("x not in seen"), r"\var{x} $\notin$ \var{seen}");
    }

    #[test]
    fn test_chained_comparison_is_rejected() {
        assert!(matches!(
            try_render("a < b < c"),
            Err(ConvertError::MalformedStatement(_))
        ));
    }

    #[test]
    fn test_constants() {
        assert_eq!(render("True"), r"\true{}");
        assert_eq!(render("False"), r"\false{}");
        assert_eq!(render("None"), r"\cNull{}");
        assert_eq!(render("1_000"), r"\num{1000}");
        assert_eq!(render("3.5"), r"\num{3.5}");
        assert_eq!(render("'50% off'"), r"\str{50\% off}");
    }

    #[test]
    fn test_unsupported_literals() {
        for source in ["b'raw'", "2j", "..."] {
            assert!(
                matches!(try_render(source), Err(ConvertError::UnsupportedLiteral(_))),
                "{} should be rejected",
                source
            );
        }
    }

    #[test]
    fn test_unsupported_operators() {
        assert!(matches!(
            try_render("a & b"),
            Err(ConvertError::UnsupportedOperator(op)) if op == "&"
        ));
        assert!(matches!(
            try_render("~a"),
            Err(ConvertError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            try_render("alpha + (beta << 2)"),
            Err(ConvertError::UnsupportedOperator(_))
        ));
    }

    #[test]
    fn test_names() {
        assert_eq!(render("left_child"), r"\var{left\_child}");
        assert_eq!(render("_"), "");
    }

    #[test]
    fn test_calls_use_name_transform() {
        assert_eq!(
            render("merge_sort(a, 1, n)"),
            r"\func{Merge-Sort}(\var{a}, \num{1}, \var{n})"
        );
        assert_eq!(
            render("queue.push_back(x)"),
            r"\var{queue}.\method{Push-Back}(\var{x})"
        );
    }

    #[test]
    fn test_attribute_and_subscript() {
        assert_eq!(render("node.left"), r"\var{node}.\var{left}");
        assert_eq!(render("a[i]"), r"\var{a}[\var{i}]");
        assert_eq!(render("grid[i, j]"), r"\var{grid}[\var{i}, \var{j}]");
        assert_eq!(render("a[i + 1]"), r"\var{a}[\var{i} $+$ \num{1}]");
    }

    #[test]
    fn test_sequences() {
        assert_eq!(render("[]"), r"[\;]");
        assert_eq!(render("[1, 2]"), r"$\langle$\num{1}, \num{2}$\rangle$");
        assert_eq!(render("(a, b)"), r"(\var{a}, \var{b})");
    }

    #[test]
    fn test_conditional_expression() {
        assert_eq!(render("a if c else b"), r"(\var{c}) ? \var{a} : \var{b}");
    }

    #[test]
    fn test_array_reference() {
        assert_eq!(
            render("Array(a, (1, n))"),
            r"\var{a}[\num{1}$\dots$\var{n}]"
        );
        assert_eq!(
            render("Array((lo, mid - 1))"),
            r"[\var{lo}$\dots$(\var{mid} $-$ \num{1})]"
        );
        assert!(matches!(
            try_render("Array(a, b, c)"),
            Err(ConvertError::MalformedConstructor { .. })
        ));
    }

    #[test]
    fn test_fstring_outside_print() {
        assert_eq!(render("f'n={n}'"), r"\str{n=\var{n}}");
    }
}

#[cfg(test)]
mod statement_tests {
    use crate::error::ConvertError;
    use crate::renderer::{indent, MacroRegistry};
    use crate::convert_source;

    fn render(source: &str) -> String {
        let macros = MacroRegistry::standard();
        let flat = convert_source(source, &macros).unwrap();
        indent(&flat, 0).unwrap()
    }

    fn render_err(source: &str) -> ConvertError {
        convert_source(source, &MacroRegistry::standard()).unwrap_err()
    }

    fn lines(lines: &[&str]) -> String {
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    #[test]
    fn test_scenario_if_with_return_in_function() {
        let output = render("def f(x):\n    if x < 0:\n        return 0\n");
        assert_eq!(
            output,
            lines(&[
                r"\gutter{\lineno{1}}%",
                r"\begin{pseudocode}{F}{\var{x}}",
                "\t\\cIf{\\var{x} $<$ \\num{0}}\\\\",
                "\t\\begin{scope}",
                "\t\t\\return{} \\num{0}\\\\",
                "\t\\end{scope}\\\\",
                r"\end{pseudocode}",
                "",
            ])
        );
        assert!(!output.contains(r"\cElse"));
    }

    #[test]
    fn test_scenario_array_of_length() {
        assert_eq!(
            render("a = Array(n)\n"),
            lines(&[r"\create{an}{array}{\var{a}}[\num{1}$\dots$\var{n}]\\"])
        );
    }

    #[test]
    fn test_scenario_count_down_with_unit_step() {
        assert_eq!(
            render("for i in range(10, 0, -1):\n    pass\n"),
            lines(&[
                r"\fordown{\var{i} \cGets{} \num{10}}{\num{0}}\\",
                r"\begin{scope}",
                "\t\\cTodo{}\\\\",
                r"\end{scope}\\",
            ])
        );
    }

    #[test]
    fn test_scenario_count_up_with_step() {
        let output = render("for i in range(0, 10, 2):\n    pass\n");
        assert!(output.starts_with(r"\forinc{\var{i} \cGets{} \num{0}}{\num{10}}{\num{2}}\\"));
    }

    #[test]
    fn test_counting_loop_variants() {
        assert!(render("for i in range(n):\n    pass\n")
            .starts_with(r"\for{\var{i} \cGets{} \num{1}}{\var{n}}\\"));
        assert!(render("for i in range(2, n, 1):\n    pass\n")
            .starts_with(r"\for{\var{i} \cGets{} \num{2}}{\var{n}}\\"));
        assert!(render("for i in range(n, 0, -2):\n    pass\n")
            .starts_with(r"\fordec{\var{i} \cGets{} \var{n}}{\num{0}}{\num{2}}\\"));
        assert!(matches!(
            render_err("for i in range():\n    pass\n"),
            ConvertError::MalformedConstructor { .. }
        ));
    }

    #[test]
    fn test_for_each() {
        assert!(render("for v in graph.adj:\n    pass\n")
            .starts_with(r"\forchild{\var{v}}{\var{graph}.\var{adj}}\\"));
        assert!(render("for v in neighbors(u):\n    pass\n")
            .starts_with(r"\forchild{\var{v}}{\func{Neighbors}(\var{u})}\\"));
    }

    #[test]
    fn test_if_elif_else_chain() {
        let source = "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n";
        assert_eq!(
            render(source),
            lines(&[
                r"\cIf{\var{a}}\\",
                r"\begin{scope}",
                "\t\\var{x} \\cGets{} \\num{1}\\\\",
                r"\end{scope}\\",
                r"\cElif{\var{b}}\\",
                r"\begin{scope}",
                "\t\\var{x} \\cGets{} \\num{2}\\\\",
                r"\end{scope}\\",
                r"\cElse{}\\",
                r"\begin{scope}",
                "\t\\var{x} \\cGets{} \\num{3}\\\\",
                r"\end{scope}\\",
            ])
        );
    }

    #[test]
    fn test_else_block_starting_with_if_keeps_remaining_statements() {
        let output = render("if a:\n    pass\nelse:\n    if b:\n        pass\n    x = 1\n");
        assert!(output.contains(r"\cElse{}\\"));
        assert!(!output.contains(r"\cElif"));
        assert!(output.contains(r"\var{x} \cGets{} \num{1}\\"));
    }

    #[test]
    fn test_while() {
        assert_eq!(
            render("while i < n:\n    i += 1\n"),
            lines(&[
                r"\while{\var{i} $<$ \var{n}}\\",
                r"\begin{scope}",
                "\t\\var{i} \\cGets{} \\var{i} $+$ \\num{1}\\\\",
                r"\end{scope}\\",
            ])
        );
    }

    #[test]
    fn test_augmented_assignment_inherits_parenthesization() {
        assert_eq!(
            render("x -= a + b\n"),
            lines(&[r"\var{x} \cGets{} \var{x} $-$ (\var{a} $+$ \var{b})\\"])
        );
        assert_eq!(
            render("total //= 2\n"),
            lines(&[r"\var{total} \cGets{} $\lfloor$\var{total} $/$ \num{2}$\rfloor$\\"])
        );
    }

    #[test]
    fn test_tuple_assignment() {
        assert_eq!(
            render("a, b = b, a\n"),
            lines(&[r"\var{a} \cGets{} \var{b}; \var{b} \cGets{} \var{a}\\"])
        );
        assert_eq!(
            render("_, y = 1, 2\n"),
            lines(&[r"\var{y} \cGets{} \num{2}\\"])
        );
        assert_eq!(
            render("x = 0\n_, _ = 1, 2\n"),
            lines(&[r"\var{x} \cGets{} \num{0}\\"])
        );
        assert!(matches!(
            render_err("a, b = 1, 2, 3\n"),
            ConvertError::MalformedStatement(_)
        ));
    }

    #[test]
    fn test_chained_assignment() {
        assert_eq!(
            render("a = b = 0\n"),
            lines(&[r"\var{a} \cGets{} \var{b} \cGets{} \num{0}\\"])
        );
    }

    #[test]
    fn test_data_structure_creation() {
        assert_eq!(render("s = Stack()\n"), lines(&[r"\create{a}{stack}{\var{s}}\\"]));
        assert_eq!(render("h = MinHeap()\n"), lines(&[r"\create{a}{min-heap}{\var{h}}\\"]));
        assert_eq!(
            render("l = List()\n"),
            lines(&[r"\create{a}{dynamic array}{\var{l}} \cGets{} [\;]\\"])
        );
        assert_eq!(
            render("l = List(items)\n"),
            lines(&[r"\create{a}{dynamic array}{\var{l}} \cGets{} \var{items}\\"])
        );
    }

    #[test]
    fn test_array_creation_forms() {
        assert_eq!(
            render("b = Array((0, n - 1))\n"),
            lines(&[r"\create{an}{array}{\var{b}}[\num{0}$\dots$(\var{n} $-$ \num{1})]\\"])
        );
        assert_eq!(
            render("b = Array(range(2, n))\n"),
            lines(&[r"\create{an}{array}{\var{b}}[\num{2}$\dots$\var{n}]\\"])
        );
        assert_eq!(
            render("b = Array()\n"),
            lines(&[r"\create{an}{array}{\var{b}}[\num{1}$\dots$\var{n}]\\"])
        );
        assert_eq!(
            render("b = Array((1, k), Array(a, (lo, hi)))\n"),
            lines(&[r"\create{an}{array}{\var{b}}[\num{1}$\dots$\var{k}] \cGets{} \var{a}[\var{lo}$\dots$\var{hi}]\\"])
        );
        assert!(matches!(
            render_err("b = Array(n, m)\n"),
            ConvertError::MalformedConstructor { .. }
        ));
    }

    #[test]
    fn test_matrix_creation() {
        assert_eq!(
            render("m = Mat((1, n), (1, n))\n"),
            lines(&[r"\create{a}{2-D matrix}{\var{m}}[\num{1}$\dots$\var{n}][\num{1}$\dots$\var{n}]\\"])
        );
        assert!(matches!(
            render_err("m = Mat((1, n))\n"),
            ConvertError::MalformedConstructor { ref name, .. } if name == "Mat"
        ));
    }

    #[test]
    fn test_annotated_assignment() {
        assert_eq!(
            render("a: Array((1, n))\n"),
            lines(&[r"\var{a}[\num{1}$\dots$\var{n}]\\"])
        );
        assert_eq!(
            render("a: Array((1, n)) = b\n"),
            lines(&[r"\var{a}[\num{1}$\dots$\var{n}] \cGets{} \var{b}\\"])
        );
        assert!(matches!(
            render_err("a: int = 0\n"),
            ConvertError::UnsupportedAnnotation { ref target } if target == "a"
        ));
    }

    #[test]
    fn test_parameters() {
        let output = render("def find(a: Array((1, n)), key):\n    return 0\n");
        assert!(output.contains(r"\begin{pseudocode}{Find}{\var{a}[\num{1}$\dots$\var{n}], \var{key}}"));
        assert!(matches!(
            render_err("def find(a: list):\n    return 0\n"),
            ConvertError::UnsupportedAnnotation { ref target } if target == "a"
        ));
    }

    #[test]
    fn test_simple_statements() {
        assert_eq!(
            render("while True:\n    pass\n    break\n    continue\n    return\n"),
            lines(&[
                r"\while{\true{}}\\",
                r"\begin{scope}",
                "\t\\cTodo{}\\\\",
                "\t\\cBreak{}\\\\",
                "\t\\continue{}\\\\",
                "\t\\return{}\\\\",
                r"\end{scope}\\",
            ])
        );
    }

    #[test]
    fn test_print() {
        assert_eq!(
            render("print(\"found\", x)\n"),
            lines(&[r"\print{found \var{x}}\\"])
        );
        assert_eq!(
            render("print(f\"sum is {a + b}\")\n"),
            lines(&[r"\print{sum is \var{a} $+$ \var{b}}\\"])
        );
    }

    #[test]
    fn test_docstring_becomes_comment() {
        assert_eq!(
            render("\"\"\"Sorts  the\n   array.\"\"\"\n"),
            lines(&[r"\comment{Sorts the array.}\\"])
        );
    }

    #[test]
    fn test_imports_render_nothing() {
        assert_eq!(
            render("import math\nfrom heapq import heappush\nx = 1\n"),
            lines(&[r"\var{x} \cGets{} \num{1}\\"])
        );
    }

    #[test]
    fn test_gutter_counts_direct_statements() {
        let output = render("def f(a):\n    x = 1\n    while x:\n        x -= 1\n        y = 2\n    return x\n");
        assert!(output.starts_with(r"\gutter{\lineno{1}\\\lineno{2}\\\lineno{3}}%"));
    }

    #[test]
    fn test_nested_procedure_has_its_own_counter() {
        let output = render("def outer(n):\n    def inner(k):\n        return k\n    return inner(n)\n");
        assert_eq!(
            output,
            lines(&[
                r"\gutter{\lineno{1}}%",
                r"\begin{pseudocode}{Outer}{\var{n}}",
                "\t\\gutter{\\lineno{1}}%",
                "\t\\begin{pseudocode}{Inner}{\\var{k}}",
                "\t\t\\return{} \\var{k}\\\\",
                "\t\\end{pseudocode}\\\\",
                "\t\\return{} \\func{Inner}(\\var{n})\\\\",
                r"\end{pseudocode}",
                "",
            ])
        );
    }

    #[test]
    fn test_only_enclosed_procedures_close_their_row() {
        let top = render("def f(x):\n    return x\n");
        assert!(top.trim_end().ends_with(r"\end{pseudocode}"));

        let scoped = render("if ready:\n    def g(y):\n        return y\n");
        assert!(scoped.contains("\t\\end{pseudocode}\\\\\n"), "{}", scoped);
    }

    #[test]
    fn test_procedures_are_separated_by_blank_line() {
        let output = render("def a_b(x):\n    return x\ndef c(y):\n    return y\n");
        assert!(output.contains("\\end{pseudocode}\n\n\\gutter"));
        assert!(output.contains(r"\begin{pseudocode}{A-B}{\var{x}}"));
    }

    #[test]
    fn test_block_markers_balance() {
        let source = "\
def bubble_sort(a: Array((1, n))):
    for i in range(1, n):
        for j in range(n, i, -1):
            if a[j] < a[j - 1]:
                a[j], a[j - 1] = a[j - 1], a[j]
            elif a[j] == a[j - 1]:
                continue
            else:
                pass
    while n > 0 and not done:
        n -= 1
    return a
";
        let flat = convert_source(source, &MacroRegistry::standard()).unwrap();
        let begins = flat.matches(r"\begin{").count();
        let ends = flat.matches(r"\end{").count();
        assert_eq!(begins, ends);
        assert!(indent(&flat, 0).is_ok());
        assert!(indent(&flat, 3).is_ok());
    }

    #[test]
    fn test_failure_aborts_whole_conversion() {
        let err = render_err("def f(x):\n    y = 1\n    z = b'raw'\n");
        assert!(matches!(err, ConvertError::UnsupportedLiteral(_)));
    }

    #[test]
    fn test_syntax_errors_surface_with_location() {
        let err = render_err("def f(x):\n    class A:\n        pass\n");
        match err {
            ConvertError::Syntax { span, .. } => assert_eq!(span.line, 2),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod context_tests {
    use crate::parser::parse;
    use crate::renderer::{render_body, MacroRegistry, RenderContext};

    #[test]
    fn test_counter_is_restored_after_procedure() {
        let macros = MacroRegistry::standard();
        let mut context = RenderContext::new(&macros);
        let module = parse("x = 1\ndef f():\n    a = 1\n    b = 2\ny = 2\n").unwrap();

        render_body(&mut context, &module.body).unwrap();
        assert_eq!(context.statement_count(), 2);
        assert_eq!(context.depth(), 0);
        assert!(!context.is_nested());
    }

    #[test]
    fn test_counter_is_restored_after_failure() {
        let macros = MacroRegistry::standard();
        let mut context = RenderContext::new(&macros);
        let module = parse("x = 1\ndef f():\n    a = b'raw'\n").unwrap();

        assert!(render_body(&mut context, &module.body).is_err());
        assert_eq!(context.statement_count(), 1);
        assert_eq!(context.depth(), 0);
    }
}
