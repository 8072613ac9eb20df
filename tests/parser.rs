#[cfg(test)]
mod parser_tests {
    use lox_interpreter as lox;

    use lox::ast::{Expr, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::parser::Parser;
    use lox::scanner::Scanner;

    fn print_program(source: &str) -> String {
        let (tokens, diagnostics) = Scanner::new(source).scan_all();
        assert!(diagnostics.is_empty(), "lex errors: {}", diagnostics);

        let statements = Parser::new(&tokens)
            .parse()
            .unwrap_or_else(|d| panic!("parse errors:\n{}", d));

        AstPrinter::print_program(&statements)
    }

    fn parse_errors(source: &str) -> Vec<String> {
        let (tokens, _) = Scanner::new(source).scan_all();

        match Parser::new(&tokens).parse() {
            Ok(_) => panic!("expected parse errors for: {}", source),
            Err(d) => d.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(
            print_program("print (1 + 2) * 3 - -4 / 2;"),
            "(print (- (* (group (+ 1.0 2.0)) 3.0) (/ (- 4.0) 2.0)))"
        );
    }

    #[test]
    fn test_logical_operators_bind_looser_than_equality() {
        assert_eq!(
            print_program("a == 1 or b and !c;"),
            "(; (or (== a 1.0) (and b (! c))))"
        );
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(print_program("a = b = 3;"), "(; (= a (= b 3.0)))");
    }

    #[test]
    fn test_for_loop_desugars_to_while() {
        assert_eq!(
            print_program("for (var i = 0; i < 3; i = i + 1) print i;"),
            "(block (var i = 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"
        );
    }

    #[test]
    fn test_empty_for_clauses_loop_forever() {
        assert_eq!(print_program("for (;;) print 1;"), "(while true (print 1.0))");
    }

    #[test]
    fn test_if_else_and_while() {
        assert_eq!(
            print_program("if (x) print \"yes\"; else { print \"no\"; } while (false) x = nil;"),
            "(if x then (print \"yes\") else (block (print \"no\")))\n(while false (; (= x nil)))"
        );
    }

    #[test]
    fn test_function_declaration() {
        assert_eq!(
            print_program("fun add(a, b) { return a + b; } add(1, 2);"),
            "(fun add(a b) (return (+ a b)))\n(; (call add 1.0 2.0))"
        );
    }

    #[test]
    fn test_class_with_superclass_and_super_call() {
        assert_eq!(
            print_program("class B < A { greet() { return super.greet(); } }"),
            "(class B < A (fun greet() (return (call (super greet)))))"
        );
    }

    #[test]
    fn test_property_get_and_set() {
        assert_eq!(
            print_program("this.a.b = obj.c(1);"),
            "(; (= (. this a) b (call (. obj c) 1.0)))"
        );
    }

    #[test]
    fn test_scope_sensitive_nodes_get_distinct_ids() {
        let (tokens, _) = Scanner::new("a = a; this; super.m;").scan_all();
        let statements = Parser::new(&tokens).parse().expect("parses");

        let mut ids = Vec::new();
        for stmt in &statements {
            if let Stmt::Expression(expr) = stmt {
                match expr {
                    Expr::Assign { id, value, .. } => {
                        ids.push(*id);
                        if let Expr::Variable { id, .. } = value.as_ref() {
                            ids.push(*id);
                        }
                    }
                    Expr::This { id, .. } | Expr::Super { id, .. } => ids.push(*id),
                    _ => {}
                }
            }
        }

        let mut unique = ids.clone();
        unique.sort_by_key(|id| id.0);
        unique.dedup();

        assert_eq!(ids.len(), 4);
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(
            parse_errors("1 + 2 = 3;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_errors_are_collected_after_synchronizing() {
        let errors = parse_errors("var = 1;\nprint 2\nvar ok = 3;\nprint );");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at 'var': Expect ';' after value.",
                "[line 4] Error at ')': Expect expression.",
            ]
        );
    }

    #[test]
    fn test_error_at_end() {
        assert_eq!(
            parse_errors("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_parse_single_expression() {
        let (tokens, _) = Scanner::new("\"a\" + nil").scan_all();
        let expr = Parser::new(&tokens).parse_expression().expect("parses");

        assert_eq!(AstPrinter::print(&expr), "(+ \"a\" nil)");
    }

    #[test]
    fn test_parse_expression_rejects_trailing_tokens() {
        let (tokens, _) = Scanner::new("1 2").scan_all();
        let err = Parser::new(&tokens).parse_expression().unwrap_err();

        assert_eq!(err.to_string(), "[line 1] Error at '2': Expect end of expression.");
    }

    #[test]
    fn test_argument_and_parameter_limits() {
        let args = |n: usize| vec!["a"; n].join(", ");

        let source = format!("f({});", args(255));
        let (tokens, _) = Scanner::new(&source).scan_all();
        assert!(Parser::new(&tokens).parse().is_ok());

        assert_eq!(
            parse_errors(&format!("f({});", args(256))),
            vec!["[line 1] Error at 'a': Can't have more than 255 arguments."]
        );

        let params = (0..256).map(|i| format!("p{}", i)).collect::<Vec<_>>().join(", ");
        assert_eq!(
            parse_errors(&format!("fun f({}) {{}}", params)),
            vec!["[line 1] Error at 'p255': Can't have more than 255 parameters."]
        );
    }
}
