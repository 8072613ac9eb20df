mod common;

#[cfg(test)]
mod interpreter_tests {
    use lox_interpreter as lox;

    use lox::error::LoxError;
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;
    use lox::value::Value;

    use crate::common::{run, run_lines, run_runtime_error, SharedBuffer};

    fn evaluate(source: &str) -> String {
        let (tokens, _) = Scanner::new(source).scan_all();
        let expr = Parser::new(&tokens).parse_expression().expect("parses");

        let mut interpreter = Interpreter::new();
        match interpreter.evaluate(&expr) {
            Ok(value) => value.to_string(),
            Err(e) => e.message(),
        }
    }

    #[test]
    fn test_arithmetic_and_number_formatting() {
        assert_eq!(evaluate("1 + 2"), "3");
        assert_eq!(evaluate("5 / 2"), "2.5");
        assert_eq!(evaluate("-(3 * 4) + 0.5"), "-11.5");
        assert_eq!(evaluate("10 - 2 - 3"), "5");
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        assert_eq!(evaluate("1 / 0"), "inf");
        assert_eq!(evaluate("-1 / 0"), "-inf");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(evaluate("\"foo\" + \"bar\""), "foobar");
    }

    #[test]
    fn test_mixed_plus_is_an_error() {
        assert_eq!(evaluate("\"a\" + 1"), "Operands must be two numbers or two strings.");
        assert_eq!(evaluate("1 + nil"), "Operands must be two numbers or two strings.");
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(evaluate("-\"x\""), "Operand must be a number.");
        assert_eq!(evaluate("1 < \"2\""), "Operands must be numbers.");
        assert_eq!(evaluate("true * 2"), "Operands must be numbers.");
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(evaluate("!nil"), "true");
        assert_eq!(evaluate("!false"), "true");
        assert_eq!(evaluate("!0"), "false");
        assert_eq!(evaluate("!\"\""), "false");
    }

    #[test]
    fn test_equality_never_coerces() {
        assert_eq!(evaluate("nil == nil"), "true");
        assert_eq!(evaluate("nil == false"), "false");
        assert_eq!(evaluate("1 == \"1\""), "false");
        assert_eq!(evaluate("\"ab\" == \"a\" + \"b\""), "true");
        assert_eq!(evaluate("2 != 3"), "true");
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(evaluate("nil or \"yes\""), "yes");
        assert_eq!(evaluate("1 or undefined"), "1");
        assert_eq!(evaluate("false and undefined"), "false");
        assert_eq!(evaluate("1 and 2"), "2");
    }

    #[test]
    fn test_value_equality_by_identity() {
        let a = Value::Number(1.0);
        assert_eq!(a, Value::Number(1.0));
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::String("1".into()), Value::Number(1.0));
    }

    #[test]
    fn test_block_scoping_restores_outer_binding() {
        let source = r#"
            var a = 1;
            {
                var a = 2;
                print a;
            }
            print a;
        "#;

        assert_eq!(run_lines(source), vec!["2", "1"]);
    }

    #[test]
    fn test_assignment_reaches_enclosing_frame() {
        let source = r#"
            var a = 1;
            {
                a = 2;
                { a = a + 1; }
            }
            print a;
        "#;

        assert_eq!(run_lines(source), vec!["3"]);
    }

    #[test]
    fn test_undefined_global_halts_run() {
        let (output, err) = run_runtime_error("print x;\nprint \"unreachable\";");

        assert_eq!(output, "");
        assert_eq!(err.to_string(), "Undefined variable 'x'.\n[line 1]");
    }

    #[test]
    fn test_assign_to_undefined_global() {
        let (_, err) = run_runtime_error("y = 1;");

        assert_eq!(err.message(), "Undefined variable 'y'.");
    }

    #[test]
    fn test_output_before_runtime_error_is_kept() {
        let (output, err) = run_runtime_error("print 1;\nprint -nil;\nprint 2;");

        assert_eq!(output, "1\n");
        assert_eq!(err.line(), Some(2));
        assert!(matches!(err, LoxError::Runtime { .. }));
    }

    #[test]
    fn test_control_flow() {
        let source = r#"
            var out = "";
            for (var i = 0; i < 5; i = i + 1) {
                if (i == 2) out = out + "two"; else out = out + "x";
            }
            print out;

            var n = 0;
            while (n < 3) n = n + 1;
            print n;
        "#;

        assert_eq!(run_lines(source), vec!["xxtwoxx", "3"]);
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        "#;

        assert_eq!(run_lines(source), vec!["610"]);
    }

    #[test]
    fn test_return_unwinds_loops_and_blocks() {
        let source = r#"
            fun find() {
                var i = 0;
                while (true) {
                    {
                        if (i == 4) return i;
                    }
                    i = i + 1;
                }
            }
            print find();

            fun nothing() { return; }
            print nothing();

            fun implicit() {}
            print implicit();
        "#;

        assert_eq!(run_lines(source), vec!["4", "nil", "nil"]);
    }

    #[test]
    fn test_environment_restored_after_return() {
        let source = r#"
            var a = "outer";
            fun f() {
                var a = "inner";
                { return a; }
            }
            print f();
            print a;
        "#;

        assert_eq!(run_lines(source), vec!["inner", "outer"]);
    }

    #[test]
    fn test_counters_are_independent() {
        let source = r#"
            fun makeCounter() {
                var count = 0;
                fun inc() {
                    count = count + 1;
                    return count;
                }
                return inc;
            }

            var a = makeCounter();
            var b = makeCounter();
            print a();
            print a();
            print b();
        "#;

        assert_eq!(run_lines(source), vec!["1", "2", "1"]);
    }

    #[test]
    fn test_closures_share_captured_frame() {
        let source = r#"
            var get;
            var set;
            {
                var value = "before";
                fun g() { return value; }
                fun s(v) { value = v; }
                get = g;
                set = s;
            }
            set("after");
            print get();
        "#;

        assert_eq!(run_lines(source), vec!["after"]);
    }

    #[test]
    fn test_forward_reference_between_globals() {
        let source = r#"
            fun isEven(n) { if (n == 0) return true; return isOdd(n - 1); }
            fun isOdd(n) { if (n == 0) return false; return isEven(n - 1); }
            print isEven(10);
        "#;

        assert_eq!(run_lines(source), vec!["true"]);
    }

    #[test]
    fn test_too_few_arguments() {
        let (output, err) = run_runtime_error("fun f(a, b) { print \"ran\"; }\nf(1);");

        assert_eq!(output, "");
        assert_eq!(err.to_string(), "Not enough arguments. Expected 2 but got 1.\n[line 2]");
    }

    #[test]
    fn test_extra_arguments_are_ignored() {
        assert_eq!(run_lines("fun f(a) { print a; }\nf(1, 2, 3);"), vec!["1"]);
    }

    #[test]
    fn test_arguments_evaluated_left_to_right() {
        let source = r#"
            fun show(x) { print x; return x; }
            fun pair(a, b) {}
            pair(show(1), show(2));
        "#;

        assert_eq!(run_lines(source), vec!["1", "2"]);
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (_, err) = run_runtime_error("\"text\"();");
        assert_eq!(err.message(), "Can only call functions and classes.");

        let (_, err) = run_runtime_error("var n = 3;\nn(1);");
        assert_eq!(err.message(), "Can only call functions and classes.");
    }

    #[test]
    fn test_callable_display() {
        assert_eq!(
            run_lines("fun greet() {}\nprint greet;\nprint clock;"),
            vec!["<fn greet>", "<native fn clock>"]
        );
    }

    #[test]
    fn test_clock_returns_seconds() {
        assert_eq!(
            run_lines("var t = clock();\nprint t > 1000000000;\nprint clock() >= t;"),
            vec!["true", "true"]
        );
    }

    #[test]
    fn test_functions_compare_by_identity() {
        let source = r#"
            fun f() {}
            var g = f;
            print f == g;
            fun make() { fun inner() {} return inner; }
            print make() == make();
        "#;

        assert_eq!(run_lines(source), vec!["true", "false"]);
    }

    #[test]
    fn test_static_error_exit_code() {
        let outcome = run("print ;");

        let err = outcome.result.expect_err("rejected");
        assert_eq!(err.exit_code(), 65);
        assert_eq!(err.to_string(), "[line 1] Error at ';': Expect expression.");
    }

    #[test]
    fn test_runtime_error_exit_code() {
        let outcome = run("print -\"no\";");

        assert_eq!(outcome.result.expect_err("fails").exit_code(), 70);
    }

    #[test]
    fn test_lex_and_parse_errors_reported_together() {
        let outcome = run("print @1;\nprint ;");

        let err = outcome.result.expect_err("rejected");
        assert_eq!(
            err.to_string(),
            "[line 1] Error: Unexpected character: @\n[line 2] Error at ';': Expect expression."
        );
    }

    #[test]
    fn test_interpreter_reused_across_programs() {
        // both `a` reads below get the first id of their parse
        let first = "{ var a = 1; print a; }";
        let second = "var a = \"global\";\n{ var b = a; var a = \"local\"; print b; }";

        let (first_tokens, _) = Scanner::new(first).scan_all();
        let (second_tokens, _) = Scanner::new(second).scan_all();

        let buffer = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));

        for tokens in [&first_tokens, &second_tokens] {
            let statements = Parser::new(tokens).parse().expect("parses");
            let locals = Resolver::new().resolve(&statements).expect("resolves");
            interpreter.interpret(&statements, locals).expect("runs");
        }

        assert_eq!(buffer.contents(), "1\nglobal\n");
    }
}
