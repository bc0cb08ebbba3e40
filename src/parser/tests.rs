//! Parser tests.

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, Program, Stmt};
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(source: &str) -> Program {
        let tokens = Lexer::new(source).tokenize();
        Parser::new(tokens)
            .parse()
            .unwrap_or_else(|errors| panic!("parser errors for {:?}: {:?}", source, errors))
    }

    fn parse_expr(source: &str) -> Expr {
        let program = parse(source);
        assert_eq!(program.statements.len(), 1, "program: {:?}", program);
        match program.statements.into_iter().next().unwrap() {
            Stmt::Expression(expr) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_let_statements() {
        let cases = [
            ("let x = 5;", "x", "5"),
            ("let y = true;", "y", "true"),
            ("let foobar = y;", "foobar", "y"),
        ];
        for (source, expected_name, expected_value) in cases {
            let program = parse(source);
            match &program.statements[0] {
                Stmt::Let { name, value } => {
                    assert_eq!(name, expected_name);
                    assert_eq!(value.to_string(), expected_value);
                }
                other => panic!("expected let statement, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_return_statement() {
        let program = parse("return 5 + 10;");
        match &program.statements[0] {
            Stmt::Return(value) => assert_eq!(value.to_string(), "(5 + 10)"),
            other => panic!("expected return statement, got {:?}", other),
        }
    }

    #[test]
    fn test_prefix_expressions() {
        for (source, operator, operand) in [("!5;", "!", "5"), ("-15;", "-", "15")] {
            match parse_expr(source) {
                Expr::Prefix {
                    operator: op,
                    right,
                } => {
                    assert_eq!(op, operator);
                    assert_eq!(right.to_string(), operand);
                }
                other => panic!("expected prefix expression, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_infix_expressions() {
        for op in ["+", "-", "*", "/", "<", ">", "==", "!="] {
            let source = format!("5 {} 7;", op);
            match parse_expr(&source) {
                Expr::Infix { operator, .. } => assert_eq!(operator, op),
                other => panic!("expected infix expression, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_operator_precedence() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a * b + c", "((a * b) + c)"),
            ("a + b * c", "(a + (b * c))"),
            ("a + b / c", "(a + (b / c))"),
            ("3 + 4; -5 * 5", "(3 + 4)((-5) * 5)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("3 + 4 * 5 == 3 * 1 + 4 * 5", "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))"),
            ("true", "true"),
            ("3 < 5 == false", "((3 < 5) == false)"),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(!(true == true))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            ("add(a + b + c * d / f + g)", "add((((a + b) + ((c * d) / f)) + g))"),
            ("a * [1, 2, 3, 4][b * c] * d", "((a * ([1, 2, 3, 4][(b * c)])) * d)"),
            ("add(a * b[2], b[1], 2 * [1, 2][1])", "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))"),
        ];
        for (source, expected) in cases {
            assert_eq!(parse(source).to_string(), expected, "source: {}", source);
        }
    }

    #[test]
    fn test_if_expression() {
        match parse_expr("if (x < y) { x } else { y }") {
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                assert_eq!(condition.to_string(), "(x < y)");
                assert_eq!(consequence.to_string(), "x");
                assert_eq!(alternative.unwrap().to_string(), "y");
            }
            other => panic!("expected if expression, got {:?}", other),
        }
    }

    #[test]
    fn test_function_literal() {
        match parse_expr("fn(x, y) { x + y; }") {
            Expr::Function {
                parameters,
                body,
                name,
            } => {
                assert_eq!(parameters, vec!["x", "y"]);
                assert_eq!(body.to_string(), "(x + y)");
                assert_eq!(name, None);
            }
            other => panic!("expected function literal, got {:?}", other),
        }
    }

    #[test]
    fn test_function_parameter_lists() {
        let cases: [(&str, &[&str]); 3] = [
            ("fn() {};", &[]),
            ("fn(x) {};", &["x"]),
            ("fn(x, y, z) {};", &["x", "y", "z"]),
        ];
        for (source, expected) in cases {
            match parse_expr(source) {
                Expr::Function { parameters, .. } => assert_eq!(parameters, expected),
                other => panic!("expected function literal, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_function_literal_with_name() {
        let program = parse("let myFunction = fn() { };");
        match &program.statements[0] {
            Stmt::Let { value, .. } => match value {
                Expr::Function { name, .. } => {
                    assert_eq!(name.as_deref(), Some("myFunction"));
                }
                other => panic!("expected function literal, got {:?}", other),
            },
            other => panic!("expected let statement, got {:?}", other),
        }
    }

    #[test]
    fn test_call_expression() {
        match parse_expr("add(1, 2 * 3, 4 + 5);") {
            Expr::Call {
                function,
                arguments,
            } => {
                assert_eq!(function.to_string(), "add");
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                assert_eq!(args, vec!["1", "(2 * 3)", "(4 + 5)"]);
            }
            other => panic!("expected call expression, got {:?}", other),
        }
    }

    #[test]
    fn test_array_literal() {
        match parse_expr("[1, 2 * 2, 3 + 3]") {
            Expr::Array(elements) => {
                assert_eq!(elements.len(), 3);
                assert_eq!(elements[1].to_string(), "(2 * 2)");
            }
            other => panic!("expected array literal, got {:?}", other),
        }
    }

    #[test]
    fn test_hash_literals() {
        match parse_expr(r#"{"one": 1, "two": 2, "three": 3}"#) {
            Expr::Hash(pairs) => {
                let rendered: Vec<(String, String)> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                assert_eq!(
                    rendered,
                    vec![
                        ("one".to_string(), "1".to_string()),
                        ("two".to_string(), "2".to_string()),
                        ("three".to_string(), "3".to_string()),
                    ]
                );
            }
            other => panic!("expected hash literal, got {:?}", other),
        }

        match parse_expr("{}") {
            Expr::Hash(pairs) => assert!(pairs.is_empty()),
            other => panic!("expected hash literal, got {:?}", other),
        }

        match parse_expr("{1: 0 + 1, 2: 10 - 8}") {
            Expr::Hash(pairs) => {
                assert_eq!(pairs[0].1.to_string(), "(0 + 1)");
                assert_eq!(pairs[1].1.to_string(), "(10 - 8)");
            }
            other => panic!("expected hash literal, got {:?}", other),
        }
    }

    #[test]
    fn test_index_expression() {
        match parse_expr("myArray[1 + 1]") {
            Expr::Index { left, index } => {
                assert_eq!(left.to_string(), "myArray");
                assert_eq!(index.to_string(), "(1 + 1)");
            }
            other => panic!("expected index expression, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_errors_are_collected() {
        let tokens = Lexer::new("let = 5; let x 7;").tokenize();
        let errors = Parser::new(tokens).parse().unwrap_err();
        assert!(errors.len() >= 2, "errors: {:?}", errors);
    }
}
