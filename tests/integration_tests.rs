// Parser Robustness Tests for Phae
//
// Table-driven suites of programs that must parse, or must fail with a given
// message. Each case runs under catch_unwind so a panicking parser shows up
// as a crash rather than aborting the whole run.

use phae::ast::Program;
use phae::compile;
use phae::error::PhaeError;

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error_contains: Option<String>,
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Run all tests in this suite
    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ✓ {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  ✗ {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  💥 {}: CRASHED - {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

/// Run a single test case
fn run_single_test(test: &TestCase) -> TestResult {
    let result = std::panic::catch_unwind(|| parse_input(&test.input));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(_), true) => TestResult::Pass,
            (Ok(_), false) => TestResult::Fail("Expected parsing to fail, but it succeeded".to_string()),
            (Err(error), false) => match &test.expected_error_contains {
                Some(expected) if !error.message.contains(expected.as_str()) => TestResult::Fail(format!(
                    "Error message '{}' doesn't contain expected text '{}'",
                    error.message, expected
                )),
                _ => TestResult::Pass,
            },
            (Err(error), true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got error: {}",
                error.message
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

/// Scan and parse input
fn parse_input(input: &str) -> Result<Program, PhaeError> {
    compile(input)
}

impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error_contains: None,
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_malformed_expressions_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_print_paren",
        "print(1 + 2;",
        "Expected ')' after print argument",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_group",
        "x = (1 + 2;",
        "Expected ')' after expression",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "stray_closing_paren",
        "x = 1 + 2);",
        "Expected ';' after assignment, found ')'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_parentheses",
        "x = ();",
        "Expected expression, found ')'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_right_operand",
        "print(1 +);",
        "Expected expression",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_block",
        "if (1) { x = 1;",
        "Expected '}' after block, found end of input",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "stray_closing_brace",
        "x = 1; }",
        "Expected statement, found '}'",
    ));

    suite
}

fn create_edge_case_tests() -> TestSuite {
    let mut suite = TestSuite::new("Edge Cases");

    suite.add_test(TestCase::should_succeed("empty_input", ""));
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n\t  "));
    suite.add_test(TestCase::should_succeed("only_comment", "// nothing to see\n"));
    suite.add_test(TestCase::should_fail("unexpected_eof_after_operator", "x = 1 +"));
    suite.add_test(TestCase::should_fail("unexpected_eof_in_group", "x = 1 + ("));

    let deep_parens = format!("x = {}1{};", "(".repeat(100), ")".repeat(100));
    suite.add_test(TestCase::should_succeed("deeply_nested_parens", &deep_parens));

    suite
}

fn create_operator_tests() -> TestSuite {
    let mut suite = TestSuite::new("Operator Tests");

    suite.add_test(TestCase::should_fail("missing_left_operand", "x = * 1;"));
    suite.add_test(TestCase::should_fail("double_plus", "x = 1 ++ 2;"));
    suite.add_test(TestCase::should_succeed("negated_operand", "x = 1 - -2;"));
    suite.add_test(TestCase::should_succeed("chained_operators", "x = 1 + 2 * 3 - 4 / 5 % 6;"));
    suite.add_test(TestCase::should_succeed("comparison_equal", "x = 1 == 2;"));
    suite.add_test(TestCase::should_succeed("comparison_not_equal", "x = 1 != 2;"));
    suite.add_test(TestCase::should_succeed("comparison_less_equal", "x = 1 <= 2;"));
    suite.add_test(TestCase::should_succeed("comparison_greater_equal", "x = 1 >= 2;"));
    suite.add_test(TestCase::should_fail_with_message(
        "lone_bang",
        "x = 1 ! 2;",
        "Unexpected character: '!'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "chained_assignment",
        "x = 1 = 2;",
        "Expected ';' after assignment, found '='",
    ));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow Tests");

    suite.add_test(TestCase::should_succeed("valid_if", "if (1) { x = 1; }"));
    suite.add_test(TestCase::should_succeed("valid_if_else", "if (1) { } else { x = 2; }"));
    suite.add_test(TestCase::should_fail_with_message(
        "if_missing_condition",
        "if { x = 1; }",
        "Expected '(' after 'if'",
    ));
    suite.add_test(TestCase::should_fail("if_missing_body", "if (1)"));
    suite.add_test(TestCase::should_fail_with_message(
        "if_body_without_braces",
        "if (1) x = 1;",
        "Expected '{' before block",
    ));

    suite.add_test(TestCase::should_succeed("valid_while", "while (x < 3) { x = x + 1; }"));
    suite.add_test(TestCase::should_fail("while_missing_parens", "while x { }"));

    suite.add_test(TestCase::should_succeed("for_range_end", "for i in range(3) { print(i); }"));
    suite.add_test(TestCase::should_succeed("for_range_start_end", "for i in range(1, 4) { }"));
    suite.add_test(TestCase::should_succeed("for_range_step", "for i in range(5, 0, -1) { }"));
    suite.add_test(TestCase::should_fail_with_message(
        "for_non_range_iterable",
        "for i in x { }",
        "Only 'range' iterables are supported",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "for_missing_in",
        "for i range(3) { }",
        "Expected 'in' after loop variable",
    ));
    suite.add_test(TestCase::should_fail("for_range_no_arguments", "for i in range() { }"));
    suite.add_test(TestCase::should_fail_with_message(
        "for_range_four_arguments",
        "for i in range(1, 2, 3, 4) { }",
        "Expected ')' after range arguments",
    ));

    suite
}

fn create_literal_tests() -> TestSuite {
    let mut suite = TestSuite::new("Literal Tests");

    suite.add_test(TestCase::should_succeed("integer_literal", "x = 42;"));
    suite.add_test(TestCase::should_succeed("string_literal", "x = \"hello\";"));
    suite.add_test(TestCase::should_succeed("empty_string_literal", "x = \"\";"));
    suite.add_test(TestCase::should_fail_with_message(
        "decimal_literal",
        "x = 3.14;",
        "Unexpected character: '.'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "oversized_integer",
        "x = 99999999999999999999;",
        "Invalid integer",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string",
        "x = \"hello;",
        "Unterminated string",
    ));

    suite
}

fn create_function_tests() -> TestSuite {
    let mut suite = TestSuite::new("Function Tests");

    suite.add_test(TestCase::should_succeed("no_parameters", "function f() { }"));
    suite.add_test(TestCase::should_succeed("two_parameters", "function add(a, b) { return a + b; }"));
    suite.add_test(TestCase::should_succeed("bare_return", "function f() { return; }"));
    suite.add_test(TestCase::should_fail("trailing_comma_in_parameters", "function f(a,) { }"));
    suite.add_test(TestCase::should_fail("missing_function_name", "function (a) { }"));
    suite.add_test(TestCase::should_fail_with_message(
        "literal_parameter",
        "function f(1) { }",
        "Expected parameter name, found number '1'",
    ));

    suite.add_test(TestCase::should_succeed("call_statement", "f();"));
    suite.add_test(TestCase::should_succeed("call_with_args", "f(1, \"two\", x);"));
    suite.add_test(TestCase::should_succeed("calls_in_expression", "x = f(1) + g(2, 3);"));
    suite.add_test(TestCase::should_fail("trailing_comma_in_call", "f(1, 2,);"));
    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_call",
        "f(1, 2;",
        "Expected ')' after arguments",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "call_missing_semicolon",
        "f(1)",
        "Expected ';' after function call",
    ));

    suite
}

fn create_statement_tests() -> TestSuite {
    let mut suite = TestSuite::new("Statement Tests");

    suite.add_test(TestCase::should_succeed("assignment", "x = 1 + 2;"));
    suite.add_test(TestCase::should_succeed("input", "input(x);"));
    suite.add_test(TestCase::should_fail_with_message(
        "input_literal",
        "input(1);",
        "Expected variable name in input statement",
    ));
    suite.add_test(TestCase::should_fail("input_without_parens", "input x;"));
    suite.add_test(TestCase::should_fail_with_message(
        "print_missing_semicolon",
        "print(x)",
        "Expected ';' after print statement",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_value",
        "x = ;",
        "Expected expression",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "bare_identifier",
        "x;",
        "Expected '=' or '(' after identifier",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "expression_statement",
        "1 + 2;",
        "Expected statement, found number '1'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "reserved_word",
        "WOW x = 1;",
        "Expected statement, found 'WOW'",
    ));

    suite
}

fn create_positive_tests() -> TestSuite {
    let mut suite = TestSuite::new("Positive Tests");

    suite.add_test(TestCase::should_succeed(
        "full_program",
        r#"
        function fact(n) {
            if (n <= 1) { return 1; }
            return n * fact(n - 1);
        }
        input(limit);
        for i in range(limit) {
            print("fact(" + i + ") = " + fact(i));
        }
        count = 0;
        while (count < 3) { count = count + 1; }
        "#,
    ));
    suite.add_test(TestCase::should_succeed(
        "nested_blocks",
        "if (1) { while (0) { for i in range(1) { if (i) { } else { } } } }",
    ));

    suite
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_parser_tests() {
    let suites = vec![
        create_malformed_expressions_tests(),
        create_edge_case_tests(),
        create_operator_tests(),
        create_control_flow_tests(),
        create_literal_tests(),
        create_function_tests(),
        create_statement_tests(),
        create_positive_tests(),
    ];

    let mut failing_suites = Vec::new();
    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            failing_suites.push(results.suite_name);
        }
    }

    assert!(
        failing_suites.is_empty(),
        "parser suites with failures: {:?}",
        failing_suites
    );
}
