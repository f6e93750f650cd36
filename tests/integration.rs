//! End-to-end tests driving the full scan -> parse -> resolve -> interpret pipeline through the
//! public API, one scenario per test. Grounded on the teacher pack's `tests/*.rs` convention (see
//! `H1ghBre4k3r-y-lang`'s one-file-per-example layout): each test is a self-contained program and
//! its expected output, rather than a single file asserting many unrelated cases.

use lox::diagnostics::Diagnostics;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::scan_tokens;

/// Runs a whole Lox program through the pipeline and returns what it printed, panicking on any
/// static or runtime error (callers that want to assert on failure use [try_run] instead).
fn run(source: &str) -> String {
    try_run(source).expect("program was expected to run cleanly")
}

fn try_run(source: &str) -> Result<String, String> {
    let mut diagnostics = Diagnostics::new();
    let tokens = scan_tokens(source, &mut diagnostics);
    let statements = Parser::new(tokens, &mut diagnostics).parse();
    if diagnostics.had_error() {
        return Err("static error".to_owned());
    }

    let locals = Resolver::new(&mut diagnostics).resolve(&statements);
    if diagnostics.had_error() {
        return Err("resolution error".to_owned());
    }

    let mut out = Vec::new();
    let mut interpreter = Interpreter::new(&mut out);
    interpreter.set_locals(locals);
    interpreter
        .interpret(&statements)
        .map_err(|err| err.to_string())?;

    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn fibonacci_recursion() {
    let source = "
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
    ";
    assert_eq!("55\n", run(source));
}

#[test]
fn counter_closures_are_independent_per_call() {
    let source = "
        fun makeCounter() {
            var count = 0;
            fun increment() {
                count = count + 1;
                return count;
            }
            return increment;
        }
        var a = makeCounter();
        var b = makeCounter();
        print a();
        print a();
        print b();
    ";
    assert_eq!("1\n2\n1\n", run(source));
}

#[test]
fn block_scoping_restores_outer_binding_after_the_block() {
    let source = "
        var a = \"global\";
        {
            var a = \"block\";
            print a;
        }
        print a;
    ";
    assert_eq!("block\nglobal\n", run(source));
}

#[test]
fn for_loop_desugars_and_runs() {
    let source = "
        var total = 0;
        for (var i = 1; i <= 5; i = i + 1) {
            total = total + i;
        }
        print total;
    ";
    assert_eq!("15\n", run(source));
}

#[test]
fn logical_operators_short_circuit_and_return_operand_values() {
    let source = "
        print nil or \"fallback\";
        print false and \"never\";
    ";
    assert_eq!("fallback\nfalse\n", run(source));
}

#[test]
fn string_concatenation_and_number_formatting() {
    assert_eq!("ab\n3\n3.5\n", run("print \"a\" + \"b\"; print 1 + 2; print 7 / 2.0;"));
}

#[test]
fn native_clock_is_callable_with_no_arguments() {
    assert!(run("print clock() >= 0;").starts_with("true"));
}

#[test]
fn adding_a_number_and_a_string_is_a_runtime_error() {
    assert!(try_run("print 1 + \"a\";").is_err());
}

#[test]
fn calling_a_non_callable_value_is_a_runtime_error() {
    assert!(try_run("var a = 1; a();").is_err());
}

#[test]
fn wrong_argument_count_is_a_runtime_error() {
    assert!(try_run("fun add(a, b) { return a + b; } add(1);").is_err());
}

#[test]
fn undefined_variable_is_a_runtime_error() {
    assert!(try_run("print undeclared;").is_err());
}

#[test]
fn reading_a_local_in_its_own_initializer_is_a_static_error() {
    assert!(try_run("{ var a = a; }").is_err());
}

#[test]
fn returning_from_top_level_code_is_a_static_error() {
    assert!(try_run("return 1;").is_err());
}
