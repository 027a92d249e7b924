//! End-to-end tests: source text through the parser, compiler, and VM.

use dipper::{parse, CollectStreams, Module, Value, VirtualMachine, VmError};
use pretty_assertions::assert_eq;

/// Parses, compiles, and runs a program, returning the exit status, the
/// terminal return value of `main`, and the captured streams.
fn execute(source: &str, argv: Vec<String>) -> (i32, Value, CollectStreams) {
    let items = parse(source).expect("program parses");
    let module = Module::from_items("<test>", "globals", &items).expect("program compiles");
    let vm = VirtualMachine::new(module, argv);
    let mut streams = CollectStreams::new();
    let mut result = Value::Null;
    let status = vm
        .run_observed(&mut streams, |value| result = value.clone())
        .expect("program runs");
    (status, result, streams)
}

fn run(source: &str) -> Value {
    execute(source, vec![]).1
}

fn run_int(source: &str) -> i64 {
    match run(source) {
        Value::Int(v) => v,
        other => panic!("expected int result, got {}", other.repr()),
    }
}

fn run_err(source: &str) -> VmError {
    let items = parse(source).expect("program parses");
    let module = Module::from_items("<test>", "globals", &items).expect("program compiles");
    let vm = VirtualMachine::new(module, vec![]);
    vm.run(&mut CollectStreams::new())
        .expect_err("program fails at runtime")
}

#[test]
fn return_constant() {
    assert_eq!(run_int("fn main() { return 0 }"), 0);
}

#[test]
fn add_consts() {
    assert_eq!(run_int("fn main() { return 5 + 5 }"), 10);
}

#[test]
fn add_vars() {
    assert_eq!(
        run_int(
            "fn main() {
                x = 5
                y = 5
                return x + y
            }"
        ),
        10
    );
}

#[test]
fn sub_mul_div() {
    assert_eq!(run_int("fn main() { x = 5\ny = 4\nreturn x - y }"), 1);
    assert_eq!(run_int("fn main() { x = 2\ny = 3\nreturn x * y }"), 6);
    assert_eq!(run_int("fn main() { x = 6\ny = 3\nreturn x / y }"), 2);
}

#[test]
fn integer_division_truncates_toward_zero() {
    assert_eq!(run_int("fn main() { x = 7\ny = 2\nreturn x / y }"), 3);
    assert_eq!(run_int("fn main() { x = -7\ny = 2\nreturn x / y }"), -3);
    assert_eq!(run_int("fn main() { x = 7\ny = -2\nreturn x / y }"), -3);
}

#[test]
fn sqrt_of_int_and_float() {
    let result = run("fn main() { x : int = 4\nreturn sqrt(x) }");
    assert!(matches!(result, Value::Float(v) if v == 2.0));
    let result = run("fn main() { x : float = 4.0\nreturn sqrt(x) }");
    assert!(matches!(result, Value::Float(v) if v == 2.0));
}

#[test]
fn equality_on_variables() {
    assert!(matches!(
        run("fn main() { x = 4\nreturn 4 == x }"),
        Value::Bool(true)
    ));
    assert!(matches!(
        run("fn main() { x = 4\nreturn 4 != x }"),
        Value::Bool(false)
    ));
}

#[test]
fn string_concat_and_len() {
    let result = run("fn main() { x = \"a\"\nreturn x + \"b\" }");
    assert_eq!(result.display(), "ab");
    assert!(matches!(
        run("fn main() { x = \"abcd\"\nreturn len(x) == 4 }"),
        Value::Bool(true)
    ));
    assert!(matches!(
        run("fn main() { x = \"abcd\"\nreturn len(x + \"zzzz\") == 8 }"),
        Value::Bool(true)
    ));
}

#[test]
fn if_else_selects_branch() {
    assert_eq!(
        run_int(
            "fn main() {
                x = 10
                if x > 20 {
                    return x
                }
                else {
                    return x + 10
                }
            }"
        ),
        20
    );
}

#[test]
fn elif_chain_takes_the_matching_arm() {
    assert_eq!(
        run_int(
            "fn main() {
                x = 10
                if x > 20 { return x }
                elif x > 15 { return 2 }
                elif x > 11 { return 3 }
                elif x == 10 { return 999 }
                else { return x + 10 }
            }"
        ),
        999
    );
}

#[test]
fn if_without_else_falls_through() {
    assert_eq!(
        run_int(
            "fn main() {
                x = 1
                if x > 5 { return 100 }
                return 7
            }"
        ),
        7
    );
}

#[test]
fn user_function_call() {
    assert_eq!(
        run_int(
            "fn add(x, y) {
                return x + y
            }
            fn main() {
                return add(5, 5)
            }"
        ),
        10
    );
}

#[test]
fn recursion_fib() {
    assert_eq!(
        run_int(
            "fn fib(n : int) -> int {
                if n < 2 { return n }
                return fib(n - 2) + fib(n - 1)
            }
            fn main() {
                return fib(10)
            }"
        ),
        55
    );
}

#[test]
fn forward_reference_to_later_function() {
    assert_eq!(
        run_int(
            "fn main() {
                return later()
            }
            fn later() {
                return 12
            }"
        ),
        12
    );
}

#[test]
fn for_loop_accumulates() {
    assert_eq!(
        run_int(
            "fn main() {
                x = 10
                for i in 0..10 {
                    x += 1
                }
                return x
            }"
        ),
        20
    );
}

#[test]
fn for_loop_variable_is_visible_in_body() {
    assert_eq!(
        run_int(
            "fn main() {
                total = 0
                for i in 0..5 {
                    total += i
                }
                return total
            }"
        ),
        10
    );
}

#[test]
fn inplace_operators() {
    assert_eq!(run_int("fn main() { x = 10\nx += 2\nreturn x }"), 12);
    assert_eq!(run_int("fn main() { x = 10\nx -= 2\nreturn x }"), 8);
    assert_eq!(run_int("fn main() { x = 10\nx *= 2\nreturn x }"), 20);
    assert_eq!(run_int("fn main() { x = 10\nx /= 2\nreturn x }"), 5);
}

#[test]
fn print_items_are_space_separated() {
    let (_, _, streams) = execute("fn main() { print 1 2 3 }", vec![]);
    assert_eq!(streams.stdout_str(), "1 2 3\n");
}

#[test]
fn print_trailing_comma_suppresses_newline() {
    let (_, _, streams) = execute(
        "fn main() {
            print \"a\" ,
            print \"b\"
        }",
        vec![],
    );
    assert_eq!(streams.stdout_str(), "ab\n");
}

#[test]
fn bare_print_writes_a_newline() {
    let (_, _, streams) = execute("fn main() { print }", vec![]);
    assert_eq!(streams.stdout_str(), "\n");
}

#[test]
fn print_renders_values() {
    let (_, _, streams) = execute(
        "fn main() {
            x : float = 2.0
            print \"x =\" x
        }",
        vec![],
    );
    assert_eq!(streams.stdout_str(), "x = 2.0\n");
}

#[test]
fn struct_construction_and_return() {
    let result = run(
        "struct Point {
            x : int
            y : int
        }
        fn main() {
            p = Point(3, 4)
            return p
        }",
    );
    assert_eq!(result.display(), "Point(3, 4)");
}

#[test]
fn struct_field_type_is_enforced_at_bind() {
    let err = run_err(
        "struct Point { x : int, y : int }
        fn main() {
            p = Point(1, \"nope\")
            return p
        }",
    );
    assert!(err.error.to_string().contains("expects int"));
}

#[test]
fn struct_forward_reference_from_function() {
    let result = run(
        "fn make() {
            return Pair(1, 2)
        }
        struct Pair { a : int, b : int }
        fn main() {
            return make()
        }",
    );
    assert_eq!(result.display(), "Pair(1, 2)");
}

#[test]
fn main_receives_argv_list() {
    let (_, result, _) = execute(
        "fn main(args) { return len(args) }",
        vec!["prog.dip".to_owned(), "x".to_owned(), "y".to_owned()],
    );
    assert_eq!(result.as_int().unwrap(), 3);
}

#[test]
fn main_without_parameter_ignores_argv() {
    let (status, result, _) = execute(
        "fn main() { return 1 }",
        vec!["prog.dip".to_owned(), "x".to_owned()],
    );
    assert_eq!(status, 0);
    assert_eq!(result.as_int().unwrap(), 1);
}

#[test]
fn name_shadowing_rebinds_forward() {
    assert_eq!(
        run_int(
            "fn main() {
                x = 5
                y = x + 1
                x = 100
                return x + y
            }"
        ),
        106
    );
}

#[test]
fn constant_folding_matches_runtime_results() {
    let cases = [
        (9, "+", 4),
        (9, "-", 4),
        (9, "*", 4),
        (9, "/", 4),
        (-9, "/", 4),
        (9, "/", -4),
        (7, "==", 7),
        (7, "!=", 8),
        (3, "<", 5),
        (5, ">", 3),
        (5, "<=", 5),
        (5, ">=", 6),
    ];
    for (a, op, b) in cases {
        let folded = run(&format!("fn main() {{ return {a} {op} {b} }}"));
        let runtime = run(&format!(
            "fn main() {{ x = {a}\ny = {b}\nreturn x {op} y }}"
        ));
        assert_eq!(
            folded.repr(),
            runtime.repr(),
            "folding diverged for {a} {op} {b}"
        );
    }
}

#[test]
fn compiled_functions_satisfy_bytecode_invariants() {
    let items = parse(
        "fn fib(n : int) -> int {
            if n < 2 { return n }
            return fib(n - 2) + fib(n - 1)
        }
        fn main() {
            total = 0
            for i in 0..5 {
                total += fib(i)
            }
            if total > 100 { return 0 }
            elif total > 10 { return 1 }
            else { return 2 }
        }",
    )
    .unwrap();
    let module = Module::from_items("<test>", "globals", &items).unwrap();

    for name in ["fib", "main"] {
        let func = module.get_func(name).unwrap();
        assert_eq!(
            func.bytecode.last().unwrap().op,
            dipper::Opcode::Ret,
            "{name} must end with RET"
        );
        for instr in &func.bytecode {
            if let Some(target) = instr.branch_target() {
                assert!(
                    target >= 0 && (target as usize) < func.bytecode.len(),
                    "{name}: branch target {target} out of range in {}",
                    instr.render()
                );
            }
        }
        // the first N template slots are the declared arguments
        for (i, param) in func.params.iter().enumerate() {
            assert_eq!(func.bindings[&param.name], i, "{name}: argument order");
        }
    }
}

#[test]
fn unknown_variable_is_a_compile_error() {
    let items = parse("fn main() { return nope }").unwrap();
    let err = Module::from_items("<test>", "globals", &items).unwrap_err();
    assert!(err.message.contains("nope"));
    assert_eq!(err.pos.line, 1);
}

#[test]
fn call_arity_is_a_compile_error() {
    let items = parse(
        "fn add(x, y) { return x + y }
        fn main() { return add(5) }",
    )
    .unwrap();
    let err = Module::from_items("<test>", "globals", &items).unwrap_err();
    assert!(err.message.contains("expected 2, got 1"));
}

#[test]
fn unsupported_operator_is_a_compile_error() {
    let items = parse("fn main() { x = \"a\"\nreturn x - x }").unwrap();
    assert!(Module::from_items("<test>", "globals", &items).is_err());
}

#[test]
fn division_by_zero_reports_with_frame_context() {
    let err = run_err("fn main() { x = 1\ny = 0\nreturn x / y }");
    assert!(err.error.to_string().contains("division by zero"));
    let trace = err.trace.as_ref().expect("runtime errors carry frame context");
    assert_eq!(trace.function, "main");
    assert!(!trace.registers.is_empty());

    let rendered = report_for("fn main() { x = 1\ny = 0\nreturn x / y }", &err);
    assert!(rendered.contains("division by zero"));
    assert!(rendered.contains("frame registers"));
}

fn report_for(source: &str, err: &VmError) -> String {
    dipper::report::render_runtime("<test>", source, err)
}

#[test]
fn module_dump_lists_functions_and_structs() {
    let items = parse(
        "struct Point { x : int, y : int }
        fn main() { return 0 }",
    )
    .unwrap();
    let module = Module::from_items("<test>", "globals", &items).unwrap();
    let dump = module.dump();
    assert!(dump.contains("Structs:"));
    assert!(dump.contains("Point { x:int, y:int }"));
    assert!(dump.contains("----- main -----"));
    assert!(dump.contains("RET"));
}
