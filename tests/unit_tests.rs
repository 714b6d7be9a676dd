//! Integration tests for the full pipeline: source text through the
//! compiler, assembler and machine.

use std::path::PathBuf;

use fool::prelude::*;
use proptest::prelude::*;

/// Load a program from the test_scripts directory.
fn load_script(filename: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_scripts")
        .join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

fn printed(source: &str) -> Vec<Word> {
    fool::run(source)
        .unwrap_or_else(|e| panic!("program failed: {e}"))
        .printed
}

fn compile(source: &str) -> Result<CompiledProgram, FoolError> {
    fool::compile(source, &CompileOptions::default())
}

fn compilation_errors(source: &str) -> Vec<CompilationError> {
    match compile(source) {
        Err(FoolError::Compilation(errors)) => errors.into_iter().collect(),
        other => panic!("expected compilation errors, got {other:?}"),
    }
}

// =============================================================================
// Basic Programs
// =============================================================================

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(printed("print(2+3*4);"), vec![14]);
}

#[test]
fn test_global_variable() {
    assert_eq!(printed("let var x:int = 5; in print(x); ;"), vec![5]);
}

#[test]
fn test_if_without_print() {
    let outcome = fool::run("if 1 == 1 then { true } else { false };").unwrap();
    assert!(outcome.printed.is_empty());
    assert_eq!(outcome.top, Some(1));
}

#[test]
fn test_if_leaves_branch_value_on_stack() {
    let outcome = fool::run("if true then {1} else {2};").unwrap();
    assert!(outcome.printed.is_empty());
    assert_eq!(outcome.top, Some(1));
}

#[test]
fn test_printed_text_goes_to_writer() {
    let mut out = Vec::new();
    fool::run_with_output("print(print(7) - 1);", MachineConfig::default(), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "7\n6\n");
}

#[test]
fn test_comparisons() {
    let cases = [
        ("print(3 >= 7);", 0),
        ("print(7 >= 3);", 1),
        ("print(3 >= 3);", 1),
        ("print(3 <= 3);", 1),
        ("print(4 <= 3);", 0),
        ("print(2 == 2);", 1),
        ("print(true == false);", 0),
        ("print(null == null);", 1),
        ("print(!true);", 0),
        ("print(true && false);", 0),
        ("print(false || true);", 1),
    ];
    for (source, expected) in cases {
        assert_eq!(printed(source), vec![expected], "{source}");
    }
}

#[test]
fn test_functions_and_recursion() {
    let source = "let
        fun fib:int (n:int) if n <= 1 then { n } else { fib(n - 1) + fib(n - 2) };
        in print(fib(10));";
    assert_eq!(printed(source), vec![55]);
}

#[test]
fn test_function_values_survive_calls() {
    let source = "let
        var a:int = 1;
        fun f:int (x:int, y:bool) let var z:int = x * 2; in if y then { z } else { a };
        var b:int = f(20, true);
        in print(b + f(3, false));";
    assert_eq!(printed(source), vec![41]);
}

// =============================================================================
// Objects
// =============================================================================

const COUNTER: &str = "let
    class Counter (start:int, step:int) {
        fun next:int () start + step;
        fun twice:int () next() + step;
    }
    var c:Counter = new Counter(10, 3);
    in print(c.twice());";

#[test]
fn test_method_call_through_dispatch_table() {
    assert_eq!(printed(COUNTER), vec![16]);
}

#[test]
fn test_dispatch_table_holds_method_addresses() {
    let compiled = compile(COUNTER).unwrap();
    let program = assemble(&compiled.code).unwrap();
    let mut machine = Machine::new(&program, MachineConfig::default());
    machine.run().unwrap();

    // The only class is laid out first: its table starts at heap address 0,
    // one cell per method in declaration order.
    assert_eq!(machine.heap_cell(0), program.label("function0"));
    assert_eq!(machine.heap_cell(1), program.label("function1"));
    // The object follows: step, start, then the dispatch pointer.
    assert_eq!(machine.heap_cell(2), Some(3));
    assert_eq!(machine.heap_cell(3), Some(10));
    assert_eq!(machine.heap_cell(4), Some(0));

    // `c.twice()` jumps through the cell at table base + method offset.
    let (dot_call, _) = compiled
        .unit
        .tree()
        .iter()
        .find(|(_, node)| matches!(node, fool_parser::Node::DotCall { .. }))
        .unwrap();
    let offset = compiled.unit.tables().method_entry(dot_call).unwrap().offset;
    assert_eq!(offset, 1);
    let table = machine.heap_cell(4).unwrap();
    assert_eq!(machine.heap_cell(table + offset), program.label("function1"));
}

#[test]
fn test_objects_as_arguments() {
    let source = "let
        class Point (x:int, y:int) {
            fun sum:int () x + y;
        }
        fun dot:int (p:Point, q:Point) p.sum() * q.sum();
        in print(dot(new Point(1, 2), new Point(3, 4)));";
    assert_eq!(printed(source), vec![21]);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_boolean_arithmetic_is_rejected() {
    let errors = compilation_errors("true + 1;");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("Non integers in sum"));
}

#[test]
fn test_name_errors_are_collected() {
    let errors = compilation_errors("let var a:int = missing; var a:int = 2; in a;");
    assert!(matches!(
        errors[0],
        CompilationError::UndeclaredIdentifier { .. }
    ));
    assert!(matches!(
        errors[1],
        CompilationError::DuplicateDeclaration { .. }
    ));
}

#[test]
fn test_name_and_type_errors_reported_in_one_compile() {
    let errors = compilation_errors("let var a:int = missing; var b:bool = 1; in a;");
    assert_eq!(errors.len(), 2);
    assert!(matches!(
        errors[0],
        CompilationError::UndeclaredIdentifier { .. }
    ));
    assert!(errors[1]
        .to_string()
        .contains("Incompatible value for variable b"));
}

#[test]
fn test_syntax_errors_stop_the_pipeline() {
    assert!(matches!(compile("let in 1;"), Err(FoolError::Parse(_))));
}

#[test]
fn test_symbol_table_runs_once() {
    let tree = fool::parse("1 + 2;").unwrap();
    let mut unit = CompilationUnit::new(tree);
    assert!(SymbolTablePass::new(&mut unit).run().errors.is_empty());

    let second = SymbolTablePass::new(&mut unit).run();
    assert!(matches!(
        second.errors.as_slice(),
        [CompilationError::PassOrder { .. }]
    ));
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(
        fool::run("print(10 / (3 - 3));"),
        Err(FoolError::Runtime(RuntimeError::DivisionByZero { .. }))
    ));
}

#[test]
fn test_step_limit() {
    let source = "let fun spin:int (n:int) spin(n + 1); in spin(0);";
    let config = MachineConfig::default().with_step_limit(10_000);
    assert!(matches!(
        fool::run_with_output(source, config, &mut std::io::sink()),
        Err(FoolError::Runtime(RuntimeError::StepLimitExceeded { limit: 10_000 }))
    ));
}

#[test]
fn test_unbounded_recursion_exhausts_memory() {
    let source = "let fun spin:int (n:int) spin(n + 1); in spin(0);";
    assert!(matches!(
        fool::run(source),
        Err(FoolError::Runtime(RuntimeError::MemoryExhausted { .. }))
    ));
}

// =============================================================================
// Assembly Text
// =============================================================================

#[test]
fn test_assembly_text_round_trip() {
    let compiled = compile(COUNTER).unwrap();
    let text = compiled.code.to_string();
    let reparsed = AsmProgram::parse(&text).unwrap();
    assert_eq!(reparsed, compiled.code);

    let mut direct = Vec::new();
    let mut from_text = Vec::new();
    let first = fool::execute(&compiled.code, MachineConfig::default(), &mut direct).unwrap();
    let second = fool::execute_text(&text, MachineConfig::default(), &mut from_text).unwrap();
    assert_eq!(first, second);
    assert_eq!(direct, from_text);
}

#[test]
fn test_memory_size_flows_to_the_compiler() {
    let config = MachineConfig::default().with_memory_size(256);
    let outcome = fool::run_with_output(COUNTER, config, &mut std::io::sink()).unwrap();
    assert_eq!(outcome.printed, vec![16]);
}

// =============================================================================
// Scripts
// =============================================================================

#[test]
fn test_scripts() {
    let cases: [(&str, &[Word]); 7] = [
        ("arithmetic.fool", &[12]),
        ("factorial.fool", &[720]),
        ("static_links.fool", &[25]),
        ("booleans.fool", &[7]),
        ("accounts.fool", &[1050]),
        ("dispatch.fool", &[17]),
        ("print_chain.fool", &[1, 2, 20]),
    ];
    for (script, expected) in cases {
        assert_eq!(printed(&load_script(script)), expected, "{script}");
    }
}

// =============================================================================
// Properties
// =============================================================================

#[derive(Debug, Clone)]
enum Arith {
    Lit(Word),
    Add(Box<Arith>, Box<Arith>),
    Sub(Box<Arith>, Box<Arith>),
    Mul(Box<Arith>, Box<Arith>),
}

impl Arith {
    fn source(&self) -> String {
        match self {
            Arith::Lit(value) => value.to_string(),
            Arith::Add(l, r) => format!("({} + {})", l.source(), r.source()),
            Arith::Sub(l, r) => format!("({} - {})", l.source(), r.source()),
            Arith::Mul(l, r) => format!("({} * {})", l.source(), r.source()),
        }
    }

    fn eval(&self) -> Word {
        match self {
            Arith::Lit(value) => *value,
            Arith::Add(l, r) => l.eval().wrapping_add(r.eval()),
            Arith::Sub(l, r) => l.eval().wrapping_sub(r.eval()),
            Arith::Mul(l, r) => l.eval().wrapping_mul(r.eval()),
        }
    }
}

fn arith() -> impl Strategy<Value = Arith> {
    let leaf = (-1000..1000).prop_map(Arith::Lit);
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Arith::Add(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Arith::Sub(Box::new(l), Box::new(r))),
            (inner.clone(), inner).prop_map(|(l, r)| Arith::Mul(Box::new(l), Box::new(r))),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arithmetic_matches_wrapping_words(expr in arith()) {
        let outcome = fool::run(&format!("print({});", expr.source())).unwrap();
        prop_assert_eq!(outcome.printed, vec![expr.eval()]);
    }
}
