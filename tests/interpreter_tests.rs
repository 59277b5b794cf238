// ABOUTME: Integration tests interpreting sources and asserting canonical
// string forms, ported error cases and the language invariants

use checkerlang::environment::Environment;
use checkerlang::errors::CklError;
use checkerlang::interpreter::Interpreter;

fn interpret(source: &str) -> String {
    let interpreter = Interpreter::new(false, false).expect("interpreter setup failed");
    let env = Environment::with_parent(&interpreter.environment);
    interpreter
        .interpret_in(source, "{test}", &env)
        .unwrap_or_else(|e| panic!("evaluation of {:?} failed: {}", source, e))
        .to_string()
}

fn interpret_err(source: &str) -> CklError {
    let interpreter = Interpreter::new(false, false).expect("interpreter setup failed");
    let env = Environment::with_parent(&interpreter.environment);
    match interpreter.interpret_in(source, "{test}", &env) {
        Ok(value) => panic!("expected error for {:?} but got {}", source, value),
        Err(error) => error,
    }
}

// ----------------------------------------------------------------------
// Literals, blocks and control flow
// ----------------------------------------------------------------------

#[test]
fn test_literals() {
    assert_eq!(interpret("'abc'"), "'abc'");
    assert_eq!(interpret("123"), "123");
    assert_eq!(interpret("12.5"), "12.5");
    assert_eq!(interpret("TRUE"), "TRUE");
    assert_eq!(interpret("//a[0-9]//"), "//a[0-9]//");
    assert_eq!(interpret("[1, 2, 3]"), "[1, 2, 3]");
    assert_eq!(interpret("NULL"), "NULL");
}

#[test]
fn test_block() {
    assert_eq!(interpret("do 2 * 3; 3 * 4; end"), "12");
}

#[test]
fn test_if_then() {
    assert_eq!(interpret("if 13 < 12 then 'a' if 11 < 12 then 'b'"), "'b'");
    assert_eq!(interpret("if 13 < 12 then 'a' if 14 < 12 then 'b'"), "TRUE");
    assert_eq!(
        interpret("if 13 < 12 then 'a' if 14 < 12 then 'b' else 'c'"),
        "'c'"
    );
    assert_eq!(
        interpret("if 13 < 12 then do 'a' end if 11 < 12 then do 2 * 2; 'b'; end"),
        "'b'"
    );
    assert_eq!(
        interpret("if 1 == 2 then 3 elif 1 == 3 then 4 elif 1 == 1 then 5 else 6"),
        "5"
    );
}

#[test]
fn test_list_with_if_and_fn() {
    assert_eq!(
        interpret("[if 1 < 2 then 'a' else 'b', 'x', if 1 > 2 then 'c' else 'd']"),
        "['a', 'x', 'd']"
    );
    assert_eq!(interpret("[1, fn(x) 2*x, 2]"), "[1, <#lambda>, 2]");
}

#[test]
fn test_for_loop_with_return() {
    assert_eq!(
        interpret("for i in range(10) do if i == 5 then return i end"),
        "5"
    );
}

#[test]
fn test_def_and_assign() {
    assert_eq!(interpret("def a=12;a+2"), "14");
    assert_eq!(interpret("def a=12; def b = 3; a = b + 2 * a; a"), "27");
}

#[test]
fn test_while() {
    assert_eq!(
        interpret("def x = 10; while x > 0 do x = x - 2; end; x"),
        "0"
    );
    assert_eq!(
        interpret("def s = '012'; while s !> starts_with('0') do s = s !> substr(1); end;"),
        "'12'"
    );
}

#[test]
fn test_boolean_operators() {
    assert_eq!(interpret("2 == 3 or 3 == 4 or 4 == 4"), "TRUE");
    assert_eq!(interpret("2 == 3 or 3 == 4 or 4 == 5"), "FALSE");
    assert_eq!(interpret("2 == 2 and 3 == 3 and 4 == 4"), "TRUE");
    assert_eq!(interpret("2 == 2 and 3 == 3 and 4 == 5"), "FALSE");
    assert_eq!(interpret("not 2 == 3"), "TRUE");
    assert_eq!(interpret("not 2 == 2"), "FALSE");
    assert_eq!(interpret("2 == 3 or 3 == 3 and not 4 == 5"), "TRUE");
}

#[test]
fn test_comparison_chains() {
    assert_eq!(interpret("2 == 2"), "TRUE");
    assert_eq!(interpret("2 == 2 != 3"), "TRUE");
    assert_eq!(interpret("2 == 2 <> 3"), "TRUE");
    assert_eq!(interpret("2 < 3"), "TRUE");
    assert_eq!(interpret("2 < 3 <= 3 < 4"), "TRUE");
    assert_eq!(interpret("2 < 3 < 3 <= 4"), "FALSE");
    assert_eq!(interpret("5 >= 5 > 4 >= 2 == 2"), "TRUE");
    assert_eq!(interpret("5 >= 5 > 5 >= 2 == 2"), "FALSE");
}

#[test]
fn test_chained_comparison_matches_explicit_and() {
    for (chained, explicit) in [
        ("2 < 3 <= 3", "2 < 3 and 3 <= 3"),
        ("1 < 2 < 2", "1 < 2 and 2 < 2"),
        ("5 >= 5 > 4", "5 >= 5 and 5 > 4"),
    ] {
        assert_eq!(interpret(chained), interpret(explicit));
    }
}

// ----------------------------------------------------------------------
// Arithmetic
// ----------------------------------------------------------------------

#[test]
fn test_arithmetic() {
    assert_eq!(interpret("2 + 3"), "5");
    assert_eq!(interpret("2 + 3 + 4"), "9");
    assert_eq!(interpret("2 - 3"), "-1");
    assert_eq!(interpret("2 - 3 - 4"), "-5");
    assert_eq!(interpret("2 * 3"), "6");
    assert_eq!(interpret("2 * 3 * 4"), "24");
    assert_eq!(interpret("6 / 2"), "3");
    assert_eq!(interpret("10 / 20.0"), "0.5");
    assert_eq!(interpret("6 % 2"), "0");
    assert_eq!(interpret("7 % 2"), "1");
    assert_eq!(interpret("(2 + 3) * (3 + 4) / 5"), "7");
    assert_eq!(interpret("2 + 3 * 3 + 4 / 5"), "11");
    assert_eq!(interpret("2 + 3 * 3 + 4 / 5.0"), "11.8");
    assert_eq!(interpret("2 + 3 * 4"), "14");
}

#[test]
fn test_unary_minus() {
    assert_eq!(interpret("-2"), "-2");
    assert_eq!(interpret("2 + -2"), "0");
    assert_eq!(interpret("def a = 5; -a"), "-5");
}

#[test]
fn test_arithmetic_desugars_to_builtins() {
    assert_eq!(interpret("2 + 3 == add(2, 3)"), "TRUE");
    assert_eq!(interpret("2 - 3 == sub(2, 3)"), "TRUE");
    assert_eq!(interpret("2 * 3 == mul(2, 3)"), "TRUE");
    assert_eq!(interpret("6 / 2 == div(6, 2)"), "TRUE");
    assert_eq!(interpret("7 % 2 == mod(7, 2)"), "TRUE");
}

#[test]
fn test_null_propagation() {
    assert_eq!(interpret("add(NULL, 1)"), "NULL");
    assert_eq!(interpret("sub(NULL, 1)"), "NULL");
    assert_eq!(interpret("mul(NULL, 1)"), "NULL");
    assert_eq!(interpret("div(NULL, 1)"), "NULL");
    assert_eq!(interpret("mod(NULL, 1)"), "NULL");
    assert_eq!(interpret("1 + NULL"), "NULL");
}

#[test]
fn test_division_by_zero() {
    let error = interpret_err("1 / 0");
    match error {
        CklError::Runtime(e) => assert_eq!(e.msg, "divide by zero"),
        other => panic!("expected runtime error, got {}", other),
    }
    assert_eq!(interpret("def DIV_0_VALUE = 99; 1 / 0"), "99");
}

#[test]
fn test_add_collections() {
    assert_eq!(interpret("[1, 2] + [3]"), "[1, 2, 3]");
    assert_eq!(interpret("[1, 2] + 3"), "[1, 2, 3]");
    assert_eq!(interpret("<<1, 2>> + <<2, 3>>"), "<<1, 2, 3>>");
    assert_eq!(interpret("<<1, 2>> + 3"), "<<1, 2, 3>>");
    assert_eq!(interpret("1 + [2, 3]"), "[1, 2, 3]");
    assert_eq!(interpret("'a' + 1"), "'a1'");
    assert_eq!(interpret("1 + 'a'"), "'1a'");
}

#[test]
fn test_sub_collections() {
    assert_eq!(interpret("sub([1, 2, 3], 2)"), "[1, 3]");
    assert_eq!(interpret("sub(<<3, 1, 2>>, 2)"), "<<1, 3>>");
}

#[test]
fn test_mul_repeats() {
    assert_eq!(interpret("mul('2', 3)"), "'222'");
    assert_eq!(interpret("mul([1, 2], 3)"), "[1, 2, 1, 2, 1, 2]");
}

#[test]
fn test_bitwise_is_32bit_unsigned() {
    assert_eq!(interpret("bit_and(5, 6)"), "4");
    assert_eq!(interpret("bit_or(3, 4)"), "7");
    assert_eq!(interpret("bit_xor(1, 3)"), "2");
    assert_eq!(interpret("bit_not(1)"), "4294967294");
    assert_eq!(interpret("bit_not(0)"), "4294967295");
    assert_eq!(interpret("bit_shift_left(1, 3)"), "8");
    assert_eq!(interpret("bit_shift_right(4, 2)"), "1");
    assert_eq!(interpret("bit_rotate_left(1, 2)"), "4");
    assert_eq!(interpret("bit_rotate_right(1, 2)"), "1073741824");
}

// ----------------------------------------------------------------------
// Predicates
// ----------------------------------------------------------------------

#[test]
fn test_is_empty_predicates() {
    assert_eq!(interpret("[] is empty"), "TRUE");
    assert_eq!(interpret("[1, 2] is empty"), "FALSE");
    assert_eq!(interpret("[] is not empty"), "FALSE");
    assert_eq!(interpret("[1, 2] is not empty"), "TRUE");
}

#[test]
fn test_in_predicates() {
    assert_eq!(
        interpret("def feld1 = 'M231'; feld1 is in ['M230', 'M231', 'M232']"),
        "TRUE"
    );
    assert_eq!(
        interpret("def feld1 = 'M233'; feld1 is in ['M230', 'M231', 'M232']"),
        "FALSE"
    );
    assert_eq!(
        interpret("def feld1 = 'M231'; feld1 not in ['M230', 'M231', 'M232']"),
        "FALSE"
    );
    assert_eq!(interpret("def feld1 = 2; feld1 in [1, 2, 3]"), "TRUE");
    assert_eq!(interpret("def feld1 = '2'; feld1 is in [1, 2, 3]"), "FALSE");
    assert_eq!(interpret("def feld1 = 4; feld1 in [1, 2, 3]"), "FALSE");
    assert_eq!(interpret("'b' in 'abc'"), "TRUE");
    assert_eq!(interpret("2 in <<1, 2>>"), "TRUE");
    assert_eq!(interpret("1 in <<<1 => 'a'>>>"), "TRUE");
}

#[test]
fn test_zero_and_negative_predicates() {
    assert_eq!(interpret("1 is zero"), "FALSE");
    assert_eq!(interpret("0 is zero"), "TRUE");
    assert_eq!(interpret("1 is not zero"), "TRUE");
    assert_eq!(interpret("0 is negative"), "FALSE");
    assert_eq!(interpret("-1 is negative"), "TRUE");
    assert_eq!(interpret("1 is not negative"), "TRUE");
}

#[test]
fn test_numerical_predicates() {
    assert_eq!(interpret("'1234' is numerical"), "TRUE");
    assert_eq!(interpret("'12a' is not numerical"), "TRUE");
    assert_eq!(interpret("'abc123' is alphanumerical"), "TRUE");
    assert_eq!(interpret("'abc--' is not alphanumerical"), "TRUE");
    assert_eq!(interpret("'1234' is numerical exact_len 4"), "TRUE");
    assert_eq!(interpret("'1234' is numerical min_len 5"), "FALSE");
}

#[test]
fn test_date_predicates() {
    assert_eq!(interpret("'2001010199' is not date with hour"), "TRUE");
    assert_eq!(interpret("'2001010112' is date with hour"), "TRUE");
    assert_eq!(interpret("'20010101' is date with hour"), "FALSE");
    assert_eq!(interpret("'20010133' is not date"), "TRUE");
    assert_eq!(interpret("'20010101' is date"), "TRUE");
    assert_eq!(interpret("'1245' is time"), "TRUE");
    assert_eq!(interpret("'2512' is not time"), "TRUE");
}

#[test]
fn test_string_predicates() {
    assert_eq!(interpret("'abc' starts with 'a'"), "TRUE");
    assert_eq!(interpret("'abc' starts with 'ab'"), "TRUE");
    assert_eq!(interpret("'abc' starts not with 'ab'"), "FALSE");
    assert_eq!(interpret("'abc' starts not with 'b'"), "TRUE");
    assert_eq!(interpret("'abc' ends with 'c'"), "TRUE");
    assert_eq!(interpret("'abc' ends not with 'b'"), "TRUE");
    assert_eq!(interpret("'abc' contains 'b'"), "TRUE");
    assert_eq!(interpret("'abc' contains not 'x'"), "TRUE");
    assert_eq!(interpret("'abc' matches //[a-z]+//"), "TRUE");
    assert_eq!(interpret("'abc' matches not //[1-9]+//"), "TRUE");
}

#[test]
fn test_type_tag_predicates() {
    assert_eq!(interpret("'a' is string"), "TRUE");
    assert_eq!(interpret("1 is int"), "TRUE");
    assert_eq!(interpret("1.5 is decimal"), "TRUE");
    assert_eq!(interpret("NULL is null"), "TRUE");
    assert_eq!(interpret("[1] is list"), "TRUE");
    assert_eq!(interpret("1 is not string"), "TRUE");
}

// ----------------------------------------------------------------------
// Deref
// ----------------------------------------------------------------------

#[test]
fn test_deref() {
    assert_eq!(interpret("def feld1 = 'abc123'; feld1[1]"), "'b'");
    assert_eq!(interpret("[1, 2, 3][2]"), "3");
    assert_eq!(interpret("[['a', 1], ['b', 2]][1][0]"), "'b'");
    assert_eq!(interpret("'abcd'[2]"), "'c'");
    assert_eq!(interpret("'abcd'[-1]"), "'d'");
    assert_eq!(interpret("[1, 2, 3][-2]"), "2");
}

#[test]
fn test_deref_out_of_bounds() {
    interpret_err("[1, 2, 3][5]");
    interpret_err("'abc'[7]");
}

#[test]
fn test_deref_map_and_object() {
    assert_eq!(interpret("def a = <<<'x' => 1, 'y' => 2>>>; a->y"), "2");
    assert_eq!(interpret("def m = <<<'a' => 1>>>; m['b', 0]"), "0");
    assert_eq!(interpret("def m = <<<>>>; m['a', 0] += 1; m['a']"), "1");
    assert_eq!(interpret("def o = <*a=1*>; o->missing"), "NULL");
    assert_eq!(interpret("def o = <*a=1*>; o['missing', 42]"), "42");
}

#[test]
fn test_deref_assign() {
    assert_eq!(interpret("def lst = [1, 2, 3]; lst[1] = 9; lst"), "[1, 9, 3]");
    assert_eq!(interpret("def s = 'abc'; s[1] = 'x'; s"), "'axc'");
    assert_eq!(
        interpret("def m = <<<'a' => 1>>>; m['b'] = 2; m"),
        "<<<'a' => 1, 'b' => 2>>>"
    );
    assert_eq!(interpret("def o = <*a=1*>; o->b = 2; o"), "<*a=1, b=2*>");
}

#[test]
fn test_object_prototype_chain() {
    assert_eq!(
        interpret(
            "def proto = <*greet = fn(self) 'hi'*>; def o = object(); \
             o->_proto_ = proto; o->greet()"
        ),
        "'hi'"
    );
}

// ----------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------

#[test]
fn test_func_def() {
    assert_eq!(interpret("def dup = fn(n) 2 * n; dup(3)"), "6");
    assert_eq!(interpret("def dup(n) 2 * n; dup(3)"), "6");
    assert_eq!(
        interpret(
            "def myfn = fn(n) do def m = 2 * n; if m % 2 == 0 then m + 1 else m end; myfn(3)"
        ),
        "7"
    );
}

#[test]
fn test_lambda_with_default() {
    assert_eq!(interpret("(fn(a, b = 3) string(a) * b)(55)"), "'555555'");
    assert_eq!(interpret("def a = fn(x = 12) x; a(10)"), "10");
    assert_eq!(interpret("def a = fn(x = 12) x; a()"), "12");
}

#[test]
fn test_recursion() {
    assert_eq!(
        interpret("def a = fn(x) do def y = x - 1; if x == 0 then 1 else x * a(y) end; a(10)"),
        "3628800"
    );
}

#[test]
fn test_block_local_forward_reference() {
    assert_eq!(
        interpret(
            "def a = fn(y) do def b = fn(x) 2 * c(x); def c = fn(x) 3 + x; b(y); end; a(12)"
        ),
        "30"
    );
    assert_eq!(
        interpret("def b = fn(x) 2 * c(x); def c = fn(x) 3 + x; b(12)"),
        "30"
    );
}

#[test]
fn test_fresh_list_literal_per_call() {
    assert_eq!(
        interpret(
            "def f(x, y) do def r = []; append(r, x); append(r, y); return r; end; \
             f(1, 2); f(2, 3);"
        ),
        "[2, 3]"
    );
    assert_eq!(
        interpret(
            "def f(x, y) do def r = [1]; append(r, x); append(r, y); return r; end; \
             f(1, 2); f(2, 3);"
        ),
        "[1, 2, 3]"
    );
}

#[test]
fn test_argument_binding() {
    assert_eq!(interpret("(fn(a) a)(12)"), "12");
    assert_eq!(interpret("(fn(a, b) [a, b])(1, 2)"), "[1, 2]");
    assert_eq!(interpret("(fn(a, b) [a, b])(a = 1,  b=2)"), "[1, 2]");
    assert_eq!(interpret("(fn(a, b) [a, b])(b = 2,  a=1)"), "[1, 2]");
    assert_eq!(interpret("(fn(a, b) [a, b])(1,  b=2)"), "[1, 2]");
    assert_eq!(interpret("(fn(a, b) [a, b])(2,  a=1)"), "[1, 2]");
}

#[test]
fn test_rest_arguments() {
    assert_eq!(interpret("(fn(a...) a...)(1, 2)"), "[1, 2]");
    assert_eq!(interpret("(fn(a, b, c...) [a, b, c...])(1, 2)"), "[1, 2, []]");
    assert_eq!(
        interpret("(fn(a, b, c...) [a, b, c...])(1, 2, 3)"),
        "[1, 2, [3]]"
    );
    assert_eq!(
        interpret("(fn(a, b, c...) [a, b, c...])(1, 2, 3, 4)"),
        "[1, 2, [3, 4]]"
    );
}

#[test]
fn test_rest_arguments_with_defaults() {
    assert_eq!(interpret("(fn(a=1, b=2, c...) [a, b, c...])()"), "[1, 2, []]");
    assert_eq!(
        interpret("(fn(a=1, b=2, c...) [a, b, c...])(a=11)"),
        "[11, 2, []]"
    );
    assert_eq!(
        interpret("(fn(a=1, b=2, c...) [a, b, c...])(b=12)"),
        "[1, 12, []]"
    );
    assert_eq!(
        interpret("(fn(a=1, b=2, c...) [a, b, c...])(1, 3, 4, b=12)"),
        "[1, 12, [3, 4]]"
    );
}

#[test]
fn test_argument_binding_errors() {
    interpret_err("(fn(a, b) [a, b])(1, 2, 3)");
    interpret_err("(fn(a, b) [a, b])(c = 1)");
    interpret_err("(fn(a, b) [a, b])(b = 1, 2)");
    interpret_err("(fn(a, b) [a, b])(1)");
}

#[test]
fn test_control_outside_loop_is_error() {
    interpret_err("def f() do break; end; f()");
    interpret_err("def f() do continue; end; f()");
}

#[test]
fn test_spread() {
    assert_eq!(interpret("[1, ...[2, 3, 4], 5]"), "[1, 2, 3, 4, 5]");
    assert_eq!(interpret("[1, ...[2, 3], 4]"), "[1, 2, 3, 4]");
    assert_eq!(
        interpret("def a = [2, 3, 4]; [1, ...a, 5]"),
        "[1, 2, 3, 4, 5]"
    );
    assert_eq!(
        interpret("def f(a, b, c) [a, b, c]; f(1, ...[2, 3])"),
        "[1, 2, 3]"
    );
    assert_eq!(
        interpret("def f(a, b, c) [a, b, c]; f(...<<<'c' => 3, 'a' => 1, 'b' => 2>>>)"),
        "[1, 2, 3]"
    );
    assert_eq!(
        interpret("def f(args...) args...; f(1, ...[2, 3, 4], 5)"),
        "[1, 2, 3, 4, 5]"
    );
    assert_eq!(
        interpret("def f(args...) args...; def a = [2, 3, 4]; f(1, ...a, 5)"),
        "[1, 2, 3, 4, 5]"
    );
}

#[test]
fn test_pipeline() {
    assert_eq!(interpret("'abcdef'!>starts_with('abc')"), "TRUE");
    assert_eq!(interpret("' xy '!>trim()"), "'xy'");
    assert_eq!(interpret("[2, 4, 6] !> all(fn(x) x % 2 == 0)"), "TRUE");
    assert_eq!(interpret("12 !> max(2)"), "12");
    assert_eq!(interpret("[1, 2, 3] !> (fn(lst) lst[2])()"), "3");
}

// ----------------------------------------------------------------------
// Destructuring
// ----------------------------------------------------------------------

#[test]
fn test_def_destructuring() {
    assert_eq!(interpret("def [a, b] = [1, 2]; [a, b]"), "[1, 2]");
    assert_eq!(interpret("def [a] = [1, 2]; a"), "1");
    assert_eq!(interpret("def [a, b, c] = <<1, 2, 3>>; c"), "3");
    assert_eq!(interpret("def [a, b, c] = [1, 2]"), "NULL");
}

#[test]
fn test_assign_destructuring() {
    assert_eq!(
        interpret("def a = 1; def b = 1; [a, b] = [1, 2]; [a, b]"),
        "[1, 2]"
    );
    assert_eq!(interpret("def a = 1; [a] = [2, 3]; a"), "2");
    assert_eq!(
        interpret("def a = 1; def b = 2; [a, b] = [b, a]; [a, b]"),
        "[2, 1]"
    );
}

#[test]
fn test_for_destructuring() {
    assert_eq!(
        interpret("def a = 0; for [x, y, z] in [[1, 2, 3], [4, 5, 6]] do a += x + y + z; end; a;"),
        "21"
    );
    assert_eq!(
        interpret(
            "def a = 0; for [x, y, z] in [<<1, 2, 3>>, <<4, 5, 6>>] do a += x + y + z; end; a;"
        ),
        "21"
    );
    assert_eq!(
        interpret(
            "def a = 0; for [x, y, z] in <<[1, 2, 3], [4, 5, 6]>> do a += x + y + z; end; a;"
        ),
        "21"
    );
    assert_eq!(
        interpret(
            "def a = 0; for [x, y, z] in << <<1, 2, 3>>, <<4, 5, 6>> >> do a += x + y + z; end; a;"
        ),
        "21"
    );
}

// ----------------------------------------------------------------------
// Comprehensions
// ----------------------------------------------------------------------

#[test]
fn test_list_comprehensions() {
    assert_eq!(interpret("[x * 2 for x in range(5)]"), "[0, 2, 4, 6, 8]");
    assert_eq!(
        interpret("[x for x in keys <<<'a' => 12, 'b' => 13>>>]"),
        "['a', 'b']"
    );
    assert_eq!(
        interpret("[x for x in values <<<'a' => 12, 'b' => 13>>>]"),
        "[12, 13]"
    );
    assert_eq!(
        interpret("[x for x in entries <<<'a' => 12, 'b' => 13>>>]"),
        "[['a', 12], ['b', 13]]"
    );
    assert_eq!(
        interpret("[x for x in keys <*a = 12, b = 13*>]"),
        "['a', 'b']"
    );
    assert_eq!(
        interpret("[x for x in values <*a = 12, b = 13*>]"),
        "[12, 13]"
    );
    assert_eq!(
        interpret("[x for x in entries <*a = 12, b = 13*>]"),
        "[['a', 12], ['b', 13]]"
    );
    assert_eq!(interpret("[x * 2 for x in range(5) if x % 2 == 1]"), "[2, 6]");
    assert_eq!(interpret("[int(ch) for ch in '123']"), "[1, 2, 3]");
}

#[test]
fn test_parallel_and_product_comprehensions() {
    assert_eq!(
        interpret("[a * b for a in [1, 2, 3] also for b in [1, 2, 3]]"),
        "[1, 4, 9]"
    );
    assert_eq!(
        interpret("[a * b for a in [1, 2, 3] for b in [1, 2, 3]]"),
        "[1, 2, 3, 2, 4, 6, 3, 6, 9]"
    );
    // parallel pairing binds NULL past the shorter list
    assert_eq!(
        interpret("[if a is null then b else a for a in [1] also for b in [8, 9]]"),
        "[1, 9]"
    );
}

#[test]
fn test_set_comprehensions() {
    assert_eq!(interpret("<<x * 2 for x in range(5)>>"), "<<0, 2, 4, 6, 8>>");
    assert_eq!(
        interpret("<<x for x in keys <<<'a' => 12, 'b' => 13>>> >>"),
        "<<'a', 'b'>>"
    );
    assert_eq!(
        interpret("<<x * 2 for x in range(5) if x % 2 == 1>>"),
        "<<2, 6>>"
    );
    assert_eq!(interpret("<<int(ch) for ch in '12312'>>"), "<<1, 2, 3>>");
    assert_eq!(
        interpret("<<a * b for a in [1, 2, 3] also for b in [1, 2, 3]>>"),
        "<<1, 4, 9>>"
    );
    assert_eq!(
        interpret("<<a * b for a in [1, 2, 3] for b in [1, 2, 3]>>"),
        "<<1, 2, 3, 4, 6, 9>>"
    );
}

#[test]
fn test_map_comprehensions() {
    assert_eq!(
        interpret("<<<a => 2 * a for a in range(5)>>>"),
        "<<<0 => 0, 1 => 2, 2 => 4, 3 => 6, 4 => 8>>>"
    );
    assert_eq!(
        interpret("<<<'x' + a => 2 * a for a in range(5)>>>"),
        "<<<'x0' => 0, 'x1' => 2, 'x2' => 4, 'x3' => 6, 'x4' => 8>>>"
    );
    assert_eq!(
        interpret(
            "<<<x[0] => x[1] for x in values <<<'a' => ['u', 12], 'b' => ['v', 13]>>> >>>"
        ),
        "<<<'u' => 12, 'v' => 13>>>"
    );
    assert_eq!(
        interpret(
            "<<<x[0] => x[1][1] for x in entries <<<'a' => ['u', 12], 'b' => ['v', 13]>>> >>>"
        ),
        "<<<'a' => 12, 'b' => 13>>>"
    );
    assert_eq!(
        interpret("<<<a => 2 * a for a in range(5) if 2 * a < 6>>>"),
        "<<<0 => 0, 1 => 2, 2 => 4>>>"
    );
}

// ----------------------------------------------------------------------
// Builtins
// ----------------------------------------------------------------------

#[test]
fn test_length() {
    assert_eq!(interpret("length('abc')"), "3");
    assert_eq!(interpret("length([1, 2, 3])"), "3");
    assert_eq!(interpret("length(<<1, 2, 3>>)"), "3");
    assert_eq!(interpret("<<<'a' => 1, 'b' => 2, 'c' =>3>>> !> length()"), "3");
    assert_eq!(interpret("length(object())"), "0");
}

#[test]
fn test_conversions() {
    assert_eq!(interpret("int('12')"), "12");
    assert_eq!(interpret("int('-5')"), "-5");
    assert_eq!(interpret("int(-5.0)"), "-5");
    assert_eq!(interpret("decimal('12.3')"), "12.3");
    assert_eq!(interpret("decimal('-5')"), "-5.0");
    assert_eq!(interpret("decimal(-5)"), "-5.0");
    assert_eq!(interpret("boolean('1')"), "TRUE");
    assert_eq!(interpret("boolean('0')"), "FALSE");
    assert_eq!(interpret("string(123)"), "'123'");
    assert_eq!(interpret("pattern('^abc[0-9]+$')"), "//^abc[0-9]+$//");
}

#[test]
fn test_split() {
    assert_eq!(
        interpret("split('a,b,ccc,d,e', ',')"),
        "['a', 'b', 'ccc', 'd', 'e']"
    );
    assert_eq!(
        interpret("split('a, b;ccc,d ,e', ' ?[,;] ?')"),
        "['a', 'b', 'ccc', 'd', 'e']"
    );
    assert_eq!(
        interpret("split2('a:b:c|d:e:f', escape_pattern('|'), escape_pattern(':'))"),
        "[['a', 'b', 'c'], ['d', 'e', 'f']]"
    );
}

#[test]
fn test_substr_and_sublist() {
    assert_eq!(interpret("substr('abcdef', 3)"), "'def'");
    assert_eq!(interpret("substr('abcdef', 3, 4)"), "'d'");
    assert_eq!(interpret("substr('abcdef', 5)"), "'f'");
    assert_eq!(interpret("substr('abcdef', 6)"), "''");
    assert_eq!(interpret("sublist([1, 2, 3, 4], 2)"), "[3, 4]");
    assert_eq!(interpret("sublist([1, 2, 3, 4], 2, 3)"), "[3]");
    assert_eq!(interpret("sublist([1, 2, 3, 4], 3)"), "[4]");
    assert_eq!(interpret("sublist([1, 2, 3, 4], 4)"), "[]");
}

#[test]
fn test_find() {
    assert_eq!(interpret("find('abcd', 'b')"), "1");
    assert_eq!(interpret("find('abcd', 'e')"), "-1");
    assert_eq!(interpret("find('abc|def|ghi', '|', start = 4)"), "7");
    assert_eq!(interpret("find([1, 2, 3], 2)"), "1");
    assert_eq!(interpret("find([1, 2, 3], 4)"), "-1");
    assert_eq!(
        interpret("find([[1, 'a'], [2, 'b'], [3, 'c']], 2, fn(x) x[0])"),
        "1"
    );
    assert_eq!(
        interpret("find([[1, 'a'], [2, 'b'], [3, 'c']], 4, fn(x) x[0])"),
        "-1"
    );
}

#[test]
fn test_find_last() {
    assert_eq!(interpret("find_last('abcdefgcdexy', 'cde')"), "7");
    assert_eq!(interpret("find_last('abc|def|ghi|jkl', '|', start = 10)"), "7");
    assert_eq!(interpret("find_last('abcxyabc', 'abc', start = 4)"), "0");
    assert_eq!(interpret("find_last([1, 2, 3, 4, 3], 3)"), "4");
}

#[test]
fn test_range() {
    assert_eq!(interpret("range()"), "[]");
    assert_eq!(interpret("range(10)"), "[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]");
    assert_eq!(interpret("range(5, 10)"), "[5, 6, 7, 8, 9]");
    assert_eq!(interpret("range(10, 5, -1)"), "[10, 9, 8, 7, 6]");
    assert_eq!(interpret("range(5, 10, -1)"), "[]");
    assert_eq!(interpret("range(10, step = 3)"), "[0, 3, 6, 9]");
}

#[test]
fn test_sorted() {
    assert_eq!(interpret("sorted([3, 1, 2])"), "[1, 2, 3]");
    assert_eq!(interpret("sorted([6, 2, 5, 3, 1, 4])"), "[1, 2, 3, 4, 5, 6]");
    assert_eq!(
        interpret("sorted([3, 1, 2], cmp = fn(a, b) compare(b, a))"),
        "[3, 2, 1]"
    );
    assert_eq!(
        interpret("sorted([[2, 'b'], [1, 'a']], key = fn(x) x[0])"),
        "[[1, 'a'], [2, 'b']]"
    );
}

#[test]
fn test_zip() {
    assert_eq!(
        interpret("zip([1, 2, 3], [4, 5, 6, 7])"),
        "[[1, 4], [2, 5], [3, 6]]"
    );
    assert_eq!(
        interpret("zip_map(['a', 'b', 'c'], [1, 2, 3])"),
        "<<<'a' => 1, 'b' => 2, 'c' => 3>>>"
    );
}

#[test]
fn test_list_mutation() {
    assert_eq!(interpret("append([1, 2], 3)"), "[1, 2, 3]");
    assert_eq!(interpret("insert_at([1, 2, 3], 0, 9)"), "[9, 1, 2, 3]");
    assert_eq!(interpret("insert_at([1, 2, 3], 2, 9)"), "[1, 2, 9, 3]");
    assert_eq!(interpret("insert_at([1, 2, 3], -1, 9)"), "[1, 2, 3, 9]");
    assert_eq!(interpret("insert_at([1, 2, 3], 4, 9)"), "[1, 2, 3]");
    assert_eq!(interpret("delete_at(['a', 'b', 'c', 'd'], 2)"), "'c'");
    assert_eq!(interpret("delete_at(['a', 'b', 'c', 'd'], -3)"), "'b'");
    assert_eq!(interpret("delete_at(['a', 'b', 'c', 'd'], 4)"), "NULL");
    assert_eq!(
        interpret("def lst=['a','b','c','d']; delete_at(lst, 2); lst"),
        "['a', 'b', 'd']"
    );
    assert_eq!(interpret("remove([1, 2, 3, 4], 3)"), "[1, 2, 4]");
    assert_eq!(interpret("remove(<<1, 2, 3, 4>>, 3)"), "<<1, 2, 4>>");
    assert_eq!(
        interpret("remove(<<<'a' => 1, 'b' => 2>>>, 'b')"),
        "<<<'a' => 1>>>"
    );
    assert_eq!(interpret("remove(<*a=1, b=2*>, 'b')"), "<*a=1*>");
}

#[test]
fn test_container_aliasing() {
    assert_eq!(interpret("def x = []; def y = x; append(x, 1); y"), "[1]");
    assert_eq!(
        interpret("def m = <<<>>>; def n = m; put(m, 'a', 1); n"),
        "<<<'a' => 1>>>"
    );
}

#[test]
fn test_set_and_map_conversions() {
    assert_eq!(interpret("set([1, 2, 3, 3, 4, 5])"), "<<1, 2, 3, 4, 5>>");
    assert_eq!(
        interpret("map([[1, 'a'], [2, 'b'], [3, 'c'], [3, 'd'], [4, 'e'], [5, 'f']])"),
        "<<<1 => 'a', 2 => 'b', 3 => 'd', 4 => 'e', 5 => 'f'>>>"
    );
    assert_eq!(interpret("int(<<<'a' => 12>>>)"), "1");
    assert_eq!(interpret("boolean(<<<'a' => 12>>>)"), "TRUE");
    assert_eq!(interpret("boolean(<<<>>>)"), "FALSE");
}

#[test]
fn test_types() {
    assert_eq!(interpret("type(4)"), "'int'");
    assert_eq!(interpret("type(4.0)"), "'decimal'");
    assert_eq!(interpret("type('a')"), "'string'");
    assert_eq!(interpret("type(//a//)"), "'pattern'");
    assert_eq!(interpret("type([1])"), "'list'");
    assert_eq!(interpret("type(<<1>>)"), "'set'");
    assert_eq!(interpret("type(<<<1 => 2>>>)"), "'map'");
    assert_eq!(interpret("type(fn(x) x)"), "'func'");
    assert_eq!(interpret("type(TRUE)"), "'boolean'");
    assert_eq!(interpret("type(date())"), "'date'");
    assert_eq!(interpret("type(NULL)"), "'null'");
    assert_eq!(interpret("type(object())"), "'object'");
}

#[test]
fn test_base_library_helpers() {
    assert_eq!(interpret("non_zero('12', '3')"), "'12'");
    assert_eq!(interpret("non_zero('0', '3')"), "'3'");
    assert_eq!(interpret("non_empty('12', '3')"), "'12'");
    assert_eq!(interpret("non_empty('', '3')"), "'3'");
    assert_eq!(interpret("abs(-3)"), "3");
    assert_eq!(interpret("min([3, 1, 2])"), "1");
    assert_eq!(interpret("max([3, 1, 2])"), "3");
    assert_eq!(interpret("all([2, 4, 6], fn(x) x % 2 == 0)"), "TRUE");
    assert_eq!(interpret("any([1, 2, 3], fn(x) x == 2)"), "TRUE");
    assert_eq!(interpret("join([1, 2, 3], sep = '-')"), "'1-2-3'");
    assert_eq!(interpret("replace('abcabc', 'b', 'x')"), "'axcaxc'");
    assert_eq!(interpret("substitute('abcdef', 3, 'x')"), "'abcxef'");
    assert_eq!(interpret("sprintf('{0} and {1}', 1, 'a')"), "'1 and a'");
}

#[test]
fn test_string_interpolation() {
    assert_eq!(interpret("def name = 'damian'; s('hello {name}')"), "'hello damian'");
    assert_eq!(interpret("s('2x3 = {2*3}')"), "'2x3 = 6'");
    assert_eq!(interpret("def a = 'abc'; s('\"{a#-8}\"')"), "'\"abc     \"'");
    assert_eq!(interpret("def a = 'abc'; s('\"{a#8}\"')"), "'\"     abc\"'");
    assert_eq!(interpret("def n = 12; s('n = {n#05}')"), "'n = 00012'");
    assert_eq!(interpret("def n = 1.2345678; s('n = {n#.2}')"), "'n = 1.23'");
    assert_eq!(interpret("def n = 123; s('n = {n#x}')"), "'n = 7b'");
    assert_eq!(interpret("def n = 255; s('n = {n#04x}')"), "'n = 00ff'");
}

#[test]
fn test_sum() {
    assert_eq!(interpret("sum([1, 2, 3])"), "6");
    assert_eq!(interpret("sum([1, 2.5, 3])"), "6.5");
    assert_eq!(interpret("sum([1.0, 2.0, 3.0])"), "6.0");
    assert_eq!(interpret("sum([1, 2, -3])"), "0");
    assert_eq!(interpret("sum([1, '1', 1], ignore = ['1'])"), "2");
    assert_eq!(interpret("sum(range(101))"), "5050");
    assert_eq!(interpret("sum([])"), "0");
    assert_eq!(interpret("sum([1, NULL, 3], ignore = [NULL])"), "4");
}

#[test]
fn test_dates() {
    assert_eq!(interpret("string(date('20170102'))"), "'20170102000000'");
    assert_eq!(interpret("string(date('2017010212'))"), "'20170102120000'");
    assert_eq!(interpret("string(date('20170102123456'))"), "'20170102123456'");
    assert_eq!(
        interpret("format_date(date('20170102'))"),
        "'2017-01-02 00:00:00'"
    );
    assert_eq!(interpret("format_date(NULL)"), "NULL");
    assert_eq!(interpret("format_date(date('2017010212'), fmt = 'HH')"), "'12'");
    assert_eq!(interpret("parse_date('20170102')"), "20170102000000");
    assert_eq!(interpret("parse_date('2017010222', fmt = 'yyyyMMdd')"), "NULL");
    assert_eq!(interpret("parse_date('20170102', fmt = 'yyyyMMddHH')"), "NULL");
    assert_eq!(interpret("parse_date('20170144')"), "NULL");
    assert_eq!(
        interpret("parse_date('201701022015', fmt = ['yyyyMMddHHmm', 'yyyyMMddHH', 'yyyyMMdd'])"),
        "20170102201500"
    );
    assert_eq!(interpret("parse_date('20170112', fmt = ['yyyyMM', 'yyyy'])"), "NULL");
}

#[test]
fn test_date_arithmetic() {
    assert_eq!(
        interpret("string(add(date('20100201'), 3))"),
        "'20100204000000'"
    );
    assert_eq!(interpret("sub(date('20170405'), date('20170402'))"), "3");
    assert_eq!(
        interpret("string(sub(date('20170405'), 3))"),
        "'20170402000000'"
    );
}

#[test]
fn test_parse_and_eval() {
    assert_eq!(interpret("parse('2+3')"), "(add 2, 3)");
    assert_eq!(interpret("parse('return x + 1')"), "(add x, 1)");
    assert_eq!(interpret("parse('do return x + 1; end')"), "(add x, 1)");
    assert_eq!(
        interpret("parse('do def x = 1; return x + 1; end')"),
        "(block (def x = 1), (add x, 1))"
    );
    assert_eq!(interpret("eval('1+1')"), "2");
    assert_eq!(interpret("eval(parse('2*21'))"), "42");
    assert_eq!(interpret("body(fn(x) 2 * x)"), "(mul 2, x)");
}

#[test]
fn test_info() {
    assert_eq!(
        interpret("\"Doubles x.\" def dup(x) 2 * x; info(dup)"),
        "'Doubles x.'"
    );
    assert_eq!(interpret("info(1)"), "''");
    assert_eq!(interpret("info(PI) is not empty"), "TRUE");
}

// ----------------------------------------------------------------------
// Maps, sets, objects
// ----------------------------------------------------------------------

#[test]
fn test_map_equality_is_order_independent() {
    assert_eq!(interpret("<<<a => 1, b => 2>>> == <<<b => 2, a => 1>>>"), "TRUE");
    assert_eq!(interpret("<<<a => 1, b => 1>>> == <<<b => 2, a => 1>>>"), "FALSE");
    assert_eq!(interpret("<<<a => 1, c => 2>>> == <<<b => 2, a => 1>>>"), "FALSE");
}

#[test]
fn test_map_literal_implicit_string_keys() {
    assert_eq!(interpret("<<<x => 1, y => 2>>>"), "<<<'x' => 1, 'y' => 2>>>");
}

#[test]
fn test_set_iteration_is_sorted() {
    assert_eq!(interpret("<<3, 1, 2>>"), "<<1, 2, 3>>");
    assert_eq!(
        interpret("def r = []; for x in <<3, 1, 2>> do append(r, x); end; r"),
        "[1, 2, 3]"
    );
}

#[test]
fn test_map_iteration_is_key_sorted() {
    assert_eq!(
        interpret("def result = []; def obj = <<<b=>2, a=>1, c=>3>>>; \
                   for o in keys obj do append(result, o); end; result;"),
        "['a', 'b', 'c']"
    );
}

#[test]
fn test_for_over_maps() {
    assert_eq!(
        interpret("def result = []; def obj = <<<a=>1, b=>2, c=>3>>>; \
                   for o in values obj do append(result, o) end; result;"),
        "[1, 2, 3]"
    );
    assert_eq!(
        interpret("def result = []; def obj = <<<a=>1, b=>2, c=>3>>>; \
                   for o in obj do append(result, o); end; result;"),
        "[1, 2, 3]"
    );
    assert_eq!(
        interpret("def result = []; def obj = <<<a=>1, b=>2, c=>3>>>; \
                   for o in entries obj do append(result, o); end; result;"),
        "[['a', 1], ['b', 2], ['c', 3]]"
    );
}

#[test]
fn test_for_over_objects() {
    assert_eq!(
        interpret("def result = []; def obj = <*a=1, b=2, c=3*>; \
                   for o in values obj append(result, o); result;"),
        "[1, 2, 3]"
    );
    assert_eq!(
        interpret("def result = []; def obj = <*a=1, b=2, c=3*>; \
                   for o in obj append(result, o); result;"),
        "[1, 2, 3]"
    );
    assert_eq!(
        interpret("def result = []; def obj = <*a=1, b=2, c=3*>; \
                   for o in keys obj append(result, o); result;"),
        "['a', 'b', 'c']"
    );
    assert_eq!(
        interpret("def result = []; def obj = <*a=1, b=2, c=3*>; \
                   for o in entries obj append(result, o); result;"),
        "[['a', 1], ['b', 2], ['c', 3]]"
    );
}

#[test]
fn test_objects() {
    assert_eq!(
        interpret("def o = object(); o->a = 12; o->b = fn(x) 2 * x; o->a"),
        "12"
    );
    assert_eq!(
        interpret("def o = object(); o->a = 12; o->b = fn(x) 2 * x; o"),
        "<*a=12, b=<#lambda>*>"
    );
    assert_eq!(interpret("def o = <*a = 2, b=3, c=2*3*>; o->c"), "6");
}

#[test]
fn test_object_method_receives_self() {
    assert_eq!(
        interpret("def o = <*a=1, b=fn(self, x) self->a + x*>; o->b(10)"),
        "11"
    );
}

#[test]
fn test_object_str_member_controls_printing() {
    assert_eq!(
        interpret("def o = <*name='x', _str_ = fn(self) 'obj:' + self->name*>; string(o)"),
        "'obj:x'"
    );
}

// ----------------------------------------------------------------------
// Errors, catch and finally
// ----------------------------------------------------------------------

#[test]
fn test_catch_all() {
    assert_eq!(interpret("do 1/0 catch all 'div-by-zero' end"), "'div-by-zero'");
}

#[test]
fn test_catch_by_value() {
    assert_eq!(
        interpret("do error 'boom' catch 'other' 1 catch 'boom' 2 end"),
        "2"
    );
    assert_eq!(
        interpret("do error 42 catch 42 'int err' catch all 'other' end"),
        "'int err'"
    );
}

#[test]
fn test_uncaught_error_value() {
    let error = interpret_err("error 'kaput'");
    match error {
        CklError::Runtime(e) => assert_eq!(e.value.to_string(), "'kaput'"),
        other => panic!("expected runtime error, got {}", other),
    }
}

#[test]
fn test_finally() {
    assert_eq!(
        interpret("def a = 1; def b = 1; do a += 1; finally b += 2; end; [a, b]"),
        "[2, 3]"
    );
    assert_eq!(
        interpret(
            "def a = 1; def f(x) a = x + 1; def b = 1; do f(3); finally b += 2; end; [a, b]"
        ),
        "[4, 3]"
    );
    // finally runs even when the error propagates to an outer catch
    assert_eq!(
        interpret("def a = 1; do do error 'boom'; finally a = 2; end; catch all 'caught'; end; a"),
        "2"
    );
}

#[test]
fn test_stacktrace_accumulates_frames() {
    let error = interpret_err("def f(x) 1 / 0; def g(x) f(x); g(1)");
    match error {
        CklError::Runtime(e) => {
            assert!(e.stacktrace.len() >= 2, "stacktrace: {:?}", e.stacktrace);
            assert!(e.stacktrace.iter().any(|frame| frame.starts_with("f(")));
            assert!(e.stacktrace.iter().any(|frame| frame.starts_with("g(")));
        }
        other => panic!("expected runtime error, got {}", other),
    }
}

#[test]
fn test_undefined_symbol() {
    interpret_err("no_such_symbol");
    interpret_err("a = 1");
    interpret_err("[a, b] = [1, 2]");
}

#[test]
fn test_for_loop_variable_is_removed() {
    interpret_err("for i in range(3) do i end; i");
    assert_eq!(
        interpret("def i = 'outer'; for i in range(3) do i end; 'done'"),
        "'done'"
    );
}

#[test]
fn test_short_circuit() {
    assert_eq!(
        interpret(
            "def calls = 0; def t(v) do calls += 1; v; end; t(TRUE) or t(TRUE); calls"
        ),
        "1"
    );
    assert_eq!(
        interpret(
            "def calls = 0; def t(v) do calls += 1; v; end; t(FALSE) and t(TRUE); calls"
        ),
        "1"
    );
}

#[test]
fn test_boolean_required() {
    interpret_err("1 and TRUE");
    interpret_err("not 1");
    interpret_err("if 1 then 2");
    interpret_err("while 'x' do end");
}

#[test]
fn test_compare_total_order() {
    assert_eq!(interpret("compare(1, 2) < 0"), "TRUE");
    assert_eq!(interpret("compare(3, 1) > 0"), "TRUE");
    assert_eq!(interpret("compare(1, 1) == 0"), "TRUE");
    assert_eq!(interpret("compare('1', 2) < 0"), "TRUE");
    assert_eq!(interpret("compare(100, '100') > 0"), "TRUE");
    assert_eq!(interpret("compare(NULL, 1) > 0"), "TRUE");
    assert_eq!(interpret("compare(NULL, NULL) == 0"), "TRUE");
    assert_eq!(interpret("equals(1, 1.0)"), "TRUE");
    assert_eq!(interpret("sorted([3, '1', 2.5, NULL])"), "['1', 2.5, 3, NULL]");
}

// ----------------------------------------------------------------------
// Modules
// ----------------------------------------------------------------------

#[test]
fn test_require_qualified() {
    assert_eq!(interpret("require Math; Math->sqrt(4)"), "2.0");
    assert_eq!(interpret("require String; String->lower('Abc')"), "'abc'");
    assert_eq!(interpret("require String; String->upper('Abc')"), "'ABC'");
    assert_eq!(
        interpret("require List; [1, 2, 3]!>List->reverse()"),
        "[3, 2, 1]"
    );
    assert_eq!(
        interpret("require List; [1, 2, 3] !> List->reverse() !> join(sep = '-')"),
        "'3-2-1'"
    );
}

#[test]
fn test_require_as() {
    assert_eq!(interpret("require Math as M; M->sqrt(9)"), "3.0");
}

#[test]
fn test_require_unqualified() {
    assert_eq!(interpret("require Math unqualified; sqrt(16)"), "4.0");
}

#[test]
fn test_require_import() {
    assert_eq!(interpret("require Math import [sqrt]; sqrt(25)"), "5.0");
    assert_eq!(interpret("require Math import [sqrt as wurzel]; wurzel(25)"), "5.0");
}

#[test]
fn test_require_cached_module_compares_equal() {
    assert_eq!(
        interpret("require Math; def a = Math; require Math as M2; a == M2"),
        "TRUE"
    );
}

#[test]
fn test_random_is_deterministic_after_seed() {
    assert_eq!(
        interpret(
            "require Random; Random->set_seed(7); def a = Random->random(1000); \
             Random->set_seed(7); def b = Random->random(1000); a == b"
        ),
        "TRUE"
    );
    assert_eq!(
        interpret("require Random; Random->set_seed(1); def x = Random->random(10); \
                   x >= 0 and x < 10"),
        "TRUE"
    );
}

#[test]
fn test_module_method_calls_have_no_implicit_self() {
    // Math->sqrt(4) must not pass the module object as first argument
    assert_eq!(interpret("require Math; Math->sqrt(x = 4)"), "2.0");
}
