// ABOUTME: Integration tests for the I/O builtins: string streams, file
// round trips, process_lines and directory operations

use checkerlang::environment::Environment;
use checkerlang::interpreter::Interpreter;

fn interpret(source: &str) -> String {
    let interpreter = Interpreter::new(false, false).expect("interpreter setup failed");
    let env = Environment::with_parent(&interpreter.environment);
    interpreter
        .interpret_in(source, "{test}", &env)
        .unwrap_or_else(|e| panic!("evaluation of {:?} failed: {}", source, e))
        .to_string()
}

#[test]
fn test_str_input_reads() {
    assert_eq!(interpret("def s = str_input('hello'); read(s)"), "'h'");
    assert_eq!(interpret("def s = str_input('hello'); read_all(s)"), "'hello'");
    assert_eq!(interpret("def s = str_input('hello'); readln(s)"), "'hello'");
    assert_eq!(
        interpret("def s = str_input('a\\nb'); readln(s); readln(s)"),
        "'b'"
    );
    assert_eq!(interpret("def s = str_input(''); readln(s)"), "NULL");
}

#[test]
fn test_str_output_collects() {
    assert_eq!(
        interpret("do def o = str_output(); print('abc', out = o); get_output_string(o); end"),
        "'abc'"
    );
    assert_eq!(
        interpret(
            "do def o = str_output(); println('abc', out = o); get_output_string(o); end"
        ),
        "'abc\\n'"
    );
    assert_eq!(
        interpret("do def o = str_output(); print(123, out = o); get_output_string(o); end"),
        "'123'"
    );
}

#[test]
fn test_close_is_idempotent() {
    assert_eq!(
        interpret("def s = str_input('x'); close(s); close(s); readln(s)"),
        "NULL"
    );
}

#[test]
fn test_process_lines() {
    assert_eq!(
        interpret(
            "def result = []; str_input('one\\ntwo\\nthree') !> \
             process_lines(fn(line) result !> append(line)); result"
        ),
        "['one', 'two', 'three']"
    );
    assert_eq!(
        interpret("str_input('one\\ntwo\\nthree') !> process_lines(fn(line) line)"),
        "3"
    );
    assert_eq!(
        interpret(
            "def result = ''; process_lines(['a', 'b', 'c'], fn(line) result += line); result"
        ),
        "'abc'"
    );
}

#[test]
fn test_for_over_input() {
    assert_eq!(
        interpret(
            "def r = []; for line in str_input('a\\nb\\nc') do append(r, line); end; r"
        ),
        "['a', 'b', 'c']"
    );
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data.txt");
    let path = path.to_string_lossy().replace('\\', "/");
    let script = format!(
        "def o = file_output('{path}'); println('line1', out = o); println('line2', out = o); \
         close(o); def i = file_input('{path}'); def r = []; \
         for line in i do append(r, line); end; close(i); r"
    );
    assert_eq!(interpret(&script), "['line1', 'line2']");
}

#[test]
fn test_file_exists_and_delete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("afile.txt");
    let path = path.to_string_lossy().replace('\\', "/");
    let script = format!(
        "def o = file_output('{path}'); print('x', out = o); close(o); \
         def before = file_exists('{path}'); file_delete('{path}'); \
         [before, file_exists('{path}')]"
    );
    assert_eq!(interpret(&script), "[TRUE, FALSE]");
}

#[test]
fn test_file_copy_and_move() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src = dir.path().join("src.txt").to_string_lossy().replace('\\', "/");
    let copy = dir.path().join("copy.txt").to_string_lossy().replace('\\', "/");
    let moved = dir.path().join("moved.txt").to_string_lossy().replace('\\', "/");
    let script = format!(
        "def o = file_output('{src}'); print('payload', out = o); close(o); \
         file_copy('{src}', '{copy}'); file_move('{copy}', '{moved}'); \
         def i = file_input('{moved}'); def content = read_all(i); close(i); content"
    );
    assert_eq!(interpret(&script), "'payload'");
}

#[test]
fn test_make_dir_and_list_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sub = dir.path().join("sub").to_string_lossy().replace('\\', "/");
    let file = format!("{}/x.txt", sub);
    let script = format!(
        "make_dir('{sub}'); def o = file_output('{file}'); print('1', out = o); close(o); \
         list_dir('{sub}')"
    );
    assert_eq!(interpret(&script), "['x.txt']");
}

#[test]
fn test_file_info() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("info.txt").to_string_lossy().replace('\\', "/");
    let script = format!(
        "def o = file_output('{path}'); print('abcde', out = o); close(o); \
         def fi = file_info('{path}'); [fi->size, fi->is_dir]"
    );
    assert_eq!(interpret(&script), "[5, FALSE]");
    assert_eq!(interpret("file_info('no-such-file-here')"), "NULL");
}

#[test]
fn test_parse_json() {
    assert_eq!(interpret("parse_json('[1, 2.5, 3, 4]')"), "[1, 2.5, 3, 4]");
    assert_eq!(
        interpret("parse_json('{\"a\": 12, \"b\": [1, 2]}')"),
        "<<<'a' => 12, 'b' => [1, 2]>>>"
    );
    assert_eq!(interpret("parse_json('\"x\"')"), "'x'");
    assert_eq!(interpret("parse_json('true')"), "TRUE");
    assert_eq!(interpret("parse_json('null')"), "NULL");
}

#[test]
fn test_get_env() {
    std::env::set_var("CKL_TEST_VARIABLE", "42");
    assert_eq!(interpret("get_env('CKL_TEST_VARIABLE')"), "'42'");
    assert_eq!(interpret("get_env('CKL_TEST_UNDEFINED_VARIABLE')"), "''");
}

#[test]
fn test_run_script_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("script.ckl").to_string_lossy().replace('\\', "/");
    std::fs::write(&path, "def answer = 6 * 7; answer").expect("write script");
    let script = format!("run('{path}')");
    assert_eq!(interpret(&script), "42");
}

#[test]
fn test_module_loading_from_module_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let module = dir.path().join("Greeter.ckl");
    std::fs::write(&module, "def greet(name) 'hello ' + name;").expect("write module");
    let dir_str = dir.path().to_string_lossy().replace('\\', "/");
    let script = format!(
        "def checkerlang_module_path = ['{dir_str}']; require Greeter; Greeter->greet('world')"
    );
    assert_eq!(interpret(&script), "'hello world'");
}
