//! Tests for the Python module scanner

use super::*;
use std::fs;
use tempfile::TempDir;

fn names(functions: &[PythonFunction]) -> Vec<&str> {
    functions.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn test_simple_functions_in_order() {
    let src = r#"
import math

def add(a, b):
    return a + b

def area(radius):
    return math.pi * radius ** 2
"#;
    let functions = parse_functions(src).unwrap();
    assert_eq!(names(&functions), vec!["add", "area"]);
    assert_eq!(functions[0].args, vec!["a", "b"]);
    assert_eq!(functions[1].args, vec!["radius"]);
    assert_eq!(functions[0].doc, None);
}

#[test]
fn test_methods_and_nested_functions_are_skipped() {
    let src = r#"
class Stack:
    def push(self, item):
        pass

def outer():
    def inner():
        pass
    return inner

if DEBUG:
    def debug_only():
        pass
"#;
    let functions = parse_functions(src).unwrap();
    assert_eq!(names(&functions), vec!["outer"]);
}

#[test]
fn test_async_functions_are_skipped() {
    let src = "async def fetch(url):\n    pass\n\ndef sync(url):\n    pass\n";
    assert_eq!(names(&parse_functions(src).unwrap()), vec!["sync"]);
}

#[test]
fn test_decorated_functions_are_found() {
    let src = "@cache\n@other(arg=1)\ndef fib(n):\n    return n\n";
    let functions = parse_functions(src).unwrap();
    assert_eq!(names(&functions), vec!["fib"]);
    assert_eq!(functions[0].args, vec!["n"]);
}

#[test]
fn test_parameter_kinds() {
    let src = "def f(p, /, a: int = 1, b=(1, 2), *rest, k, **extra) -> dict[str, int]:\n    pass\n";
    let functions = parse_functions(src).unwrap();
    assert_eq!(functions[0].args, vec!["a", "b"]);
}

#[test]
fn test_bare_star_starts_keyword_only() {
    let src = "def f(a, *, key=None):\n    pass\n";
    assert_eq!(parse_functions(src).unwrap()[0].args, vec!["a"]);
}

#[test]
fn test_lambda_defaults_keep_their_parameters() {
    let src = "def f(a=lambda x, y: x + y, b=1, c=lambda: 0, d=lambda *p, **kw: p):\n    pass\n";
    assert_eq!(parse_functions(src).unwrap()[0].args, vec!["a", "b", "c", "d"]);

    let src = "def g(key: Callable = lambda item, n=2: item, *, flag=lambda z, w: z):\n    pass\n";
    assert_eq!(parse_functions(src).unwrap()[0].args, vec!["key"]);
}

#[test]
fn test_multiline_signature_with_comments() {
    let src = r#"
def transfer(
    source,  # account to debit
    target: "Account",
    amount: float = 0.0,
):
    """Move money."""
"#;
    let functions = parse_functions(src).unwrap();
    assert_eq!(functions[0].args, vec!["source", "target", "amount"]);
    assert_eq!(functions[0].doc.as_deref(), Some("Move money."));
}

#[test]
fn test_type_parameters() {
    let src = "def first[T](items: list[T]) -> T:\n    return items[0]\n";
    let functions = parse_functions(src).unwrap();
    assert_eq!(names(&functions), vec!["first"]);
    assert_eq!(functions[0].args, vec!["items"]);
}

#[test]
fn test_docstring_is_cleaned() {
    let src = r#"
def divide(a, b):
    """Divide a by b.

    Raises:
        ZeroDivisionError: when b is zero.
    """
    return a / b
"#;
    let functions = parse_functions(src).unwrap();
    assert_eq!(
        functions[0].doc.as_deref(),
        Some("Divide a by b.\n\nRaises:\n    ZeroDivisionError: when b is zero.")
    );
}

#[test]
fn test_docstring_variants() {
    let src = r#"
def single():
    'single quoted'

def raw():
    r"C:\temp\new"

def escaped():
    "tab\there"

def joined():
    "one " "two"

def formatted():
    f"{x}"

def as_bytes():
    b"data"

def not_first():
    x = 1
    "too late"

def method_call():
    "text".strip()
"#;
    let functions = parse_functions(src).unwrap();
    let docs: Vec<Option<&str>> = functions.iter().map(|f| f.doc.as_deref()).collect();
    assert_eq!(
        docs,
        vec![
            Some("single quoted"),
            Some(r"C:\temp\new"),
            Some("tab     here"),
            Some("one two"),
            None,
            None,
            None,
            None,
        ]
    );
}

#[test]
fn test_parenthesized_docstring() {
    let src = r#"
def wrapped():
    ("Long summary "
     "continued.")

def tuple_is_not_a_docstring():
    ("one", "two")

def called():
    ("text").strip()
"#;
    let functions = parse_functions(src).unwrap();
    let docs: Vec<Option<&str>> = functions.iter().map(|f| f.doc.as_deref()).collect();
    assert_eq!(docs, vec![Some("Long summary continued."), None, None]);
}

#[test]
fn test_named_unicode_escape_in_docstring() {
    let src = "def bullets():\n    \"\\N{BULLET} item\"\n";
    let functions = parse_functions(src).unwrap();
    assert_eq!(functions[0].doc.as_deref(), Some("\u{2022} item"));
}

#[test]
fn test_one_line_body() {
    let src = "def ident(x): \"Return x.\"; return x\ndef nothing(): pass\n";
    let functions = parse_functions(src).unwrap();
    assert_eq!(functions[0].doc.as_deref(), Some("Return x."));
    assert_eq!(functions[1].doc, None);
}

#[test]
fn test_def_inside_strings_is_ignored() {
    let src = "TEMPLATE = '''\ndef fake():\n    pass\n'''\n\ndef real():\n    pass\n";
    assert_eq!(names(&parse_functions(src).unwrap()), vec!["real"]);
}

#[test]
fn test_empty_module() {
    assert!(parse_functions("").unwrap().is_empty());
    assert!(parse_functions("# just a comment\n\nX = 1\n").unwrap().is_empty());
}

#[test]
fn test_invalid_def_header() {
    let err = parse_functions("def (x):\n    pass\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidDefinition { line: 1, .. }));

    let err = parse_functions("\ndef f(x)\n    pass\n").unwrap_err();
    assert!(err.to_string().contains("missing ':'"));
}

#[test]
fn test_lexical_errors_surface() {
    assert!(matches!(
        parse_functions("def f(x:\n    pass\n"),
        Err(ParseError::UnclosedBracket { .. })
    ));
    assert!(matches!(
        parse_functions("def f():\n    return 'oops\n"),
        Err(ParseError::UnterminatedString { line: 2 })
    ));
}

#[test]
fn test_extract_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("calculator.py");
    fs::write(
        &path,
        "\u{feff}def add(a, b):\n    \"\"\"Sum.\"\"\"\n    return a + b\n",
    )
    .unwrap();

    let module = extract_top_level_functions(&path).unwrap();
    assert_eq!(module.name, "calculator");
    assert_eq!(module.path, path);
    assert!(module.source.starts_with("def add"));
    assert_eq!(module.functions.len(), 1);
    assert_eq!(module.functions[0].doc.as_deref(), Some("Sum."));
}

#[test]
fn test_extract_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = extract_top_level_functions(&temp_dir.path().join("nope.py")).unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
}

#[test]
fn test_extract_non_utf8_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("latin.py");
    fs::write(&path, [0x64, 0x65, 0x66, 0x20, 0xe9]).unwrap();
    let err = extract_top_level_functions(&path).unwrap_err();
    assert!(matches!(err, ParseError::Encoding { .. }));
}
