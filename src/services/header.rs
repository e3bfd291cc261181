//! Generated test file repair
//!
//! Models do not always follow the formatting rules in the prompt. These
//! helpers unwrap a Markdown fence around the reply and make sure the file
//! starts with `import pytest` and imports the module under test.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::PythonFunction;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A\s*```[\w+.-]*[ \t]*\r?\n(.*?)\r?\n?[ \t]*```\s*\z")
        .expect("code fence pattern is valid")
});

/// Return the body of a reply wrapped in a single Markdown code fence.
///
/// Text that is not fenced is returned unchanged.
pub fn strip_code_fences(text: &str) -> String {
    match CODE_FENCE.captures(text) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).to_string(),
        None => text.to_string(),
    }
}

/// Import statement for the module under test.
pub fn module_import(module_name: &str, functions: &[PythonFunction]) -> String {
    if functions.is_empty() {
        format!("import {}", module_name)
    } else {
        let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
        format!("from {} import {}", module_name, names.join(", "))
    }
}

/// Make sure the generated file starts with `import pytest` and imports the
/// module under test.
///
/// - `import pytest` is inserted as the first line unless the first line
///   already starts with it.
/// - When no line starts with `from <module> import` or `import <module>`,
///   the module import is inserted as the second line.
/// - The result ends with exactly one newline.
pub fn ensure_imports_and_header(
    module_name: &str,
    generated: &str,
    functions: &[PythonFunction],
) -> String {
    let mut lines = split_lines(generated);

    let has_pytest_header = lines
        .first()
        .is_some_and(|line| line.trim().starts_with("import pytest"));
    if !has_pytest_header {
        lines.insert(0, "import pytest".to_string());
    }

    let from_prefix = format!("from {} import", module_name);
    let import_prefix = format!("import {}", module_name);
    let imports_module = lines.iter().any(|line| {
        let line = line.trim();
        line.starts_with(&from_prefix) || line.starts_with(&import_prefix)
    });
    if !imports_module {
        lines.insert(1, module_import(module_name, functions));
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

/// Split on `\n`, `\r\n` and `\r`, without a trailing empty line.
fn split_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::to_string)
        .collect()
}
