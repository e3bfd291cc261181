//! Python module model
//!
//! Describes what the parser learned about a Python source file: its module
//! name and the functions defined directly in its body.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A function defined at the top level of a Python module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PythonFunction {
    /// Function name
    pub name: String,
    /// Regular positional-or-keyword parameter names, in declaration order
    pub args: Vec<String>,
    /// Cleaned docstring, if the body starts with one
    pub doc: Option<String>,
}

impl PythonFunction {
    /// Create a function without a docstring.
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
            doc: None,
        }
    }

    /// Attach a docstring.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Render as `name(a, b)`.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.args.join(", "))
    }
}

/// A parsed Python module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Module name (file stem, e.g. `calculator` for `calculator.py`)
    pub name: String,
    /// Path the module was read from
    pub path: PathBuf,
    /// Full source text
    pub source: String,
    /// Top-level functions in source order
    pub functions: Vec<PythonFunction>,
}

impl ModuleInfo {
    /// Names of all top-level functions, in source order.
    pub fn function_names(&self) -> Vec<&str> {
        self.functions.iter().map(|f| f.name.as_str()).collect()
    }

    /// File name of the test module generated for this module.
    pub fn test_file_name(&self) -> String {
        format!("test_{}.py", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_module() -> ModuleInfo {
        ModuleInfo {
            name: "calculator".to_string(),
            path: PathBuf::from("src/calculator.py"),
            source: String::new(),
            functions: vec![
                PythonFunction::new("add", vec!["a".into(), "b".into()]),
                PythonFunction::new("now", vec![]).with_doc("Current time."),
            ],
        }
    }

    #[test]
    fn test_signature_joins_args() {
        let module = sample_module();
        assert_eq!(module.functions[0].signature(), "add(a, b)");
        assert_eq!(module.functions[1].signature(), "now()");
    }

    #[test]
    fn test_function_names_keep_source_order() {
        assert_eq!(sample_module().function_names(), vec!["add", "now"]);
    }

    #[test]
    fn test_test_file_name() {
        assert_eq!(sample_module().test_file_name(), "test_calculator.py");
    }
}
