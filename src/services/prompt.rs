//! Prompt construction
//!
//! The prompts are written in Portuguese and ask for a bare pytest file:
//! `import pytest` first, the module's functions imported, and a success and
//! a failure test per function.

use crate::config::PromptConfig;
use crate::models::{ModuleInfo, PromptPair};

pub const SYSTEM_PROMPT: &str = "Você é um assistente que produz arquivos de teste (pytest) para módulos Python. \
Retorne APENAS o conteúdo do arquivo de teste em Python (sem comentários, sem markdown, \
sem explicação). O primeiro caractere do arquivo deve começar com 'import pytest'.";

/// Listing shown when the module defines no top-level function
pub const NO_FUNCTIONS_LISTING: &str = "(nenhuma função top-level encontrada)";

/// Build the system and human prompts for `module`.
pub fn build_prompts(module: &ModuleInfo, options: &PromptConfig) -> PromptPair {
    let name = &module.name;

    let imported = if module.functions.is_empty() {
        "*".to_string()
    } else {
        module.function_names().join(", ")
    };

    let listing = if module.functions.is_empty() {
        NO_FUNCTIONS_LISTING.to_string()
    } else {
        module
            .functions
            .iter()
            .map(|f| format!("- {}", f.signature()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let source_section = if options.include_source {
        format!("```python\n{}\n```\n", module.source.trim_end())
    } else {
        String::new()
    };

    let human = format!(
        r#"
Gere um arquivo pytest para o módulo "{name}". 
Regras obrigatórias:
1) A primeira linha do arquivo deve ser: import pytest
2) Inclua import dos simbolos testados: from {name} import {imported}
3) Para cada função top-level listada abaixo gere AO MENOS 2 testes:
   - def test_<func>_success(): teste de comportamento típico/esperado
   - def test_<func>_failure(): teste de caso limite ou exceção esperada (use pytest.raises quando apropriado)
4) Use asserts claros (assert resultado == esperado) e evite chamadas de rede, tempo ou I/O.
5) Saia apenas com código Python válido (sem explicações). 

Módulo (conteúdo):
{source_section}
Funções a serem testadas:
{listing}

Gerar agora somente o conteúdo do arquivo test_{name}.py
"#
    );

    PromptPair {
        system: SYSTEM_PROMPT.trim().to_string(),
        human: human.trim().to_string(),
    }
}
