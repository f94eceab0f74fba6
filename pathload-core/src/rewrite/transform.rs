//! Rewriting relative imports into fallback chains
//!
//! The transform is a pure function over the statement list. Each relative
//! reference becomes one fallback chain per bound name, whose candidates are
//! request paths anchored at the directory placeholder. Unparsing emits the
//! chains as loader directives; those lines do not parse as relative
//! references again, so rewriting is idempotent.

use std::path::Path;

use crate::config::LoaderConfig;
use crate::error::CodeInfo;

use super::ast::{Candidate, FallbackChain, ModuleAst, RelativeImport, Stmt};

/// The directive name emitted for fallback chains.
pub const LOAD_DIRECTIVE: &str = "__load_any__";

/// Rewrite every relative reference in the module into fallback chains.
pub fn transform(ast: ModuleAst, file: &Path, config: &LoaderConfig) -> ModuleAst {
    let stmts = ast
        .stmts
        .into_iter()
        .flat_map(|stmt| match stmt {
            Stmt::RelativeImport(import) => expand(import, file, config),
            other => vec![other],
        })
        .collect();
    ModuleAst { stmts }
}

fn expand(import: RelativeImport, file: &Path, config: &LoaderConfig) -> Vec<Stmt> {
    let extension = config.source_extension.as_str();
    let init = config.init_basename.as_str();
    let up = "../".repeat(import.level.saturating_sub(1) as usize);
    let origin = CodeInfo {
        source: import.text.clone(),
        file_path: file.to_path_buf(),
        line: import.line,
        offset: import.offset,
    };

    let chain = |binding: String, candidates: Vec<Candidate>| {
        Stmt::FallbackChain(FallbackChain {
            binding,
            candidates,
            origin: origin.clone(),
            indent: import.indent.clone(),
        })
    };

    match (&import.module, import.wildcard) {
        // from .mod import a, b
        (Some(module), false) => {
            let base = module.replace('.', "/");
            import
                .items
                .iter()
                .map(|item| {
                    chain(
                        item.binding().to_string(),
                        vec![
                            Candidate::symbol(
                                format!("__dir__/{}{}/{}.{}", up, base, init, extension),
                                &item.name,
                            ),
                            Candidate::symbol(
                                format!("__dir__/{}{}.{}", up, base, extension),
                                &item.name,
                            ),
                        ],
                    )
                })
                .collect()
        }
        // from .mod import *
        (Some(module), true) => {
            let base = module.replace('.', "/");
            vec![chain(
                String::from("*"),
                vec![
                    Candidate::symbol(
                        format!("__dir__/{}{}/{}.{}", up, base, init, extension),
                        "*",
                    ),
                    Candidate::symbol(format!("__dir__/{}{}.{}", up, base, extension), "*"),
                ],
            )]
        }
        // from . import name
        (None, false) => import
            .items
            .iter()
            .map(|item| {
                chain(
                    item.binding().to_string(),
                    vec![
                        Candidate::symbol(
                            format!("__dir__/{}{}.{}", up, init, extension),
                            &item.name,
                        ),
                        Candidate::symbol(
                            format!("__dir__/{}{}/{}.{}", up, item.name, init, extension),
                            &item.name,
                        ),
                        Candidate::whole(format!("__dir__/{}{}.{}", up, item.name, extension)),
                    ],
                )
            })
            .collect(),
        // from . import *
        (None, true) => vec![chain(
            String::from("*"),
            vec![Candidate::symbol(
                format!("__dir__/{}{}.{}", up, init, extension),
                "*",
            )],
        )],
    }
}

/// Emit the module back as source text.
pub fn unparse(ast: &ModuleAst) -> String {
    let mut out = String::new();
    for stmt in &ast.stmts {
        match stmt {
            Stmt::Raw(line) => out.push_str(line),
            Stmt::RelativeImport(import) => {
                // Only reachable on an untransformed tree.
                out.push_str(&import.indent);
                out.push_str(&import.text);
            }
            Stmt::FallbackChain(chain) => {
                let args: Vec<String> = chain
                    .candidates
                    .iter()
                    .map(|c| format!("'{}'", c.to_spec()))
                    .collect();
                out.push_str(&format!(
                    "{}{} = {}({})  # {} @ {}:{}",
                    chain.indent,
                    chain.binding,
                    LOAD_DIRECTIVE,
                    args.join(", "),
                    chain.origin.source,
                    chain.origin.line,
                    chain.origin.offset,
                ));
            }
        }
        out.push('\n');
    }
    out
}
