//! Line-based parser for relative reference statements
//!
//! Only statements of the form `from .<module> import <items>` are parsed;
//! absolute `from`/`import` statements and everything else pass through as
//! raw lines. A line that starts like a relative reference but cannot be
//! parsed is a hard error, since silently passing it through would defer the
//! failure to the host with a worse message.

use std::path::Path;

use crate::error::RewriteError;

use super::ast::{ImportItem, ModuleAst, RelativeImport, Stmt};

/// Parse source text into a statement list.
pub fn parse(source: &str, file: &Path) -> Result<ModuleAst, RewriteError> {
    let mut stmts = Vec::new();
    for (index, raw_line) in source.lines().enumerate() {
        let line_no = (index + 1) as u32;
        match parse_line(raw_line, line_no, file)? {
            Some(import) => stmts.push(Stmt::RelativeImport(import)),
            None => stmts.push(Stmt::Raw(raw_line.to_string())),
        }
    }
    Ok(ModuleAst { stmts })
}

fn parse_line(
    raw_line: &str,
    line_no: u32,
    file: &Path,
) -> Result<Option<RelativeImport>, RewriteError> {
    let trimmed = raw_line.trim_start();
    let indent_len = raw_line.len() - trimmed.len();

    let Some(rest) = trimmed.strip_prefix("from") else {
        return Ok(None);
    };
    let rest = rest.trim_start();
    if rest.len() == trimmed.len() - "from".len() || !rest.starts_with('.') {
        // `from` without whitespace after it, or an absolute reference.
        return Ok(None);
    }

    let syntax = |message: &str| RewriteError::Syntax {
        file: file.to_path_buf(),
        line: line_no,
        message: message.to_string(),
    };

    let (target, items_text) = rest
        .split_once(" import ")
        .ok_or_else(|| syntax("expected 'import' after the module path"))?;

    let target = target.trim();
    let level = target.chars().take_while(|&c| c == '.').count() as u32;
    let module_text = &target[level as usize..];
    if !module_text.is_empty() && !is_dotted_identifier(module_text) {
        return Err(syntax("module path is not a dotted identifier"));
    }
    let module = if module_text.is_empty() {
        None
    } else {
        Some(module_text.to_string())
    };

    let items_text = items_text.trim().trim_end_matches('\\').trim();
    if items_text.is_empty() {
        return Err(syntax("expected at least one imported name"));
    }

    let mut items = Vec::new();
    let mut wildcard = false;
    for part in items_text.split(',') {
        let part = part.trim();
        if part == "*" {
            wildcard = true;
            continue;
        }
        let (name, alias) = match part.split_once(" as ") {
            Some((name, alias)) => (name.trim(), Some(alias.trim())),
            None => (part, None),
        };
        if !is_identifier(name) || !alias.map_or(true, is_identifier) {
            return Err(syntax("imported name is not an identifier"));
        }
        items.push(ImportItem {
            name: name.to_string(),
            alias: alias.map(str::to_string),
        });
    }
    if wildcard && !items.is_empty() {
        return Err(syntax("'*' cannot be combined with named imports"));
    }

    Ok(Some(RelativeImport {
        level,
        module,
        items,
        wildcard,
        line: line_no,
        offset: indent_len as u32,
        text: trimmed.to_string(),
        indent: raw_line[..indent_len].to_string(),
    }))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_dotted_identifier(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(line: &str) -> RelativeImport {
        let ast = parse(line, Path::new("/app/mod.py")).unwrap();
        match &ast.stmts[0] {
            Stmt::RelativeImport(import) => import.clone(),
            other => panic!("expected relative import, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_lines_are_raw() {
        let ast = parse("x = 1\nimport os\nfrom os import path\n", Path::new("/m.py")).unwrap();
        assert_eq!(ast.stmts.len(), 3);
        assert!(ast.stmts.iter().all(|s| matches!(s, Stmt::Raw(_))));
    }

    #[test]
    fn test_sibling_module_import() {
        let import = parse_one("from .utils import helper");
        assert_eq!(import.level, 1);
        assert_eq!(import.module.as_deref(), Some("utils"));
        assert_eq!(import.items.len(), 1);
        assert_eq!(import.items[0].name, "helper");
        assert!(!import.wildcard);
    }

    #[test]
    fn test_parent_level_and_alias() {
        let import = parse_one("from ..pkg.utils import helper as h, other");
        assert_eq!(import.level, 2);
        assert_eq!(import.module.as_deref(), Some("pkg.utils"));
        assert_eq!(import.items[0].binding(), "h");
        assert_eq!(import.items[1].binding(), "other");
    }

    #[test]
    fn test_bare_dot_import() {
        let import = parse_one("from . import sibling");
        assert_eq!(import.level, 1);
        assert_eq!(import.module, None);
        assert_eq!(import.items[0].name, "sibling");
    }

    #[test]
    fn test_wildcard() {
        let import = parse_one("from .utils import *");
        assert!(import.wildcard);
        assert!(import.items.is_empty());
    }

    #[test]
    fn test_indent_preserved() {
        let import = parse_one("    from .utils import helper");
        assert_eq!(import.indent, "    ");
        assert_eq!(import.offset, 4);
        assert_eq!(import.text, "from .utils import helper");
    }

    #[test]
    fn test_malformed_is_error() {
        let err = parse("from .utils helper", Path::new("/m.py")).unwrap_err();
        match err {
            RewriteError::Syntax { line, message, .. } => {
                assert_eq!(line, 1);
                assert!(message.contains("import"));
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_wildcard_mixed_with_names_is_error() {
        assert!(parse("from .utils import *, helper", Path::new("/m.py")).is_err());
    }

    #[test]
    fn test_bad_module_path_is_error() {
        assert!(parse("from .ut-ils import helper", Path::new("/m.py")).is_err());
    }
}
