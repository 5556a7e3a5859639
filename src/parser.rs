//! A minimal line-oriented makefile parser (ambient outer surface, non-core). Adapted from the
//! teacher's `parser.rs` / `expand.rs` / `var.rs` design: recipe-prefix detection, rule-line
//! splitting on `:`/`::`, a trailing `;` recipe, `NAME = value` assignment, and `$(NAME)`/`${NAME}`
//! variable expansion with a stack of frames for nesting.
//!
//! Conditionals, `include` directives, and pattern rules beyond the two-extension inference form
//! (`.c.o:`) are not implemented. Everything this module learns from
//! a makefile is pushed through the core's external interface (`declare_target`, `set_recipe`,
//! `add_prerequisite`, `declare_inference_rule`, ...) -- it holds no build-graph state of its own.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::auto_vars::is_automatic_expr;
use crate::context::Context;
use crate::error::{ErrorKind, MakeError};
use crate::ids::ScopeId;
use crate::Engine;

const COMMENT_INDICATOR: char = '#';
const DEFAULT_RECIPE_PREFIX: char = '\t';

#[derive(Debug)]
struct Var {
    value: String,
    recursive: bool,
}

/// General (non-automatic) makefile variables, e.g. `CC`, `CFLAGS`. Automatic variables
/// (`@ * < ? **`) are never stored here; they're left untouched by [`expand`] and resolved later,
/// per-target, by the core's recipe compiler.
#[derive(Debug)]
struct VarMap {
    map: HashMap<String, Var>,
    blank: Var,
    default_recipe_prefix: Var,
}

impl VarMap {
    fn new() -> Self {
        Self {
            map: HashMap::new(),
            blank: Var {
                value: String::new(),
                recursive: false,
            },
            default_recipe_prefix: Var {
                value: DEFAULT_RECIPE_PREFIX.to_string(),
                recursive: false,
            },
        }
    }

    fn get(&self, k: &str) -> &Var {
        let k = k.trim();
        if k == ".RECIPEPREFIX" {
            return match self.map.get(k) {
                Some(var) if !var.value.is_empty() => var,
                _ => &self.default_recipe_prefix,
            };
        }
        self.map.get(k).unwrap_or(&self.blank)
    }

    fn set(&mut self, k: &str, v: String, recursive: bool) {
        self.map
            .insert(k.trim().to_string(), Var { value: v, recursive });
    }
}

struct Frame {
    previous_buffer: String,
    opening_delimiter: char,
}

/// Expand `$(NAME)` / `${NAME}` / `$X` references against `vars`. An automatic-variable reference
/// (`$@`, `$(@D)`, `$<`, ...) is recognized and passed through byte-for-byte rather than expanded,
/// since its value depends on the target the recipe ends up attached to, which isn't known until
/// recipe-compile time.
fn expand(s: &str, vars: &VarMap, context: &Context) -> Result<String, MakeError> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut current_buffer = String::with_capacity(s.len());
    let mut hit_variable = false;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => {
                hit_variable = !hit_variable;
                if !hit_variable {
                    current_buffer.push(c);
                }
            }
            '(' | '{' if hit_variable => {
                if let Some(passthrough) = try_take_automatic_passthrough(&mut chars, c) {
                    current_buffer.push('$');
                    current_buffer.push_str(&passthrough);
                    hit_variable = false;
                    continue;
                }
                stack.push(Frame {
                    previous_buffer: current_buffer,
                    opening_delimiter: c,
                });
                current_buffer = String::new();
                hit_variable = false;
            }
            ')' | '}' => match stack.last() {
                None => current_buffer.push(c),
                Some(f) => {
                    if (c == '}' && f.opening_delimiter == '{') || (c == ')' && f.opening_delimiter == '(') {
                        let var = vars.get(&current_buffer);
                        let result = if var.recursive {
                            expand(&var.value, vars, context)?
                        } else {
                            var.value.clone()
                        };
                        current_buffer = stack.pop().expect("checked Some above").previous_buffer;
                        current_buffer.push_str(&result);
                        hit_variable = false;
                    } else {
                        current_buffer.push(c);
                    }
                }
            },
            _ => {
                if hit_variable {
                    if "@*<?".contains(c) {
                        current_buffer.push('$');
                        current_buffer.push(c);
                    } else {
                        current_buffer.push_str(&vars.get(&c.to_string()).value);
                    }
                    hit_variable = false;
                } else {
                    current_buffer.push(c);
                }
            }
        }
    }

    match stack.pop() {
        None => Ok(current_buffer),
        Some(frame) => Err(MakeError::new(
            ErrorKind::Parse,
            format!("unclosed variable: {}{}", frame.opening_delimiter, frame.previous_buffer),
            context.clone(),
        )),
    }
}

/// If the text immediately following `$(`/`${` (up to its matching close, with no nested `$`)
/// names an automatic variable, consume it from `chars` and return the whole `(...)`/`{...}` span
/// verbatim. Returns `None` (consuming nothing) otherwise, so the caller falls back to ordinary
/// variable lookup.
fn try_take_automatic_passthrough(chars: &mut std::iter::Peekable<std::str::Chars>, open: char) -> Option<String> {
    let close = if open == '(' { ')' } else { '}' };
    let mut lookahead = chars.clone();
    let mut inner = String::new();
    loop {
        match lookahead.next() {
            None => return None,
            Some('$') => return None,
            Some(c) if c == close => break,
            Some(c) => inner.push(c),
        }
    }
    if !is_automatic_expr(&inner) {
        return None;
    }
    for _ in 0..=inner.chars().count() {
        chars.next();
    }
    Some(format!("{}{}{}", open, inner, close))
}

struct PendingRule {
    targets: Vec<String>,
    dependencies: Vec<String>,
    recipe: Vec<String>,
    context: Context,
}

/// Drives an [`Engine`] by parsing makefile text line by line, entirely within one scope. A
/// single scope is sufficient for the subset of make this parser supports (no `include`, so no
/// need to open a scope per included file's directory).
pub struct Parser<'a> {
    engine: &'a mut Engine,
    scope: ScopeId,
    vars: VarMap,
    current_rule: Option<PendingRule>,
    context: Context,
}

impl<'a> Parser<'a> {
    pub fn new(engine: &'a mut Engine, scope: ScopeId) -> Self {
        Self {
            engine,
            scope,
            vars: VarMap::new(),
            current_rule: None,
            context: Context::new(),
        }
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<(), MakeError> {
        let text = fs::read_to_string(path).map_err(|e| {
            MakeError::new(ErrorKind::Io, format!("could not read makefile ({})", e), Context::new())
        })?;
        self.context.path = Some(path.to_path_buf());
        self.parse_str(&text)
    }

    pub fn parse_str(&mut self, text: &str) -> Result<(), MakeError> {
        self.current_rule = None;
        for (i, line) in text.lines().enumerate() {
            self.context.line_number = i + 1;
            self.context.line = Some(line.to_string());
            self.parse_line(line)?;
        }
        // Flush any trailing rule.
        self.parse_line("")?;
        self.engine.close_scope(self.scope)
    }

    fn parse_line(&mut self, line: &str) -> Result<(), MakeError> {
        let recipe_prefix = self.vars.get(".RECIPEPREFIX").value.clone();
        if !recipe_prefix.is_empty() && line.starts_with(&recipe_prefix) {
            return match &mut self.current_rule {
                None => Err(MakeError::new(ErrorKind::Parse, "recipe without rule", self.context.clone())),
                Some(r) => {
                    let cmd = line
                        .strip_prefix(&recipe_prefix)
                        .expect("checked starts_with above")
                        .to_string();
                    if !cmd.trim().is_empty() {
                        r.recipe.push(expand(&cmd, &self.vars, &self.context)?);
                    }
                    Ok(())
                }
            };
        }

        if let Some(rule) = self.current_rule.take() {
            self.commit_rule(rule)?;
        }

        if line.trim().is_empty() || line.trim_start().starts_with(COMMENT_INDICATOR) {
            return Ok(());
        }

        if let Some((targets, mut deps)) = line.split_once(':') {
            if let Some(rest) = deps.strip_prefix(':') {
                deps = rest;
            }

            let mut deps = deps;
            let mut inline_recipe = None;
            if let Some((d, r)) = deps.split_once(';') {
                deps = d;
                inline_recipe = Some(r.to_string());
            }

            self.current_rule = Some(PendingRule {
                targets: expand(targets, &self.vars, &self.context)?
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
                dependencies: expand(deps, &self.vars, &self.context)?
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
                recipe: Vec::new(),
                context: self.context.clone(),
            });

            if let Some(r) = inline_recipe {
                let prefixed = format!("{}{}", self.vars.get(".RECIPEPREFIX").value, r);
                return self.parse_line(&prefixed);
            }
            return Ok(());
        }

        if let Some((k, v)) = line.split_once('=') {
            let value = expand(v.trim_start(), &self.vars, &self.context)?;
            self.vars.set(k, value, false);
            return Ok(());
        }

        Err(MakeError::new(ErrorKind::Parse, "invalid line", self.context.clone()))
    }

    /// An inference-rule definition looks like `.c.obj:` with no dependencies: exactly one
    /// target, starting with `.`, containing exactly two more `.`-separated components.
    fn as_inference_rule(rule: &PendingRule) -> Option<(String, String)> {
        if rule.targets.len() != 1 || !rule.dependencies.is_empty() {
            return None;
        }
        let name = rule.targets[0].strip_prefix('.')?;
        let (source_ext, target_ext) = name.split_once('.')?;
        if source_ext.is_empty() || target_ext.is_empty() || target_ext.contains('.') {
            return None;
        }
        Some((source_ext.to_string(), target_ext.to_string()))
    }

    fn commit_rule(&mut self, rule: PendingRule) -> Result<(), MakeError> {
        let recipe_text = rule.recipe.join("\n");

        if let Some((source_ext, target_ext)) = Self::as_inference_rule(&rule) {
            let carrier = self.engine.declare_target(self.scope, &rule.targets[0])?;
            self.engine.declare_inference_rule(self.scope, &source_ext, &target_ext, carrier);
            self.engine.set_recipe(carrier, &recipe_text);
            return Ok(());
        }

        for target_name in &rule.targets {
            let target = self.engine.declare_target(self.scope, target_name)?;
            for dep_name in &rule.dependencies {
                let dep = self.engine.declare_target(self.scope, dep_name)?;
                self.engine.add_prerequisite(dep, target);
                self.engine.mark_target_inference_rule_needed_if_needed(self.scope, dep);
            }
            self.engine.set_recipe(target, &recipe_text);
            self.engine.mark_target_inference_rule_needed_if_needed(self.scope, target);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_simple_rule_with_recipe() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        {
            let mut parser = Parser::new(&mut engine, root);
            parser
                .parse_str("a.obj: a.c\n\tcc $< -o $@\n")
                .unwrap();
        }
        let obj = engine.declare_target(root, "a.obj").unwrap();
        assert_eq!(engine.target(obj).recipe, "cc $< -o $@");
        assert!(engine.target(obj).explicit_recipe_found);
        let c = engine.declare_target(root, "a.c").unwrap();
        assert!(engine.prerequisites_of(obj).any(|p| p == c));
    }

    #[test]
    fn test_inference_rule_definition() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        {
            let mut parser = Parser::new(&mut engine, root);
            parser.parse_str(".c.obj:\n\tcc $< -o $@\n").unwrap();
        }
        let rule = engine.next_rule_for_target_ext(root, "obj", None).unwrap();
        assert_eq!(engine.inference_rule(rule).source_ext, "c");
    }

    #[test]
    fn test_variable_assignment_and_expansion() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        {
            let mut parser = Parser::new(&mut engine, root);
            parser
                .parse_str("CC = gcc\nall: a.obj\n\t$(CC) -o all a.obj\n")
                .unwrap();
        }
        let all = engine.declare_target(root, "all").unwrap();
        assert_eq!(engine.target(all).recipe, "gcc -o all a.obj");
    }

    #[test]
    fn test_automatic_variable_passes_through_unexpanded() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        {
            let mut parser = Parser::new(&mut engine, root);
            parser.parse_str("a.obj: a.c\n\tcc $< -o $(@F)\n").unwrap();
        }
        let obj = engine.declare_target(root, "a.obj").unwrap();
        assert_eq!(engine.target(obj).recipe, "cc $< -o $(@F)");
    }

    #[test]
    fn test_dependency_only_rule_still_marks_explicit_recipe() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        {
            let mut parser = Parser::new(&mut engine, root);
            parser.parse_str("all: a.obj\n").unwrap();
        }
        let all = engine.declare_target(root, "all").unwrap();
        assert!(engine.target(all).explicit_recipe_found);
        assert_eq!(engine.target(all).recipe, "");
    }

    #[test]
    fn test_dependency_named_only_as_a_prerequisite_is_queued_for_inference() {
        let dir = std::env::temp_dir().join(format!("rmake-parser-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.c"), "").unwrap();

        let mut engine = Engine::new(dir.clone());
        let root = engine.root_scope();
        {
            let mut parser = Parser::new(&mut engine, root);
            parser
                .parse_str("all: a.obj\n\ttouch all\n.c.obj:\n\tcc $< -o $@\n")
                .unwrap();
        }
        // `a.obj` never appears as a rule target, only as a dependency of `all`, so it must have
        // been queued via `mark_target_inference_rule_needed_if_needed` for its own sake, not
        // just `all`, for the scope-close resolver to find its chained `.c.obj` rule.
        let obj = engine.declare_target(root, "a.obj").unwrap();
        assert_eq!(
            engine
                .inference_rule(engine.target(obj).inference_rule.unwrap())
                .source_ext,
            "c"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
