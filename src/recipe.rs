//! The recipe compiler: splits a recipe template into command lines, strips per-line prefix
//! modifiers (`@`, `-`), and expands automatic variables. The `$()`/`${}` scanning loop is a
//! simplified variant of a general nested-brace expander, simplified here because automatic
//! variable references never nest.

use crate::context::Context;
use crate::error::{ErrorKind, MakeError};
use crate::ids::TargetId;
use crate::target::ExecCmd;

impl crate::Engine {
    /// Expand automatic-variable references (`$@`, `$(@F)`, `$<`, `$?`, `$**`, ...) inside a
    /// single recipe line. A reference that does not name an automatic variable expands to the
    /// empty string -- by the time a recipe line reaches the core, the ambient parser has
    /// already substituted every ordinary (non-automatic) makefile variable, so anything left
    /// unresolved here is an undefined reference.
    pub fn expand_recipe_line(
        &self,
        target: TargetId,
        line: &str,
        context: &Context,
    ) -> Result<String, MakeError> {
        let mut out = String::with_capacity(line.len());
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }

            match chars.peek().copied() {
                Some('$') => {
                    chars.next();
                    out.push('$');
                }
                Some(open @ ('(' | '{')) => {
                    chars.next();
                    let close = if open == '(' { ')' } else { '}' };
                    let mut inner = String::new();
                    let mut closed = false;
                    for c2 in chars.by_ref() {
                        if c2 == close {
                            closed = true;
                            break;
                        }
                        inner.push(c2);
                    }
                    if !closed {
                        return Err(MakeError::new(
                            ErrorKind::Parse,
                            format!("unclosed variable reference '${}{}'", open, inner),
                            context.clone(),
                        ));
                    }
                    if let Some(result) = self.expand_target_variable(target, &inner, context) {
                        out.push_str(&result?);
                    }
                }
                Some(_) => {
                    let mut name = String::new();
                    name.push(chars.next().expect("peek confirmed a char is present"));
                    if name == "*" && chars.peek() == Some(&'*') {
                        name.push(chars.next().unwrap());
                    }
                    if let Some(result) = self.expand_target_variable(target, &name, context) {
                        out.push_str(&result?);
                    }
                }
                None => out.push('$'),
            }
        }

        Ok(out)
    }

    /// Chooses the source recipe template, splits it into command
    /// lines, strips leading `@`/`-` modifiers, and expands each line, appending the results to
    /// `target.exec_cmds`.
    pub fn generate_exec_script(&mut self, target: TargetId) -> Result<(), MakeError> {
        let t = self.target(target);
        let template = if !t.recipe.is_empty() {
            t.recipe.clone()
        } else if let Some(rule_id) = t.inference_rule {
            let carrier = self.inference_rule(rule_id).carrier_target;
            self.target(carrier).recipe.clone()
        } else if t.explicit_recipe_found {
            t.recipe.clone()
        } else {
            return Err(MakeError::new(
                ErrorKind::NoBuildableRecipe,
                format!("don't know how to build {}", t.key.display()),
                Context::new(),
            ));
        };

        let context = Context::new();
        for raw_line in template.split('\n') {
            let mut line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

            let mut display_cmd = true;
            let mut ignore_errors = false;
            loop {
                if let Some(rest) = line.strip_prefix('@') {
                    display_cmd = false;
                    line = rest;
                } else if let Some(rest) = line.strip_prefix('-') {
                    ignore_errors = true;
                    line = rest;
                } else {
                    break;
                }
            }

            let cmd = self.expand_recipe_line(target, line, &context)?;
            self.target_mut(target).exec_cmds.push(ExecCmd {
                cmd,
                display_cmd,
                ignore_errors,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Engine;
    use std::path::PathBuf;

    #[test]
    fn test_simple_recipe_compiles_one_command() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let src = engine.declare_target(root, "a.c").unwrap();
        let obj = engine.declare_target(root, "a.obj").unwrap();
        engine.add_prerequisite(src, obj);
        engine.set_recipe(obj, "cc $< -o $@");

        engine.generate_exec_script(obj).unwrap();
        let cmds = &engine.target(obj).exec_cmds;
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].cmd, "cc /p/a.c -o /p/a.obj");
        assert!(cmds[0].display_cmd);
        assert!(!cmds[0].ignore_errors);
    }

    #[test]
    fn test_at_and_dash_prefixes_strip_and_flag() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let t = engine.declare_target(root, "all").unwrap();
        engine.set_recipe(t, "@-echo hi\n-@echo bye");

        engine.generate_exec_script(t).unwrap();
        let cmds = &engine.target(t).exec_cmds;
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].cmd, "echo hi");
        assert!(!cmds[0].display_cmd);
        assert!(cmds[0].ignore_errors);
        assert_eq!(cmds[1].cmd, "echo bye");
        assert!(!cmds[1].display_cmd);
        assert!(cmds[1].ignore_errors);
    }

    #[test]
    fn test_inference_rule_supplies_recipe() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let carrier = engine.declare_target(root, ".c.obj").unwrap();
        engine.set_recipe(carrier, "cc $< -o $@");
        let rule = engine.create_rule(root, "c", "obj", carrier);

        let obj = engine.declare_target(root, "a.obj").unwrap();
        let src = engine.declare_target(root, "a.c").unwrap();
        engine.target_mut(obj).inference_rule = Some(rule);
        engine.target_mut(obj).inference_parent = Some(src);
        engine.add_prerequisite(src, obj);

        engine.generate_exec_script(obj).unwrap();
        assert_eq!(engine.target(obj).exec_cmds[0].cmd, "cc /p/a.c -o /p/a.obj");
    }

    #[test]
    fn test_no_recipe_no_inference_fails() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let t = engine.declare_target(root, "a.obj").unwrap();
        assert!(engine.generate_exec_script(t).is_err());
    }

    #[test]
    fn test_explicit_empty_recipe_compiles_to_zero_commands() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let t = engine.declare_target(root, "all").unwrap();
        engine.set_recipe(t, "");
        engine.generate_exec_script(t).unwrap();
        assert!(engine.target(t).exec_cmds.is_empty());
    }
}
