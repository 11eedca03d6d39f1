use crate::core::{ForInTarget, ForInit, FunctionNode, Statement, StatementKind};
use indexmap::IndexSet;
use std::rc::Rc;

/// Hoisted declarations of one program, eval or function body.
#[derive(Debug, Default)]
pub struct ScopeInfo {
    /// Function declarations in source order; a later one with the same name wins.
    pub functions: Vec<Rc<FunctionNode>>,
    /// `var` names in first-declaration order.
    pub vars: IndexSet<String>,
}

/// Hoisted declarations of `body`, not descending into nested functions.
pub fn collect_declarations(body: &[Statement]) -> ScopeInfo {
    let mut info = ScopeInfo::default();
    for stmt in body {
        visit(stmt, &mut info);
    }
    log::trace!("collected {} functions, {} vars", info.functions.len(), info.vars.len());
    info
}

fn visit_all(stmts: &[Statement], info: &mut ScopeInfo) {
    for stmt in stmts {
        visit(stmt, info);
    }
}

fn visit(stmt: &Statement, info: &mut ScopeInfo) {
    match &stmt.kind {
        StatementKind::Var(decls) => {
            for (name, _) in decls {
                info.vars.insert(name.clone());
            }
        }
        StatementKind::FunctionDeclaration(func) => info.functions.push(func.clone()),
        StatementKind::Block(body) => visit_all(body, info),
        StatementKind::If(_, then, otherwise) => {
            visit(then, info);
            if let Some(s) = otherwise {
                visit(s, info);
            }
        }
        StatementKind::DoWhile(body, _) | StatementKind::While(_, body) | StatementKind::With(_, body) => visit(body, info),
        StatementKind::Labelled(_, body) => visit(body, info),
        StatementKind::For(init, _, _, body) => {
            if let Some(ForInit::Var(decls)) = init {
                for (name, _) in decls {
                    info.vars.insert(name.clone());
                }
            }
            visit(body, info);
        }
        StatementKind::ForIn(target, _, body) => {
            if let ForInTarget::Var(name, _) = target {
                info.vars.insert(name.clone());
            }
            visit(body, info);
        }
        StatementKind::Switch(_, clauses) => {
            for clause in clauses {
                visit_all(&clause.body, info);
            }
        }
        StatementKind::Try(block, handler, finalizer) => {
            visit_all(block, info);
            if let Some((_, body)) = handler {
                visit_all(body, info);
            }
            if let Some(body) = finalizer {
                visit_all(body, info);
            }
        }
        StatementKind::Empty
        | StatementKind::Expr(_)
        | StatementKind::Continue(_)
        | StatementKind::Break(_)
        | StatementKind::Return(_)
        | StatementKind::Throw(_)
        | StatementKind::Debugger => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse_program;

    #[test]
    fn hoists_vars_and_functions_but_not_nested_bodies() {
        let program = parse_program(
            "var a; if (x) { var b = 1; function f() { var inner; } } \
             for (var i = 0;;) {} for (var k in o) {} \
             try { var t } catch (e) { var c } finally { var d } \
             switch (x) { case 1: var s; } lbl: var l; var a;",
            None,
            false,
        )
        .unwrap();
        let info = collect_declarations(&program.body);
        let vars: Vec<&str> = info.vars.iter().map(String::as_str).collect();
        assert_eq!(vars, ["a", "b", "i", "k", "t", "c", "d", "s", "l"]);
        assert_eq!(info.functions.len(), 1);
        assert_eq!(info.functions[0].name.as_deref(), Some("f"));
    }

    #[test]
    fn function_nodes_carry_their_own_declarations() {
        let program = parse_program("function outer(p) { var v; function inner() { var deep; } }", None, false).unwrap();
        let info = collect_declarations(&program.body);
        let outer = &info.functions[0];
        let vars: Vec<&str> = outer.scope.vars.iter().map(String::as_str).collect();
        assert_eq!(vars, ["v"]);
        assert_eq!(outer.scope.functions.len(), 1);
        let inner = &outer.scope.functions[0];
        assert_eq!(inner.scope.vars.iter().map(String::as_str).collect::<Vec<_>>(), ["deep"]);
    }
}
