//! Static binding resolver
//!
//! Walks the program once before evaluation, mirroring lexical scopes and
//! tracking each binding's move state. Reading a variable in value position
//! moves it; `copy`, field receivers and callees do not. Mutability grades
//! are checked for every `set` and for calls to methods declared `mut`.

mod scope;

pub use scope::{BindingInfo, BindingKind, MoveState};

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::ast::{
    Block, ClassDecl, Expr, FunctionDecl, FunctionKind, Grade, Ident, IfStmt, PathSegment,
    PlaceRoot, Program, SetStmt, Stmt, WhileStmt,
};
use crate::error::ResolveError;
use crate::span::Span;
use crate::stack::ensure_sufficient_stack;

use scope::{merge_into, merge_states, Access, BindingId, LoopFrame, Scope, Slot};

/// A program that passed binding resolution.
#[derive(Debug, Clone)]
pub struct ResolvedProgram {
    /// The checked syntax tree
    pub program: Program,
    /// Names of every method declared `mut` in any class
    pub mutating_methods: IndexSet<String>,
    /// Number of bindings the resolver created
    pub binding_count: usize,
}

/// Check moves and mutability for a parsed program.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resolve(program: Program) -> Result<ResolvedProgram, ResolveError> {
    let mut mutating_methods = IndexSet::new();
    collect_mutating_methods(&program.stmts, &mut mutating_methods);

    let mut resolver = Resolver::new(&mutating_methods);
    resolver.resolve_stmts(&program.stmts)?;

    let binding_count = resolver.bindings.len();
    tracing::debug!(bindings = binding_count, "resolved program");
    Ok(ResolvedProgram {
        program,
        mutating_methods,
        binding_count,
    })
}

/// Gather `mut` method names from classes anywhere in `stmts`.
fn collect_mutating_methods(stmts: &[Stmt], names: &mut IndexSet<String>) {
    ensure_sufficient_stack(|| {
        for stmt in stmts {
            match stmt {
                Stmt::Class(class) => {
                    for method in &class.methods {
                        if method.kind == FunctionKind::MutMethod {
                            names.insert(method.name.name.clone());
                        }
                        collect_mutating_methods(&method.body.stmts, names);
                    }
                    if let Some(ctor) = &class.constructor {
                        collect_mutating_methods(&ctor.body.stmts, names);
                    }
                }
                Stmt::Function(decl) => collect_mutating_methods(&decl.body.stmts, names),
                Stmt::If(stmt) => {
                    for (_, body) in &stmt.branches {
                        collect_mutating_methods(&body.stmts, names);
                    }
                    if let Some(body) = &stmt.otherwise {
                        collect_mutating_methods(&body.stmts, names);
                    }
                }
                Stmt::While(stmt) => collect_mutating_methods(&stmt.body.stmts, names),
                _ => {}
            }
        }
    })
}

/// Whether control can fall off the end of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continues,
    Diverges,
}

/// How an expression's value is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Use {
    /// Value position: a bare variable read moves it
    Move,
    /// Receiver or callee: the variable is only looked through
    Place,
}

struct Resolver<'m> {
    bindings: Vec<BindingInfo>,
    states: Vec<Slot>,
    scopes: Vec<Scope>,
    loops: Vec<LoopFrame>,
    /// Loops below this index belong to enclosing functions
    loop_floor: usize,
    /// Scopes below this index belong to enclosing functions
    function_scope: usize,
    /// Ticks at every loop entry and every plain `set`
    clock: u32,
    mutating_methods: &'m IndexSet<String>,
}

impl<'m> Resolver<'m> {
    fn new(mutating_methods: &'m IndexSet<String>) -> Self {
        Self {
            bindings: Vec::new(),
            states: Vec::new(),
            scopes: vec![Scope::default()],
            loops: Vec::new(),
            loop_floor: 0,
            function_scope: 0,
            clock: 0,
            mutating_methods,
        }
    }

    fn tick(&mut self) -> u32 {
        self.clock += 1;
        self.clock
    }

    // ═══════════════════════════════════════════════════════════════════
    // Bindings
    // ═══════════════════════════════════════════════════════════════════

    fn declare(
        &mut self,
        ident: &Ident,
        grade: Grade,
        kind: BindingKind,
        initialized: bool,
    ) -> Result<BindingId, ResolveError> {
        let scope = self.scopes.len() - 1;
        if let Some(existing) = self.scopes[scope].get(&ident.name) {
            // a moved-out or deleted name may be declared again
            if !matches!(
                self.states[existing].state,
                MoveState::Moved(_) | MoveState::Deleted(_)
            ) {
                return Err(ResolveError::DuplicateDeclaration {
                    name: ident.name.clone(),
                    span: ident.span,
                    previous: self.bindings[existing].declared_at,
                });
            }
        }

        let id = self.bindings.len();
        self.bindings.push(BindingInfo {
            name: ident.name.clone(),
            grade,
            kind,
            declared_at: ident.span,
        });
        self.states.push(Slot::new(if initialized {
            MoveState::Live
        } else {
            MoveState::Uninitialized
        }));
        self.scopes[scope].insert(ident.name.clone(), id);
        Ok(id)
    }

    /// Find `name` along with the index of the scope that declares it.
    fn lookup_scoped(&self, name: &str) -> Option<(usize, BindingId)> {
        self.scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, scope)| scope.get(name).map(|id| (depth, id)))
    }

    fn lookup(&self, name: &str) -> Option<BindingId> {
        self.lookup_scoped(name).map(|(_, id)| id)
    }

    /// Record a use of `id` in every enclosing loop it reaches across the
    /// back edge.
    fn note_loop_use(&mut self, id: BindingId, access: Access, span: Span) {
        let assigned = self.states[id].assigned;
        for frame in &mut self.loops {
            if id < frame.outer_bindings && assigned < frame.entered {
                frame.expose(id, access, span);
            }
        }
    }

    /// Check that `name` is readable, moving it when `moves` is set.
    fn read(&mut self, name: &str, span: Span, moves: bool) -> Result<BindingId, ResolveError> {
        let Some(id) = self.lookup(name) else {
            return Err(ResolveError::UndeclaredVariable {
                name: name.to_string(),
                span,
            });
        };
        self.note_loop_use(id, Access::Read, span);

        match self.states[id].state {
            MoveState::Moved(moved_at) => {
                return Err(ResolveError::UseAfterMove {
                    name: name.to_string(),
                    span,
                    moved_at,
                })
            }
            MoveState::Deleted(deleted_at) => {
                return Err(ResolveError::UseAfterDelete {
                    name: name.to_string(),
                    span,
                    deleted_at,
                })
            }
            MoveState::Uninitialized => {
                return Err(ResolveError::Uninitialized {
                    name: name.to_string(),
                    span,
                    declared_at: self.bindings[id].declared_at,
                })
            }
            MoveState::Live => {}
        }

        if moves && self.bindings[id].kind.is_movable() {
            tracing::trace!(name, "binding moved");
            self.states[id].state = MoveState::Moved(span);
        }
        Ok(id)
    }

    fn read_root(&mut self, root: &PlaceRoot) -> Result<BindingId, ResolveError> {
        self.read(root.name(), root.span(), false)
    }

    /// Require the mutate privilege on binding `id`.
    fn check_mutate(&self, id: BindingId, span: Span) -> Result<(), ResolveError> {
        let binding = &self.bindings[id];
        if binding.grade.contains(Grade::MUTATE) {
            Ok(())
        } else {
            Err(ResolveError::IllegalMutate {
                name: binding.name.clone(),
                span,
                declared_at: binding.declared_at,
            })
        }
    }

    /// Replace the current move states with a snapshot.
    fn restore(&mut self, mut states: Vec<Slot>) {
        states.resize(self.bindings.len(), Slot::new(MoveState::Live));
        self.states = states;
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve statements in the current scope, hoisting declarations.
    fn resolve_stmts(&mut self, stmts: &[Stmt]) -> Result<Flow, ResolveError> {
        for stmt in stmts {
            match stmt {
                Stmt::Function(decl) => {
                    self.declare(&decl.name, Grade::empty(), BindingKind::Function, true)?;
                }
                Stmt::Class(decl) => {
                    self.declare(&decl.name, Grade::empty(), BindingKind::Class, true)?;
                }
                _ => {}
            }
        }

        let mut flow = Flow::Continues;
        for stmt in stmts {
            if self.resolve_stmt(stmt)? == Flow::Diverges {
                flow = Flow::Diverges;
            }
        }
        Ok(flow)
    }

    fn resolve_block(&mut self, block: &Block) -> Result<Flow, ResolveError> {
        ensure_sufficient_stack(|| {
            self.scopes.push(Scope::default());
            let flow = self.resolve_stmts(&block.stmts)?;
            self.scopes.pop();
            Ok(flow)
        })
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<Flow, ResolveError> {
        match stmt {
            Stmt::Let(stmt) => {
                if let Some(init) = &stmt.init {
                    self.resolve_expr(init, Use::Move)?;
                }
                self.declare(
                    &stmt.name,
                    stmt.grade,
                    BindingKind::Variable,
                    stmt.init.is_some(),
                )?;
            }
            Stmt::Set(stmt) => self.resolve_set(stmt)?,
            Stmt::Delete { name, span } => self.resolve_delete(name, *span)?,
            Stmt::Function(decl) => self.resolve_function(decl)?,
            Stmt::Class(decl) => self.resolve_class(decl)?,
            Stmt::If(stmt) => return self.resolve_if(stmt),
            Stmt::While(stmt) => return self.resolve_while(stmt),
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.resolve_expr(value, Use::Move)?;
                }
                return Ok(Flow::Diverges);
            }
            Stmt::Break(span) => {
                let states = self.states.clone();
                let frame = self.innermost_loop("break", *span)?;
                frame.breaks = Some(merge_into(frame.breaks.take(), &states));
                return Ok(Flow::Diverges);
            }
            Stmt::Continue(span) => {
                let states = self.states.clone();
                let frame = self.innermost_loop("continue", *span)?;
                frame.continues = Some(merge_into(frame.continues.take(), &states));
                return Ok(Flow::Diverges);
            }
            Stmt::Print { value, .. } | Stmt::Expr(value) => self.resolve_expr(value, Use::Move)?,
        }
        Ok(Flow::Continues)
    }

    /// The innermost loop of the current function body.
    fn innermost_loop(
        &mut self,
        keyword: &'static str,
        span: Span,
    ) -> Result<&mut LoopFrame, ResolveError> {
        let floor = self.loop_floor;
        self.loops
            .get_mut(floor..)
            .and_then(|frames| frames.last_mut())
            .ok_or(ResolveError::MisplacedControl { keyword, span })
    }

    fn resolve_set(&mut self, stmt: &SetStmt) -> Result<(), ResolveError> {
        self.resolve_expr(&stmt.value, Use::Move)?;
        let target = &stmt.target;

        if !target.path.is_empty() {
            let id = self.read_root(&target.root)?;
            self.check_mutate(id, stmt.span)?;
            return self.resolve_path(&target.path);
        }

        let name = target.root.name();
        let Some(id) = self.lookup(name) else {
            return Err(ResolveError::UndeclaredVariable {
                name: name.to_string(),
                span: target.root.span(),
            });
        };
        self.note_loop_use(id, Access::Write, target.root.span());
        if let MoveState::Deleted(deleted_at) = self.states[id].state {
            return Err(ResolveError::UseAfterDelete {
                name: name.to_string(),
                span: target.root.span(),
                deleted_at,
            });
        }

        let binding = &self.bindings[id];
        if binding.kind != BindingKind::Variable || !binding.grade.contains(Grade::REASSIGN) {
            return Err(ResolveError::IllegalReassign {
                name: name.to_string(),
                span: stmt.span,
                declared_at: binding.declared_at,
            });
        }
        let now = self.tick();
        self.states[id] = Slot {
            state: MoveState::Live,
            assigned: now,
        };
        Ok(())
    }

    /// Mark a binding dead. Only bindings of the current function body may
    /// be deleted.
    fn resolve_delete(&mut self, name: &Ident, span: Span) -> Result<(), ResolveError> {
        let Some((depth, id)) = self.lookup_scoped(&name.name) else {
            return Err(ResolveError::UndeclaredVariable {
                name: name.name.clone(),
                span: name.span,
            });
        };
        if depth < self.function_scope {
            return Err(ResolveError::IllegalDelete {
                name: name.name.clone(),
                span,
                declared_at: self.bindings[id].declared_at,
            });
        }

        self.note_loop_use(id, Access::Write, name.span);
        if let MoveState::Deleted(deleted_at) = self.states[id].state {
            return Err(ResolveError::UseAfterDelete {
                name: name.name.clone(),
                span: name.span,
                deleted_at,
            });
        }
        tracing::trace!(name = %name.name, "binding deleted");
        self.states[id].state = MoveState::Deleted(span);
        Ok(())
    }

    fn resolve_if(&mut self, stmt: &IfStmt) -> Result<Flow, ResolveError> {
        let mut merged: Option<Vec<Slot>> = None;
        let mut diverges = true;

        for (cond, body) in &stmt.branches {
            self.resolve_expr(cond, Use::Move)?;
            let after_cond = self.states.clone();
            if self.resolve_block(body)? == Flow::Continues {
                merged = Some(merge_into(merged, &self.states));
                diverges = false;
            }
            self.restore(after_cond);
        }

        match &stmt.otherwise {
            Some(body) => {
                if self.resolve_block(body)? == Flow::Continues {
                    merged = Some(merge_into(merged, &self.states));
                    diverges = false;
                }
            }
            None => {
                merged = Some(merge_into(merged, &self.states));
                diverges = false;
            }
        }

        if let Some(merged) = merged {
            self.restore(merged);
        }
        Ok(if diverges {
            Flow::Diverges
        } else {
            Flow::Continues
        })
    }

    /// Resolve a loop body once.
    ///
    /// Uses of outer bindings that no `set` in the body precedes are
    /// checked afterwards against the state flowing back to the condition,
    /// which is what the next iteration would see.
    fn resolve_while(&mut self, stmt: &WhileStmt) -> Result<Flow, ResolveError> {
        let entered = self.tick();
        self.loops.push(LoopFrame::new(entered, self.bindings.len()));

        self.resolve_expr(&stmt.cond, Use::Move)?;
        let exit = self.states.clone();
        let flow = self.resolve_block(&stmt.body)?;
        let frame = self.loops.pop().unwrap_or_default();

        let mut back = (flow == Flow::Continues).then(|| self.states.clone());
        if let Some(continues) = &frame.continues {
            back = Some(merge_into(back, continues));
        }

        let mut after = exit;
        if let Some(back) = back {
            self.check_back_edge(&frame, &back)?;
            after = merge_states(&after, &back);
        }
        if let Some(breaks) = &frame.breaks {
            after = merge_states(&after, breaks);
        }
        self.restore(after);
        Ok(Flow::Continues)
    }

    fn check_back_edge(&self, frame: &LoopFrame, back: &[Slot]) -> Result<(), ResolveError> {
        for (&id, &(access, span)) in &frame.exposed {
            let Some(slot) = back.get(id) else { continue };
            let name = &self.bindings[id].name;
            match (slot.state, access) {
                (MoveState::Deleted(deleted_at), _) => {
                    return Err(ResolveError::UseAfterDelete {
                        name: name.clone(),
                        span,
                        deleted_at,
                    })
                }
                (MoveState::Moved(moved_at), Access::Read) => {
                    return Err(ResolveError::UseAfterMove {
                        name: name.clone(),
                        span,
                        moved_at,
                    })
                }
                _ => {}
            }
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Functions and Classes
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve a body in its own scope. Moves inside it do not leak out.
    fn resolve_function(&mut self, decl: &FunctionDecl) -> Result<(), ResolveError> {
        let saved_states = self.states.clone();
        let saved_floor = std::mem::replace(&mut self.loop_floor, self.loops.len());
        let saved_scope = std::mem::replace(&mut self.function_scope, self.scopes.len());
        self.scopes.push(Scope::default());

        if decl.kind != FunctionKind::Function {
            let this = Ident::new("this", decl.name.span);
            self.declare(&this, decl.this_grade(), BindingKind::This, true)?;
        }
        for param in &decl.params {
            self.declare(&param.name, param.grade, BindingKind::Variable, true)?;
        }
        self.resolve_block(&decl.body)?;

        self.scopes.pop();
        self.loop_floor = saved_floor;
        self.function_scope = saved_scope;
        self.restore(saved_states);
        Ok(())
    }

    fn resolve_class(&mut self, decl: &ClassDecl) -> Result<(), ResolveError> {
        let mut members: HashMap<&str, Span> = HashMap::new();
        let names = decl
            .fields
            .iter()
            .map(|f| &f.name)
            .chain(decl.methods.iter().map(|m| &m.name));
        for name in names {
            if let Some(previous) = members.insert(&name.name, name.span) {
                return Err(ResolveError::DuplicateDeclaration {
                    name: name.name.clone(),
                    span: name.span,
                    previous,
                });
            }
        }

        if let Some(ctor) = &decl.constructor {
            self.resolve_function(ctor)?;
        }
        for method in &decl.methods {
            self.resolve_function(method)?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════

    fn resolve_expr(&mut self, expr: &Expr, use_: Use) -> Result<(), ResolveError> {
        ensure_sufficient_stack(|| self.resolve_expr_inner(expr, use_))
    }

    fn resolve_expr_inner(&mut self, expr: &Expr, use_: Use) -> Result<(), ResolveError> {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Ident(ident) => {
                self.read(&ident.name, ident.span, use_ == Use::Move)?;
            }
            Expr::This(span) => {
                self.read("this", *span, false)?;
            }
            Expr::Binary { lhs, rhs, .. } => {
                self.resolve_expr(lhs, Use::Move)?;
                self.resolve_expr(rhs, Use::Move)?;
            }
            Expr::Unary { operand, .. } => self.resolve_expr(operand, Use::Move)?,
            Expr::Copy { place, .. } => {
                self.read_root(&place.root)?;
                self.resolve_path(&place.path)?;
            }
            Expr::Call { callee, args, span } => {
                if let Expr::Field { object, field, .. } = callee.as_ref() {
                    self.resolve_expr(object, Use::Place)?;
                    if self.mutating_methods.contains(&field.name) {
                        if let Some((name, root_span)) = place_root(object) {
                            let id = self.read(name, root_span, false)?;
                            self.check_mutate(id, *span)?;
                        }
                    }
                } else {
                    self.resolve_expr(callee, Use::Place)?;
                }
                for arg in args {
                    self.resolve_expr(arg, Use::Move)?;
                }
            }
            Expr::Field { object, .. } => self.resolve_expr(object, Use::Place)?,
            Expr::Index { object, index, .. } => {
                self.resolve_expr(object, Use::Place)?;
                self.resolve_expr(index, Use::Move)?;
            }
            Expr::List { items, .. } => {
                for item in items {
                    self.resolve_expr(item, Use::Move)?;
                }
            }
            Expr::Object { fields, .. } => {
                let mut seen: HashMap<&str, Span> = HashMap::new();
                for (name, value) in fields {
                    if let Some(previous) = seen.insert(&name.name, name.span) {
                        return Err(ResolveError::DuplicateDeclaration {
                            name: name.name.clone(),
                            span: name.span,
                            previous,
                        });
                    }
                    self.resolve_expr(value, Use::Move)?;
                }
            }
        }
        Ok(())
    }

    /// Resolve the index expressions along a place path.
    fn resolve_path(&mut self, path: &[PathSegment]) -> Result<(), ResolveError> {
        for segment in path {
            if let PathSegment::Index { index, .. } = segment {
                self.resolve_expr(index, Use::Move)?;
            }
        }
        Ok(())
    }
}

/// The variable (or `this`) a field or index chain starts from, if any.
fn place_root(expr: &Expr) -> Option<(&str, Span)> {
    match expr {
        Expr::Ident(ident) => Some((&ident.name, ident.span)),
        Expr::This(span) => Some(("this", *span)),
        Expr::Field { object, .. } | Expr::Index { object, .. } => place_root(object),
        _ => None,
    }
}
