//! Interpreter: declaration builder, dispatch and the evaluator
//!
//! The interpreter owns the type registry, the global scope and the call
//! stack. Submodules add behaviour to [`Interpreter`] by topic:
//!
//! - `declare`: declaration builder and inheritance merge
//! - `vmt`: virtual method tables and late implementation propagation
//! - `invoke`: the shared invocation protocol (scope, `Self`, `Result`)
//! - `methods`: instance, class and constructor dispatch
//! - `members`: member reads, writes and class constants
//! - `property`: property access protocol
//! - `records`: record value semantics
//! - `helpers`: helper resolution
//! - `operators`: operator overloads and conversions
//! - `eval`: expressions and statements
//! - `builtins`: intrinsic helpers and the built-in function library

pub mod builtins;
mod declare;
mod eval;
mod helpers;
mod invoke;
mod members;
mod methods;
mod operators;
mod property;
mod records;
mod vmt;

pub use builtins::{BuiltinLibrary, DefaultBuiltins};
pub use property::PropertyReceiver;

use crate::ast::{Declaration, Expr, FunctionDecl, Item, Program, Stmt};
use crate::ident::normalize;
use crate::registry::{MethodRef, TypeEntry, TypeRegistry};
use crate::runtime::{
    CallStack, ClassId, EngineOptions, Environment, EvalResult, HelperId, RecordId, Value,
};
use property::PropertyKey;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Name-resolution context of the code currently running
#[derive(Debug, Clone, Default)]
pub(crate) struct Context {
    /// Running method, `None` for initializers and property expressions
    pub method: Option<MethodRef>,
    /// Class whose class variables and constants are visible unqualified
    pub class: Option<ClassId>,
    /// Record whose constants, class variables and static methods are visible
    pub record: Option<RecordId>,
    /// Helper whose class variables and constants are visible
    pub helper: Option<HelperId>,
    /// Arguments of the running method, forwarded by bare `inherited`
    pub args: Vec<Value>,
}

impl Context {
    pub(crate) fn class(class: ClassId) -> Self {
        Self {
            class: Some(class),
            ..Default::default()
        }
    }

    pub(crate) fn record(record: RecordId) -> Self {
        Self {
            record: Some(record),
            ..Default::default()
        }
    }
}

/// Control flow signal returned by statement execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Normal,
    Exit,
}

/// The object model runtime
pub struct Interpreter {
    pub(crate) registry: TypeRegistry,
    pub(crate) globals: Environment,
    pub(crate) env: Environment,
    pub(crate) functions: FxHashMap<String, Vec<Rc<FunctionDecl>>>,
    pub(crate) call_stack: CallStack,
    pub(crate) contexts: Vec<Context>,
    pub(crate) property_chain: Vec<PropertyKey>,
    pub(crate) constant_guard: Vec<(ClassId, String)>,
    pub(crate) enclosing_class: Option<ClassId>,
    pub(crate) options: EngineOptions,
    pub(crate) builtins: Box<dyn BuiltinLibrary>,
}

impl Interpreter {
    /// Interpreter with default options and the default built-in library
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Interpreter with custom options
    pub fn with_options(options: EngineOptions) -> Self {
        Self::with_builtins(options, Box::new(DefaultBuiltins::new()))
    }

    /// Interpreter with custom options and a host-provided built-in library
    pub fn with_builtins(options: EngineOptions, builtins: Box<dyn BuiltinLibrary>) -> Self {
        let globals = Environment::new();
        let mut interp = Self {
            registry: TypeRegistry::new(),
            env: globals.clone(),
            globals,
            functions: FxHashMap::default(),
            call_stack: CallStack::new(options.max_recursion_depth),
            contexts: Vec::new(),
            property_chain: Vec::new(),
            constant_guard: Vec::new(),
            enclosing_class: None,
            options,
            builtins,
        };
        interp.bootstrap();
        interp
    }

    fn bootstrap(&mut self) {
        if self.options.implicit_tobject {
            if let Err(err) = self.declare_root_class() {
                tracing::debug!(error = %err, "failed to declare TObject");
            }
        }
        if self.options.intrinsic_helpers {
            builtins::register_intrinsic_helpers(&mut self.registry);
        }
    }

    // ========================================================================
    // Program execution
    // ========================================================================

    /// Run every item of a program in order
    pub fn run(&mut self, program: &Program) -> EvalResult<Value> {
        for item in &program.items {
            match item {
                Item::Decl(decl) => {
                    self.eval_declaration(decl)?;
                }
                Item::Stmt(stmt) => {
                    if self.exec_stmt(stmt)? == Flow::Exit {
                        break;
                    }
                }
            }
        }
        Ok(Value::Nil)
    }

    /// Evaluate one declaration
    pub fn eval_declaration(&mut self, decl: &Declaration) -> EvalResult<Value> {
        match decl {
            Declaration::Class(class) => self.declare_class(class).map(|_| Value::Nil),
            Declaration::Record(record) => self.declare_record(record).map(|_| Value::Nil),
            Declaration::Interface(iface) => self.declare_interface(iface).map(|_| Value::Nil),
            Declaration::Helper(helper) => self.declare_helper(helper).map(|_| Value::Nil),
            Declaration::Operator(op) => self.declare_operator(op),
            Declaration::Enum(decl) => self.declare_enum(decl).map(|_| Value::Nil),
            Declaration::ArrayType(decl) => self.declare_array_type(decl),
            Declaration::Subrange(decl) => self.declare_subrange(decl),
            Declaration::TypeAlias(decl) => self.declare_type_alias(decl),
            Declaration::Function(decl) => self.declare_function(decl),
        }
    }

    /// Evaluate an expression in the current scope
    pub fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.eval_expr(expr)
    }

    /// Execute a statement in the current scope
    pub fn exec(&mut self, stmt: &Stmt) -> EvalResult<()> {
        self.exec_stmt(stmt).map(|_| ())
    }

    // ========================================================================
    // Host access
    // ========================================================================

    /// The type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Active options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Read a global variable
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    /// Define or overwrite a global variable
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.define(name, value);
    }

    /// Case-insensitive type lookup
    pub fn lookup_type(&self, name: &str) -> Option<TypeEntry> {
        self.registry.lookup_type(name)
    }

    /// Current call depth
    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }

    /// Whether a global function with this name is declared
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&normalize(name))
    }

    /// Render a value for display, using declared type names
    pub fn display(&self, value: &Value) -> String {
        match value {
            Value::Object(obj) => {
                let class = obj.borrow().class;
                format!("{} instance", self.registry.class(class).name)
            }
            Value::Class(id) => self.registry.class(*id).name.clone(),
            Value::Record(rec) => {
                let info = self.registry.record(rec.record);
                let fields = info
                    .field_order
                    .iter()
                    .filter_map(|key| {
                        let field = info.fields.get(key)?;
                        let value = rec.fields.get(key)?;
                        Some(format!("{}: {}", field.name, self.display(value)))
                    })
                    .collect::<Vec<_>>();
                format!("({})", fields.join("; "))
            }
            Value::RecordType(id) => self.registry.record(*id).name.clone(),
            Value::EnumType(id) => self.registry.enum_info(*id).name.clone(),
            Value::Enum(e) => self
                .registry
                .enum_info(e.enum_id)
                .name_of(e.ordinal)
                .map(str::to_string)
                .unwrap_or_else(|| e.ordinal.to_string()),
            other => other.to_string(),
        }
    }

    pub(crate) fn current_context(&self) -> Option<&Context> {
        self.contexts.last()
    }

    pub(crate) fn with_context<T>(
        &mut self,
        context: Context,
        f: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        self.contexts.push(context);
        let result = f(self);
        self.contexts.pop();
        result
    }

    /// Evaluate an expression in a fresh scope under `context`
    pub(crate) fn eval_isolated(&mut self, context: Context, expr: &Expr) -> EvalResult<Value> {
        let scope = Environment::enclosed(&self.globals);
        let saved = std::mem::replace(&mut self.env, scope);
        let result = self.with_context(context, |interp| interp.eval_expr(expr));
        self.env = saved;
        result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
