//! Method dispatch, instantiation and destruction

use super::{Context, Interpreter};
use crate::ast::{Expr, Span};
use crate::ident::normalize;
use crate::registry::{MethodOwner, MethodRef};
use crate::runtime::{ClassId, EvalResult, ObjectInstance, ObjectRef, RuntimeError, Value};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

impl Interpreter {
    // ========================================================================
    // Calls
    // ========================================================================

    /// Call a resolved method
    ///
    /// `receiver` is the instance for instance methods, a class or record
    /// type value for static methods, or `None` for free functions. Record
    /// methods run on a copy; use the member-access path to observe the
    /// mutated copy.
    pub fn call_method(
        &mut self,
        receiver: Option<&Value>,
        method: &MethodRef,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        if method.decl.flags.is_abstract && !method.has_body() {
            return Err(RuntimeError::semantic(
                format!("cannot call abstract method '{}'", self.qualified_name(method)),
                span,
            ));
        }
        match method.owner {
            MethodOwner::Class(owner) => {
                let this = receiver.cloned();
                self.invoke_body(
                    method,
                    args,
                    Context::class(owner),
                    span,
                    |_, scope| {
                        if let Some(this) = this {
                            scope.define("Self", this);
                        }
                        Ok(())
                    },
                    |_, _| Ok(()),
                )
                .map(|(value, _)| value)
            }
            MethodOwner::Record(record) => match receiver {
                Some(Value::Record(rec)) => self
                    .call_record_method(rec.clone(), method, args, span)
                    .map(|(value, _)| value),
                _ => self.call_static_record_method(record, method, args, span),
            },
            MethodOwner::Helper(helper) => {
                let this = receiver.cloned().unwrap_or_default();
                self.invoke_helper_method(helper, method, this, args, span)
            }
            MethodOwner::Global => self
                .invoke_body(method, args, Context::default(), span, |_, _| Ok(()), |_, _| Ok(()))
                .map(|(value, _)| value),
        }
    }

    /// Overload-resolve and dynamically dispatch a method on a class
    ///
    /// Instance methods are searched first unless `class_only` is set.
    /// Returns `None` when no method of that name exists.
    pub(crate) fn dispatch(
        &mut self,
        class: ClassId,
        receiver: &Value,
        key: &str,
        args: Vec<Value>,
        class_only: bool,
        span: Span,
    ) -> EvalResult<Option<Value>> {
        let mut overloads = if class_only {
            Vec::new()
        } else {
            self.registry.collect_overloads(class, key, false)
        };
        overloads.extend(self.registry.collect_overloads(class, key, true));
        if overloads.is_empty() {
            return Ok(None);
        }
        let method = self.select_overload(&overloads, &args).ok_or_else(|| {
            RuntimeError::resolution(
                format!(
                    "no overload of '{}.{}' accepts {} argument(s)",
                    self.registry.class(class).name,
                    overloads[0].name(),
                    args.len()
                ),
                span,
            )
        })?;
        let target = self.registry.virtual_target(class, &method);
        let receiver = if target.is_class_method() {
            Value::Class(class)
        } else {
            receiver.clone()
        };
        self.call_method(Some(&receiver), &target, args, span).map(Some)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Whether a class is abstract, explicitly or through an abstract method
    pub fn is_abstract_class(&self, id: ClassId) -> bool {
        let class = self.registry.class(id);
        class.flags.is_abstract
            || class
                .vmt
                .values()
                .any(|m| m.decl.flags.is_abstract && !m.has_body())
    }

    /// Create an instance through a named constructor
    #[tracing::instrument(level = "trace", skip(self, args))]
    pub fn instantiate(
        &mut self,
        class: ClassId,
        constructor: &str,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        let info = self.registry.class(class);
        if self.is_abstract_class(class) {
            return Err(RuntimeError::semantic(
                format!("cannot instantiate abstract class '{}'", info.name),
                span,
            ));
        }
        let key = normalize(constructor);
        let overloads = self.registry.collect_constructors(class, &key);
        if overloads.is_empty() {
            return Err(RuntimeError::resolution(
                format!("constructor '{}' not found in class '{}'", constructor, info.name),
                span,
            ));
        }
        let ctor = self.select_overload(&overloads, &args).ok_or_else(|| {
            RuntimeError::resolution(
                format!(
                    "no constructor '{}.{}' accepts {} argument(s)",
                    self.registry.class(class).name,
                    constructor,
                    args.len()
                ),
                span,
            )
        })?;

        let object = self.new_object(class)?;
        self.run_constructor(&object, &ctor, args, span)?;
        Ok(Value::Object(object))
    }

    /// Allocate an instance with every field initialized
    pub(crate) fn new_object(&mut self, class: ClassId) -> EvalResult<ObjectRef> {
        let info = self.registry.class(class);
        let layout: Vec<_> = info
            .field_order
            .iter()
            .filter_map(|key| info.fields.get(key).map(|f| (key.clone(), f.clone())))
            .collect();
        let mut fields = FxHashMap::default();
        for (key, field) in layout {
            let value = match &field.init {
                Some(init) => {
                    let value = self.eval_isolated(Context::class(class), init)?;
                    self.coerce(value, &field.ty, init.span())?
                }
                None => self.zero_value(&field.ty)?,
            };
            fields.insert(key, value);
        }
        Ok(Rc::new(RefCell::new(ObjectInstance::new(class, fields))))
    }

    /// Run a constructor body on an already allocated instance
    pub(crate) fn run_constructor(
        &mut self,
        object: &ObjectRef,
        ctor: &MethodRef,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<()> {
        if !ctor.has_body() {
            if !ctor.decl.params.is_empty() && args.len() != ctor.decl.params.len() {
                return Err(RuntimeError::resolution(
                    format!(
                        "wrong number of arguments for '{}': expected {}, got {}",
                        ctor.name(),
                        ctor.decl.params.len(),
                        args.len()
                    ),
                    span,
                ));
            }
            return Ok(());
        }
        self.call_method(Some(&Value::Object(object.clone())), ctor, args, span)
            .map(|_| ())
    }

    /// Run the destructor once and mark the instance destroyed
    pub fn destroy(&mut self, object: &ObjectRef, span: Span) -> EvalResult<()> {
        let class = {
            let instance = object.borrow();
            if instance.destroyed {
                return Err(RuntimeError::runtime("object already destroyed", span));
            }
            instance.class
        };
        if let Some(dtor) = self.registry.class(class).destructor.clone() {
            let target = self.registry.virtual_target(class, &dtor);
            if target.has_body() {
                self.call_method(Some(&Value::Object(object.clone())), &target, Vec::new(), span)?;
            }
        }
        object.borrow_mut().destroyed = true;
        tracing::trace!(class = %self.registry.class(class).name, "destroyed instance");
        Ok(())
    }

    // ========================================================================
    // inherited
    // ========================================================================

    /// Evaluate `inherited` or `inherited Name(args)`
    ///
    /// The parent's implementation is bound statically. Bare `inherited`
    /// forwards the running method's arguments and is a no-op when the
    /// parent has nothing to run.
    pub(crate) fn eval_inherited(
        &mut self,
        name: Option<&str>,
        args: &[Expr],
        span: Span,
    ) -> EvalResult<Value> {
        let context = self.current_context().cloned().unwrap_or_default();
        let Some(method) = context.method.clone() else {
            return Err(RuntimeError::semantic(
                "'inherited' used outside of a method",
                span,
            ));
        };
        let MethodOwner::Class(owner) = method.owner else {
            return Err(RuntimeError::semantic(
                "'inherited' is only valid in class methods",
                span,
            ));
        };
        let Some(parent) = self.registry.class(owner).parent else {
            return Err(RuntimeError::resolution(
                format!("class '{}' has no parent", self.registry.class(owner).name),
                span,
            ));
        };

        let bare = name.is_none();
        let target_name = name.unwrap_or(method.name()).to_string();
        let key = normalize(&target_name);
        let args = if bare {
            context.args.clone()
        } else {
            args.iter()
                .map(|arg| self.eval_expr(arg))
                .collect::<EvalResult<Vec<_>>>()?
        };
        let this = self.env.get("Self").unwrap_or_default();

        let candidates = if method.decl.flags.is_constructor || self.registry.has_constructor(parent, &key) {
            self.registry.collect_constructors(parent, &key)
        } else if method.decl.flags.is_destructor && bare {
            self.registry.class(parent).destructor.iter().cloned().collect()
        } else {
            let mut list = self.registry.collect_overloads(parent, &key, false);
            list.extend(self.registry.collect_overloads(parent, &key, true));
            list
        };

        let Some(target) = self.select_overload(&candidates, &args) else {
            if bare {
                return Ok(Value::Nil);
            }
            return Err(RuntimeError::resolution(
                format!(
                    "method '{}' not found in parent class '{}'",
                    target_name,
                    self.registry.class(parent).name
                ),
                span,
            ));
        };
        if !target.has_body()
            && (bare || target.decl.flags.is_constructor || target.decl.flags.is_destructor)
        {
            return Ok(Value::Nil);
        }
        let receiver = if target.is_class_method() {
            match &this {
                Value::Object(obj) => Value::Class(obj.borrow().class),
                other => other.clone(),
            }
        } else {
            this
        };
        self.call_method(Some(&receiver), &target, args, span)
    }
}
