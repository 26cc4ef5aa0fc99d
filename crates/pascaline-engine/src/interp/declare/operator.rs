//! Operator and conversion declarations

use crate::ast::{OperatorDecl, OperatorKind, Span, TypeExpr};
use crate::ident::{normalize, normalize_type_name};
use crate::interp::Interpreter;
use crate::registry::{OperatorEntry, OperatorError};
use crate::runtime::{ClassId, EvalResult, RuntimeError, Value};

fn operator_error(err: OperatorError, span: Span) -> RuntimeError {
    RuntimeError::declaration(err.to_string(), span)
}

impl Interpreter {
    /// Declare a global operator or a conversion
    pub fn declare_operator(&mut self, decl: &OperatorDecl) -> EvalResult<Value> {
        match decl.kind {
            OperatorKind::Global => {
                let operands = self.operand_type_names(&decl.operand_types, decl.span)?;
                if !self.has_function(&decl.binding) {
                    return Err(RuntimeError::declaration(
                        format!(
                            "operator '{}' is bound to unknown function '{}'",
                            decl.symbol, decl.binding
                        ),
                        decl.span,
                    ));
                }
                let entry = OperatorEntry::global(&decl.symbol, &operands, &decl.binding);
                self.registry
                    .global_operators
                    .register(entry)
                    .map_err(|err| operator_error(err, decl.span))?;
                tracing::debug!(
                    symbol = %decl.symbol,
                    operands = %operands.join(", "),
                    binding = %decl.binding,
                    "registered global operator"
                );
            }
            OperatorKind::Implicit | OperatorKind::Explicit => {
                let [from] = decl.operand_types.as_slice() else {
                    return Err(RuntimeError::declaration(
                        "conversion operator takes exactly one operand type",
                        decl.span,
                    ));
                };
                let Some(to) = &decl.return_type else {
                    return Err(RuntimeError::declaration(
                        "conversion operator needs a result type",
                        decl.span,
                    ));
                };
                let from = self.operand_type_name(from, decl.span)?;
                let to = self.operand_type_name(to, decl.span)?;
                let implicit = decl.kind == OperatorKind::Implicit;
                self.registry
                    .conversions
                    .register(&from, &to, &decl.binding, implicit)
                    .map_err(|err| operator_error(err, decl.span))?;
                tracing::debug!(%from, %to, implicit, binding = %decl.binding, "registered conversion");
            }
            OperatorKind::Class => {
                return Err(RuntimeError::declaration(
                    format!(
                        "class operator '{}' must be declared inside a class",
                        decl.symbol
                    ),
                    decl.span,
                ))
            }
        }
        Ok(Value::Nil)
    }

    /// Register a class operator in the class's own table
    ///
    /// The class type is added to the signature when it is not already one
    /// of the operands: first for ordinary operators, last for `in`. A later
    /// declaration with the same signature replaces the inherited entry.
    pub(crate) fn declare_class_operator(&mut self, class: ClassId, decl: &OperatorDecl) -> EvalResult<()> {
        let class_name = normalize_type_name(&self.registry.class(class).name);
        let symbol = decl.symbol.to_ascii_lowercase();
        let mut operands = self.operand_type_names(&decl.operand_types, decl.span)?;
        if !operands.contains(&class_name) {
            if symbol == "in" {
                operands.push(class_name.clone());
            } else {
                operands.insert(0, class_name.clone());
            }
        }

        let key = normalize(&decl.binding);
        let instance = self.registry.collect_overloads(class, &key, false);
        let statics = self.registry.collect_overloads(class, &key, true);
        let is_class_method = match (instance.is_empty(), statics.is_empty()) {
            (false, _) => false,
            (true, false) => true,
            (true, true) => {
                return Err(RuntimeError::declaration(
                    format!(
                        "operator '{}' is bound to unknown method '{}.{}'",
                        decl.symbol,
                        self.registry.class(class).name,
                        decl.binding
                    ),
                    decl.span,
                ))
            }
        };
        let self_index = if is_class_method {
            None
        } else {
            operands.iter().position(|t| *t == class_name)
        };

        let entry = OperatorEntry {
            symbol: symbol.clone(),
            operand_types: operands.clone(),
            binding: decl.binding.clone(),
            class: Some(class),
            self_index,
            is_class_method,
        };
        let table = &mut self.registry.class_mut(class).operators;
        table.remove(&symbol, &operands);
        table
            .register(entry)
            .map_err(|err| operator_error(err, decl.span))?;
        tracing::debug!(
            class = %self.registry.class(class).name,
            symbol = %symbol,
            operands = %operands.join(", "),
            "registered class operator"
        );
        Ok(())
    }

    fn operand_type_names(&self, types: &[TypeExpr], span: Span) -> EvalResult<Vec<String>> {
        types
            .iter()
            .map(|ty| self.operand_type_name(ty, span))
            .collect()
    }

    /// Normalized name of a resolved operand type, aliases followed
    fn operand_type_name(&self, ty: &TypeExpr, span: Span) -> EvalResult<String> {
        let resolved = self.resolve_type_expr(ty, span)?;
        Ok(normalize_type_name(&self.registry.type_name(&resolved)))
    }
}
