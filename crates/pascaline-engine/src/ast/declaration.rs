//! Declaration nodes
//!
//! Each declaration node has a chainable constructor API so hosts and tests
//! can assemble programs without a parser:
//!
//! ```ignore
//! let class = ClassDecl::new("TPoint")
//!     .field(FieldDecl::new("X", TypeExpr::named("Integer")))
//!     .method(FunctionDecl::function("Sum", TypeExpr::named("Integer")));
//! ```

use super::{Expr, Span, Stmt, TypeExpr};

// ============================================================================
// Functions and methods
// ============================================================================

/// Formal parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Declared type; untyped parameters accept any value
    pub ty: Option<TypeExpr>,
}

impl Param {
    /// Typed parameter
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
        }
    }

    /// Untyped parameter
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
        }
    }
}

/// Method modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodFlags {
    /// `class procedure` / `class function` / `static`
    pub is_class_method: bool,
    /// `constructor`
    pub is_constructor: bool,
    /// `destructor`
    pub is_destructor: bool,
    /// `virtual`
    pub is_virtual: bool,
    /// `override`
    pub is_override: bool,
    /// `abstract`
    pub is_abstract: bool,
    /// `overload`
    pub is_overload: bool,
}

/// Function, procedure, method, constructor or destructor
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// Function name
    pub name: String,
    /// Owning type for out-of-line implementations (`TFoo.Bar`)
    pub owner: Option<String>,
    /// Formal parameters
    pub params: Vec<Param>,
    /// Return type (`None` for procedures)
    pub return_type: Option<TypeExpr>,
    /// Body, `None` for declarations that only state the signature
    pub body: Option<Vec<Stmt>>,
    /// Modifiers
    pub flags: MethodFlags,
    /// Location
    pub span: Span,
}

impl FunctionDecl {
    /// A procedure (no return type)
    pub fn procedure(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            params: Vec::new(),
            return_type: None,
            body: None,
            flags: MethodFlags::default(),
            span: Span::default(),
        }
    }

    /// A function returning `ty`
    pub fn function(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            return_type: Some(ty),
            ..Self::procedure(name)
        }
    }

    /// A constructor
    pub fn constructor(name: impl Into<String>) -> Self {
        let mut decl = Self::procedure(name);
        decl.flags.is_constructor = true;
        decl
    }

    /// A destructor
    pub fn destructor(name: impl Into<String>) -> Self {
        let mut decl = Self::procedure(name);
        decl.flags.is_destructor = true;
        decl
    }

    /// Mark as an out-of-line implementation belonging to `owner`
    pub fn of(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Append a parameter
    pub fn param(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    /// Set the body
    pub fn body(mut self, stmts: Vec<Stmt>) -> Self {
        self.body = Some(stmts);
        self
    }

    /// `class` method
    pub fn class_method(mut self) -> Self {
        self.flags.is_class_method = true;
        self
    }

    /// `virtual`
    pub fn virtual_(mut self) -> Self {
        self.flags.is_virtual = true;
        self
    }

    /// `override`
    pub fn override_(mut self) -> Self {
        self.flags.is_override = true;
        self
    }

    /// `virtual; abstract`
    pub fn abstract_(mut self) -> Self {
        self.flags.is_virtual = true;
        self.flags.is_abstract = true;
        self
    }

    /// `overload`
    pub fn overload(mut self) -> Self {
        self.flags.is_overload = true;
        self
    }

    /// Attach a source position
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.span = Span::new(line, column);
        self
    }

    /// Whether a body is attached
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Normalized parameter type signature, e.g. `integer,string`
    pub fn signature(&self) -> String {
        self.params
            .iter()
            .map(|p| {
                p.ty.as_ref()
                    .map(|t| t.display_name().to_ascii_lowercase())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether both declarations have the same parameter types in the same order
    pub fn params_match(&self, other: &FunctionDecl) -> bool {
        self.params.len() == other.params.len() && self.signature() == other.signature()
    }
}

// ============================================================================
// Members
// ============================================================================

/// Instance field or class variable
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: Option<TypeExpr>,
    /// Initializer
    pub init: Option<Expr>,
    /// `class var`
    pub is_class_var: bool,
    /// Location
    pub span: Span,
}

impl FieldDecl {
    /// Typed instance field
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            init: None,
            is_class_var: false,
            span: Span::default(),
        }
    }

    /// Field whose type is inferred from its initializer
    pub fn inferred(name: impl Into<String>, init: Expr) -> Self {
        Self {
            name: name.into(),
            ty: None,
            init: Some(init),
            is_class_var: false,
            span: Span::default(),
        }
    }

    /// Set the initializer
    pub fn init(mut self, expr: Expr) -> Self {
        self.init = Some(expr);
        self
    }

    /// Turn into a `class var`
    pub fn class_var(mut self) -> Self {
        self.is_class_var = true;
        self
    }
}

/// `const Name = Value;`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    /// Constant name
    pub name: String,
    /// Optional declared type
    pub ty: Option<TypeExpr>,
    /// Value expression
    pub value: Expr,
    /// Location
    pub span: Span,
}

impl ConstDecl {
    /// Untyped constant
    pub fn new(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: name.into(),
            ty: None,
            value,
            span: Span::default(),
        }
    }
}

/// `property Name[params]: Type read R write W; default;`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    /// Property name
    pub name: String,
    /// Declared type
    pub ty: TypeExpr,
    /// Index parameters (non-empty for indexed properties)
    pub index_params: Vec<Param>,
    /// Read specifier: an identifier naming a field/method, or an expression
    pub read: Option<Expr>,
    /// Write specifier: an identifier naming a field/method
    pub write: Option<Expr>,
    /// `index N` directive, passed as an implicit leading argument
    pub index_value: Option<Expr>,
    /// `default` marker
    pub is_default: bool,
    /// `class property`
    pub is_class_property: bool,
    /// Location
    pub span: Span,
}

impl PropertyDecl {
    /// Property with no accessors yet
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            index_params: Vec::new(),
            read: None,
            write: None,
            index_value: None,
            is_default: false,
            is_class_property: false,
            span: Span::default(),
        }
    }

    /// `read Name`
    pub fn read(mut self, name: impl Into<String>) -> Self {
        self.read = Some(Expr::Ident(name.into(), Span::default()));
        self
    }

    /// `read (expr)`
    pub fn read_expr(mut self, expr: Expr) -> Self {
        self.read = Some(expr);
        self
    }

    /// `write Name`
    pub fn write(mut self, name: impl Into<String>) -> Self {
        self.write = Some(Expr::Ident(name.into(), Span::default()));
        self
    }

    /// Add an index parameter
    pub fn index_param(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.index_params.push(Param::new(name, ty));
        self
    }

    /// `index N`
    pub fn index(mut self, value: Expr) -> Self {
        self.index_value = Some(value);
        self
    }

    /// `default`
    pub fn default_(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// `class property`
    pub fn class_property(mut self) -> Self {
        self.is_class_property = true;
        self
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Where an operator declaration lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// `operator + (A, B): C uses Fn;` at top level
    Global,
    /// `class operator` inside a class body
    Class,
    /// `operator implicit (A): B uses Fn;`
    Implicit,
    /// `operator explicit (A): B uses Fn;`
    Explicit,
}

/// Operator overload declaration
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDecl {
    /// Placement
    pub kind: OperatorKind,
    /// Operator symbol (`+`, `=`, `in`, `not`, ...), ignored for conversions
    pub symbol: String,
    /// Declared operand types in order
    pub operand_types: Vec<TypeExpr>,
    /// Result type
    pub return_type: Option<TypeExpr>,
    /// Name of the function or method implementing the operator
    pub binding: String,
    /// Location
    pub span: Span,
}

impl OperatorDecl {
    /// Global operator bound to a free function
    pub fn global(symbol: impl Into<String>, operands: Vec<TypeExpr>, binding: impl Into<String>) -> Self {
        Self {
            kind: OperatorKind::Global,
            symbol: symbol.into(),
            operand_types: operands,
            return_type: None,
            binding: binding.into(),
            span: Span::default(),
        }
    }

    /// Class operator bound to a method of the enclosing class
    pub fn class(symbol: impl Into<String>, operands: Vec<TypeExpr>, binding: impl Into<String>) -> Self {
        Self {
            kind: OperatorKind::Class,
            ..Self::global(symbol, operands, binding)
        }
    }

    /// Conversion operator from `from` to `to`
    pub fn conversion(implicit: bool, from: TypeExpr, to: TypeExpr, binding: impl Into<String>) -> Self {
        Self {
            kind: if implicit {
                OperatorKind::Implicit
            } else {
                OperatorKind::Explicit
            },
            symbol: if implicit { "implicit" } else { "explicit" }.to_string(),
            operand_types: vec![from],
            return_type: Some(to),
            binding: binding.into(),
            span: Span::default(),
        }
    }

    /// Set the result type
    pub fn returns(mut self, ty: TypeExpr) -> Self {
        self.return_type = Some(ty);
        self
    }
}

// ============================================================================
// Type declarations
// ============================================================================

/// `type TFoo = class(TParent, IBar) .. end;`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassDecl {
    /// Class name
    pub name: String,
    /// Explicit parent class
    pub parent: Option<String>,
    /// Implemented interfaces
    pub interfaces: Vec<String>,
    /// Fields and class variables
    pub fields: Vec<FieldDecl>,
    /// Methods, constructors, destructors
    pub methods: Vec<FunctionDecl>,
    /// Properties
    pub properties: Vec<PropertyDecl>,
    /// Class constants
    pub constants: Vec<ConstDecl>,
    /// Class operators
    pub operators: Vec<OperatorDecl>,
    /// Nested class declarations
    pub nested: Vec<ClassDecl>,
    /// `abstract`
    pub is_abstract: bool,
    /// `external` (bound to a host class, no implicit `TObject` parent)
    pub is_external: bool,
    /// `partial`
    pub is_partial: bool,
    /// Location
    pub span: Span,
}

impl ClassDecl {
    /// Empty class declaration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the parent class
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    /// Add a field
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a method
    pub fn method(mut self, method: FunctionDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a property
    pub fn property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a constant
    pub fn constant(mut self, constant: ConstDecl) -> Self {
        self.constants.push(constant);
        self
    }

    /// Add a class operator
    pub fn operator(mut self, operator: OperatorDecl) -> Self {
        self.operators.push(operator);
        self
    }

    /// Add a nested class
    pub fn nested(mut self, class: ClassDecl) -> Self {
        self.nested.push(class);
        self
    }

    /// `abstract`
    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// `partial`
    pub fn partial(mut self) -> Self {
        self.is_partial = true;
        self
    }

    /// `external`
    pub fn external(mut self) -> Self {
        self.is_external = true;
        self
    }
}

/// `type TPoint = record .. end;`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordDecl {
    /// Record name
    pub name: String,
    /// Fields and class variables
    pub fields: Vec<FieldDecl>,
    /// Instance and static methods
    pub methods: Vec<FunctionDecl>,
    /// Properties
    pub properties: Vec<PropertyDecl>,
    /// Constants
    pub constants: Vec<ConstDecl>,
    /// Location
    pub span: Span,
}

impl RecordDecl {
    /// Empty record declaration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a field
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a method
    pub fn method(mut self, method: FunctionDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a property
    pub fn property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a constant
    pub fn constant(mut self, constant: ConstDecl) -> Self {
        self.constants.push(constant);
        self
    }
}

/// `type IFoo = interface(IParent) .. end;`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterfaceDecl {
    /// Interface name
    pub name: String,
    /// Parent interface
    pub parent: Option<String>,
    /// Method signatures
    pub methods: Vec<FunctionDecl>,
    /// Properties
    pub properties: Vec<PropertyDecl>,
    /// Location
    pub span: Span,
}

impl InterfaceDecl {
    /// Empty interface declaration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the parent interface
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// Add a method signature
    pub fn method(mut self, method: FunctionDecl) -> Self {
        self.methods.push(method);
        self
    }
}

/// `type TFooHelper = helper(TParentHelper) for T .. end;`
#[derive(Debug, Clone, PartialEq)]
pub struct HelperDecl {
    /// Helper name
    pub name: String,
    /// Extended type
    pub for_type: TypeExpr,
    /// Parent helper
    pub parent: Option<String>,
    /// `record helper`
    pub is_record_helper: bool,
    /// Methods
    pub methods: Vec<FunctionDecl>,
    /// Properties
    pub properties: Vec<PropertyDecl>,
    /// Class variables
    pub class_vars: Vec<FieldDecl>,
    /// Class constants
    pub constants: Vec<ConstDecl>,
    /// Location
    pub span: Span,
}

impl HelperDecl {
    /// Empty helper for `for_type`
    pub fn new(name: impl Into<String>, for_type: TypeExpr) -> Self {
        Self {
            name: name.into(),
            for_type,
            parent: None,
            is_record_helper: false,
            methods: Vec::new(),
            properties: Vec::new(),
            class_vars: Vec::new(),
            constants: Vec::new(),
            span: Span::default(),
        }
    }

    /// Set the parent helper
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// Add a method
    pub fn method(mut self, method: FunctionDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a property
    pub fn property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a class variable
    pub fn class_var(mut self, field: FieldDecl) -> Self {
        self.class_vars.push(field.class_var());
        self
    }

    /// Add a constant
    pub fn constant(mut self, constant: ConstDecl) -> Self {
        self.constants.push(constant);
        self
    }
}

/// Enumeration member
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// Member name
    pub name: String,
    /// Explicit ordinal
    pub value: Option<i64>,
}

/// `type TColor = (Red, Green, Blue);`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    /// Enum name
    pub name: String,
    /// Members in declaration order
    pub members: Vec<EnumMember>,
    /// Location
    pub span: Span,
}

impl EnumDecl {
    /// Enum with implicit ordinals
    pub fn new(name: impl Into<String>, members: &[&str]) -> Self {
        Self {
            name: name.into(),
            members: members
                .iter()
                .map(|m| EnumMember {
                    name: (*m).to_string(),
                    value: None,
                })
                .collect(),
            span: Span::default(),
        }
    }
}

/// `type TNames = array of String;`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayTypeDecl {
    /// Type name
    pub name: String,
    /// Array shape
    pub ty: TypeExpr,
    /// Location
    pub span: Span,
}

/// `type TDigit = 0..9;`
#[derive(Debug, Clone, PartialEq)]
pub struct SubrangeDecl {
    /// Type name
    pub name: String,
    /// Lower bound
    pub low: i64,
    /// Upper bound
    pub high: i64,
    /// Location
    pub span: Span,
}

/// `type TName = String;`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl {
    /// Alias name
    pub name: String,
    /// Aliased type
    pub target: TypeExpr,
    /// Location
    pub span: Span,
}

/// Any top-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// Class type
    Class(ClassDecl),
    /// Record type
    Record(RecordDecl),
    /// Interface type
    Interface(InterfaceDecl),
    /// Helper type
    Helper(HelperDecl),
    /// Global or conversion operator
    Operator(OperatorDecl),
    /// Enumeration
    Enum(EnumDecl),
    /// Named array type
    ArrayType(ArrayTypeDecl),
    /// Subrange type
    Subrange(SubrangeDecl),
    /// Type alias
    TypeAlias(TypeAliasDecl),
    /// Global function or out-of-line method implementation
    Function(FunctionDecl),
}

/// Top-level program item
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Declaration
    Decl(Declaration),
    /// Main-block statement
    Stmt(Stmt),
}

/// A whole program: declarations and statements in source order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Items in order
    pub items: Vec<Item>,
}

impl Program {
    /// Empty program
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration
    pub fn decl(mut self, decl: impl Into<Declaration>) -> Self {
        self.items.push(Item::Decl(decl.into()));
        self
    }

    /// Append a statement
    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.items.push(Item::Stmt(stmt));
        self
    }

    /// Append several statements
    pub fn stmts(mut self, stmts: impl IntoIterator<Item = Stmt>) -> Self {
        self.items.extend(stmts.into_iter().map(Item::Stmt));
        self
    }
}

macro_rules! impl_into_declaration {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Declaration {
                fn from(decl: $ty) -> Self {
                    Declaration::$variant(decl)
                }
            }
        )*
    };
}

impl_into_declaration! {
    ClassDecl => Class,
    RecordDecl => Record,
    InterfaceDecl => Interface,
    HelperDecl => Helper,
    OperatorDecl => Operator,
    EnumDecl => Enum,
    ArrayTypeDecl => ArrayType,
    SubrangeDecl => Subrange,
    TypeAliasDecl => TypeAlias,
    FunctionDecl => Function,
}
