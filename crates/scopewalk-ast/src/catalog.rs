// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The node catalog: node types, child slots, and alias groups.
//!
//! The catalog is a pure lookup table. For every [`NodeKind`] it knows:
//!
//! - the ordered list of child slots ([`FieldSpec`]), which doubles as the
//!   visitor key order used by traversal,
//! - the alias groups the kind belongs to ([`Alias`]),
//! - the keys walked when collecting binding identifiers,
//! - which node types each slot accepts (used by [`validate_slot`]).
//!
//! The list of kinds and the list of aliases are each written exactly once, in
//! [`for_each_node_kind!`](crate::for_each_node_kind) and
//! [`for_each_alias!`](crate::for_each_alias). Downstream crates feed those
//! lists into their own macros to derive per-type predicates.

use std::fmt;
use std::str::FromStr;

use crate::arena::NodeArena;
use crate::error::AstError;
use crate::node::{Child, NodeId};

// ============================================================================
// Kind and alias lists
// ============================================================================

/// Invokes `$callback! { Kind, Kind, ... }` with every node kind in the catalog.
#[macro_export]
macro_rules! for_each_node_kind {
    ($callback:ident) => {
        $callback! {
            Program,
            ExpressionStatement,
            BlockStatement,
            EmptyStatement,
            DebuggerStatement,
            WithStatement,
            ReturnStatement,
            LabeledStatement,
            BreakStatement,
            ContinueStatement,
            IfStatement,
            SwitchStatement,
            SwitchCase,
            ThrowStatement,
            TryStatement,
            CatchClause,
            WhileStatement,
            DoWhileStatement,
            ForStatement,
            ForInStatement,
            ForOfStatement,
            FunctionDeclaration,
            FunctionExpression,
            ArrowFunctionExpression,
            VariableDeclaration,
            VariableDeclarator,
            ClassDeclaration,
            ClassExpression,
            ClassBody,
            ClassMethod,
            ClassProperty,
            StaticBlock,
            ObjectExpression,
            ObjectProperty,
            ObjectMethod,
            ObjectPattern,
            ArrayExpression,
            ArrayPattern,
            RestElement,
            AssignmentPattern,
            SpreadElement,
            ThisExpression,
            Super,
            Identifier,
            StringLiteral,
            NumericLiteral,
            BooleanLiteral,
            NullLiteral,
            RegExpLiteral,
            BigIntLiteral,
            TemplateLiteral,
            TemplateElement,
            TaggedTemplateExpression,
            UnaryExpression,
            UpdateExpression,
            BinaryExpression,
            LogicalExpression,
            AssignmentExpression,
            MemberExpression,
            ConditionalExpression,
            CallExpression,
            NewExpression,
            SequenceExpression,
            ParenthesizedExpression,
            YieldExpression,
            AwaitExpression,
            MetaProperty,
            ImportDeclaration,
            ImportSpecifier,
            ImportDefaultSpecifier,
            ImportNamespaceSpecifier,
            ExportNamedDeclaration,
            ExportSpecifier,
            ExportDefaultDeclaration,
            ExportAllDeclaration,
        }
    };
}

/// Invokes `$callback! { Alias, Alias, ... }` with every alias group in the catalog.
#[macro_export]
macro_rules! for_each_alias {
    ($callback:ident) => {
        $callback! {
            Statement,
            Expression,
            Declaration,
            Scopable,
            BlockParent,
            Block,
            Function,
            FunctionParent,
            Loop,
            For,
            ForXStatement,
            While,
            Conditional,
            CompletionStatement,
            Terminatorless,
            Pattern,
            PatternLike,
            LVal,
            Literal,
            Immutable,
            Pureish,
            Class,
            Method,
            ObjectMember,
            Property,
            ModuleDeclaration,
            ExportDeclaration,
            ModuleSpecifier,
            UnaryLike,
            Binary,
            ExpressionWrapper,
        }
    };
}

macro_rules! define_node_kind {
    ($($kind:ident),* $(,)?) => {
        /// The `type` tag of a node.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $(
                #[doc = concat!("`", stringify!($kind), "` node.")]
                $kind,
            )*
        }

        impl NodeKind {
            /// Every kind in the catalog, in declaration order.
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$kind),*];

            /// Returns the ESTree/Babel `type` string for this kind.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(NodeKind::$kind => stringify!($kind),)*
                }
            }
        }

        impl FromStr for NodeKind {
            type Err = AstError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($kind) => Ok(NodeKind::$kind),)*
                    _ => Err(AstError::UnknownNodeType(s.to_string())),
                }
            }
        }
    };
}

macro_rules! define_alias {
    ($($alias:ident),* $(,)?) => {
        /// An alias group: a named set of node kinds (`Statement`, `Scopable`, ...).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Alias {
            $(
                #[doc = concat!("`", stringify!($alias), "` alias group.")]
                $alias,
            )*
        }

        impl Alias {
            /// Every alias in the catalog, in declaration order.
            pub const ALL: &'static [Alias] = &[$(Alias::$alias),*];

            /// Returns the alias name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Alias::$alias => stringify!($alias),)*
                }
            }
        }

        impl FromStr for Alias {
            type Err = AstError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($alias) => Ok(Alias::$alias),)*
                    _ => Err(AstError::UnknownNodeType(s.to_string())),
                }
            }
        }
    };
}

for_each_node_kind!(define_node_kind);
for_each_alias!(define_alias);

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Alias {
    /// All kinds that belong to this alias group.
    pub fn kinds(self) -> impl Iterator<Item = NodeKind> {
        NodeKind::ALL
            .iter()
            .copied()
            .filter(move |kind| kind.aliases().contains(&self))
    }
}

// ============================================================================
// Fields
// ============================================================================

/// A child-slot name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Alternate,
    Argument,
    Arguments,
    Block,
    Body,
    Callee,
    Cases,
    Consequent,
    Declaration,
    Declarations,
    Discriminant,
    Elements,
    Exported,
    Expression,
    Expressions,
    Finalizer,
    Handler,
    Id,
    Imported,
    Init,
    Key,
    Label,
    Left,
    Local,
    Meta,
    Object,
    Param,
    Params,
    Properties,
    Property,
    Quasi,
    Quasis,
    Right,
    Source,
    Specifiers,
    SuperClass,
    Tag,
    Test,
    Update,
    Value,
}

impl Field {
    /// Returns the ESTree property name of this slot.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Alternate => "alternate",
            Field::Argument => "argument",
            Field::Arguments => "arguments",
            Field::Block => "block",
            Field::Body => "body",
            Field::Callee => "callee",
            Field::Cases => "cases",
            Field::Consequent => "consequent",
            Field::Declaration => "declaration",
            Field::Declarations => "declarations",
            Field::Discriminant => "discriminant",
            Field::Elements => "elements",
            Field::Exported => "exported",
            Field::Expression => "expression",
            Field::Expressions => "expressions",
            Field::Finalizer => "finalizer",
            Field::Handler => "handler",
            Field::Id => "id",
            Field::Imported => "imported",
            Field::Init => "init",
            Field::Key => "key",
            Field::Label => "label",
            Field::Left => "left",
            Field::Local => "local",
            Field::Meta => "meta",
            Field::Object => "object",
            Field::Param => "param",
            Field::Params => "params",
            Field::Properties => "properties",
            Field::Property => "property",
            Field::Quasi => "quasi",
            Field::Quasis => "quasis",
            Field::Right => "right",
            Field::Source => "source",
            Field::Specifiers => "specifiers",
            Field::SuperClass => "superClass",
            Field::Tag => "tag",
            Field::Test => "test",
            Field::Update => "update",
            Field::Value => "value",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = AstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_FIELDS
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| AstError::UnknownFieldName(s.to_string()))
    }
}

const ALL_FIELDS: &[Field] = &[
    Field::Alternate,
    Field::Argument,
    Field::Arguments,
    Field::Block,
    Field::Body,
    Field::Callee,
    Field::Cases,
    Field::Consequent,
    Field::Declaration,
    Field::Declarations,
    Field::Discriminant,
    Field::Elements,
    Field::Exported,
    Field::Expression,
    Field::Expressions,
    Field::Finalizer,
    Field::Handler,
    Field::Id,
    Field::Imported,
    Field::Init,
    Field::Key,
    Field::Label,
    Field::Left,
    Field::Local,
    Field::Meta,
    Field::Object,
    Field::Param,
    Field::Params,
    Field::Properties,
    Field::Property,
    Field::Quasi,
    Field::Quasis,
    Field::Right,
    Field::Source,
    Field::Specifiers,
    Field::SuperClass,
    Field::Tag,
    Field::Test,
    Field::Update,
    Field::Value,
];

// ============================================================================
// Type names and constraints
// ============================================================================

/// A node type or alias name, as accepted by [`is_of_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    Kind(NodeKind),
    Alias(Alias),
}

impl FromStr for TypeName {
    type Err = AstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(kind) = s.parse::<NodeKind>() {
            return Ok(TypeName::Kind(kind));
        }
        if let Ok(alias) = s.parse::<Alias>() {
            return Ok(TypeName::Alias(alias));
        }
        Err(AstError::UnknownNodeType(s.to_string()))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Kind(kind) => kind.fmt(f),
            TypeName::Alias(alias) => alias.fmt(f),
        }
    }
}

impl From<NodeKind> for TypeName {
    fn from(kind: NodeKind) -> Self {
        TypeName::Kind(kind)
    }
}

impl From<Alias> for TypeName {
    fn from(alias: Alias) -> Self {
        TypeName::Alias(alias)
    }
}

/// Shape of one child slot of a node kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Slot name.
    pub field: Field,
    /// Whether the slot holds an ordered list of nodes.
    pub list: bool,
    /// Whether a single slot may be empty.
    pub optional: bool,
    /// Node types the slot accepts (any match is enough).
    pub accepts: &'static [TypeName],
}

const fn one(field: Field, accepts: &'static [TypeName]) -> FieldSpec {
    FieldSpec {
        field,
        list: false,
        optional: false,
        accepts,
    }
}

const fn opt(field: Field, accepts: &'static [TypeName]) -> FieldSpec {
    FieldSpec {
        field,
        list: false,
        optional: true,
        accepts,
    }
}

const fn many(field: Field, accepts: &'static [TypeName]) -> FieldSpec {
    FieldSpec {
        field,
        list: true,
        optional: true,
        accepts,
    }
}

use Alias as A;
use NodeKind as K;
use TypeName::{Alias as Al, Kind as Kd};

const EXPR: &[TypeName] = &[Al(A::Expression)];
const STMT: &[TypeName] = &[Al(A::Statement)];
const BLOCK: &[TypeName] = &[Kd(K::BlockStatement)];
const IDENT: &[TypeName] = &[Kd(K::Identifier)];
const STRING: &[TypeName] = &[Kd(K::StringLiteral)];
const LVAL: &[TypeName] = &[Al(A::LVal)];
const PARAMS: &[TypeName] = &[Kd(K::Identifier), Al(A::Pattern), Kd(K::RestElement)];
const PATTERN_LIKE: &[TypeName] = &[Al(A::PatternLike)];
const ARGUMENTS: &[TypeName] = &[Al(A::Expression), Kd(K::SpreadElement)];
const PROPERTY_KEY: &[TypeName] = &[Al(A::Expression)];
const CALLEE: &[TypeName] = &[Al(A::Expression), Kd(K::Super)];
const FOR_INIT: &[TypeName] = &[Kd(K::VariableDeclaration), Al(A::Expression)];
const FOR_LEFT: &[TypeName] = &[Kd(K::VariableDeclaration), Al(A::LVal)];
const ARROW_BODY: &[TypeName] = &[Kd(K::BlockStatement), Al(A::Expression)];
const CATCH_PARAM: &[TypeName] = &[
    Kd(K::Identifier),
    Kd(K::ArrayPattern),
    Kd(K::ObjectPattern),
];
const CLASS_MEMBER: &[TypeName] = &[
    Kd(K::ClassMethod),
    Kd(K::ClassProperty),
    Kd(K::StaticBlock),
];
const OBJECT_MEMBER: &[TypeName] = &[
    Kd(K::ObjectMethod),
    Kd(K::ObjectProperty),
    Kd(K::SpreadElement),
];
const OBJECT_PATTERN_MEMBER: &[TypeName] = &[Kd(K::ObjectProperty), Kd(K::RestElement)];
const OBJECT_VALUE: &[TypeName] = &[Al(A::Expression), Al(A::PatternLike)];
const ASSIGNMENT_LEFT: &[TypeName] = &[
    Kd(K::Identifier),
    Kd(K::ObjectPattern),
    Kd(K::ArrayPattern),
    Kd(K::MemberExpression),
];
const EXPORT_DEFAULT: &[TypeName] = &[
    Kd(K::FunctionDeclaration),
    Kd(K::ClassDeclaration),
    Al(A::Expression),
];
const EXPORTED_NAME: &[TypeName] = &[Kd(K::Identifier), Kd(K::StringLiteral)];
const IMPORT_SPECIFIER: &[TypeName] = &[Al(A::ModuleSpecifier)];

impl NodeKind {
    /// Ordered child slots of this kind (the visitor keys).
    pub fn fields(self) -> &'static [FieldSpec] {
        use Field as F;
        match self {
            K::Program => const { &[many(F::Body, STMT)] },
            K::ExpressionStatement => const { &[one(F::Expression, EXPR)] },
            K::BlockStatement => const { &[many(F::Body, STMT)] },
            K::EmptyStatement | K::DebuggerStatement => &[],
            K::WithStatement => const { &[one(F::Object, EXPR), one(F::Body, STMT)] },
            K::ReturnStatement => const { &[opt(F::Argument, EXPR)] },
            K::LabeledStatement => const { &[one(F::Label, IDENT), one(F::Body, STMT)] },
            K::BreakStatement | K::ContinueStatement => const { &[opt(F::Label, IDENT)] },
            K::IfStatement => const { &[
                one(F::Test, EXPR),
                one(F::Consequent, STMT),
                opt(F::Alternate, STMT),
            ] },
            K::SwitchStatement => const { &[
                one(F::Discriminant, EXPR),
                many(F::Cases, &[Kd(K::SwitchCase)]),
            ] },
            K::SwitchCase => const { &[opt(F::Test, EXPR), many(F::Consequent, STMT)] },
            K::ThrowStatement => const { &[one(F::Argument, EXPR)] },
            K::TryStatement => const { &[
                one(F::Block, BLOCK),
                opt(F::Handler, &[Kd(K::CatchClause)]),
                opt(F::Finalizer, BLOCK),
            ] },
            K::CatchClause => const { &[opt(F::Param, CATCH_PARAM), one(F::Body, BLOCK)] },
            K::WhileStatement => const { &[one(F::Test, EXPR), one(F::Body, STMT)] },
            K::DoWhileStatement => const { &[one(F::Body, STMT), one(F::Test, EXPR)] },
            K::ForStatement => const { &[
                opt(F::Init, FOR_INIT),
                opt(F::Test, EXPR),
                opt(F::Update, EXPR),
                one(F::Body, STMT),
            ] },
            K::ForInStatement | K::ForOfStatement => const { &[
                one(F::Left, FOR_LEFT),
                one(F::Right, EXPR),
                one(F::Body, STMT),
            ] },
            K::FunctionDeclaration | K::FunctionExpression => const { &[
                opt(F::Id, IDENT),
                many(F::Params, PARAMS),
                one(F::Body, BLOCK),
            ] },
            K::ArrowFunctionExpression => const { &[many(F::Params, PARAMS), one(F::Body, ARROW_BODY)] },
            K::VariableDeclaration => const { &[many(F::Declarations, &[Kd(K::VariableDeclarator)])] },
            K::VariableDeclarator => const { &[one(F::Id, LVAL), opt(F::Init, EXPR)] },
            K::ClassDeclaration | K::ClassExpression => const { &[
                opt(F::Id, IDENT),
                opt(F::SuperClass, EXPR),
                one(F::Body, &[Kd(K::ClassBody)]),
            ] },
            K::ClassBody => const { &[many(F::Body, CLASS_MEMBER)] },
            K::ClassMethod | K::ObjectMethod => const { &[
                one(F::Key, PROPERTY_KEY),
                many(F::Params, PARAMS),
                one(F::Body, BLOCK),
            ] },
            K::ClassProperty => const { &[one(F::Key, PROPERTY_KEY), opt(F::Value, EXPR)] },
            K::StaticBlock => const { &[many(F::Body, STMT)] },
            K::ObjectExpression => const { &[many(F::Properties, OBJECT_MEMBER)] },
            K::ObjectProperty => const { &[one(F::Key, PROPERTY_KEY), one(F::Value, OBJECT_VALUE)] },
            K::ObjectPattern => const { &[many(F::Properties, OBJECT_PATTERN_MEMBER)] },
            K::ArrayExpression => const { &[many(F::Elements, ARGUMENTS)] },
            K::ArrayPattern => const { &[many(F::Elements, PATTERN_LIKE)] },
            K::RestElement => const { &[one(F::Argument, LVAL)] },
            K::AssignmentPattern => const { &[one(F::Left, ASSIGNMENT_LEFT), one(F::Right, EXPR)] },
            K::SpreadElement => const { &[one(F::Argument, EXPR)] },
            K::ThisExpression
            | K::Super
            | K::Identifier
            | K::StringLiteral
            | K::NumericLiteral
            | K::BooleanLiteral
            | K::NullLiteral
            | K::RegExpLiteral
            | K::BigIntLiteral
            | K::TemplateElement => const { &[] },
            K::TemplateLiteral => const { &[
                many(F::Quasis, &[Kd(K::TemplateElement)]),
                many(F::Expressions, EXPR),
            ] },
            K::TaggedTemplateExpression => const { &[
                one(F::Tag, EXPR),
                one(F::Quasi, &[Kd(K::TemplateLiteral)]),
            ] },
            K::UnaryExpression | K::UpdateExpression => const { &[one(F::Argument, EXPR)] },
            K::BinaryExpression | K::LogicalExpression => const {
                &[one(F::Left, EXPR), one(F::Right, EXPR)]
            }
            K::AssignmentExpression => const { &[one(F::Left, LVAL), one(F::Right, EXPR)] },
            K::MemberExpression => const { &[one(F::Object, CALLEE), one(F::Property, EXPR)] },
            K::ConditionalExpression => const { &[
                one(F::Test, EXPR),
                one(F::Consequent, EXPR),
                one(F::Alternate, EXPR),
            ] },
            K::CallExpression | K::NewExpression => const { &[
                one(F::Callee, CALLEE),
                many(F::Arguments, ARGUMENTS),
            ] },
            K::SequenceExpression => const { &[many(F::Expressions, EXPR)] },
            K::ParenthesizedExpression => const { &[one(F::Expression, EXPR)] },
            K::YieldExpression => const { &[opt(F::Argument, EXPR)] },
            K::AwaitExpression => const { &[one(F::Argument, EXPR)] },
            K::MetaProperty => const { &[one(F::Meta, IDENT), one(F::Property, IDENT)] },
            K::ImportDeclaration => const { &[
                many(F::Specifiers, IMPORT_SPECIFIER),
                one(F::Source, STRING),
            ] },
            K::ImportSpecifier => const { &[one(F::Imported, EXPORTED_NAME), one(F::Local, IDENT)] },
            K::ImportDefaultSpecifier | K::ImportNamespaceSpecifier => const { &[one(F::Local, IDENT)] },
            K::ExportNamedDeclaration => const { &[
                opt(F::Declaration, &[Al(A::Declaration)]),
                many(F::Specifiers, &[Kd(K::ExportSpecifier)]),
                opt(F::Source, STRING),
            ] },
            K::ExportSpecifier => const { &[one(F::Local, IDENT), one(F::Exported, EXPORTED_NAME)] },
            K::ExportDefaultDeclaration => const { &[one(F::Declaration, EXPORT_DEFAULT)] },
            K::ExportAllDeclaration => const { &[one(F::Source, STRING)] },
        }
    }

    /// Returns the slot spec for `field`, or `None` if this kind has no such slot.
    pub fn field_spec(self, field: Field) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.field == field)
    }

    /// Position of `field` within [`fields`](Self::fields).
    pub fn field_index(self, field: Field) -> Option<usize> {
        self.fields().iter().position(|spec| spec.field == field)
    }

    /// Alias groups this kind belongs to.
    pub fn aliases(self) -> &'static [Alias] {
        match self {
            K::Program => &[A::Scopable, A::BlockParent, A::Block],
            K::ExpressionStatement => &[A::Statement, A::ExpressionWrapper],
            K::BlockStatement => &[A::Scopable, A::BlockParent, A::Block, A::Statement],
            K::EmptyStatement | K::DebuggerStatement | K::WithStatement => &[A::Statement],
            K::ReturnStatement
            | K::BreakStatement
            | K::ContinueStatement
            | K::ThrowStatement => &[A::Statement, A::Terminatorless, A::CompletionStatement],
            K::LabeledStatement | K::TryStatement => &[A::Statement],
            K::IfStatement => &[A::Statement, A::Conditional],
            K::SwitchStatement => &[A::Statement, A::BlockParent, A::Scopable],
            K::SwitchCase => &[],
            K::CatchClause => &[A::Scopable, A::BlockParent],
            K::WhileStatement | K::DoWhileStatement => &[
                A::Statement,
                A::BlockParent,
                A::Loop,
                A::While,
                A::Scopable,
            ],
            K::ForStatement => &[
                A::Scopable,
                A::Statement,
                A::For,
                A::BlockParent,
                A::Loop,
            ],
            K::ForInStatement | K::ForOfStatement => &[
                A::Scopable,
                A::Statement,
                A::For,
                A::BlockParent,
                A::Loop,
                A::ForXStatement,
            ],
            K::FunctionDeclaration => &[
                A::Scopable,
                A::Function,
                A::BlockParent,
                A::FunctionParent,
                A::Statement,
                A::Pureish,
                A::Declaration,
            ],
            K::FunctionExpression | K::ArrowFunctionExpression => &[
                A::Scopable,
                A::Function,
                A::BlockParent,
                A::FunctionParent,
                A::Expression,
                A::Pureish,
            ],
            K::VariableDeclaration => &[A::Statement, A::Declaration],
            K::VariableDeclarator => &[],
            K::ClassDeclaration => &[A::Scopable, A::Class, A::Statement, A::Declaration],
            K::ClassExpression => &[A::Scopable, A::Class, A::Expression],
            K::ClassBody => &[],
            K::ClassMethod => &[
                A::Function,
                A::Scopable,
                A::BlockParent,
                A::FunctionParent,
                A::Method,
            ],
            K::ClassProperty => &[A::Property],
            K::StaticBlock => &[A::Scopable, A::BlockParent, A::FunctionParent],
            K::ObjectExpression | K::ArrayExpression => &[A::Expression],
            K::ObjectProperty => &[A::Property, A::ObjectMember],
            K::ObjectMethod => &[
                A::Function,
                A::Scopable,
                A::BlockParent,
                A::FunctionParent,
                A::Method,
                A::ObjectMember,
            ],
            K::ObjectPattern | K::ArrayPattern | K::AssignmentPattern => {
                &[A::Pattern, A::PatternLike, A::LVal]
            }
            K::RestElement => &[A::LVal, A::PatternLike],
            K::SpreadElement => &[A::UnaryLike],
            K::ThisExpression => &[A::Expression],
            K::Super => &[],
            K::Identifier => &[A::Expression, A::PatternLike, A::LVal],
            K::StringLiteral
            | K::NumericLiteral
            | K::BooleanLiteral
            | K::NullLiteral
            | K::BigIntLiteral => &[A::Expression, A::Pureish, A::Literal, A::Immutable],
            K::RegExpLiteral => &[A::Expression, A::Pureish, A::Literal],
            K::TemplateLiteral => &[A::Expression, A::Literal],
            K::TemplateElement => &[],
            K::TaggedTemplateExpression => &[A::Expression],
            K::UnaryExpression => &[A::UnaryLike, A::Expression],
            K::UpdateExpression | K::AssignmentExpression => &[A::Expression],
            K::BinaryExpression | K::LogicalExpression => &[A::Binary, A::Expression],
            K::MemberExpression => &[A::Expression, A::LVal],
            K::ConditionalExpression => &[A::Expression, A::Conditional],
            K::CallExpression
            | K::NewExpression
            | K::SequenceExpression
            | K::MetaProperty => &[A::Expression],
            K::ParenthesizedExpression => &[A::Expression, A::ExpressionWrapper],
            K::YieldExpression | K::AwaitExpression => &[A::Expression, A::Terminatorless],
            K::ImportDeclaration => &[A::Statement, A::Declaration, A::ModuleDeclaration],
            K::ImportSpecifier
            | K::ImportDefaultSpecifier
            | K::ImportNamespaceSpecifier
            | K::ExportSpecifier => &[A::ModuleSpecifier],
            K::ExportNamedDeclaration
            | K::ExportDefaultDeclaration
            | K::ExportAllDeclaration => &[
                A::Statement,
                A::Declaration,
                A::ModuleDeclaration,
                A::ExportDeclaration,
            ],
        }
    }

    /// Returns true if this kind is a member of `alias`.
    pub fn has_alias(self, alias: Alias) -> bool {
        self.aliases().contains(&alias)
    }

    /// Slots walked when collecting the identifiers a construct binds.
    pub fn binding_keys(self) -> &'static [Field] {
        use Field as F;
        match self {
            K::ArrowFunctionExpression | K::ObjectMethod | K::ClassMethod => &[F::Params],
            K::ForInStatement | K::ForOfStatement => &[F::Left],
            K::ClassDeclaration | K::ClassExpression => &[F::Id],
            K::RestElement | K::UpdateExpression => &[F::Argument],
            K::ObjectProperty => &[F::Value],
            K::AssignmentPattern | K::AssignmentExpression => &[F::Left],
            K::ArrayPattern => &[F::Elements],
            K::ObjectPattern => &[F::Properties],
            K::VariableDeclaration => &[F::Declarations],
            K::VariableDeclarator => &[F::Id],
            K::ImportSpecifier | K::ImportDefaultSpecifier | K::ImportNamespaceSpecifier => {
                &[F::Local]
            }
            K::ImportDeclaration => &[F::Specifiers],
            K::ExportSpecifier => &[F::Exported],
            K::FunctionDeclaration | K::FunctionExpression => &[F::Id, F::Params],
            K::CatchClause => &[F::Param],
            K::LabeledStatement => &[F::Label],
            K::UnaryExpression => &[F::Argument],
            _ => &[],
        }
    }
}

// ============================================================================
// Catalog queries
// ============================================================================

/// Returns true if `kind` is `name` or belongs to the alias `name`.
pub fn is_of_type(kind: NodeKind, name: TypeName) -> bool {
    match name {
        TypeName::Kind(expected) => kind == expected,
        TypeName::Alias(alias) => kind.has_alias(alias),
    }
}

fn accepts(spec: &FieldSpec, kind: NodeKind) -> bool {
    spec.accepts.iter().any(|name| is_of_type(kind, *name))
}

/// Checks whether `candidate` may be stored in `parent.field`.
///
/// Fails with [`AstError::UnknownField`] if `parent` has no such slot and
/// [`AstError::InvalidSlot`] if the value has the wrong shape or node type.
pub fn validate_slot(
    arena: &NodeArena,
    parent: NodeKind,
    field: Field,
    candidate: &Child,
) -> Result<(), AstError> {
    let spec = parent
        .field_spec(field)
        .ok_or(AstError::UnknownField { kind: parent, field })?;
    let invalid = |found: String| AstError::InvalidSlot {
        parent,
        field,
        expected: describe(spec),
        found,
    };
    match candidate {
        Child::None if spec.list => Err(invalid("null".to_string())),
        Child::None if !spec.optional => Err(invalid("null".to_string())),
        Child::None => Ok(()),
        Child::Node(_) if spec.list => Err(invalid("a single node".to_string())),
        Child::List(_) if !spec.list => Err(invalid("a list".to_string())),
        Child::Node(id) => check_node(arena, spec, *id).map_err(|kind| invalid(kind.to_string())),
        Child::List(ids) => {
            for id in ids {
                check_node(arena, spec, *id).map_err(|kind| invalid(kind.to_string()))?;
            }
            Ok(())
        }
    }
}

/// Checks a single element destined for a list slot.
pub fn validate_element(
    arena: &NodeArena,
    parent: NodeKind,
    field: Field,
    candidate: NodeId,
) -> Result<(), AstError> {
    let spec = parent
        .field_spec(field)
        .ok_or(AstError::UnknownField { kind: parent, field })?;
    if !spec.list {
        return Err(AstError::InvalidSlot {
            parent,
            field,
            expected: describe(spec),
            found: "a list element".to_string(),
        });
    }
    check_node(arena, spec, candidate).map_err(|kind| AstError::InvalidSlot {
        parent,
        field,
        expected: describe(spec),
        found: kind.to_string(),
    })
}

fn check_node(arena: &NodeArena, spec: &FieldSpec, id: NodeId) -> Result<(), NodeKind> {
    let kind = arena.kind(id);
    if accepts(spec, kind) {
        Ok(())
    } else {
        Err(kind)
    }
}

fn describe(spec: &FieldSpec) -> String {
    let names: Vec<String> = spec.accepts.iter().map(|name| name.to_string()).collect();
    let joined = names.join(" | ");
    if spec.list {
        format!("[{}]", joined)
    } else if spec.optional {
        format!("{} | null", joined)
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn unknown_type_names_are_errors() {
        assert!(matches!(
            "Frobnicate".parse::<TypeName>(),
            Err(AstError::UnknownNodeType(name)) if name == "Frobnicate"
        ));
    }

    #[test]
    fn type_name_prefers_kinds_then_aliases() {
        assert_eq!(
            "Identifier".parse::<TypeName>().unwrap(),
            TypeName::Kind(NodeKind::Identifier)
        );
        assert_eq!(
            "Scopable".parse::<TypeName>().unwrap(),
            TypeName::Alias(Alias::Scopable)
        );
    }

    #[test]
    fn alias_membership() {
        assert!(is_of_type(NodeKind::ForOfStatement, Alias::Loop.into()));
        assert!(is_of_type(NodeKind::ArrowFunctionExpression, Alias::Function.into()));
        assert!(!is_of_type(NodeKind::ClassDeclaration, Alias::BlockParent.into()));
        let functions: Vec<NodeKind> = Alias::Function.kinds().collect();
        assert!(functions.contains(&NodeKind::ObjectMethod));
        assert!(!functions.contains(&NodeKind::Program));
    }

    #[test]
    fn fields_are_unique_per_kind() {
        for kind in NodeKind::ALL {
            let fields = kind.fields();
            for (i, spec) in fields.iter().enumerate() {
                assert!(
                    fields[i + 1..].iter().all(|other| other.field != spec.field),
                    "{} repeats {}",
                    kind,
                    spec.field
                );
            }
        }
    }

    #[test]
    fn field_tables_keep_visitor_key_order() {
        let order: Vec<Field> = NodeKind::IfStatement.fields().iter().map(|spec| spec.field).collect();
        assert_eq!(order, vec![Field::Test, Field::Consequent, Field::Alternate]);
        assert!(NodeKind::BinaryExpression.fields().iter().all(|spec| !spec.list));
        assert!(NodeKind::EmptyStatement.fields().is_empty());
    }

    #[test]
    fn binding_keys_are_declared_fields() {
        for kind in NodeKind::ALL {
            for field in kind.binding_keys() {
                assert!(kind.field_spec(*field).is_some(), "{} lacks {}", kind, field);
            }
        }
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("superClass".parse::<Field>().unwrap(), Field::SuperClass);
        assert!("nope".parse::<Field>().is_err());
    }
}
