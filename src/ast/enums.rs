//! Byte-sized enums stored inline in node records, plus regular-expression flags.
//!
//! Each enum snapshots as its source spelling, so operators read as `"==="` and declaration
//! kinds as `"const"`.

use std::fmt;

use bitflags::bitflags;
use serde_json::Value;

use crate::ast::codec::{Scalar, SnapshotOptions, ToRecord};
use crate::core::error::Error;
use crate::core::raw::RawTransfer;

define_enums! {
    enum PropertyKind [] {
        0 => Init = "init",
        1 => Get = "get",
        2 => Set = "set",
    }

    enum VariableDeclarationKind [] {
        0 => Var = "var",
        1 => Let = "let",
        2 => Const = "const",
        3 => Using = "using",
        4 => AwaitUsing = "await using",
    }

    /// ESTree node type of a `Function` record.
    enum FunctionType [] {
        0 => FunctionDeclaration = "FunctionDeclaration",
        1 => FunctionExpression = "FunctionExpression",
        2 => TSDeclareFunction = "TSDeclareFunction",
        3 => TSEmptyBodyFunctionExpression = "TSEmptyBodyFunctionExpression",
    }

    enum ClassType [] {
        0 => ClassDeclaration = "ClassDeclaration",
        1 => ClassExpression = "ClassExpression",
    }

    enum MethodDefinitionType [] {
        0 => MethodDefinition = "MethodDefinition",
        1 => TSAbstractMethodDefinition = "TSAbstractMethodDefinition",
    }

    enum MethodDefinitionKind [] {
        0 => Constructor = "constructor",
        1 => Method = "method",
        2 => Get = "get",
        3 => Set = "set",
    }

    enum PropertyDefinitionType [] {
        0 => PropertyDefinition = "PropertyDefinition",
        1 => TSAbstractPropertyDefinition = "TSAbstractPropertyDefinition",
    }

    enum AccessorPropertyType [] {
        0 => AccessorProperty = "AccessorProperty",
        1 => TSAbstractAccessorProperty = "TSAbstractAccessorProperty",
    }

    enum FormalParameterKind [] {
        0 => FormalParameter = "FormalParameter",
        1 => UniqueFormalParameters = "UniqueFormalParameters",
        2 => ArrowFormalParameters = "ArrowFormalParameters",
        3 => Signature = "Signature",
    }

    /// `import source` / `import defer`. Absent is byte 2.
    enum ImportPhase [none = 2] {
        0 => Source = "source",
        1 => Defer = "defer",
    }

    enum ImportOrExportKind [] {
        0 => Value = "value",
        1 => Type = "type",
    }

    enum AssignmentOperator [] {
        0 => Assign = "=",
        1 => Addition = "+=",
        2 => Subtraction = "-=",
        3 => Multiplication = "*=",
        4 => Division = "/=",
        5 => Remainder = "%=",
        6 => Exponential = "**=",
        7 => ShiftLeft = "<<=",
        8 => ShiftRight = ">>=",
        9 => ShiftRightZeroFill = ">>>=",
        10 => BitwiseOR = "|=",
        11 => BitwiseXOR = "^=",
        12 => BitwiseAnd = "&=",
        13 => LogicalOr = "||=",
        14 => LogicalAnd = "&&=",
        15 => LogicalNullish = "??=",
    }

    enum BinaryOperator [] {
        0 => Equality = "==",
        1 => Inequality = "!=",
        2 => StrictEquality = "===",
        3 => StrictInequality = "!==",
        4 => LessThan = "<",
        5 => LessEqualThan = "<=",
        6 => GreaterThan = ">",
        7 => GreaterEqualThan = ">=",
        8 => Addition = "+",
        9 => Subtraction = "-",
        10 => Multiplication = "*",
        11 => Division = "/",
        12 => Remainder = "%",
        13 => Exponential = "**",
        14 => ShiftLeft = "<<",
        15 => ShiftRight = ">>",
        16 => ShiftRightZeroFill = ">>>",
        17 => BitwiseOR = "|",
        18 => BitwiseXOR = "^",
        19 => BitwiseAnd = "&",
        20 => In = "in",
        21 => Instanceof = "instanceof",
    }

    enum LogicalOperator [] {
        0 => Or = "||",
        1 => And = "&&",
        2 => Coalesce = "??",
    }

    enum UnaryOperator [] {
        0 => UnaryPlus = "+",
        1 => UnaryNegation = "-",
        2 => LogicalNot = "!",
        3 => BitwiseNot = "~",
        4 => Typeof = "typeof",
        5 => Void = "void",
        6 => Delete = "delete",
    }

    enum UpdateOperator [] {
        0 => Increment = "++",
        1 => Decrement = "--",
    }

    enum ModuleKind [] {
        0 => Script = "script",
        1 => Module = "module",
    }

    enum CommentKind [] {
        0 => Line = "Line",
        1 => Block = "Block",
    }

    enum ErrorSeverity [] {
        0 => Error = "Error",
        1 => Warning = "Warning",
        2 => Advice = "Advice",
    }

    enum TSTypeOperatorOperator [] {
        0 => Keyof = "keyof",
        1 => Unique = "unique",
        2 => Readonly = "readonly",
    }

    /// Class member modifier. Absent is byte 3.
    enum TSAccessibility [none = 3] {
        0 => Private = "private",
        1 => Protected = "protected",
        2 => Public = "public",
    }

    enum TSMethodSignatureKind [] {
        0 => Method = "method",
        1 => Get = "get",
        2 => Set = "set",
    }

    enum TSModuleDeclarationKind [] {
        0 => Global = "global",
        1 => Module = "module",
        2 => Namespace = "namespace",
    }

    /// `+readonly`, `-?` and bare modifiers of a mapped type. Absent is byte 3.
    enum TSMappedTypeModifierOperator [none = 3] {
        0 => True = "true",
        1 => Plus = "+",
        2 => Minus = "-",
    }
}

impl BinaryOperator {
    pub fn is_equality(self) -> bool {
        matches!(
            self,
            Self::Equality | Self::Inequality | Self::StrictEquality | Self::StrictInequality
        )
    }
}

impl CommentKind {
    /// Bytes of delimiter before and after the body: `//` and `/* */`.
    pub fn delimiters(self) -> (u32, u32) {
        match self {
            Self::Line => (2, 0),
            Self::Block => (2, 2),
        }
    }
}

bitflags! {
    /// Regular-expression flags, one bit each.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct RegExpFlags: u8 {
        const G = 1 << 0;
        const I = 1 << 1;
        const M = 1 << 2;
        const S = 1 << 3;
        const U = 1 << 4;
        const Y = 1 << 5;
        const D = 1 << 6;
        const V = 1 << 7;
    }
}

impl RegExpFlags {
    const LETTERS: [(RegExpFlags, char); 8] = [
        (RegExpFlags::D, 'd'),
        (RegExpFlags::G, 'g'),
        (RegExpFlags::I, 'i'),
        (RegExpFlags::M, 'm'),
        (RegExpFlags::S, 's'),
        (RegExpFlags::U, 'u'),
        (RegExpFlags::V, 'v'),
        (RegExpFlags::Y, 'y'),
    ];
}

impl fmt::Display for RegExpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, letter) in Self::LETTERS {
            if self.contains(flag) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

impl Scalar for RegExpFlags {
    const NAME: &'static str = "RegExpFlags";

    fn read(ast: &RawTransfer, pos: u32) -> Result<Self, Error> {
        // Every bit is a defined flag.
        Ok(RegExpFlags::from_bits_retain(ast.read_u8(pos)?))
    }
}

impl ToRecord for RegExpFlags {
    fn to_record_with(&self, _options: &SnapshotOptions) -> Result<Value, Error> {
        Ok(Value::String(self.to_string()))
    }
}
