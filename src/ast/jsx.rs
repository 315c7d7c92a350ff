//! Purpose: Views and unions for JSX nodes.
//! Exports: `JSXElement`, `JSXFragment`, their parts, and the JSX unions.
//! Role: Reached from `Expression` discriminants 32 and 33.

use crate::ast::codec::{Boxed, Inline, Opt, Seq, Str};
use crate::ast::js::{IdentifierReference, StringLiteral, ThisExpression};
use crate::ast::ts::TSTypeParameterInstantiation;
use crate::ast::unions::Expression;

define_views! { 'a;
    node JSXElement [48] {} {
        opening_element as "openingElement" @ 8: Boxed<JSXOpeningElement<'a>>,
        children @ 16: Seq<JSXChild<'a>, 16>,
        closing_element as "closingElement" @ 40: Opt<Boxed<JSXClosingElement<'a>>>,
    }

    node JSXOpeningElement [56] {} {
        name @ 8: JSXElementName<'a>,
        type_arguments as "typeArguments" @ 24: Opt<Boxed<TSTypeParameterInstantiation<'a>>>,
        attributes @ 32: Seq<JSXAttributeItem<'a>, 16>,
    }

    node JSXClosingElement [24] {} {
        name @ 8: JSXElementName<'a>,
    }

    /// `<>...</>`
    node JSXFragment [48] {} {
        opening_fragment as "openingFragment" @ 8: Inline<JSXOpeningFragment<'a>>,
        children @ 16: Seq<JSXChild<'a>, 16>,
        closing_fragment as "closingFragment" @ 40: Inline<JSXClosingFragment<'a>>,
    }

    node JSXOpeningFragment [8] {} {}

    node JSXClosingFragment [8] {} {}

    /// `ns:name`
    node JSXNamespacedName [56] {} {
        namespace @ 8: Inline<JSXIdentifier<'a>>,
        name @ 32: Inline<JSXIdentifier<'a>>,
    }

    /// `a.b.c`
    node JSXMemberExpression [48] {} {
        object @ 8: JSXMemberExpressionObject<'a>,
        property @ 24: Inline<JSXIdentifier<'a>>,
    }

    node JSXExpressionContainer [24] {} {
        expression @ 8: JSXExpression<'a>,
    }

    node JSXEmptyExpression [8] {} {}

    node JSXAttribute [40] {} {
        name @ 8: JSXAttributeName<'a>,
        value @ 24: Opt<JSXAttributeValue<'a>>,
    }

    node JSXSpreadAttribute [24] {} {
        argument @ 8: Expression<'a>,
    }

    node JSXIdentifier [24] {} {
        name @ 8: Str,
    }

    node JSXSpreadChild [24] {} {
        expression @ 8: Expression<'a>,
    }

    node JSXText [40] {} {
        value @ 8: Str,
        raw @ 24: Opt<Str>,
    }
}

define_unions! { 'a;
    /// Tag names. Lower-case names are `Identifier`; component references are
    /// `IdentifierReference`.
    union JSXElementName [] {
        0 => Identifier(boxed JSXIdentifier),
        1 => IdentifierReference(boxed IdentifierReference),
        2 => NamespacedName(boxed JSXNamespacedName),
        3 => MemberExpression(boxed JSXMemberExpression),
        4 => ThisExpression(boxed ThisExpression),
    }

    union JSXMemberExpressionObject [] {
        0 => IdentifierReference(boxed IdentifierReference),
        1 => MemberExpression(boxed JSXMemberExpression),
        2 => ThisExpression(boxed ThisExpression),
    }

    union JSXExpression [] {
        64 => EmptyExpression(inline JSXEmptyExpression),
        ..Expression,
    }

    union JSXAttributeItem [] {
        0 => Attribute(boxed JSXAttribute),
        1 => SpreadAttribute(boxed JSXSpreadAttribute),
    }

    union JSXAttributeName [] {
        0 => Identifier(boxed JSXIdentifier),
        1 => NamespacedName(boxed JSXNamespacedName),
    }

    /// Absent is discriminant 4.
    union JSXAttributeValue [none = 4] {
        0 => StringLiteral(boxed StringLiteral),
        1 => ExpressionContainer(boxed JSXExpressionContainer),
        2 => Element(boxed JSXElement),
        3 => Fragment(boxed JSXFragment),
    }

    union JSXChild [] {
        0 => Text(boxed JSXText),
        1 => Element(boxed JSXElement),
        2 => Fragment(boxed JSXFragment),
        3 => ExpressionContainer(boxed JSXExpressionContainer),
        4 => Spread(boxed JSXSpreadChild),
    }
}

impl<'a> JSXElementName<'a> {
    /// Local tag name, e.g. `div`, `Foo`, `this`. Namespaced names and member expressions
    /// give their last segment.
    pub fn tag_name(&self) -> Result<&'a str, crate::core::error::Error> {
        match self {
            JSXElementName::Identifier(ident) => ident.name().copied(),
            JSXElementName::IdentifierReference(ident) => ident.name().copied(),
            JSXElementName::NamespacedName(name) => name.name()?.name().copied(),
            JSXElementName::MemberExpression(member) => member.property()?.name().copied(),
            JSXElementName::ThisExpression(_) => Ok("this"),
        }
    }
}
