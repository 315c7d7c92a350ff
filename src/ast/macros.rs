// Declarative builders for views, unions, and scalar enums.
//
// One declaration per record produces its view struct, memoized accessors, walker, snapshot,
// and `LAYOUT` entry, so the layout table and the decoders share a single source.

/// Declares record views.
///
/// ```text
/// define_views! { 'a;
///     /// doc
///     node Name [size, niche = <Sentinel>] {
///         scalar_field as "jsonKey" @ offset: ScalarType,
///     } {
///         child_field @ offset: CodecType<'a>,
///     }
/// }
/// ```
///
/// `node` records are visitable and carry a leading `(start, end)` pair. `record` entries
/// are plain structs and list any span fields themselves.
macro_rules! define_views {
    (
        $lt:lifetime;
        $(
            $(#[$meta:meta])*
            $kind:ident $name:ident [$size:literal $(, niche = $niche:expr)?]
            {
                $( $(#[$smeta:meta])* $sfield:ident $(as $skey:literal)? @ $soff:literal : $sty:ty ),* $(,)?
            }
            {
                $( $(#[$fmeta:meta])* $field:ident $(as $fkey:literal)? @ $foff:literal : $codec:ty ),* $(,)?
            }
        )*
    ) => {
        $(
            $(#[$meta])*
            pub struct $name<$lt> {
                ast: &$lt $crate::core::raw::RawTransfer,
                pos: u32,
                $( $field: ::once_cell::unsync::OnceCell<<$codec as $crate::ast::codec::Codec<$lt>>::Output>, )*
            }

            impl<$lt> $name<$lt> {
                pub const NAME: &'static str = stringify!($name);
                pub const SIZE: u32 = $size;
                pub const LAYOUT: $crate::ast::layout::NodeLayout = $crate::ast::layout::NodeLayout {
                    name: stringify!($name),
                    node_type: view_node_type!($kind $name),
                    size: $size,
                    spanned: view_spanned!($kind),
                    sentinel: view_sentinel!($($niche)?),
                    fields: &[
                        $(
                            $crate::ast::layout::FieldLayout {
                                name: record_key!($sfield $(, $skey)?),
                                offset: $soff,
                                slot: <$sty as $crate::ast::codec::Scalar>::SLOT,
                            },
                        )*
                        $(
                            $crate::ast::layout::FieldLayout {
                                name: record_key!($field $(, $fkey)?),
                                offset: $foff,
                                slot: <$codec as $crate::ast::codec::Codec<$lt>>::SLOT,
                            },
                        )*
                    ],
                };

                /// Wraps the record at `pos`. Decodes nothing.
                #[inline]
                pub fn new(ast: &$lt $crate::core::raw::RawTransfer, pos: u32) -> Self {
                    #[cfg(test)]
                    $crate::core::raw::tally::count_view();
                    Self {
                        ast,
                        pos,
                        $( $field: ::once_cell::unsync::OnceCell::new(), )*
                    }
                }

                /// Buffer offset of this record.
                pub fn pos(&self) -> u32 {
                    self.pos
                }

                pub fn transfer(&self) -> &$lt $crate::core::raw::RawTransfer {
                    self.ast
                }

                pub(crate) fn walk_at(
                    ast: &$lt $crate::core::raw::RawTransfer,
                    pos: u32,
                    visitor: &mut $crate::traverse::Visitor<$lt>,
                ) -> Result<(), $crate::core::error::Error> {
                    view_walk!($kind $name, ast, pos, visitor, {
                        $( <$codec as $crate::ast::codec::Codec<$lt>>::walk(ast, ast.locate(pos, $foff)?, visitor)?; )*
                    })
                }

                $(
                    $(#[$smeta])*
                    pub fn $sfield(&self) -> Result<$sty, $crate::core::error::Error> {
                        <$sty as $crate::ast::codec::Scalar>::read(self.ast, self.ast.locate(self.pos, $soff)?)
                    }
                )*

                $(
                    $(#[$fmeta])*
                    pub fn $field(
                        &self,
                    ) -> Result<&<$codec as $crate::ast::codec::Codec<$lt>>::Output, $crate::core::error::Error> {
                        self.$field.get_or_try_init(|| {
                            <$codec as $crate::ast::codec::Codec<$lt>>::decode(self.ast, self.ast.locate(self.pos, $foff)?)
                        })
                    }
                )*
            }

            view_span!($kind $name $lt);

            impl<$lt> $crate::ast::codec::View<$lt> for $name<$lt> {
                const NAME: &'static str = stringify!($name);

                fn construct(ast: &$lt $crate::core::raw::RawTransfer, pos: u32) -> Self {
                    Self::new(ast, pos)
                }

                fn walk(
                    ast: &$lt $crate::core::raw::RawTransfer,
                    pos: u32,
                    visitor: &mut $crate::traverse::Visitor<$lt>,
                ) -> Result<(), $crate::core::error::Error> {
                    Self::walk_at(ast, pos, visitor)
                }
            }

            $(
                impl<$lt> $crate::ast::codec::Niche for $name<$lt> {
                    const SENTINEL: $crate::ast::layout::Sentinel = $niche;
                }
            )?

            impl<$lt> $crate::ast::codec::ToRecord for $name<$lt> {
                fn to_record_with(
                    &self,
                    options: &$crate::ast::codec::SnapshotOptions,
                ) -> Result<::serde_json::Value, $crate::core::error::Error> {
                    #[allow(unused_imports)]
                    use $crate::ast::codec::ToRecord as _;
                    view_record_unwrap!($name, self, options);
                    let mut map = ::serde_json::Map::new();
                    view_record_header!($kind $name, self, map, options);
                    $(
                        map.insert(
                            record_key!($sfield $(, $skey)?).to_string(),
                            self.$sfield()?.to_record_with(options)?,
                        );
                    )*
                    $(
                        map.insert(
                            record_key!($field $(, $fkey)?).to_string(),
                            self.$field()?.to_record_with(options)?,
                        );
                    )*
                    view_record_extras!($name, self, map);
                    Ok(::serde_json::Value::Object(map))
                }
            }

            impl<$lt> ::std::fmt::Debug for $name<$lt> {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.debug_struct(stringify!($name)).field("pos", &self.pos).finish()
                }
            }
        )*
    };
}

macro_rules! record_key {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $key:literal) => {
        $key
    };
}

macro_rules! view_node_type {
    (node $name:ident) => {
        Some($crate::ast::NodeType::$name)
    };
    (record $name:ident) => {
        None
    };
}

macro_rules! view_spanned {
    (node) => {
        true
    };
    (record) => {
        false
    };
}

macro_rules! view_sentinel {
    () => {
        None
    };
    ($niche:expr) => {
        Some($niche)
    };
}

macro_rules! view_span {
    (node $name:ident $lt:lifetime) => {
        impl<$lt> $name<$lt> {
            pub fn start(&self) -> Result<u32, $crate::core::error::Error> {
                self.ast.read_u32(self.ast.locate(self.pos, $crate::core::format::SPAN_START)?)
            }

            pub fn end(&self) -> Result<u32, $crate::core::error::Error> {
                self.ast.read_u32(self.ast.locate(self.pos, $crate::core::format::SPAN_END)?)
            }

            pub fn span(&self) -> Result<$crate::ast::Span, $crate::core::error::Error> {
                let [start, end] = self.ast.read_tuple::<2>(self.pos)?;
                Ok($crate::ast::Span { start, end })
            }
        }
    };
    (record $name:ident $lt:lifetime) => {};
}

macro_rules! view_walk {
    (node $name:ident, $ast:ident, $pos:ident, $visitor:ident, $children:block) => {{
        let node = if $visitor.wants($crate::ast::NodeType::$name) {
            let node = $crate::ast::AnyNode::$name($name::new($ast, $pos));
            $visitor.enter(&node)?;
            Some(node)
        } else {
            None
        };
        $children
        if let Some(node) = node {
            $visitor.exit(&node)?;
        }
        Ok(())
    }};
    (record $name:ident, $ast:ident, $pos:ident, $visitor:ident, $children:block) => {{
        let _ = (&$ast, &$pos, &$visitor);
        $children
        Ok(())
    }};
}

macro_rules! view_record_header {
    (node $name:ident, $self_:ident, $map:ident, $options:ident) => {
        let span = $self_.span()?;
        $map.insert("type".to_string(), ::serde_json::Value::from(stringify!($name)));
        $map.insert("start".to_string(), ::serde_json::Value::from(span.start));
        $map.insert("end".to_string(), ::serde_json::Value::from(span.end));
        if $options.range {
            $map.insert("range".to_string(), ::serde_json::json!([span.start, span.end]));
        }
    };
    (record $name:ident, $self_:ident, $map:ident, $options:ident) => {
        let _ = $options;
    };
}

// Parentheses are dropped from snapshots unless the options keep them.
macro_rules! view_record_unwrap {
    (ParenthesizedExpression, $self_:ident, $options:ident) => {
        if !$options.preserve_parens {
            return $self_.expression()?.to_record_with($options);
        }
    };
    ($name:ident, $self_:ident, $options:ident) => {};
}

// Derived keys that have no slot of their own.
macro_rules! view_record_extras {
    (Comment, $self_:ident, $map:ident) => {
        $map.insert("value".to_string(), ::serde_json::Value::from($self_.text()?));
    };
    ($name:ident, $self_:ident, $map:ident) => {};
}

/// Declares tagged unions.
///
/// ```text
/// define_unions! { 'a;
///     /// doc
///     union Name [none = 51] {
///         0 => Variant(boxed Target),
///         1 => Other(inline Target),
///         2 => Unit,
///         ..SharedUnion,
///     }
/// }
/// ```
///
/// `..SharedUnion` accepts every discriminant the shared union accepts and delegates to its
/// table, so shared variant sets are declared once.
macro_rules! define_unions {
    (
        $lt:lifetime;
        $(
            $(#[$meta:meta])*
            union $name:ident [$(none = $none:literal)?] {
                $( $disc:literal => $variant:ident $( ( $mode:ident $target:ident ) )? , )*
                $( .. $inherit:ident , )*
            }
        )*
    ) => {
        $(
            $(#[$meta])*
            pub enum $name<$lt> {
                $( $variant $( (Box<$target<$lt>>) )?, )*
                $( $inherit($inherit<$lt>), )*
            }

            impl<$lt> $name<$lt> {
                pub const NAME: &'static str = stringify!($name);
                pub const NONE: Option<u8> = union_none!($($none)?);
                pub const LAYOUT: $crate::ast::layout::UnionLayout = $crate::ast::layout::UnionLayout {
                    name: stringify!($name),
                    none: union_none!($($none)?),
                    payload_offset: $crate::core::format::UNION_PAYLOAD,
                    variants: &[
                        $(
                            $crate::ast::layout::VariantLayout {
                                discriminant: $disc,
                                variant: stringify!($variant),
                                target: union_target!($($target)?),
                                payload: union_payload!($($mode)?),
                            },
                        )*
                    ],
                    inherits: &[ $( stringify!($inherit), )* ],
                };

                /// True when `discriminant` maps to a variant, directly or through a shared set.
                pub fn accepts(discriminant: u8) -> bool {
                    false $( || discriminant == $disc )* $( || $inherit::accepts(discriminant) )*
                }

                /// Reads the discriminant at `pos` and builds the matching variant.
                pub fn decode_at(
                    ast: &$lt $crate::core::raw::RawTransfer,
                    pos: u32,
                ) -> Result<Self, $crate::core::error::Error> {
                    let discriminant = ast.read_u8(pos)?;
                    match discriminant {
                        $( $disc => Ok(union_build!($variant, ast, pos $(, $mode $target)?)), )*
                        _ => {
                            $(
                                if $inherit::accepts(discriminant) {
                                    return $inherit::decode_at(ast, pos).map(Self::$inherit);
                                }
                            )*
                            Err($crate::ast::union_mismatch(Self::NAME, discriminant, pos))
                        }
                    }
                }

                pub(crate) fn walk_at(
                    ast: &$lt $crate::core::raw::RawTransfer,
                    pos: u32,
                    visitor: &mut $crate::traverse::Visitor<$lt>,
                ) -> Result<(), $crate::core::error::Error> {
                    let discriminant = ast.read_u8(pos)?;
                    match discriminant {
                        $( $disc => union_walk!(ast, pos, visitor $(, $mode $target)?), )*
                        _ => {
                            $(
                                if $inherit::accepts(discriminant) {
                                    return $inherit::walk_at(ast, pos, visitor);
                                }
                            )*
                            Err($crate::ast::union_mismatch(Self::NAME, discriminant, pos))
                        }
                    }
                }

                /// Name of the concrete variant, following shared sets down to the leaf.
                pub fn variant_name(&self) -> &'static str {
                    match self {
                        $( union_pattern!($variant, _ $(, $target)?) => stringify!($variant), )*
                        $( Self::$inherit(inner) => inner.variant_name(), )*
                    }
                }
            }

            impl<$lt> $crate::ast::codec::Codec<$lt> for $name<$lt> {
                type Output = Self;
                const SLOT: $crate::ast::layout::Slot =
                    $crate::ast::layout::Slot::new($crate::ast::layout::SlotKind::Union(stringify!($name)));

                fn decode(
                    ast: &$lt $crate::core::raw::RawTransfer,
                    pos: u32,
                ) -> Result<Self, $crate::core::error::Error> {
                    Self::decode_at(ast, pos)
                }

                fn walk(
                    ast: &$lt $crate::core::raw::RawTransfer,
                    pos: u32,
                    visitor: &mut $crate::traverse::Visitor<$lt>,
                ) -> Result<(), $crate::core::error::Error> {
                    Self::walk_at(ast, pos, visitor)
                }
            }

            $(
                impl<$lt> $crate::ast::codec::Optional<$lt> for $name<$lt> {
                    const SENTINEL: $crate::ast::layout::Sentinel =
                        $crate::ast::layout::Sentinel::Byte { offset: 0, value: $none };
                }
            )?

            impl<$lt> $crate::ast::codec::ToRecord for $name<$lt> {
                fn to_record_with(
                    &self,
                    options: &$crate::ast::codec::SnapshotOptions,
                ) -> Result<::serde_json::Value, $crate::core::error::Error> {
                    #[allow(unused_imports)]
                    use $crate::ast::codec::ToRecord as _;
                    match self {
                        $(
                            union_pattern!($variant, payload $(, $target)?) =>
                                union_record!(stringify!($variant), payload, options $(, $target)?),
                        )*
                        $( Self::$inherit(inner) => inner.to_record_with(options), )*
                    }
                }
            }

            impl<$lt> ::std::fmt::Debug for $name<$lt> {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    write!(f, "{}::{}", stringify!($name), self.variant_name())
                }
            }
        )*
    };
}

macro_rules! union_none {
    () => {
        None
    };
    ($none:literal) => {
        Some($none)
    };
}

macro_rules! union_target {
    () => {
        None
    };
    ($target:ident) => {
        Some(stringify!($target))
    };
}

macro_rules! union_payload {
    () => {
        $crate::ast::layout::Payload::Unit
    };
    (boxed) => {
        $crate::ast::layout::Payload::Boxed
    };
    (inline) => {
        $crate::ast::layout::Payload::Inline
    };
}

macro_rules! union_build {
    ($variant:ident, $ast:ident, $pos:ident) => {
        Self::$variant
    };
    ($variant:ident, $ast:ident, $pos:ident, boxed $target:ident) => {
        Self::$variant(Box::new($target::new(
            $ast,
            $ast.read_ptr($ast.locate($pos, $crate::core::format::UNION_PAYLOAD)?)?,
        )))
    };
    ($variant:ident, $ast:ident, $pos:ident, inline $target:ident) => {
        Self::$variant(Box::new($target::new(
            $ast,
            $ast.locate($pos, $crate::core::format::UNION_PAYLOAD)?,
        )))
    };
}

macro_rules! union_walk {
    ($ast:ident, $pos:ident, $visitor:ident) => {
        Ok(())
    };
    ($ast:ident, $pos:ident, $visitor:ident, boxed $target:ident) => {
        $target::walk_at(
            $ast,
            $ast.read_ptr($ast.locate($pos, $crate::core::format::UNION_PAYLOAD)?)?,
            $visitor,
        )
    };
    ($ast:ident, $pos:ident, $visitor:ident, inline $target:ident) => {
        $target::walk_at($ast, $ast.locate($pos, $crate::core::format::UNION_PAYLOAD)?, $visitor)
    };
}

macro_rules! union_pattern {
    ($variant:ident, $binding:tt) => {
        Self::$variant
    };
    ($variant:ident, $binding:tt, $target:ident) => {
        Self::$variant($binding)
    };
}

macro_rules! union_record {
    ($variant:expr, $binding:ident, $options:ident) => {
        Ok($crate::ast::codec::unit_record($variant))
    };
    ($variant:expr, $binding:ident, $options:ident, $target:ident) => {
        $crate::ast::codec::variant_record($variant, $binding, $options)
    };
}

/// Declares byte-sized enums read in place.
///
/// ```text
/// define_enums! {
///     /// doc
///     enum Name [none = 2] {
///         0 => Variant = "spelling",
///     }
/// }
/// ```
macro_rules! define_enums {
    (
        $(
            $(#[$meta:meta])*
            enum $name:ident [$(none = $none:literal)?] {
                $( $value:literal => $variant:ident = $text:literal ),* $(,)?
            }
        )*
    ) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
            pub enum $name {
                $( $variant, )*
            }

            impl $name {
                pub fn from_u8(value: u8) -> Option<Self> {
                    match value {
                        $( $value => Some(Self::$variant), )*
                        _ => None,
                    }
                }

                /// Source spelling.
                pub fn as_str(self) -> &'static str {
                    match self {
                        $( Self::$variant => $text, )*
                    }
                }
            }

            impl ::std::fmt::Display for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl $crate::ast::codec::Scalar for $name {
                const NAME: &'static str = stringify!($name);

                fn read(
                    ast: &$crate::core::raw::RawTransfer,
                    pos: u32,
                ) -> Result<Self, $crate::core::error::Error> {
                    let value = ast.read_u8(pos)?;
                    Self::from_u8(value).ok_or_else(|| $crate::ast::union_mismatch(stringify!($name), value, pos))
                }
            }

            impl $crate::ast::codec::ToRecord for $name {
                fn to_record_with(
                    &self,
                    _options: &$crate::ast::codec::SnapshotOptions,
                ) -> Result<::serde_json::Value, $crate::core::error::Error> {
                    Ok(::serde_json::Value::from(self.as_str()))
                }
            }

            $(
                impl $crate::ast::codec::Scalar for Option<$name> {
                    const NAME: &'static str = concat!("Option<", stringify!($name), ">");
                    const SLOT: $crate::ast::layout::Slot =
                        $crate::ast::layout::Slot::new($crate::ast::layout::SlotKind::Scalar(stringify!($name)))
                            .optional($crate::ast::layout::Sentinel::Byte { offset: 0, value: $none });

                    fn read(
                        ast: &$crate::core::raw::RawTransfer,
                        pos: u32,
                    ) -> Result<Self, $crate::core::error::Error> {
                        let value = ast.read_u8(pos)?;
                        if value == $none {
                            return Ok(None);
                        }
                        $name::from_u8(value)
                            .map(Some)
                            .ok_or_else(|| $crate::ast::union_mismatch(stringify!($name), value, pos))
                    }
                }
            )?
        )*
    };
}
