//! Purpose: Slot codecs that turn a field offset into a decoded value.
//! Exports: `View`, `Codec`, `Optional`, `Niche`, `Scalar`, `ToRecord`, `SnapshotOptions`,
//! and the codec markers `Str`, `Inline`, `Boxed`, `Seq`, `Opt`.
//! Role: The view macros declare each field as a codec type; decoding, walking, snapshot
//! and layout description all dispatch through these traits.
//! Invariants: A codec never decodes more than its own slot; children stay lazy views.
//! Invariants: Vec codecs check the element run against the buffer before iterating.

use std::marker::PhantomData;

use serde_json::{Map, Number, Value};

use crate::ast::layout::{Sentinel, Slot, SlotKind};
use crate::core::error::Error;
use crate::core::format::{VEC_LEN, VEC_PTR};
use crate::core::raw::RawTransfer;
use crate::traverse::Visitor;

/// A typed window over one record.
pub trait View<'a>: Sized + ToRecord {
    const NAME: &'static str;

    fn construct(ast: &'a RawTransfer, pos: u32) -> Self;

    fn walk(ast: &'a RawTransfer, pos: u32, visitor: &mut Visitor<'a>) -> Result<(), Error>;
}

/// Records that can sit inline in an optional slot.
pub trait Niche {
    const SENTINEL: Sentinel;
}

pub trait Codec<'a> {
    type Output: ToRecord;
    const SLOT: Slot;

    fn decode(ast: &'a RawTransfer, pos: u32) -> Result<Self::Output, Error>;

    fn walk(_ast: &'a RawTransfer, _pos: u32, _visitor: &mut Visitor<'a>) -> Result<(), Error> {
        Ok(())
    }
}

/// Codecs with a "none" byte pattern.
pub trait Optional<'a>: Codec<'a> {
    const SENTINEL: Sentinel;
}

/// Fixed-width values decoded in place on every read.
pub trait Scalar: Sized + ToRecord {
    const NAME: &'static str;
    const SLOT: Slot = Slot::new(SlotKind::Scalar(Self::NAME));

    fn read(ast: &RawTransfer, pos: u32) -> Result<Self, Error>;
}

/// Shape knobs for snapshots.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SnapshotOptions {
    /// Adds `"range": [start, end]` to every node.
    pub range: bool,
    /// When false, `ParenthesizedExpression` nodes snapshot as the expression they wrap.
    pub preserve_parens: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            range: false,
            preserve_parens: true,
        }
    }
}

impl SnapshotOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, range: bool) -> Self {
        self.range = range;
        self
    }

    pub fn with_preserve_parens(mut self, preserve_parens: bool) -> Self {
        self.preserve_parens = preserve_parens;
        self
    }
}

/// Plain-tree snapshot of a decoded value.
pub trait ToRecord {
    fn to_record_with(&self, options: &SnapshotOptions) -> Result<Value, Error>;

    fn to_record(&self) -> Result<Value, Error> {
        self.to_record_with(&SnapshotOptions::default())
    }
}

pub struct Str;

pub struct Inline<T>(PhantomData<T>);

pub struct Boxed<T>(PhantomData<T>);

pub struct Seq<C, const STRIDE: u32>(PhantomData<C>);

pub struct Opt<C>(PhantomData<C>);

impl<'a> Codec<'a> for Str {
    type Output = &'a str;
    const SLOT: Slot = Slot::new(SlotKind::Str);

    fn decode(ast: &'a RawTransfer, pos: u32) -> Result<&'a str, Error> {
        ast.read_str(pos)
    }
}

impl<'a> Optional<'a> for Str {
    const SENTINEL: Sentinel = Sentinel::NullPointer { offset: 0 };
}

impl<'a, T: View<'a>> Codec<'a> for Inline<T> {
    type Output = T;
    const SLOT: Slot = Slot::new(SlotKind::Record(T::NAME));

    fn decode(ast: &'a RawTransfer, pos: u32) -> Result<T, Error> {
        Ok(T::construct(ast, pos))
    }

    fn walk(ast: &'a RawTransfer, pos: u32, visitor: &mut Visitor<'a>) -> Result<(), Error> {
        T::walk(ast, pos, visitor)
    }
}

impl<'a, T: View<'a> + Niche> Optional<'a> for Inline<T> {
    const SENTINEL: Sentinel = T::SENTINEL;
}

impl<'a, T: View<'a>> Codec<'a> for Boxed<T> {
    type Output = T;
    const SLOT: Slot = Slot::new(SlotKind::Record(T::NAME)).boxed();

    fn decode(ast: &'a RawTransfer, pos: u32) -> Result<T, Error> {
        let ptr = ast.read_ptr(pos)?;
        Ok(T::construct(ast, ptr))
    }

    fn walk(ast: &'a RawTransfer, pos: u32, visitor: &mut Visitor<'a>) -> Result<(), Error> {
        let ptr = ast.read_ptr(pos)?;
        T::walk(ast, ptr, visitor)
    }
}

impl<'a, T: View<'a>> Optional<'a> for Boxed<T> {
    const SENTINEL: Sentinel = Sentinel::NullPointer { offset: 0 };
}

/// Reads a vec slot. Empty vecs never touch their pointer.
///
/// `check_run` keeps every element offset below the buffer length, so element positions
/// cannot wrap.
fn run(ast: &RawTransfer, pos: u32, stride: u32) -> Result<(u32, u32), Error> {
    let len = ast.read_u32(ast.locate(pos, VEC_LEN)?)?;
    if len == 0 {
        return Ok((0, 0));
    }
    let ptr = ast.read_u32(ast.locate(pos, VEC_PTR)?)?;
    ast.check_run(ptr, len, stride)?;
    Ok((ptr, len))
}

impl<'a, C: Codec<'a>, const STRIDE: u32> Codec<'a> for Seq<C, STRIDE> {
    type Output = Vec<C::Output>;
    const SLOT: Slot = C::SLOT.sequence(STRIDE);

    fn decode(ast: &'a RawTransfer, pos: u32) -> Result<Self::Output, Error> {
        let (ptr, len) = run(ast, pos, STRIDE)?;
        let mut out = Vec::with_capacity(len as usize);
        for index in 0..len {
            out.push(C::decode(ast, ptr + index * STRIDE)?);
        }
        Ok(out)
    }

    fn walk(ast: &'a RawTransfer, pos: u32, visitor: &mut Visitor<'a>) -> Result<(), Error> {
        let (ptr, len) = run(ast, pos, STRIDE)?;
        for index in 0..len {
            C::walk(ast, ptr + index * STRIDE, visitor)?;
        }
        Ok(())
    }
}

impl<'a, C: Codec<'a>, const STRIDE: u32> Optional<'a> for Seq<C, STRIDE> {
    const SENTINEL: Sentinel = Sentinel::NullPointer { offset: 0 };
}

impl<'a, C: Optional<'a>> Codec<'a> for Opt<C> {
    type Output = Option<C::Output>;
    const SLOT: Slot = C::SLOT.optional(C::SENTINEL);

    fn decode(ast: &'a RawTransfer, pos: u32) -> Result<Self::Output, Error> {
        if C::SENTINEL.is_none(ast, pos)? {
            return Ok(None);
        }
        C::decode(ast, pos).map(Some)
    }

    fn walk(ast: &'a RawTransfer, pos: u32, visitor: &mut Visitor<'a>) -> Result<(), Error> {
        if C::SENTINEL.is_none(ast, pos)? {
            return Ok(());
        }
        C::walk(ast, pos, visitor)
    }
}

impl Scalar for bool {
    const NAME: &'static str = "bool";

    fn read(ast: &RawTransfer, pos: u32) -> Result<Self, Error> {
        ast.read_bool(pos)
    }
}

impl Scalar for u8 {
    const NAME: &'static str = "u8";

    fn read(ast: &RawTransfer, pos: u32) -> Result<Self, Error> {
        ast.read_u8(pos)
    }
}

impl Scalar for u32 {
    const NAME: &'static str = "u32";

    fn read(ast: &RawTransfer, pos: u32) -> Result<Self, Error> {
        ast.read_u32(pos)
    }
}

impl Scalar for u64 {
    const NAME: &'static str = "u64";

    fn read(ast: &RawTransfer, pos: u32) -> Result<Self, Error> {
        ast.read_u64(pos)
    }
}

impl Scalar for f64 {
    const NAME: &'static str = "f64";

    fn read(ast: &RawTransfer, pos: u32) -> Result<Self, Error> {
        ast.read_f64(pos)
    }
}

impl ToRecord for bool {
    fn to_record_with(&self, _options: &SnapshotOptions) -> Result<Value, Error> {
        Ok(Value::Bool(*self))
    }
}

impl ToRecord for u8 {
    fn to_record_with(&self, _options: &SnapshotOptions) -> Result<Value, Error> {
        Ok(Value::from(*self))
    }
}

impl ToRecord for u32 {
    fn to_record_with(&self, _options: &SnapshotOptions) -> Result<Value, Error> {
        Ok(Value::from(*self))
    }
}

impl ToRecord for u64 {
    fn to_record_with(&self, _options: &SnapshotOptions) -> Result<Value, Error> {
        Ok(Value::from(*self))
    }
}

impl ToRecord for f64 {
    fn to_record_with(&self, _options: &SnapshotOptions) -> Result<Value, Error> {
        // JSON has no NaN or infinity.
        Ok(Number::from_f64(*self).map_or(Value::Null, Value::Number))
    }
}

impl ToRecord for &str {
    fn to_record_with(&self, _options: &SnapshotOptions) -> Result<Value, Error> {
        Ok(Value::String((*self).to_string()))
    }
}

impl<T: ToRecord> ToRecord for Option<T> {
    fn to_record_with(&self, options: &SnapshotOptions) -> Result<Value, Error> {
        match self {
            Some(value) => value.to_record_with(options),
            None => Ok(Value::Null),
        }
    }
}

impl<T: ToRecord> ToRecord for Vec<T> {
    fn to_record_with(&self, options: &SnapshotOptions) -> Result<Value, Error> {
        self.iter()
            .map(|item| item.to_record_with(options))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

impl<T: ToRecord + ?Sized> ToRecord for Box<T> {
    fn to_record_with(&self, options: &SnapshotOptions) -> Result<Value, Error> {
        (**self).to_record_with(options)
    }
}

/// Snapshot of a union payload. Payloads without their own `type` get the variant name.
pub(crate) fn variant_record(
    variant: &'static str,
    payload: &impl ToRecord,
    options: &SnapshotOptions,
) -> Result<Value, Error> {
    let mut value = payload.to_record_with(options)?;
    if let Value::Object(map) = &mut value {
        if !map.contains_key("type") {
            map.insert("kind".to_string(), Value::from(variant));
        }
    }
    Ok(value)
}

pub(crate) fn unit_record(variant: &'static str) -> Value {
    let mut map = Map::new();
    map.insert("kind".to_string(), Value::from(variant));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::js::{
        AssignmentTargetRest, BindingIdentifier, BindingPattern, CatchParameter, LabelIdentifier,
        StringLiteral,
    };
    use crate::ast::jsx::JSXAttributeValue;
    use crate::ast::module_record::NameSpan;
    use crate::ast::ts::TSType;
    use crate::ast::unions::{Declaration, ForStatementInit, ModuleExportName, Statement};
    use crate::core::raw::decode;
    use crate::core::writer::BufferWriter;

    /// Two zeroed 64-byte slots: the first carries the "none" pattern, the second does not.
    fn pair(sentinel: Sentinel, present: u8) -> RawTransfer {
        let mut bytes = vec![0u8; 1024];
        let mut writer = BufferWriter::new(&mut bytes, "").expect("writer");
        let absent = writer.alloc(64).expect("absent");
        let other = writer.alloc(64).expect("present");
        assert_eq!(other, absent + 64);
        match sentinel {
            Sentinel::Byte { offset, value } => {
                writer.put_u8(absent + offset, value).expect("none byte");
                writer.put_u8(other + offset, present).expect("present byte");
            }
            Sentinel::NullPointer { offset } => {
                writer.put_u32(other + offset, 8).expect("pointer");
            }
        }
        writer.finish(absent).expect("finish");
        decode(bytes, "").expect("decode")
    }

    macro_rules! assert_presence {
        ($codec:ty, $sentinel:expr, $present:expr) => {{
            let sentinel = <$codec as Optional<'_>>::SENTINEL;
            assert_eq!(sentinel, $sentinel, "{}", stringify!($codec));
            let ast = pair(sentinel, $present);
            let absent = ast.data_pos();
            assert!(sentinel.is_none(&ast, absent).unwrap());
            assert!(!sentinel.is_none(&ast, absent + 64).unwrap());
            assert!(Opt::<$codec>::decode(&ast, absent).unwrap().is_none());
            assert!(Opt::<$codec>::decode(&ast, absent + 64).unwrap().is_some());
        }};
    }

    #[test]
    fn union_none_discriminants() {
        let byte = |value| Sentinel::Byte { offset: 0, value };
        assert_presence!(Statement<'_>, byte(70), 0);
        assert_presence!(ForStatementInit<'_>, byte(65), 64);
        assert_presence!(Declaration<'_>, byte(31), 32);
        assert_presence!(ModuleExportName<'_>, byte(3), 2);
        assert_presence!(JSXAttributeValue<'_>, byte(4), 1);
        assert_presence!(TSType<'_>, byte(38), 0);
    }

    #[test]
    fn inline_record_niches() {
        assert_presence!(
            Inline<BindingPattern<'_>>,
            Sentinel::Byte { offset: 24, value: 2 },
            0
        );
        assert_presence!(
            Inline<CatchParameter<'_>>,
            Sentinel::Byte { offset: 32, value: 2 },
            1
        );
        assert_presence!(
            Inline<StringLiteral<'_>>,
            Sentinel::Byte { offset: 40, value: 2 },
            0
        );
        assert_presence!(
            Inline<AssignmentTargetRest<'_>>,
            Sentinel::Byte { offset: 8, value: 51 },
            0
        );
        let null = |offset| Sentinel::NullPointer { offset };
        assert_presence!(Inline<BindingIdentifier<'_>>, null(8), 0);
        assert_presence!(Inline<LabelIdentifier<'_>>, null(8), 0);
        assert_presence!(Inline<NameSpan<'_>>, null(8), 0);
        assert_presence!(Boxed<StringLiteral<'_>>, null(0), 0);
        assert_presence!(Str, null(0), 0);
    }

    #[test]
    fn opt_never_decodes_absent_payload() {
        // A none byte followed by a wild pointer must not be dereferenced.
        let mut bytes = vec![0u8; 256];
        let mut writer = BufferWriter::new(&mut bytes, "").expect("writer");
        let slot = writer.alloc(16).expect("slot");
        writer.put_u8(slot, 70).expect("none");
        writer.put_u32(slot + 8, u32::MAX).expect("wild");
        writer.finish(slot).expect("finish");
        let ast = decode(bytes, "").expect("decode");
        assert!(Opt::<Statement<'_>>::decode(&ast, ast.data_pos()).unwrap().is_none());
    }
}
