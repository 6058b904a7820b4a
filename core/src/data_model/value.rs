//! Attribute values and the codec that builds them from value descriptors.
//!
//! A descriptor carries a type tag, an optional payload and, for numeric
//! types, optional bounds. Resolution per tag:
//!
//! 1. a present payload is decoded and used,
//! 2. otherwise a nullable attribute gets the type's null representative,
//! 3. otherwise the type's zero or empty value.

use num_traits::FromPrimitive;

use crate::{
    constants::{LONG_STRING_MAX_LEN, SHORT_STRING_MAX_LEN},
    error::ValueError,
    message::command::value::Kind,
};

/// Value type tags as they appear on the wire.
#[repr(i32)]
#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean = 1,
    Float = 3,
    Array = 4,
    CharString = 5,
    OctetString = 6,
    Int8 = 7,
    UInt8 = 8,
    Int16 = 9,
    UInt16 = 10,
    Int32 = 11,
    UInt32 = 12,
    Int64 = 13,
    UInt64 = 14,
    Enum8 = 15,
    Bitmap8 = 16,
    Bitmap16 = 17,
    Bitmap32 = 18,
    Enum16 = 19,
    LongCharString = 20,
    LongOctetString = 21,
}

impl ValueType {
    pub fn from_raw(raw: i32) -> Result<Self, ValueError> {
        Self::from_i32(raw).ok_or(ValueError::UnknownType(raw))
    }

    /// Only ordered types can carry a (min, max) pair.
    pub const fn supports_bounds(&self) -> bool {
        !matches!(
            self,
            ValueType::Boolean
                | ValueType::Float
                | ValueType::Array
                | ValueType::CharString
                | ValueType::LongCharString
                | ValueType::OctetString
                | ValueType::LongOctetString
        )
    }

    /// Types for which a maximum size can be requested at creation.
    pub const fn is_sized(&self) -> bool {
        matches!(
            self,
            ValueType::CharString
                | ValueType::LongCharString
                | ValueType::OctetString
                | ValueType::LongOctetString
        )
    }
}

/// A numeric value, either of a plain type or of its nullable counterpart.
/// A nullable slot holding `None` is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar<T> {
    NonNullable(T),
    Nullable(Option<T>),
}

impl<T: Copy> Scalar<T> {
    pub const fn with(value: T, nullable: bool) -> Self {
        if nullable {
            Scalar::Nullable(Some(value))
        } else {
            Scalar::NonNullable(value)
        }
    }

    pub fn value(&self) -> Option<T> {
        match self {
            Scalar::NonNullable(v) => Some(*v),
            Scalar::Nullable(v) => *v,
        }
    }

    pub const fn is_nullable(&self) -> bool {
        matches!(self, Scalar::Nullable(_))
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Scalar::Nullable(None))
    }
}

impl<T: Copy + Default> Scalar<T> {
    /// Null for nullable types, zero otherwise.
    fn empty(nullable: bool) -> Self {
        if nullable {
            Scalar::Nullable(None)
        } else {
            Scalar::NonNullable(T::default())
        }
    }
}

/// Array elements are kept encoded, the count is informational.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayValue {
    pub elements: Vec<u8>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Boolean(Scalar<bool>),
    Int8(Scalar<i8>),
    UInt8(Scalar<u8>),
    Int16(Scalar<i16>),
    UInt16(Scalar<u16>),
    Int32(Scalar<i32>),
    UInt32(Scalar<u32>),
    Int64(Scalar<i64>),
    UInt64(Scalar<u64>),
    Float(Scalar<f32>),
    /// Strings and octets have no distinct null, null is the empty value.
    CharString(String),
    LongCharString(String),
    OctetString(Vec<u8>),
    LongOctetString(Vec<u8>),
    Bitmap8(Scalar<u8>),
    Bitmap16(Scalar<u16>),
    Bitmap32(Scalar<u32>),
    Enum8(Scalar<u8>),
    Enum16(Scalar<u16>),
    Array(ArrayValue),
}

impl AttrValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            AttrValue::Boolean(_) => ValueType::Boolean,
            AttrValue::Int8(_) => ValueType::Int8,
            AttrValue::UInt8(_) => ValueType::UInt8,
            AttrValue::Int16(_) => ValueType::Int16,
            AttrValue::UInt16(_) => ValueType::UInt16,
            AttrValue::Int32(_) => ValueType::Int32,
            AttrValue::UInt32(_) => ValueType::UInt32,
            AttrValue::Int64(_) => ValueType::Int64,
            AttrValue::UInt64(_) => ValueType::UInt64,
            AttrValue::Float(_) => ValueType::Float,
            AttrValue::CharString(_) => ValueType::CharString,
            AttrValue::LongCharString(_) => ValueType::LongCharString,
            AttrValue::OctetString(_) => ValueType::OctetString,
            AttrValue::LongOctetString(_) => ValueType::LongOctetString,
            AttrValue::Bitmap8(_) => ValueType::Bitmap8,
            AttrValue::Bitmap16(_) => ValueType::Bitmap16,
            AttrValue::Bitmap32(_) => ValueType::Bitmap32,
            AttrValue::Enum8(_) => ValueType::Enum8,
            AttrValue::Enum16(_) => ValueType::Enum16,
            AttrValue::Array(_) => ValueType::Array,
        }
    }

    /// The default for a type that has no explicit value.
    pub fn empty(value_type: ValueType, nullable: bool) -> Self {
        match value_type {
            ValueType::Boolean => AttrValue::Boolean(Scalar::empty(nullable)),
            ValueType::Int8 => AttrValue::Int8(Scalar::empty(nullable)),
            ValueType::UInt8 => AttrValue::UInt8(Scalar::empty(nullable)),
            ValueType::Int16 => AttrValue::Int16(Scalar::empty(nullable)),
            ValueType::UInt16 => AttrValue::UInt16(Scalar::empty(nullable)),
            ValueType::Int32 => AttrValue::Int32(Scalar::empty(nullable)),
            ValueType::UInt32 => AttrValue::UInt32(Scalar::empty(nullable)),
            ValueType::Int64 => AttrValue::Int64(Scalar::empty(nullable)),
            ValueType::UInt64 => AttrValue::UInt64(Scalar::empty(nullable)),
            ValueType::Float => AttrValue::Float(Scalar::empty(nullable)),
            ValueType::CharString => AttrValue::CharString(String::new()),
            ValueType::LongCharString => AttrValue::LongCharString(String::new()),
            ValueType::OctetString => AttrValue::OctetString(Vec::new()),
            ValueType::LongOctetString => AttrValue::LongOctetString(Vec::new()),
            ValueType::Bitmap8 => AttrValue::Bitmap8(Scalar::empty(nullable)),
            ValueType::Bitmap16 => AttrValue::Bitmap16(Scalar::empty(nullable)),
            ValueType::Bitmap32 => AttrValue::Bitmap32(Scalar::empty(nullable)),
            ValueType::Enum8 => AttrValue::Enum8(Scalar::empty(nullable)),
            ValueType::Enum16 => AttrValue::Enum16(Scalar::empty(nullable)),
            ValueType::Array => AttrValue::Array(ArrayValue::default()),
        }
    }

    /// Length in bytes of string, octet and array values.
    pub fn len(&self) -> Option<usize> {
        match self {
            AttrValue::CharString(s) | AttrValue::LongCharString(s) => Some(s.len()),
            AttrValue::OctetString(b) | AttrValue::LongOctetString(b) => Some(b.len()),
            AttrValue::Array(a) => Some(a.elements.len()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            AttrValue::Boolean(v) => v.is_null(),
            AttrValue::Int8(v) => v.is_null(),
            AttrValue::UInt8(v) | AttrValue::Bitmap8(v) | AttrValue::Enum8(v) => v.is_null(),
            AttrValue::Int16(v) => v.is_null(),
            AttrValue::UInt16(v) | AttrValue::Bitmap16(v) | AttrValue::Enum16(v) => v.is_null(),
            AttrValue::Int32(v) => v.is_null(),
            AttrValue::UInt32(v) | AttrValue::Bitmap32(v) => v.is_null(),
            AttrValue::Int64(v) => v.is_null(),
            AttrValue::UInt64(v) => v.is_null(),
            AttrValue::Float(v) => v.is_null(),
            _ => false,
        }
    }
}

/// Inclusive (min, max) pair of the same type as the attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min: AttrValue,
    pub max: AttrValue,
}

macro_rules! integer {
    ($kind:expr, $ty:expr, $variant:path, $target:ty) => {
        match $kind {
            $variant(raw) => <$target>::try_from(*raw).map_err(|_| ValueError::OutOfRange {
                value_type: $ty,
                value: i128::from(*raw),
            }),
            _ => Err(ValueError::Mismatch($ty)),
        }
    };
}

fn text(kind: &Kind, value_type: ValueType, limit: usize) -> Result<String, ValueError> {
    let Kind::CharString(s) = kind else {
        return Err(ValueError::Mismatch(value_type));
    };
    check_len(value_type, s.len(), limit)?;
    Ok(s.clone())
}

fn octets(kind: &Kind, value_type: ValueType, limit: usize) -> Result<Vec<u8>, ValueError> {
    let Kind::OctetString(b) = kind else {
        return Err(ValueError::Mismatch(value_type));
    };
    check_len(value_type, b.len(), limit)?;
    Ok(b.clone())
}

fn check_len(value_type: ValueType, len: usize, limit: usize) -> Result<(), ValueError> {
    if len > limit {
        return Err(ValueError::TooLong {
            value_type,
            len,
            limit,
        });
    }
    Ok(())
}

/// Decode a payload that is known to be present.
pub fn decode(value_type: ValueType, kind: &Kind, nullable: bool) -> Result<AttrValue, ValueError> {
    let ty = value_type;
    let n = nullable;
    let value = match ty {
        ValueType::Boolean => match kind {
            Kind::B(b) => AttrValue::Boolean(Scalar::with(*b, n)),
            _ => return Err(ValueError::Mismatch(ty)),
        },
        ValueType::Int8 => AttrValue::Int8(Scalar::with(integer!(kind, ty, Kind::I8, i8)?, n)),
        ValueType::UInt8 => AttrValue::UInt8(Scalar::with(integer!(kind, ty, Kind::U8, u8)?, n)),
        ValueType::Int16 => AttrValue::Int16(Scalar::with(integer!(kind, ty, Kind::I16, i16)?, n)),
        ValueType::UInt16 => {
            AttrValue::UInt16(Scalar::with(integer!(kind, ty, Kind::U16, u16)?, n))
        }
        ValueType::Int32 => AttrValue::Int32(Scalar::with(integer!(kind, ty, Kind::I32, i32)?, n)),
        ValueType::UInt32 => {
            AttrValue::UInt32(Scalar::with(integer!(kind, ty, Kind::U32, u32)?, n))
        }
        ValueType::Int64 => AttrValue::Int64(Scalar::with(integer!(kind, ty, Kind::I64, i64)?, n)),
        ValueType::UInt64 => {
            AttrValue::UInt64(Scalar::with(integer!(kind, ty, Kind::U64, u64)?, n))
        }
        ValueType::Float => match kind {
            Kind::F(f) => AttrValue::Float(Scalar::with(*f, n)),
            _ => return Err(ValueError::Mismatch(ty)),
        },
        ValueType::CharString => AttrValue::CharString(text(kind, ty, SHORT_STRING_MAX_LEN)?),
        ValueType::LongCharString => {
            AttrValue::LongCharString(text(kind, ty, LONG_STRING_MAX_LEN)?)
        }
        ValueType::OctetString => AttrValue::OctetString(octets(kind, ty, SHORT_STRING_MAX_LEN)?),
        ValueType::LongOctetString => {
            AttrValue::LongOctetString(octets(kind, ty, LONG_STRING_MAX_LEN)?)
        }
        ValueType::Bitmap8 => {
            AttrValue::Bitmap8(Scalar::with(integer!(kind, ty, Kind::U8, u8)?, n))
        }
        ValueType::Bitmap16 => {
            AttrValue::Bitmap16(Scalar::with(integer!(kind, ty, Kind::U16, u16)?, n))
        }
        ValueType::Bitmap32 => {
            AttrValue::Bitmap32(Scalar::with(integer!(kind, ty, Kind::U32, u32)?, n))
        }
        ValueType::Enum8 => AttrValue::Enum8(Scalar::with(integer!(kind, ty, Kind::U8, u8)?, n)),
        ValueType::Enum16 => {
            AttrValue::Enum16(Scalar::with(integer!(kind, ty, Kind::U16, u16)?, n))
        }
        ValueType::Array => match kind {
            Kind::A(a) => AttrValue::Array(ArrayValue {
                elements: a.elements.clone(),
                count: a.n,
            }),
            _ => return Err(ValueError::Mismatch(ty)),
        },
    };
    Ok(value)
}

/// Produce the value of a new attribute.
pub fn resolve_value(
    value_type: ValueType,
    present: Option<&Kind>,
    nullable: bool,
) -> Result<AttrValue, ValueError> {
    match present {
        Some(kind) => decode(value_type, kind, nullable),
        None => Ok(AttrValue::empty(value_type, nullable)),
    }
}

/// Produce a bound pair. Fails for types that are not ordered rather than
/// dropping the bounds. An empty bound payload is a mismatch for ordered
/// types.
pub fn resolve_bounds(
    value_type: ValueType,
    min: Option<&Kind>,
    max: Option<&Kind>,
    nullable: bool,
) -> Result<Bounds, ValueError> {
    if !value_type.supports_bounds() {
        return Err(ValueError::BoundsType(value_type));
    }
    let (Some(min), Some(max)) = (min, max) else {
        return Err(ValueError::Mismatch(value_type));
    };
    Ok(Bounds {
        min: decode(value_type, min, nullable)?,
        max: decode(value_type, max, nullable)?,
    })
}

/// Validate a requested maximum size against the type and initial value.
/// Non sized types ignore the request.
pub fn resolve_max_size(
    value: &AttrValue,
    max_size: Option<u32>,
) -> Result<Option<u32>, ValueError> {
    let Some(max_size) = max_size else {
        return Ok(None);
    };
    if !value.value_type().is_sized() {
        tracing::debug!(
            value_type = ?value.value_type(),
            max_size,
            "ignoring maximum size for unsized type"
        );
        return Ok(None);
    }
    let len = value.len().unwrap_or_default();
    if len > max_size as usize {
        return Err(ValueError::ExceedsMaxSize { len, max_size });
    }
    Ok(Some(max_size))
}
