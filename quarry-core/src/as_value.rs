use crate::{Affinity, ErrorKind, Expression, Function, Result, Value, ValueKind, truncate_long};
use std::sync::Arc;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

/// Type level marker telling whether a value may be NULL.
pub trait Nullability: Send + Sync + 'static {
    const NULLABLE: bool;
    /// Nullability of an expression combining `Self` with `N`.
    type Or<N: Nullability>: Nullability;
    /// The Rust type carrying a scalar `T` with this nullability.
    type Apply<T: Scalar>: AsValue<Base = T, Nullability = Self>;
}

/// The value is never NULL.
#[derive(Debug)]
pub struct NotNull;

/// The value may be NULL, represented as `Option<T>`.
#[derive(Debug)]
pub struct Nullable;

impl Nullability for NotNull {
    const NULLABLE: bool = false;
    type Or<N: Nullability> = N;
    type Apply<T: Scalar> = T;
}

impl Nullability for Nullable {
    const NULLABLE: bool = true;
    type Or<N: Nullability> = Nullable;
    type Apply<T: Scalar> = Option<T>;
}

/// Result type of a binary expression over `L` and `R` producing the scalar `O`.
///
/// Nullable if either side is nullable.
pub type Promoted<L, R, O> = <<<L as AsValue>::Nullability as Nullability>::Or<
    <R as AsValue>::Nullability,
> as Nullability>::Apply<O>;

/// Rust types that can be stored in a column and bound to a statement.
pub trait AsValue: Sized + Send + Sync + 'static {
    type Nullability: Nullability;
    /// The non nullable scalar this type is built on.
    type Base: Scalar;

    fn kind() -> ValueKind {
        <Self::Base as Scalar>::KIND
    }
    fn as_value(&self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>;
}

/// Non nullable column types.
///
/// Custom types stored through a builtin affinity can rewrite expressions when they are read in
/// comparisons or ordering, and when they are written by insert or update.
pub trait Scalar: AsValue<Base = Self, Nullability = NotNull> + Clone {
    const KIND: ValueKind;

    /// Wraps an expression of this type before it is compared or ordered.
    fn wrap_for_read(expression: Arc<dyn Expression>) -> Arc<dyn Expression>;
    /// Wraps an expression of this type before it is stored in a column.
    fn unwrap_for_write(expression: Arc<dyn Expression>) -> Arc<dyn Expression>;
}

/// Scalars supporting arithmetic.
pub trait Numeric: Scalar {}

impl Numeric for i64 {}
impl Numeric for f64 {}

fn unexpected(expected: ValueKind, value: &Value) -> crate::Error {
    match value {
        Value::Null => ErrorKind::Decode.error(format!(
            "Unexpected NULL for a non nullable {} column",
            expected
        )),
        _ => ErrorKind::Decode.error(format!(
            "Cannot decode {} value `{}` as {}",
            value.type_name(),
            truncate_long!(format!("{:?}", value)),
            expected
        )),
    }
}

macro_rules! impl_builtin_scalar {
    ($ty:ty, $kind:expr, |$this:ident| $encode:expr, $($pattern:pat => $decode:expr),+ $(,)?) => {
        impl AsValue for $ty {
            type Nullability = NotNull;
            type Base = $ty;

            fn as_value(&self) -> Value {
                let $this = self;
                $encode
            }

            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $($pattern => Ok($decode),)+
                    v => Err(unexpected($kind, &v)),
                }
            }
        }

        impl Scalar for $ty {
            const KIND: ValueKind = $kind;

            fn wrap_for_read(expression: Arc<dyn Expression>) -> Arc<dyn Expression> {
                expression
            }

            fn unwrap_for_write(expression: Arc<dyn Expression>) -> Arc<dyn Expression> {
                expression
            }
        }
    };
}

impl_builtin_scalar!(
    bool,
    ValueKind::Boolean,
    |v| Value::Boolean(*v),
    Value::Boolean(v) => v,
    Value::Integer(v @ (0 | 1)) => v == 1,
);

impl_builtin_scalar!(
    i64,
    ValueKind::Integer,
    |v| Value::Integer(*v),
    Value::Integer(v) => v,
    Value::Boolean(v) => v as i64,
);

impl_builtin_scalar!(
    f64,
    ValueKind::Real,
    |v| Value::Real(*v),
    Value::Real(v) => v,
    Value::Integer(v) => v as f64,
);

impl_builtin_scalar!(
    String,
    ValueKind::Text,
    |v| Value::Text(v.clone()),
    Value::Text(v) => v,
);

impl_builtin_scalar!(
    Vec<u8>,
    ValueKind::Blob,
    |v| Value::Blob(v.as_slice().into()),
    Value::Blob(v) => v.into_vec(),
    Value::Text(v) => v.into_bytes(),
);

static DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Dates are stored as `YYYY-MM-DD` text, compared through `julianday()` and normalized through
/// `date()` when written.
impl AsValue for Date {
    type Nullability = NotNull;
    type Base = Date;

    fn as_value(&self) -> Value {
        match self.format(DATE_FORMAT) {
            Ok(v) => Value::Text(v),
            Err(e) => {
                log::error!("Could not format date {:?}: {:#}", self, e);
                Value::Null
            }
        }
    }

    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(ref v) => Date::parse(v, DATE_FORMAT).map_err(|e| {
                ErrorKind::Decode.error(format!("Cannot decode `{}` as DATE: {}", v, e))
            }),
            v => Err(unexpected(<Self as Scalar>::KIND, &v)),
        }
    }
}

impl Scalar for Date {
    const KIND: ValueKind = ValueKind::Custom("DATE", Affinity::Text);

    fn wrap_for_read(expression: Arc<dyn Expression>) -> Arc<dyn Expression> {
        Arc::new(Function::new("julianday", vec![expression]))
    }

    fn unwrap_for_write(expression: Arc<dyn Expression>) -> Arc<dyn Expression> {
        Arc::new(Function::new("date", vec![expression]))
    }
}

impl<T: Scalar> AsValue for Option<T> {
    type Nullability = Nullable;
    type Base = T;

    fn as_value(&self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }

    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from_value(v).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AsValue, Nullability, Nullable, Promoted};
    use crate::{ErrorKind, Value, ValueKind};
    use time::macros::date;

    #[test]
    fn builtin_round_trip() {
        assert_eq!(i64::try_from_value(Value::Integer(7)).unwrap(), 7);
        assert!(bool::try_from_value(Value::Integer(1)).unwrap());
        assert_eq!(f64::try_from_value(Value::Integer(2)).unwrap(), 2.0);
        assert_eq!(
            Option::<String>::try_from_value(Value::Null).unwrap(),
            None
        );
        assert_eq!(Some(3_i64).as_value(), Value::Integer(3));
        assert_eq!(<Option<f64>>::kind(), ValueKind::Real);
    }

    #[test]
    fn null_into_non_nullable_is_decode_error() {
        let error = i64::try_from_value(Value::Null).unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Decode));
        let error = String::try_from_value(Value::Integer(5)).unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Decode));
    }

    #[test]
    fn dates_are_text() {
        let value = date!(2024 - 02 - 29).as_value();
        assert_eq!(value, Value::Text("2024-02-29".into()));
        assert_eq!(
            time::Date::try_from_value(value).unwrap(),
            date!(2024 - 02 - 29)
        );
        let error = time::Date::try_from_value(Value::Text("29/02/2024".into())).unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Decode));
    }

    #[test]
    fn promotion() {
        fn nullable<T: AsValue>() -> bool {
            <T::Nullability as Nullability>::NULLABLE
        }
        assert!(!nullable::<Promoted<i64, i64, bool>>());
        assert!(nullable::<Promoted<Option<i64>, i64, bool>>());
        assert!(nullable::<Promoted<i64, Option<i64>, bool>>());
        assert!(<Nullable as Nullability>::NULLABLE);
    }
}
