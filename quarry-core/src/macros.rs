/// Declares a struct mapped to a table together with its typed columns.
///
/// ```rust,ignore
/// quarry::entity! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Person as PersonColumns in "person" {
///         pub id: i64 => primary_key(),
///         pub name: String,
///         pub manager: Option<i64> => references("person", "id"),
///     }
/// }
///
/// let person = Person::table();
/// let query = quarry::select(&person).from(&person).where_(person.name.eq("Alice"));
/// ```
///
/// The column roles after `=>` are the builder methods of [`ColumnDef`](crate::ColumnDef):
/// `primary_key()`, `unique()`, `references(table, column)` and `default_value(value)`.
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident as $columns:ident in $table:literal {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(=> $($role:ident($($arg:expr),*))+)?
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )+
        }

        #[allow(dead_code)]
        $vis struct $columns {
            $(pub $field: $crate::Column<$ty>,)+
        }

        impl $crate::Entity for $name {
            type Columns = $columns;

            fn table_def() -> &'static $crate::TableDef {
                static DEFINITION: ::std::sync::LazyLock<$crate::TableDef> =
                    ::std::sync::LazyLock::new(|| {
                        $crate::TableDef::new(
                            $crate::Identifier::from_static($table),
                            vec![$(
                                $crate::ColumnDef::new::<$ty>(stringify!($field))
                                    $($(.$role($($arg),*))+)?
                            ),+],
                        )
                    });
                &DEFINITION
            }

            fn columns(table: &$crate::TableRef) -> Self::Columns {
                $columns {
                    $($field: table.column::<$ty>(stringify!($field)),)+
                }
            }

            fn from_row(row: &mut $crate::RowDecoder<'_>) -> $crate::Result<Self> {
                Ok(Self {
                    $($field: row.decode::<$ty>()?,)+
                })
            }

            fn row_values(&self) -> Vec<$crate::Value> {
                vec![$($crate::AsValue::as_value(&self.$field)),+]
            }
        }
    };
}
