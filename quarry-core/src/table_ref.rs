use crate::{
    AsValue, Column, ErrorKind, Expression, HashKey, Identifier, Nullability, Parameters, Result,
    SqlWriter, Statement, ValueKind, util::lock, writer::Context,
};
use std::{
    collections::BTreeSet,
    fmt::{self, Debug, Formatter},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process wide unique id for table references and common table expressions.
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// What a table reference reads from.
#[derive(Debug, Clone)]
pub enum TableSource {
    /// Schema table.
    Table(Identifier),
    /// Common table expression declared in a `WITH` clause, by id.
    Cte(u64),
    /// Nested select, `(SELECT ...) AS t1`.
    Derived(Arc<dyn Statement>),
}

/// Field exposed by a table reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub name: Identifier,
    pub kind: ValueKind,
    pub nullable: bool,
}

struct TableRefInner {
    id: u64,
    source: TableSource,
    fields: Mutex<Vec<FieldSlot>>,
}

/// A single use of a table inside a statement.
///
/// Each reference has its own identity: the same schema table referenced twice (a self join) gives
/// two references and two aliases. Cloning keeps the identity.
#[derive(Clone)]
pub struct TableRef(Arc<TableRefInner>);

impl TableRef {
    /// New reference without fields, they are added by [`TableRef::register_field`].
    pub fn new(source: TableSource) -> Self {
        Self(Arc::new(TableRefInner {
            id: next_id(),
            source,
            fields: Mutex::new(Vec::new()),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn source(&self) -> &TableSource {
        &self.0.source
    }

    /// Name of the schema table, if the reference reads one directly.
    pub fn table_name(&self) -> Option<&Identifier> {
        match &self.0.source {
            TableSource::Table(name) => Some(name),
            _ => None,
        }
    }

    /// Registers a field on this reference, the first registration of a name wins.
    ///
    /// Registering the same name again with the same kind and nullability returns the existing
    /// field, anything else is a build error.
    pub fn register_field(
        &self,
        name: Identifier,
        kind: ValueKind,
        nullable: bool,
    ) -> Result<FieldRef> {
        let mut fields = lock(&self.0.fields);
        if let Some(existing) = fields.iter().find(|v| v.name == name) {
            if existing.kind != kind || existing.nullable != nullable {
                return Err(ErrorKind::Build.error(format!(
                    "Field {:?} is already registered as {}{}, cannot register it as {}{}",
                    name,
                    existing.kind,
                    if existing.nullable { " NULL" } else { "" },
                    kind,
                    if nullable { " NULL" } else { "" },
                )));
            }
        } else {
            fields.push(FieldSlot {
                name: name.clone(),
                kind,
                nullable,
            });
        }
        Ok(FieldRef {
            table: self.clone(),
            name,
            kind,
        })
    }

    pub fn field(&self, name: &str) -> Result<FieldRef> {
        lock(&self.0.fields)
            .iter()
            .find(|v| v.name == *name)
            .map(|v| FieldRef {
                table: self.clone(),
                name: v.name.clone(),
                kind: v.kind,
            })
            .ok_or_else(|| ErrorKind::Build.error(format!("Unknown field `{}`", name)))
    }

    pub fn fields(&self) -> Vec<FieldSlot> {
        lock(&self.0.fields).clone()
    }

    /// Typed column of this reference, registering the field on first use.
    ///
    /// Generated entity columns go through here. A name already registered with another type keeps
    /// its first registration, the conflict is logged and the column reads the registered field.
    pub fn column<T: AsValue>(&self, name: &'static str) -> Column<T> {
        let name = Identifier::from_static(name);
        let nullable = <T::Nullability as Nullability>::NULLABLE;
        match self.register_field(name.clone(), T::kind(), nullable) {
            Ok(field) => Column::new(field),
            Err(error) => {
                log::error!("{:#}", error);
                let kind = self.field(name.as_str()).map_or(T::kind(), |v| v.kind);
                Column::new(FieldRef {
                    table: self.clone(),
                    name,
                    kind,
                })
            }
        }
    }

    /// Hash of the reference where it is declared (`FROM`, `JOIN`, target of a write).
    pub fn declaration_hash(&self, context: &mut Context) -> HashKey {
        let source = match &self.0.source {
            TableSource::Table(name) => HashKey::identifier(name),
            TableSource::Cte(id) => HashKey::identifier(&context.cte_alias(*id)),
            TableSource::Derived(statement) => statement.hash_key(context),
        };
        HashKey::composite([source, HashKey::identifier(&context.table_alias(self))])
    }

    pub fn bind_parameters(&self, parameters: &mut Parameters) {
        if let TableSource::Derived(statement) = &self.0.source {
            statement.bind_parameters(parameters);
        }
    }

    pub fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        match &self.0.source {
            TableSource::Table(name) => {
                tables.insert(name.clone());
            }
            TableSource::Cte(..) => {}
            TableSource::Derived(statement) => statement.related_tables(tables),
        }
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TableRef {}

impl Debug for TableRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0.source {
            TableSource::Table(name) => write!(f, "TableRef({:?}#{})", name, self.0.id),
            TableSource::Cte(id) => write!(f, "TableRef(cte#{}#{})", id, self.0.id),
            TableSource::Derived(..) => write!(f, "TableRef(derived#{})", self.0.id),
        }
    }
}

/// Field of a table reference, `t0."name"`.
#[derive(Debug, Clone)]
pub struct FieldRef {
    pub table: TableRef,
    pub name: Identifier,
    pub kind: ValueKind,
}

impl Expression for FieldRef {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_field_ref(context, out, self)
    }

    fn hash_key(&self, context: &mut Context) -> HashKey {
        HashKey::Qualified(context.table_alias(&self.table), self.name.clone())
    }

    fn bind_parameters(&self, _parameters: &mut Parameters) {}

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        self.table.related_tables(tables);
    }
}

#[cfg(test)]
mod tests {
    use super::{TableRef, TableSource};
    use crate::{Entity, ErrorKind, Identifier, ValueKind};

    crate::entity! {
        #[derive(Debug)]
        struct Gadget as GadgetColumns in "gadget" {
            id: i64 => primary_key(),
            label: Option<String>,
        }
    }

    fn name(value: &str) -> Identifier {
        Identifier::new(value).expect("Failed to create the identifier")
    }

    #[test]
    fn first_registration_wins() {
        let table = TableRef::new(TableSource::Table(name("gadget")));
        let first = table
            .register_field(name("label"), ValueKind::Text, true)
            .expect("Failed to register the field");
        let again = table
            .register_field(name("label"), ValueKind::Text, true)
            .expect("Registering the same field twice is allowed");
        assert_eq!(first.table, again.table);
        assert_eq!(first.name, again.name);
        assert_eq!(table.fields().len(), 1);

        let error = table
            .register_field(name("label"), ValueKind::Integer, true)
            .expect_err("A different kind is rejected");
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
        let error = table
            .register_field(name("label"), ValueKind::Text, false)
            .expect_err("A different nullability is rejected");
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
        let slots = table.fields();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].kind, ValueKind::Text);
        assert!(slots[0].nullable);
    }

    #[test]
    fn lookup_by_name() {
        let table = TableRef::new(TableSource::Table(name("gadget")));
        table
            .register_field(name("id"), ValueKind::Integer, false)
            .expect("Failed to register the field");
        let field = table.field("id").expect("The field is registered");
        assert_eq!(field.kind, ValueKind::Integer);
        assert_eq!(field.table, table);
        let error = table.field("missing").expect_err("Unknown fields are an error");
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
    }

    #[test]
    fn entity_columns_register_their_fields() {
        let gadget = Gadget::table();
        let slots = gadget.reference().fields();
        assert_eq!(
            slots.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["id", "label"]
        );
        assert!(!slots[0].nullable);
        assert!(slots[1].nullable);
        assert_eq!(
            gadget
                .reference()
                .field("label")
                .expect("The column is registered")
                .kind,
            ValueKind::Text
        );

        // A column with another type keeps the registered field
        let label = gadget.reference().column::<i64>("label");
        assert_eq!(label.field().kind, ValueKind::Text);
        assert_eq!(gadget.reference().fields().len(), 2);
    }
}
