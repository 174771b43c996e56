use crate::{
    Entity, HashKey, Identifier, Parameters, Result, RowDecoder, SqlWriter, Statement, TableDef,
    TypedStatement, writer::Context,
};
use std::{
    collections::BTreeSet,
    fmt::{self, Debug, Formatter, Write},
    marker::PhantomData,
};

/// `CREATE TABLE` for the table of `E`.
pub struct CreateTable<E: Entity> {
    pub if_not_exists: bool,
    _entity: PhantomData<fn() -> E>,
}

pub fn create_table<E: Entity>() -> CreateTable<E> {
    CreateTable {
        if_not_exists: false,
        _entity: PhantomData,
    }
}

impl<E: Entity> CreateTable<E> {
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn definition(&self) -> &'static TableDef {
        E::table_def()
    }
}

impl<E: Entity> Debug for CreateTable<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateTable")
            .field("table", &E::table_def().name)
            .field("if_not_exists", &self.if_not_exists)
            .finish()
    }
}

impl<E: Entity> Statement for CreateTable<E> {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_create_table(context, out, E::table_def(), self.if_not_exists)
    }

    fn hash_key(&self, _context: &mut Context) -> HashKey {
        let def = E::table_def();
        HashKey::composite([
            HashKey::Symbol(if self.if_not_exists {
                "CREATE TABLE IF NOT EXISTS"
            } else {
                "CREATE TABLE"
            }),
            HashKey::identifier(&def.name),
            HashKey::List(
                ", ",
                def.columns
                    .iter()
                    .map(|v| {
                        let mut column = format!(
                            "{} {}{}{}{}",
                            v.name,
                            v.kind,
                            if v.nullable { "" } else { " NOT NULL" },
                            if v.primary_key { " PRIMARY KEY" } else { "" },
                            if v.unique { " UNIQUE" } else { "" },
                        );
                        if let Some(default) = &v.default {
                            let _ = write!(column, " DEFAULT {:?}", default);
                        }
                        if let Some(references) = &v.references {
                            let _ = write!(
                                column,
                                " REFERENCES {}({})",
                                references.table, references.name
                            );
                        }
                        column
                    })
                    .collect(),
            ),
        ])
    }

    fn bind_parameters(&self, _parameters: &mut Parameters) {}

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        tables.insert(E::table_def().name.clone());
    }
}

impl<E: Entity> TypedStatement for CreateTable<E> {
    type Row = ();

    fn decode_row(&self, _row: &mut RowDecoder<'_>) -> Result<Self::Row> {
        Ok(())
    }
}

/// `DROP TABLE` for the table of `E`.
pub struct DropTable<E: Entity> {
    pub if_exists: bool,
    _entity: PhantomData<fn() -> E>,
}

pub fn drop_table<E: Entity>() -> DropTable<E> {
    DropTable {
        if_exists: false,
        _entity: PhantomData,
    }
}

impl<E: Entity> DropTable<E> {
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}

impl<E: Entity> Debug for DropTable<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropTable")
            .field("table", &E::table_def().name)
            .field("if_exists", &self.if_exists)
            .finish()
    }
}

impl<E: Entity> Statement for DropTable<E> {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_drop_table(context, out, &E::table_def().name, self.if_exists)
    }

    fn hash_key(&self, _context: &mut Context) -> HashKey {
        HashKey::composite([
            HashKey::Symbol(if self.if_exists {
                "DROP TABLE IF EXISTS"
            } else {
                "DROP TABLE"
            }),
            HashKey::identifier(&E::table_def().name),
        ])
    }

    fn bind_parameters(&self, _parameters: &mut Parameters) {}

    fn related_tables(&self, tables: &mut BTreeSet<Identifier>) {
        tables.insert(E::table_def().name.clone());
    }
}

impl<E: Entity> TypedStatement for DropTable<E> {
    type Row = ();

    fn decode_row(&self, _row: &mut RowDecoder<'_>) -> Result<Self::Row> {
        Ok(())
    }
}
