use crate::{
    BinaryOp, Case, Cast, ColumnDef, CompoundBody, DeleteBody, FieldRef, Function, Identifier,
    IdentifierQuoting, InList, InsertBody, InsertSource, Join, Operand, Order, Ordered, SelectBody,
    Subquery, SubqueryKind, TableDef, TableRef, TableSource, UnaryOp, UnaryOpType, UpdateBody,
    Value, ValueKind, WithClause, separated_by,
    writer::{Context, Fragment},
};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

macro_rules! write_float {
    ($this:ident, $context:ident, $out:ident, $value:expr) => {{
        if $value.is_infinite() {
            $this.write_value_infinity($context, $out, $value.is_sign_negative());
        } else if $value.is_nan() {
            $this.write_value_nan($context, $out);
        } else {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        }
    }};
}

/// Dialect printer converting statements and expressions into SQL text.
///
/// Every method has a default implementation producing standard SQL, dialects override the few
/// that differ.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Whether table references written in the current fragment declare their alias.
    fn alias_declaration(&self, context: &Context) -> bool {
        context.fragment.alias_declaration()
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    /// Identifier as configured: always quoted, or bare unless it would be misread.
    fn write_identifier(&self, context: &mut Context, out: &mut String, value: &Identifier) {
        match context.quoting {
            IdentifierQuoting::Bare if value.is_bare_safe() => out.push_str(value.as_str()),
            _ => self.write_identifier_quoted(context, out, value.as_str()),
        }
    }

    /// Table reference, `"person" AS t0` where it is declared and `t0` elsewhere.
    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &TableRef) {
        if self.alias_declaration(context) {
            match value.source() {
                TableSource::Table(name) => self.write_identifier(context, out, name),
                TableSource::Cte(id) => out.push_str(context.cte_alias(*id).as_str()),
                TableSource::Derived(statement) => {
                    out.push('(');
                    statement.write_query(
                        self.as_dyn(),
                        &mut context.switch_fragment(Fragment::SqlSubquery),
                        out,
                    );
                    out.push(')');
                }
            }
            out.push_str(" AS ");
        }
        out.push_str(context.table_alias(value).as_str());
    }

    /// Qualified field, `t0."name"`.
    fn write_field_ref(&self, context: &mut Context, out: &mut String, value: &FieldRef) {
        out.push_str(context.table_alias(&value.table).as_str());
        out.push('.');
        self.write_identifier(context, out, &value.name);
    }

    /// SQL type of a column or cast target.
    fn write_column_type(&self, _context: &mut Context, out: &mut String, kind: ValueKind) {
        out.push_str(match kind {
            ValueKind::Boolean => "BOOLEAN",
            ValueKind::Integer => "INTEGER",
            ValueKind::Real => "REAL",
            ValueKind::Text => "TEXT",
            ValueKind::Blob => "BLOB",
            ValueKind::Custom(name, ..) => name,
        });
    }

    /// Inline literal value.
    fn write_value(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            Value::Null => self.write_value_null(context, out),
            Value::Boolean(v) => self.write_value_bool(context, out, *v),
            Value::Integer(v) => write_integer!(out, *v),
            Value::Real(v) => write_float!(self, context, out, *v),
            Value::Text(v) => self.write_value_string(context, out, v),
            Value::Blob(v) => self.write_value_blob(context, out, v),
        }
    }

    fn write_value_null(&self, _context: &mut Context, out: &mut String) {
        out.push_str("NULL");
    }

    /// Booleans are stored as integers.
    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push(['0', '1'][value as usize]);
    }

    /// Out of range literal that parses as infinity.
    fn write_value_infinity(&self, _context: &mut Context, out: &mut String, negative: bool) {
        out.push_str(if negative { "-9e999" } else { "9e999" });
    }

    /// NaN is stored as NULL.
    fn write_value_nan(&self, context: &mut Context, out: &mut String) {
        self.write_value_null(context, out);
    }

    /// Single quoted string, inner quotes doubled.
    fn write_value_string(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(context, out, value, '\'', "''");
        out.push('\'');
    }

    /// Hex blob literal, `X'CAFE'`.
    fn write_value_blob(&self, _context: &mut Context, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    /// Parameter placeholder, the value is bound at execution.
    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        context.placeholders += 1;
        out.push('?');
    }

    fn write_operand(&self, context: &mut Context, out: &mut String, value: &Operand) {
        match value {
            Operand::Parameter(..) => self.write_placeholder(context, out),
            Operand::Literal(v) => self.write_value(context, out, v),
            Operand::Null => self.write_value_null(context, out),
            Operand::Asterisk => out.push('*'),
        }
    }

    /// Binary operation, always parenthesized so the tree shape is preserved.
    fn write_binary_op(&self, context: &mut Context, out: &mut String, value: &BinaryOp) {
        out.push('(');
        value.lhs.write_query(self.as_dyn(), context, out);
        out.push(' ');
        out.push_str(value.op.symbol());
        out.push(' ');
        value.rhs.write_query(self.as_dyn(), context, out);
        out.push(')');
    }

    fn write_unary_op(&self, context: &mut Context, out: &mut String, value: &UnaryOp) {
        out.push('(');
        match value.op {
            UnaryOpType::Not => out.push_str("NOT "),
            UnaryOpType::Negative => out.push('-'),
            UnaryOpType::IsNull | UnaryOpType::IsNotNull => {}
        }
        let start = out.len();
        value.arg.write_query(self.as_dyn(), context, out);
        if value.op == UnaryOpType::Negative && out[start..].starts_with('-') {
            // `--` starts a comment
            out.insert(start, ' ');
        }
        match value.op {
            UnaryOpType::IsNull => out.push_str(" IS NULL"),
            UnaryOpType::IsNotNull => out.push_str(" IS NOT NULL"),
            UnaryOpType::Not | UnaryOpType::Negative => {}
        }
        out.push(')');
    }

    fn write_function(&self, context: &mut Context, out: &mut String, value: &Function) {
        out.push_str(value.name);
        out.push('(');
        if value.distinct {
            out.push_str("DISTINCT ");
        }
        separated_by(
            out,
            &value.args,
            |out, v| v.write_query(self.as_dyn(), context, out),
            ", ",
        );
        out.push(')');
    }

    fn write_cast(&self, context: &mut Context, out: &mut String, value: &Cast) {
        out.push_str("CAST(");
        value.arg.write_query(self.as_dyn(), context, out);
        out.push_str(" AS ");
        self.write_column_type(context, out, value.kind);
        out.push(')');
    }

    fn write_case(&self, context: &mut Context, out: &mut String, value: &Case) {
        out.push_str("CASE");
        for (condition, result) in &value.branches {
            out.push_str(" WHEN ");
            condition.write_query(self.as_dyn(), context, out);
            out.push_str(" THEN ");
            result.write_query(self.as_dyn(), context, out);
        }
        if let Some(otherwise) = &value.otherwise {
            out.push_str(" ELSE ");
            otherwise.write_query(self.as_dyn(), context, out);
        }
        out.push_str(" END");
    }

    fn write_in_list(&self, context: &mut Context, out: &mut String, value: &InList) {
        out.push('(');
        value.arg.write_query(self.as_dyn(), context, out);
        out.push_str(if value.negated { " NOT IN (" } else { " IN (" });
        separated_by(
            out,
            &value.list,
            |out, v| v.write_query(self.as_dyn(), context, out),
            ", ",
        );
        out.push_str("))");
    }

    fn write_subquery(&self, context: &mut Context, out: &mut String, value: &Subquery) {
        out.push('(');
        match &value.kind {
            SubqueryKind::Scalar => {}
            SubqueryKind::Exists => out.push_str("EXISTS ("),
            SubqueryKind::In(arg) => {
                arg.write_query(self.as_dyn(), context, out);
                out.push_str(" IN (");
            }
        }
        value.statement.write_query(
            self.as_dyn(),
            &mut context.switch_fragment(Fragment::SqlSubquery),
            out,
        );
        if !matches!(value.kind, SubqueryKind::Scalar) {
            out.push(')');
        }
        out.push(')');
    }

    fn write_ordered(&self, context: &mut Context, out: &mut String, value: &Ordered) {
        value.expression.write_query(self.as_dyn(), context, out);
        out.push_str(match value.order {
            Order::Asc => " ASC",
            Order::Desc => " DESC",
        });
    }

    fn write_join(&self, context: &mut Context, out: &mut String, join: &Join) {
        let mut context = context.switch_fragment(Fragment::SqlJoin);
        out.push('\n');
        out.push_str(join.kind.keyword());
        out.push(' ');
        self.write_table_ref(&mut context, out, &join.table);
        if let Some(on) = &join.on {
            out.push_str(" ON ");
            on.write_query(self.as_dyn(), &mut context, out);
        }
    }

    /// `WITH cte0 ("id", "name") AS (...)` followed by a new line.
    fn write_with(&self, context: &mut Context, out: &mut String, with: &WithClause) {
        let mut context = context.switch_fragment(Fragment::SqlWith);
        out.push_str(if with.recursive {
            "WITH RECURSIVE "
        } else {
            "WITH "
        });
        separated_by(
            out,
            &with.ctes,
            |out, cte| {
                out.push_str(context.cte_alias(cte.id).as_str());
                out.push_str(" (");
                separated_by(
                    out,
                    &cte.columns,
                    |out, v| self.write_identifier(&mut context, out, v),
                    ", ",
                );
                out.push_str(") AS (");
                cte.body.write_query(self.as_dyn(), &mut context, out);
                out.push(')');
            },
            ",\n",
        );
        out.push('\n');
    }

    fn write_select(&self, context: &mut Context, out: &mut String, body: &SelectBody) {
        out.reserve(128 + body.columns.len() * 32);
        if let Some(with) = &body.with {
            self.write_with(context, out, with);
        }
        body.declare_sources(context);
        out.push_str(if body.distinct {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        });
        {
            let mut context = context.switch_fragment(Fragment::SqlSelect);
            separated_by(
                out,
                &body.columns,
                |out, v| {
                    v.expression.write_query(self.as_dyn(), &mut context, out);
                    out.push_str(" AS ");
                    if v.generated {
                        out.push_str(v.name.as_str());
                    } else {
                        self.write_identifier(&mut context, out, &v.name);
                    }
                },
                ", ",
            );
        }
        if let Some(from) = &body.from {
            out.push_str("\nFROM ");
            self.write_table_ref(&mut context.switch_fragment(Fragment::SqlSelectFrom), out, from);
        }
        for join in &body.joins {
            self.write_join(context, out, join);
        }
        if let Some(filter) = &body.filter {
            out.push_str("\nWHERE ");
            filter.write_query(
                self.as_dyn(),
                &mut context.switch_fragment(Fragment::SqlSelectWhere),
                out,
            );
        }
        if !body.group_by.is_empty() {
            out.push_str("\nGROUP BY ");
            let mut context = context.switch_fragment(Fragment::SqlSelectGroupBy);
            separated_by(
                out,
                &body.group_by,
                |out, v| v.write_query(self.as_dyn(), &mut context, out),
                ", ",
            );
        }
        if let Some(having) = &body.having {
            out.push_str("\nHAVING ");
            having.write_query(
                self.as_dyn(),
                &mut context.switch_fragment(Fragment::SqlSelectHaving),
                out,
            );
        }
        if !body.order_by.is_empty() {
            out.push_str("\nORDER BY ");
            let mut context = context.switch_fragment(Fragment::SqlSelectOrderBy);
            separated_by(
                out,
                &body.order_by,
                |out, v| self.write_ordered(&mut context, out, v),
                ", ",
            );
        }
        if body.limit.is_some() {
            out.push_str("\nLIMIT ");
            self.write_placeholder(context, out);
        }
        if body.offset.is_some() {
            out.push_str("\nOFFSET ");
            self.write_placeholder(context, out);
        }
    }

    fn write_compound(&self, context: &mut Context, out: &mut String, body: &CompoundBody) {
        self.write_select(context, out, &body.first);
        for (operator, select) in &body.rest {
            out.push('\n');
            out.push_str(operator.keyword());
            out.push('\n');
            self.write_select(context, out, select);
        }
    }

    fn write_insert(&self, context: &mut Context, out: &mut String, body: &InsertBody) {
        out.reserve(64 + body.columns.len() * 24);
        if let Some(with) = &body.with {
            self.write_with(context, out, with);
        }
        let mut context = context.switch_fragment(Fragment::SqlInsertInto);
        out.push_str(if body.replace {
            "INSERT OR REPLACE INTO "
        } else {
            "INSERT INTO "
        });
        self.write_identifier(&mut context, out, &body.table);
        out.push_str(" (");
        separated_by(
            out,
            &body.columns,
            |out, v| self.write_identifier(&mut context, out, &v.name),
            ", ",
        );
        out.push(')');
        match &body.source {
            InsertSource::Values(rows) => {
                out.push_str("\nVALUES ");
                let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
                separated_by(
                    out,
                    rows,
                    |out, row| {
                        out.push('(');
                        separated_by(
                            out,
                            row,
                            |out, v| v.write_query(self.as_dyn(), &mut context, out),
                            ", ",
                        );
                        out.push(')');
                    },
                    ", ",
                );
            }
            InsertSource::Select(statement) => {
                out.push('\n');
                statement.write_query(
                    self.as_dyn(),
                    &mut context.switch_fragment(Fragment::SqlSubquery),
                    out,
                );
            }
        }
    }

    fn write_update(&self, context: &mut Context, out: &mut String, body: &UpdateBody) {
        if let Some(with) = &body.with {
            self.write_with(context, out, with);
        }
        out.push_str("UPDATE ");
        self.write_table_ref(&mut context.switch_fragment(Fragment::SqlUpdate), out, &body.table);
        out.push_str("\nSET ");
        {
            let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
            separated_by(
                out,
                &body.assignments,
                |out, (name, value)| {
                    self.write_identifier(&mut context, out, name);
                    out.push_str(" = ");
                    value.write_query(self.as_dyn(), &mut context, out);
                },
                ", ",
            );
        }
        if let Some(filter) = &body.filter {
            out.push_str("\nWHERE ");
            filter.write_query(
                self.as_dyn(),
                &mut context.switch_fragment(Fragment::SqlSelectWhere),
                out,
            );
        }
    }

    fn write_delete(&self, context: &mut Context, out: &mut String, body: &DeleteBody) {
        if let Some(with) = &body.with {
            self.write_with(context, out, with);
        }
        out.push_str("DELETE FROM ");
        self.write_table_ref(
            &mut context.switch_fragment(Fragment::SqlDeleteFrom),
            out,
            &body.table,
        );
        if let Some(filter) = &body.filter {
            out.push_str("\nWHERE ");
            filter.write_query(
                self.as_dyn(),
                &mut context.switch_fragment(Fragment::SqlSelectWhere),
                out,
            );
        }
    }

    /// `CREATE TABLE` with one line per column, a composite primary key becomes a table
    /// constraint.
    fn write_create_table(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &TableDef,
        if_not_exists: bool,
    ) {
        let mut context = context.switch_fragment(Fragment::SqlCreateTable);
        out.reserve(64 + table.columns.len() * 48);
        out.push_str("CREATE TABLE ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_identifier(&mut context, out, &table.name);
        out.push_str(" (\n");
        let composite = table.primary_key().count() > 1;
        separated_by(
            out,
            &table.columns,
            |out, v| self.write_create_table_column(&mut context, out, v, !composite),
            ",\n",
        );
        if composite {
            out.push_str(",\nPRIMARY KEY (");
            separated_by(
                out,
                table.primary_key(),
                |out, v| self.write_identifier(&mut context, out, &v.name),
                ", ",
            );
            out.push(')');
        }
        out.push_str("\n)");
    }

    /// Column line of `CREATE TABLE`. Columns are `NOT NULL` unless optional or the single
    /// primary key.
    fn write_create_table_column(
        &self,
        context: &mut Context,
        out: &mut String,
        column: &ColumnDef,
        inline_primary_key: bool,
    ) {
        self.write_identifier(context, out, &column.name);
        out.push(' ');
        self.write_column_type(context, out, column.kind);
        let primary_key = column.primary_key && inline_primary_key;
        if primary_key {
            out.push_str(" PRIMARY KEY");
        } else if !column.nullable {
            out.push_str(" NOT NULL");
        }
        if column.unique && !column.primary_key {
            out.push_str(" UNIQUE");
        }
        if let Some(default) = &column.default {
            out.push_str(" DEFAULT ");
            self.write_value(context, out, default);
        }
        if let Some(references) = &column.references {
            out.push_str(" REFERENCES ");
            self.write_identifier(context, out, &references.table);
            out.push('(');
            self.write_identifier(context, out, &references.name);
            out.push(')');
        }
    }

    fn write_drop_table(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &Identifier,
        if_exists: bool,
    ) {
        let mut context = context.switch_fragment(Fragment::SqlDropTable);
        out.push_str("DROP TABLE ");
        if if_exists {
            out.push_str("IF EXISTS ");
        }
        self.write_identifier(&mut context, out, table);
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK");
    }
}

/// Standard SQL writer.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
