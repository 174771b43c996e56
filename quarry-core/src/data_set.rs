use crate::TableRef;

/// Anything that can be read from in `FROM` or `JOIN`.
pub trait DataSet {
    fn table_ref(&self) -> &TableRef;
}

impl DataSet for TableRef {
    fn table_ref(&self) -> &TableRef {
        self
    }
}

impl<D: DataSet> DataSet for &D {
    fn table_ref(&self) -> &TableRef {
        (*self).table_ref()
    }
}
