// Lazy Table Scan
//
// Yields rows from a pinned list of data objects, one object in memory
// at a time, followed by any rows still buffered in the transaction.
// Rewinding re-reads the same objects rather than caching rows.

use std::sync::Arc;

use super::TxError;
use crate::data::{DataObject, Row};
use crate::store::ObjectStore;

pub struct Scan<S: ObjectStore + ?Sized> {
    store: Arc<S>,
    table: String,
    objects: Vec<String>,
    buffered: Vec<Row>,
    next_object: usize,
    next_buffered: usize,
    current: std::vec::IntoIter<Row>,
}

impl<S: ObjectStore + ?Sized> Scan<S> {
    pub(crate) fn new(store: Arc<S>, table: String, objects: Vec<String>, buffered: Vec<Row>) -> Self {
        Self {
            store,
            table,
            objects,
            buffered,
            next_object: 0,
            next_buffered: 0,
            current: Vec::new().into_iter(),
        }
    }

    /// Restart from the first row of the pinned file set.
    pub fn rewind(&mut self) {
        self.next_object = 0;
        self.next_buffered = 0;
        self.current = Vec::new().into_iter();
    }

    fn load(&self, key: &str) -> Result<Vec<Row>, TxError> {
        let bytes = self.store.read(key)?;
        let object = DataObject::decode(&bytes).map_err(|e| TxError::CorruptObject {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        if object.table != self.table {
            return Err(TxError::CorruptObject {
                key: key.to_string(),
                reason: format!("object belongs to table `{}`", object.table),
            });
        }
        Ok(object.rows)
    }
}

impl<S: ObjectStore + ?Sized> Iterator for Scan<S> {
    type Item = Result<Row, TxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.current.next() {
                return Some(Ok(row));
            }

            if let Some(key) = self.objects.get(self.next_object) {
                self.next_object += 1;
                match self.load(key) {
                    Ok(rows) => self.current = rows.into_iter(),
                    Err(e) => return Some(Err(e)),
                }
                continue;
            }

            let row = self.buffered.get(self.next_buffered)?.clone();
            self.next_buffered += 1;
            return Some(Ok(row));
        }
    }
}
