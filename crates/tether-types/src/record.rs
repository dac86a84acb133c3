//! Ordered field/value records for insert and update helpers.

use crate::Value;

/// An ordered set of `(field, value)` pairs.
///
/// Field order is declaration order. Helpers that build parameterised
/// statements from a record emit columns and bind placeholders in exactly
/// this order.
///
/// ```
/// use tether_types::{Record, Value};
///
/// let rec = Record::new().field("name", "Alice").field("age", 30);
/// assert_eq!(rec.names().collect::<Vec<_>>(), ["name", "age"]);
/// assert_eq!(rec.values()[1], Value::Integer(30));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    names: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Record::push`].
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    /// Appends a field. A repeated name replaces the earlier value in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.names.iter().position(|n| *n == name) {
            Some(idx) => self.values[idx] = value,
            None => {
                self.names.push(name);
                self.values.push(value);
            }
        }
    }

    /// Iterates over field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Borrows the values in declaration order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Looks up a value by field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.values[idx])
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns `true` if `other` has the same field names in the same order.
    pub fn same_shape(&self, other: &Record) -> bool {
        self.names == other.names
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.push(k, v);
        }
        record
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(fields: [(K, V); N]) -> Self {
        fields.into_iter().collect()
    }
}
