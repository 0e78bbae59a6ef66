//! The assembler's output type.

use std::sync::Arc;

/// An ordered, pairwise-unique sequence of column names, shared by every
/// record the assembler produces for a given parse.
///
/// Header strings are owned once here and referenced by every `Object`
/// record through a cheap `Arc` clone rather than copied per record, matching
/// the "header owned by the assembler, borrowed by records" shape called for
/// by a strict-ownership rewrite of the original generator-based design.
pub type Header = Arc<[String]>;

/// A record emitted by the assembler, in the shape selected at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A mapping from header name to field value, in header order.
    Object {
        header: Header,
        values: Vec<String>,
    },
    /// An ordered sequence of field values.
    Array(Vec<String>),
}

impl Record {
    /// The number of fields actually carried by this record.
    pub fn arity(&self) -> usize {
        match self {
            Record::Object { values, .. } => values.len(),
            Record::Array(values) => values.len(),
        }
    }

    /// Looks up a field by header name. Always `None` for `Array` records.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self {
            Record::Object { header, values } => header
                .iter()
                .position(|h| h == name)
                .and_then(|i| values.get(i))
                .map(String::as_str),
            Record::Array(_) => None,
        }
    }

    /// Iterates `(header name, value)` pairs for an `Object` record, or
    /// `(None, value)` for an `Array` record in positional order.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        match self {
            Record::Object { header, values } => Iter::Object {
                names: header.iter(),
                values: values.iter(),
            },
            Record::Array(values) => Iter::Array(values.iter()),
        }
    }

    /// The field values only, in positional order.
    pub fn values(&self) -> &[String] {
        match self {
            Record::Object { values, .. } => values,
            Record::Array(values) => values,
        }
    }
}

enum Iter<'a> {
    Object {
        names: std::slice::Iter<'a, String>,
        values: std::slice::Iter<'a, String>,
    },
    Array(std::slice::Iter<'a, String>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = (Option<&'a str>, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Object { names, values } => {
                let name = names.next()?.as_str();
                let value = values.next()?.as_str();
                Some((Some(name), value))
            }
            Iter::Array(values) => values.next().map(|v| (None, v.as_str())),
        }
    }
}
