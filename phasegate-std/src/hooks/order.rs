//! Normalization of order clauses in queries.

use phasegate_core::{Actor, BoxError, OperationKind, QueryConsumer, Record};
use thiserror::Error;

/// A query carrying `"field [direction]"` order clauses.
pub trait Orderable {
    /// The order clauses, in priority order.
    fn orders_mut(&mut self) -> &mut Vec<String>;
}

/// Why an order clause was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The clause names a field the record does not have.
    #[error("`{record}` has no field `{field}` to order by")]
    UnknownField {
        /// Record name.
        record: &'static str,
        /// The offending field.
        field: String,
    },

    /// The direction is neither `asc` nor `desc`.
    #[error("unknown order direction `{0}`")]
    UnknownDirection(String),

    /// The clause is blank or has more than two words.
    #[error("malformed order clause `{0}`")]
    Malformed(String),
}

/// A pre query consumer that normalizes order clauses.
///
/// Each clause is checked against the record's declared fields and rewritten
/// as `field` or `field ASC|DESC`. Records that declare no fields accept any
/// field name.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderQueryConsumer;

impl OrderQueryConsumer {
    /// Normalizes one clause for record type `R`.
    pub fn normalize<R: Record>(clause: &str) -> Result<String, OrderError> {
        let mut words = clause.split_whitespace();
        let (Some(field), direction, None) = (words.next(), words.next(), words.next()) else {
            return Err(OrderError::Malformed(clause.to_owned()));
        };

        let descriptor = R::DESCRIPTOR;
        if !descriptor.fields.is_empty() && !descriptor.has_field(field) {
            return Err(OrderError::UnknownField {
                record: descriptor.name,
                field: field.to_owned(),
            });
        }

        match direction {
            None => Ok(field.to_owned()),
            Some(direction) => {
                let direction = direction.to_ascii_uppercase();
                if direction != "ASC" && direction != "DESC" {
                    return Err(OrderError::UnknownDirection(direction));
                }
                Ok(format!("{field} {direction}"))
            }
        }
    }
}

impl<R, Q> QueryConsumer<R, Q> for OrderQueryConsumer
where
    R: Record,
    Q: Orderable + 'static,
{
    fn accept(
        &self,
        _operation: OperationKind,
        query: &mut Q,
        _actor: &Actor,
    ) -> Result<(), BoxError> {
        for clause in query.orders_mut().iter_mut() {
            *clause = Self::normalize::<R>(clause)?;
        }
        Ok(())
    }
}
