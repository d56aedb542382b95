//! Per-conversion state: the ordered deferred-clause collector.
//!
//! Some node renderings cannot be inlined into the filter expression and
//! are instead appended after the main query body at finalization time.
//! The collector preserves pre-order encounter order, which is significant
//! because logsource clauses are separated out before the rest is
//! concatenated.

use log::warn;

/// A rendered fragment excluded from the inline expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredClause {
    /// The main filter body, emitted as a `where` pipe stage.
    Where { negated: bool, text: String },
    /// A table selection absorbed into the query prefix.
    Logsource { table: String },
    /// A deferred regex match (dialects without an inline regex template).
    Regex { negated: bool, text: String },
    /// A deferred CIDR match (dialects without an inline CIDR template).
    Cidr { negated: bool, text: String },
}

impl DeferredClause {
    /// Toggle negation. Returns `false` for clause kinds that cannot be
    /// negated (logsource selection).
    pub fn negate(&mut self) -> bool {
        match self {
            DeferredClause::Where { negated, .. }
            | DeferredClause::Regex { negated, .. }
            | DeferredClause::Cidr { negated, .. } => {
                *negated = !*negated;
                true
            }
            DeferredClause::Logsource { .. } => false,
        }
    }
}

/// Mutable state for exactly one rule conversion.
///
/// Never reused or shared across conversions; the backend configuration is
/// the only thing shared between concurrent conversions.
#[derive(Debug, Default)]
pub struct ConversionState {
    deferred: Vec<DeferredClause>,
}

impl ConversionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause in traversal order.
    pub fn push(&mut self, clause: DeferredClause) {
        self.deferred.push(clause);
    }

    /// Toggle negation on the most recently pushed clause. Returns `false`
    /// if there is no clause or the clause cannot be negated.
    pub fn negate_last(&mut self) -> bool {
        self.deferred.last_mut().is_some_and(DeferredClause::negate)
    }

    pub fn is_empty(&self) -> bool {
        self.deferred.is_empty()
    }

    /// Number of clauses collected so far. The converter snapshots this
    /// around a NOT subtree to tell how many clauses the subtree added.
    pub fn len(&self) -> usize {
        self.deferred.len()
    }

    /// Extract the logsource table, removing every logsource clause from
    /// the collector. First-seen wins; extras are dropped with a warning
    /// (the upstream pipeline design only ever injects one).
    pub fn take_logsource(&mut self, rule_title: &str) -> Option<String> {
        let tables: Vec<String> = self
            .deferred
            .iter()
            .filter_map(|c| match c {
                DeferredClause::Logsource { table } => Some(table.clone()),
                _ => None,
            })
            .collect();
        if tables.len() > 1 {
            warn!(
                "rule '{rule_title}': {} logsource clauses accumulated, keeping '{}'",
                tables.len(),
                tables[0]
            );
        }
        self.deferred
            .retain(|c| !matches!(c, DeferredClause::Logsource { .. }));
        tables.into_iter().next()
    }

    /// Consume the collector, yielding remaining clauses in encounter order.
    pub fn into_clauses(self) -> Vec<DeferredClause> {
        self.deferred
    }
}
