//! Boolean operator precedence and grouping decisions.
//!
//! Fixed total order: NOT binds tightest, then AND, then OR. The converter
//! consults [`needs_grouping`] for every boolean child before joining it
//! into its parent's expression.

/// Boolean operators in the condition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    Not,
    And,
    Or,
}

/// Binding strength; higher binds tighter.
pub fn precedence(op: BoolOp) -> u8 {
    match op {
        BoolOp::Not => 3,
        BoolOp::And => 2,
        BoolOp::Or => 1,
    }
}

/// Whether a boolean child must be wrapped in grouping parentheses under
/// the given parent operator.
///
/// Without `parenthesize`, only children binding strictly looser than
/// their parent are grouped. With `parenthesize`, every AND/OR child is
/// grouped unconditionally. NOT children are never re-grouped: NOT
/// already parenthesizes its own argument.
pub fn needs_grouping(child: BoolOp, parent: BoolOp, parenthesize: bool) -> bool {
    if child == BoolOp::Not {
        return false;
    }
    if parenthesize {
        return true;
    }
    precedence(child) < precedence(parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        assert!(precedence(BoolOp::Not) > precedence(BoolOp::And));
        assert!(precedence(BoolOp::And) > precedence(BoolOp::Or));
    }

    #[test]
    fn test_or_under_and_is_grouped() {
        assert!(needs_grouping(BoolOp::Or, BoolOp::And, false));
    }

    #[test]
    fn test_and_under_or_is_not_grouped_without_parenthesize() {
        assert!(!needs_grouping(BoolOp::And, BoolOp::Or, false));
    }

    #[test]
    fn test_parenthesize_groups_everything() {
        assert!(needs_grouping(BoolOp::And, BoolOp::Or, true));
        assert!(needs_grouping(BoolOp::Or, BoolOp::And, true));
        assert!(needs_grouping(BoolOp::And, BoolOp::And, true));
    }

    #[test]
    fn test_not_child_never_regrouped() {
        assert!(!needs_grouping(BoolOp::Not, BoolOp::And, true));
        assert!(!needs_grouping(BoolOp::Not, BoolOp::Or, false));
    }
}
