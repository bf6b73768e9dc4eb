//! Index selection for the `commits` table.
//!
//! The planner decides which WHERE constraints the cursor handles itself,
//! which argument slot each one occupies, and whether the requested ORDER BY
//! comes for free from the traversal order. The host adapter translates
//! SQLite's index info into these plain structures and back, so the rules
//! here have no SQLite dependency.

use super::codec::{self, Role, Tag};
use super::schema::{COL_COMMITTER_WHEN, COL_HASH, COL_REF, COL_REPOSITORY};
use crate::error::{CommitsqlError, Result};

/// Comparison operator of an offered constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Other,
}

/// One constraint SQLite offers for the current plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintInfo {
    pub column: usize,
    pub op: Operator,
    pub usable: bool,
}

/// One ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderInfo {
    pub column: usize,
    pub desc: bool,
}

/// How a pushed-down constraint is passed to `filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintUse {
    /// 1-based position in the filter arguments.
    pub argv_index: usize,
    /// SQLite may skip re-checking the constraint.
    pub omit: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexPlan {
    /// Parallel to the offered constraints; `None` leaves it to SQLite.
    pub usages: Vec<Option<ConstraintUse>>,
    /// One tag per used constraint, in argument order.
    pub tags: Vec<Tag>,
    /// At most one row is produced.
    pub unique: bool,
    /// Explicit (cost, rows); `None` keeps SQLite's defaults.
    pub estimate: Option<(f64, i64)>,
    pub order_by_consumed: bool,
}

impl IndexPlan {
    /// The index string handed to `filter`.
    pub fn token(&self) -> String {
        codec::encode(&self.tags)
    }

    pub fn argument_count(&self) -> usize {
        self.usages.iter().flatten().count()
    }
}

/// Role and omit flag for a constraint the cursor can handle.
fn pushdown(constraint: &ConstraintInfo) -> Option<(Role, bool)> {
    match (constraint.column, constraint.op) {
        (COL_HASH, Operator::Eq) => Some((Role::Lookup, false)),
        (COL_REPOSITORY | COL_REF, Operator::Eq) => Some((Role::PassThrough, true)),
        (COL_COMMITTER_WHEN, Operator::Lt) => Some((Role::Upper, false)),
        (COL_COMMITTER_WHEN, Operator::Gt) => Some((Role::Lower, false)),
        _ => None,
    }
}

/// Builds the plan for one set of offered constraints.
///
/// # Errors
///
/// Returns `CommitsqlError::UnusableConstraint` when an equality on the hash
/// or on a selector column is offered but unusable. The query cannot be
/// answered correctly without it, so the plan is rejected rather than
/// degraded to a full scan.
pub fn plan(constraints: &[ConstraintInfo], order_by: &[OrderInfo]) -> Result<IndexPlan> {
    let mut plan = IndexPlan {
        usages: vec![None; constraints.len()],
        ..IndexPlan::default()
    };

    for (i, constraint) in constraints.iter().enumerate() {
        let Some((role, omit)) = pushdown(constraint) else {
            continue;
        };

        if !constraint.usable {
            if matches!(role, Role::Lookup | Role::PassThrough) {
                return Err(CommitsqlError::UnusableConstraint {
                    column: constraint.column,
                });
            }
            continue;
        }

        // one argument per (role, column); repeats are re-checked by SQLite
        let tag = Tag::new(role, constraint.column);
        if plan.tags.contains(&tag) {
            continue;
        }

        plan.tags.push(tag);
        plan.usages[i] = Some(ConstraintUse {
            argv_index: plan.tags.len(),
            omit,
        });

        if role == Role::Lookup {
            plan.unique = true;
            plan.estimate = Some((1.0, 1));
        }
    }

    // the log walk yields newest committer time first, except across clock
    // skew where a parent is newer than its child (see `CommitLog`)
    plan.order_by_consumed = matches!(
        order_by,
        [OrderInfo {
            column: COL_COMMITTER_WHEN,
            desc: true
        }]
    );

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vtab::schema::{COL_AUTHOR_NAME, COL_AUTHOR_WHEN};

    fn usable(column: usize, op: Operator) -> ConstraintInfo {
        ConstraintInfo {
            column,
            op,
            usable: true,
        }
    }

    fn unusable(column: usize, op: Operator) -> ConstraintInfo {
        ConstraintInfo {
            column,
            op,
            usable: false,
        }
    }

    #[test]
    fn test_no_constraints() {
        let plan = plan(&[], &[]).unwrap();
        assert!(plan.tags.is_empty());
        assert_eq!(plan.token(), "");
        assert!(!plan.unique);
        assert_eq!(plan.estimate, None);
        assert!(!plan.order_by_consumed);
    }

    #[test]
    fn test_hash_equality_is_point_lookup() {
        let plan = plan(&[usable(COL_HASH, Operator::Eq)], &[]).unwrap();
        assert_eq!(plan.tags, vec![Tag::new(Role::Lookup, COL_HASH)]);
        assert_eq!(
            plan.usages,
            vec![Some(ConstraintUse {
                argv_index: 1,
                omit: false
            })]
        );
        assert!(plan.unique);
        assert_eq!(plan.estimate, Some((1.0, 1)));
    }

    #[test]
    fn test_unusable_hash_rejects_plan() {
        let err = plan(&[unusable(COL_HASH, Operator::Eq)], &[]).unwrap_err();
        assert!(matches!(
            err,
            CommitsqlError::UnusableConstraint { column: COL_HASH }
        ));
    }

    #[test]
    fn test_unusable_selectors_reject_plan() {
        for column in [COL_REPOSITORY, COL_REF] {
            let err = plan(&[unusable(column, Operator::Eq)], &[]).unwrap_err();
            assert!(matches!(err, CommitsqlError::UnusableConstraint { column: c } if c == column));
        }
    }

    #[test]
    fn test_selectors_are_omitted() {
        let plan = plan(
            &[usable(COL_REF, Operator::Eq), usable(COL_REPOSITORY, Operator::Eq)],
            &[],
        )
        .unwrap();
        assert_eq!(
            plan.tags,
            vec![
                Tag::new(Role::PassThrough, COL_REF),
                Tag::new(Role::PassThrough, COL_REPOSITORY),
            ]
        );
        assert!(plan.usages.iter().all(|u| u.map(|u| u.omit) == Some(true)));
        assert!(!plan.unique);
        assert_eq!(plan.estimate, None);
    }

    #[test]
    fn test_committer_range_is_pushed_but_rechecked() {
        let plan = plan(
            &[
                usable(COL_COMMITTER_WHEN, Operator::Gt),
                usable(COL_COMMITTER_WHEN, Operator::Lt),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(
            plan.tags,
            vec![
                Tag::new(Role::Lower, COL_COMMITTER_WHEN),
                Tag::new(Role::Upper, COL_COMMITTER_WHEN),
            ]
        );
        assert_eq!(
            plan.usages,
            vec![
                Some(ConstraintUse {
                    argv_index: 1,
                    omit: false
                }),
                Some(ConstraintUse {
                    argv_index: 2,
                    omit: false
                }),
            ]
        );
    }

    #[test]
    fn test_other_constraints_left_to_sqlite() {
        let plan = plan(
            &[
                usable(COL_AUTHOR_NAME, Operator::Eq),
                usable(COL_COMMITTER_WHEN, Operator::Le),
                usable(COL_COMMITTER_WHEN, Operator::Ge),
                usable(COL_AUTHOR_WHEN, Operator::Lt),
                usable(COL_HASH, Operator::Other),
                unusable(COL_COMMITTER_WHEN, Operator::Lt),
            ],
            &[],
        )
        .unwrap();
        assert!(plan.tags.is_empty());
        assert!(plan.usages.iter().all(Option::is_none));
    }

    #[test]
    fn test_argument_slots_follow_tag_order() {
        let plan = plan(
            &[
                usable(COL_AUTHOR_NAME, Operator::Eq),
                usable(COL_COMMITTER_WHEN, Operator::Lt),
                usable(COL_REPOSITORY, Operator::Eq),
                usable(COL_HASH, Operator::Eq),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(plan.argument_count(), plan.tags.len());
        assert_eq!(plan.usages[0], None);
        assert_eq!(plan.usages[1].unwrap().argv_index, 1);
        assert_eq!(plan.usages[2].unwrap().argv_index, 2);
        assert_eq!(plan.usages[3].unwrap().argv_index, 3);
        assert_eq!(
            codec::decode(&plan.token()).unwrap(),
            vec![
                Tag::new(Role::Upper, COL_COMMITTER_WHEN),
                Tag::new(Role::PassThrough, COL_REPOSITORY),
                Tag::new(Role::Lookup, COL_HASH),
            ]
        );
    }

    #[test]
    fn test_duplicate_constraints_pushed_once() {
        let plan = plan(
            &[
                usable(COL_REPOSITORY, Operator::Eq),
                usable(COL_REPOSITORY, Operator::Eq),
                usable(COL_HASH, Operator::Eq),
                usable(COL_HASH, Operator::Eq),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(plan.tags.len(), 2);
        assert!(plan.usages[0].is_some());
        assert_eq!(plan.usages[1], None);
        assert!(plan.usages[2].is_some());
        assert_eq!(plan.usages[3], None);
    }

    #[test]
    fn test_order_by_committer_when_desc_consumed() {
        let desc = OrderInfo {
            column: COL_COMMITTER_WHEN,
            desc: true,
        };
        assert!(plan(&[], &[desc]).unwrap().order_by_consumed);

        let asc = OrderInfo { desc: false, ..desc };
        assert!(!plan(&[], &[asc]).unwrap().order_by_consumed);

        let other = OrderInfo {
            column: COL_AUTHOR_WHEN,
            desc: true,
        };
        assert!(!plan(&[], &[other]).unwrap().order_by_consumed);
        assert!(!plan(&[], &[desc, other]).unwrap().order_by_consumed);
    }
}
