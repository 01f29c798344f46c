//! SQLite rendering of filter criteria.
//!
//! Fragments reference the base query's aliases: `i` for `items` and `p` for
//! the joined `projects` row. Literal values are always single-quoted with
//! embedded quotes doubled, so nothing a user types can close the literal or
//! be parsed as a parameter.
//!
//! Where `NOT` lands is decided per axis. Most axes negate their `IN` list
//! directly; responsible is nullable, so its negation also admits items with
//! no responsible party (`NOT IN` alone would drop them, because comparing
//! `NULL` yields `NULL`).

use super::{FilterDialect, PROJECTS_PLACEHOLDER};
use crate::model::ItemState;

/// Renders fragments for the SQLite item store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqliteDialect;

impl FilterDialect for SqliteDialect {
    fn project_for_selected(&self, project_ids: &[String], negate: bool) -> String {
        format!(
            "(i.project_id {} {})",
            in_keyword(negate),
            literal_list(project_ids)
        )
    }

    fn project_for_registered_user(&self) -> String {
        format!(
            "(p.is_public = 1 OR i.project_id IN (SELECT value FROM json_each({PROJECTS_PLACEHOLDER})))"
        )
    }

    fn project_for_unregistered_user(&self) -> String {
        "(p.is_public = 1)".to_string()
    }

    fn state_in(&self, states: &[ItemState], negate: bool) -> String {
        let names: Vec<&str> = states.iter().map(|state| state.as_str()).collect();
        format!(
            " AND (i.state {} {})",
            in_keyword(negate),
            literal_list(&names)
        )
    }

    fn identifier_equals(&self, item_id: &str) -> String {
        format!(" AND (i.item_id = {})", quote(item_id))
    }

    fn responsible_in(&self, responsible_ids: &[String], negate: bool) -> String {
        let list = literal_list(responsible_ids);
        if negate {
            format!(" AND (i.responsible_id IS NULL OR i.responsible_id NOT IN {list})")
        } else {
            format!(" AND (i.responsible_id IN {list})")
        }
    }

    fn type_in(&self, titles: &[String], negate: bool) -> String {
        format!(
            " AND (i.item_type {} {})",
            in_keyword(negate),
            literal_list(titles)
        )
    }

    fn node_in(&self, titles: &[String], negate: bool) -> String {
        format!(
            " AND (i.workflow_node {} {})",
            in_keyword(negate),
            literal_list(titles)
        )
    }

    fn text_contains(&self, text: &str) -> String {
        let pattern = quote(&format!("%{text}%"));
        format!(" AND (i.title LIKE {pattern} OR i.description LIKE {pattern})")
    }
}

const fn in_keyword(negate: bool) -> &'static str {
    if negate { "NOT IN" } else { "IN" }
}

/// Single-quote a literal, doubling embedded quotes.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `('a', 'b', 'c')`
fn literal_list<S: AsRef<str>>(values: &[S]) -> String {
    let mut out = String::from("(");
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        out.push_str(&quote(value.as_ref()));
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{Criteria, ProjectCriterion, StateCriterion, TextCriterion};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn selected_projects() {
        let d = SqliteDialect;
        assert_eq!(
            d.project_for_selected(&strings(&["p1", "p2"]), false),
            "(i.project_id IN ('p1', 'p2'))"
        );
        assert_eq!(
            d.project_for_selected(&strings(&["p1"]), true),
            "(i.project_id NOT IN ('p1'))"
        );
    }

    #[test]
    fn registered_and_unregistered_scopes() {
        let d = SqliteDialect;
        assert_eq!(
            d.project_for_registered_user(),
            "(p.is_public = 1 OR i.project_id IN (SELECT value FROM json_each($projects)))"
        );
        assert_eq!(d.project_for_unregistered_user(), "(p.is_public = 1)");
    }

    #[test]
    fn state_set_and_negation() {
        let d = SqliteDialect;
        let states = [ItemState::Open, ItemState::Blocked];
        assert_eq!(
            d.state_in(&states, false),
            " AND (i.state IN ('open', 'blocked'))"
        );
        assert_eq!(
            d.state_in(&states, true),
            " AND (i.state NOT IN ('open', 'blocked'))"
        );
    }

    #[test]
    fn identifier_is_equality() {
        assert_eq!(
            SqliteDialect.identifier_equals("ITM-12"),
            " AND (i.item_id = 'ITM-12')"
        );
    }

    #[test]
    fn negated_responsible_keeps_unassigned() {
        let d = SqliteDialect;
        assert_eq!(
            d.responsible_in(&strings(&["alice"]), false),
            " AND (i.responsible_id IN ('alice'))"
        );
        assert_eq!(
            d.responsible_in(&strings(&["alice", "bob"]), true),
            " AND (i.responsible_id IS NULL OR i.responsible_id NOT IN ('alice', 'bob'))"
        );
    }

    #[test]
    fn type_and_node_sets() {
        let d = SqliteDialect;
        assert_eq!(
            d.type_in(&strings(&["Bug"]), true),
            " AND (i.item_type NOT IN ('Bug'))"
        );
        assert_eq!(
            d.node_in(&strings(&["Review", "QA"]), false),
            " AND (i.workflow_node IN ('Review', 'QA'))"
        );
    }

    #[test]
    fn text_matches_title_or_description() {
        assert_eq!(
            SqliteDialect.text_contains("login bug"),
            " AND (i.title LIKE '%login bug%' OR i.description LIKE '%login bug%')"
        );
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(
            SqliteDialect.text_contains("it's"),
            " AND (i.title LIKE '%it''s%' OR i.description LIKE '%it''s%')"
        );
        assert_eq!(
            SqliteDialect.type_in(&strings(&["O'Brien"]), false),
            " AND (i.item_type IN ('O''Brien'))"
        );
    }

    #[test]
    fn registered_user_with_states_scenario() {
        let criteria = Criteria {
            state: StateCriterion::one_of([ItemState::Open, ItemState::Blocked], false).unwrap(),
            ..Criteria::unconstrained(ProjectCriterion::RegisteredUser)
        };
        assert_eq!(
            SqliteDialect.compile(&criteria).as_str(),
            " WHERE (p.is_public = 1 OR i.project_id IN (SELECT value FROM json_each($projects))) \
             AND (i.state IN ('open', 'blocked'))"
        );
    }

    #[test]
    fn unregistered_user_with_text_scenario() {
        let criteria = Criteria {
            text: TextCriterion::contains("login bug").unwrap(),
            ..Criteria::unconstrained(ProjectCriterion::UnregisteredUser)
        };
        assert_eq!(
            SqliteDialect.compile(&criteria).as_str(),
            " WHERE (p.is_public = 1) \
             AND (i.title LIKE '%login bug%' OR i.description LIKE '%login bug%')"
        );
    }
}
