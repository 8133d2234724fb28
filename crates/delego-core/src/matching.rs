//! Filter evaluation engine.
//!
//! Pure functions deciding whether an incoming attribute query activates a
//! delegate: OR across filters, AND across the rules inside a filter. No
//! state, no I/O, safe to call concurrently.

use delego_types::store::{Filter, Operator, QueryFilter, Rule};

/// Returns true when the query activates at least one of the filters.
///
/// An empty filter list means no restriction: the delegate receives
/// everything.
pub fn matches(query: &QueryFilter, filters: &[Filter]) -> bool {
	if filters.is_empty() {
		return true;
	}
	filters.iter().any(|filter| filter_matches(query, filter))
}

/// A filter is satisfied iff all of its rules are satisfied.
fn filter_matches(query: &QueryFilter, filter: &Filter) -> bool {
	filter.rules.iter().all(|rule| rule_matches(query, rule))
}

fn rule_matches(query: &QueryFilter, rule: &Rule) -> bool {
	// The "*" EQUALS "*" sentinel succeeds even against an empty query, so
	// it must short-circuit before the attribute lookup.
	if rule.is_match_all() {
		return true;
	}

	let hit = query
		.get(&*rule.attribute_name)
		.is_some_and(|values| values.iter().any(|value| eq_ignore_case(value, &rule.attribute_value)));

	match rule.operator {
		Operator::Equals => hit,
		Operator::NotEquals => !hit,
	}
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
	a.to_lowercase() == b.to_lowercase()
}


// vim: ts=4
