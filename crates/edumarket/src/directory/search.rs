use std::cmp::Ordering;

use serde::Deserialize;

use super::domain::Institution;
use crate::store::contains_ignore_case;

/// Directory ordering. Unknown values fall back to rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Rating,
    Students,
    Name,
}

impl SortKey {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("students") => SortKey::Students,
            Some("name") => SortKey::Name,
            _ => SortKey::Rating,
        }
    }

    fn compare(self, left: &Institution, right: &Institution) -> Ordering {
        match self {
            SortKey::Rating => right.rating.total_cmp(&left.rating),
            SortKey::Students => right.total_students.cmp(&left.total_students),
            SortKey::Name => left.name.cmp(&right.name),
        }
    }
}

/// Public directory filter as received on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub sort_by: Option<String>,
}

impl InstitutionQuery {
    pub fn matches(&self, institution: &Institution) -> bool {
        if !institution.is_listed() {
            return false;
        }

        if let Some(term) = non_blank(self.search.as_deref()) {
            let hit = [
                &institution.name,
                &institution.location,
                &institution.city,
                &institution.specialization,
            ]
            .into_iter()
            .any(|field| contains_ignore_case(field, term));
            if !hit {
                return false;
            }
        }

        in_list(self.category.as_deref(), &institution.category)
            && in_list(self.city.as_deref(), &institution.city)
    }

    /// Filters and orders a candidate set. The sort is stable, so ties keep store order.
    pub fn apply(&self, institutions: Vec<Institution>) -> Vec<Institution> {
        let key = SortKey::parse(self.sort_by.as_deref());
        let mut matched: Vec<Institution> = institutions
            .into_iter()
            .filter(|institution| self.matches(institution))
            .collect();
        matched.sort_by(|left, right| key.compare(left, right));
        matched
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Comma separated allow-list; absent, blank or `All` matches everything.
fn in_list(filter: Option<&str>, value: &str) -> bool {
    match non_blank(filter) {
        None | Some("All") => true,
        Some(list) => list.split(',').map(str::trim).any(|item| item == value),
    }
}
