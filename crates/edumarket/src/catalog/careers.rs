use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::CareerId;
use crate::store::contains_ignore_case;

const DEFAULT_ICON: &str = "briefcase";
const DEFAULT_SALARY_RANGE: &str = "3 - 10 LPA";
const DEFAULT_EDUCATION_PATH: &str = "12th > B.Tech > M.Tech";
const DEFAULT_OUTLOOK: &str = "High Growth";
const ALL_CATEGORIES: &str = "All Careers";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Career {
    pub id: CareerId,
    pub title: String,
    pub category: String,
    pub description: String,
    pub icon: String,
    pub salary_range: String,
    pub education_path: String,
    pub future_outlook: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCareer {
    pub title: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub education_path: Option<String>,
    #[serde(default)]
    pub future_outlook: Option<String>,
}

impl NewCareer {
    pub fn into_career(self, now: DateTime<Utc>) -> Result<Career, &'static str> {
        let title = self.title.trim().to_string();
        let category = self.category.trim().to_string();
        let description = self.description.trim().to_string();
        if title.is_empty() || category.is_empty() || description.is_empty() {
            return Err("Title, category and description are required.");
        }

        let or = |value: Option<String>, default: &str| {
            value
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Career {
            id: CareerId::generate(),
            title,
            category,
            description,
            icon: or(self.icon, DEFAULT_ICON),
            salary_range: or(self.salary_range, DEFAULT_SALARY_RANGE),
            education_path: or(self.education_path, DEFAULT_EDUCATION_PATH),
            future_outlook: or(self.future_outlook, DEFAULT_OUTLOOK),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CareerQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl CareerQuery {
    pub fn matches(&self, career: &Career) -> bool {
        let title_hit = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => contains_ignore_case(&career.title, term),
            _ => true,
        };
        let category_hit = match self.category.as_deref().map(str::trim) {
            Some(category) if !category.is_empty() && category != ALL_CATEGORIES => {
                career.category == category
            }
            _ => true,
        };
        title_hit && category_hit
    }

    /// Matching careers ordered by title.
    pub fn apply(&self, careers: Vec<Career>) -> Vec<Career> {
        let mut matched: Vec<Career> = careers
            .into_iter()
            .filter(|career| self.matches(career))
            .collect();
        matched.sort_by(|left, right| left.title.cmp(&right.title));
        matched
    }
}

/// Starter library used by the admin seed action.
pub fn sample_careers() -> Vec<NewCareer> {
    [
        ("Data Scientist", "Science & Tech", "Analyze complex data to help companies make decisions.", "6-20 LPA", "database"),
        ("Graphic Designer", "Design & Arts", "Create visual concepts using computer software.", "3-8 LPA", "pen-tool"),
        ("Investment Banker", "Commerce & Finance", "Help companies raise capital and manage investments.", "10-30 LPA", "dollar-sign"),
        ("Doctor (MBBS)", "Medical", "Diagnose and treat illnesses.", "8-25 LPA", "activity"),
        ("Lawyer", "Legal", "Advise and represent clients in legal matters.", "5-15 LPA", "scale"),
    ]
    .into_iter()
    .map(|(title, category, description, salary, icon)| NewCareer {
        title: title.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        icon: Some(icon.to_string()),
        salary_range: Some(salary.to_string()),
        education_path: None,
        future_outlook: None,
    })
    .collect()
}
