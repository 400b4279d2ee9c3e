use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::BlogId;

pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    /// Display date as entered by the editor.
    pub date: String,
    pub read_time: String,
    pub category: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update form. On update only non-empty fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDraft {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub read_time: Option<String>,
    pub category: Option<String>,
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl BlogDraft {
    pub fn into_blog(self, image: Option<String>, now: DateTime<Utc>) -> Result<Blog, &'static str> {
        let title = filled(self.title).ok_or("Title is required.")?;
        Ok(Blog {
            id: BlogId::generate(),
            title,
            excerpt: self.excerpt.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            date: self.date.unwrap_or_default(),
            read_time: self.read_time.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            image: filled(image).unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(self, blog: &mut Blog, image: Option<String>, now: DateTime<Utc>) {
        for (target, value) in [
            (&mut blog.title, self.title),
            (&mut blog.excerpt, self.excerpt),
            (&mut blog.content, self.content),
            (&mut blog.author, self.author),
            (&mut blog.date, self.date),
            (&mut blog.read_time, self.read_time),
            (&mut blog.category, self.category),
            (&mut blog.image, image),
        ] {
            if let Some(value) = filled(value) {
                *target = value;
            }
        }
        blog.updated_at = now;
    }
}

/// Home page card.
#[derive(Debug, Clone, Serialize)]
pub struct BlogTeaser {
    pub id: BlogId,
    pub title: String,
    pub excerpt: String,
}

impl From<&Blog> for BlogTeaser {
    fn from(blog: &Blog) -> Self {
        Self {
            id: blog.id.clone(),
            title: blog.title.clone(),
            excerpt: blog.excerpt.clone(),
        }
    }
}
