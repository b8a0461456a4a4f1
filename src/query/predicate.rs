use crate::domain::Delivery;
use crate::error::Result;
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// One typed (field, operator, value) constraint against a delivery row.
///
/// Substring matches are case-sensitive unless the variant says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    AuthorContains(String),
    CommentContains(String),
    FileListContains(String),
    /// Case-insensitive regular expression over the raw file list text.
    FileListMatches(String),
    Uploaded(bool),
    Approved(bool),
    Failed(bool),
    /// Inclusive range over the creation timestamp.
    CreatedBetween(DateTime<Utc>, DateTime<Utc>),
    GroupIdEndsWith(String),
    /// Case-insensitive substring over the derived display name. Logically
    /// a post-filter on fetched rows.
    NameContains(String),
}

/// Canonical constraint set produced by the query builder. All predicates
/// are ANDed. Opaque to callers; consumed by `DeliveryStore` impls, which
/// either translate the variants or evaluate rows through [`Matcher`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Pre-compiles the set for row-by-row evaluation. Fails when a regex
    /// predicate carries a template that does not compile.
    pub fn matcher(&self) -> Result<Matcher> {
        let mut tests = Vec::with_capacity(self.predicates.len());
        for predicate in &self.predicates {
            let regex = match predicate {
                Predicate::FileListMatches(pattern) => {
                    Some(RegexBuilder::new(pattern).case_insensitive(true).build()?)
                }
                _ => None,
            };
            tests.push(Test {
                predicate: predicate.clone(),
                regex,
            });
        }
        Ok(Matcher { tests })
    }
}

impl FromIterator<Predicate> for PredicateSet {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

/// Compiled form of a [`PredicateSet`]; regexes are built once and reused
/// across rows.
pub struct Matcher {
    tests: Vec<Test>,
}

struct Test {
    predicate: Predicate,
    // Compiled pattern for FileListMatches; None for every other variant.
    regex: Option<Regex>,
}

impl Matcher {
    pub fn matches(&self, delivery: &Delivery) -> bool {
        self.tests.iter().all(|test| test.matches(delivery))
    }
}

impl Test {
    fn matches(&self, delivery: &Delivery) -> bool {
        match &self.predicate {
            Predicate::AuthorContains(needle) => delivery.author.contains(needle),
            Predicate::CommentContains(needle) => delivery.comment.contains(needle),
            Predicate::FileListContains(needle) => delivery.file_list.contains(needle),
            Predicate::FileListMatches(_) => self
                .regex
                .as_ref()
                .map(|re| re.is_match(&delivery.file_list))
                .unwrap_or(false),
            Predicate::Uploaded(value) => delivery.flag_uploaded == *value,
            Predicate::Approved(value) => delivery.flag_approved == *value,
            Predicate::Failed(value) => delivery.flag_failed == *value,
            Predicate::CreatedBetween(start, end) => {
                *start <= delivery.creation_date && delivery.creation_date <= *end
            }
            Predicate::GroupIdEndsWith(suffix) => delivery.group_id.ends_with(suffix),
            Predicate::NameContains(needle) => delivery
                .display_name()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}
