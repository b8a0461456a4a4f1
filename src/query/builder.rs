use crate::error::{ProviderError, Result};
use crate::query::components::ComponentResolver;
use crate::query::params::normalize_date_params;
use crate::query::predicate::{Predicate, PredicateSet};
use crate::storage::ComponentStore;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Sentinel component code selecting a raw substring match on the file
/// list instead of a type lookup.
const FILE_COMPONENT: &str = "FILE";

const DATE_FORMAT: &str = "%d-%m-%Y";

/// Translates normalized search parameters into a [`PredicateSet`].
pub struct QueryBuilder {
    components: ComponentResolver,
}

impl QueryBuilder {
    pub fn new(components: Arc<dyn ComponentStore>) -> Self {
        Self {
            components: ComponentResolver::new(components),
        }
    }

    /// Builds the predicate set for one search request.
    ///
    /// Empty string values count as absent throughout. The ownership
    /// predicate on `client_code` is always present, so an empty parameter
    /// map still narrows the store to one client's rows.
    pub async fn build(
        &self,
        client_code: &str,
        params: &HashMap<String, String>,
        timezone: &str,
    ) -> Result<PredicateSet> {
        debug!("Building query for client [{client_code}], params: {params:?}");

        let mut params = params.clone();
        normalize_date_params(&mut params);

        let mut set = PredicateSet::new();

        if let Some(author) = non_empty(&params, "created_by") {
            set.push(Predicate::AuthorContains(author.to_string()));
        }
        if let Some(comment) = non_empty(&params, "comment") {
            set.push(Predicate::CommentContains(comment.to_string()));
        }

        match non_empty(&params, "component_0") {
            Some(FILE_COMPONENT) => {
                if let Some(fragment) = non_empty(&params, "component_1") {
                    set.push(Predicate::FileListContains(fragment.to_string()));
                }
            }
            Some(code) => {
                if let Some(types) = self.components.resolve(code).await? {
                    let version = params
                        .get("component_1")
                        .map(String::as_str)
                        .unwrap_or_default();
                    let templates: Vec<&str> = types
                        .iter()
                        .filter_map(|citype| citype.template_for(version))
                        .collect();
                    // Resolved types may carry no template for the
                    // requested version, leaving the union empty.
                    if !templates.is_empty() {
                        let pattern = templates.join("|");
                        debug!("Component [{code}] (v. [{version}]) expands to [{pattern}]");
                        set.push(Predicate::FileListMatches(pattern));
                    }
                }
            }
            None => {}
        }

        if let Some(value) = flag_requested(&params, "is_uploaded") {
            set.push(Predicate::Uploaded(value));
        }
        if let Some(value) = flag_requested(&params, "is_approved") {
            set.push(Predicate::Approved(value));
        }
        if let Some(value) = flag_requested(&params, "is_failed") {
            set.push(Predicate::Failed(value));
        }

        let after = non_empty(&params, "date_range_after");
        let before = non_empty(&params, "date_range_before");
        if after.is_some() || before.is_some() {
            let tz = parse_timezone(timezone)?;
            let start = match after {
                Some(value) => parse_local_date(value, &tz, timezone)?.with_timezone(&Utc),
                None => DateTime::<Utc>::MIN_UTC,
            };
            // A bare date localizes to 00:00, which would exclude the whole
            // end day; force the upper bound to the end of its day. The
            // default upper bound is the current day in the request zone.
            let end_day = match before {
                Some(value) => parse_local_date(value, &tz, timezone)?,
                None => Utc::now().with_timezone(&tz),
            };
            let end = end_of_day(end_day, &tz, timezone)?.with_timezone(&Utc);
            set.push(Predicate::CreatedBetween(start, end));
        }

        set.push(Predicate::GroupIdEndsWith(client_code.to_string()));

        if let Some(project) = non_empty(&params, "project") {
            set.push(Predicate::NameContains(project.to_string()));
        }

        debug!("Final predicate set has {} entries", set.len());
        Ok(set)
    }
}

pub(crate) fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| ProviderError::UnknownTimezone(name.to_string()))
}

fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// Portal flag convention: `"2"` requests the flag set, `"3"` requests it
/// clear, anything else leaves the flag out of the query.
fn flag_requested(params: &HashMap<String, String>, key: &str) -> Option<bool> {
    match params.get(key).map(String::as_str) {
        Some("2") => Some(true),
        Some("3") => Some(false),
        _ => None,
    }
}

/// Parses a `DD-MM-YYYY` value as midnight in `tz`. Malformed input is a
/// request-level failure, not a skipped filter.
fn parse_local_date(value: &str, tz: &Tz, tz_name: &str) -> Result<DateTime<Tz>> {
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ProviderError::InvalidDate(value.to_string()))?;
    localize(date.and_time(NaiveTime::MIN), tz, tz_name)
}

fn end_of_day(moment: DateTime<Tz>, tz: &Tz, tz_name: &str) -> Result<DateTime<Tz>> {
    let wall = moment
        .date_naive()
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| ProviderError::InvalidLocalTime("23:59:59".to_string(), tz_name.to_string()))?;
    localize(wall, tz, tz_name)
}

fn localize(wall: NaiveDateTime, tz: &Tz, tz_name: &str) -> Result<DateTime<Tz>> {
    tz.from_local_datetime(&wall)
        .earliest()
        .ok_or_else(|| ProviderError::InvalidLocalTime(wall.to_string(), tz_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComponentGroup, ComponentType, ANY_VERSION};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    struct StubComponents {
        groups: HashMap<String, ComponentGroup>,
        types: HashMap<String, ComponentType>,
    }

    #[async_trait]
    impl ComponentStore for StubComponents {
        async fn find_group(&self, code: &str) -> Result<Option<ComponentGroup>> {
            Ok(self.groups.get(code).cloned())
        }

        async fn find_type(&self, code: &str) -> Result<Option<ComponentType>> {
            Ok(self.types.get(code).cloned())
        }

        async fn find_types_in(&self, codes: &[String]) -> Result<Vec<ComponentType>> {
            Ok(codes
                .iter()
                .filter_map(|code| self.types.get(code).cloned())
                .collect())
        }
    }

    fn citype(code: &str, versioned: &[(&str, &str)]) -> ComponentType {
        let templates: BTreeMap<String, String> = versioned
            .iter()
            .map(|(version, template)| (version.to_string(), template.to_string()))
            .collect();
        ComponentType {
            code: code.to_string(),
            name: format!("{code} component"),
            templates,
        }
    }

    fn builder() -> QueryBuilder {
        let mut groups = HashMap::new();
        groups.insert(
            "RELEASE".to_string(),
            ComponentGroup {
                code: "RELEASE".to_string(),
                members: vec!["DSTR".to_string(), "DOC".to_string()],
            },
        );
        let mut types = HashMap::new();
        types.insert(
            "DSTR".to_string(),
            citype(
                "DSTR",
                &[("1.0", r"distr/.+-1\.0\.zip"), (ANY_VERSION, r"distr/.+\.zip")],
            ),
        );
        types.insert(
            "DOC".to_string(),
            citype("DOC", &[(ANY_VERSION, r"docs/.+\.pdf")]),
        );
        types.insert("BARE".to_string(), citype("BARE", &[]));
        QueryBuilder::new(Arc::new(StubComponents { groups, types }))
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn expected(predicates: impl IntoIterator<Item = Predicate>) -> PredicateSet {
        predicates.into_iter().collect()
    }

    #[tokio::test]
    async fn empty_params_still_filter_by_client() {
        let set = builder()
            .build("CLIENT_A", &params(&[]), "Etc/UTC")
            .await
            .unwrap();
        assert_eq!(
            set,
            expected([Predicate::GroupIdEndsWith("CLIENT_A".into())])
        );
    }

    #[tokio::test]
    async fn free_text_flags_and_project() {
        let set = builder()
            .build(
                "CLIENT_A",
                &params(&[
                    ("created_by", "jdoe"),
                    ("comment", "March"),
                    ("is_uploaded", "2"),
                    ("is_failed", "3"),
                    ("is_approved", "1"),
                    ("project", "billing"),
                ]),
                "Etc/UTC",
            )
            .await
            .unwrap();
        assert_eq!(
            set,
            expected([
                Predicate::AuthorContains("jdoe".into()),
                Predicate::CommentContains("March".into()),
                Predicate::Uploaded(true),
                Predicate::Failed(false),
                Predicate::GroupIdEndsWith("CLIENT_A".into()),
                Predicate::NameContains("billing".into()),
            ])
        );
    }

    #[tokio::test]
    async fn file_sentinel_matches_raw_substring() {
        let set = builder()
            .build(
                "CLIENT_A",
                &params(&[("component_0", "FILE"), ("component_1", "billing")]),
                "Etc/UTC",
            )
            .await
            .unwrap();
        assert_eq!(
            set,
            expected([
                Predicate::FileListContains("billing".into()),
                Predicate::GroupIdEndsWith("CLIENT_A".into()),
            ])
        );
    }

    #[tokio::test]
    async fn file_sentinel_without_fragment_adds_nothing() {
        let set = builder()
            .build("CLIENT_A", &params(&[("component_0", "FILE")]), "Etc/UTC")
            .await
            .unwrap();
        assert_eq!(
            set,
            expected([Predicate::GroupIdEndsWith("CLIENT_A".into())])
        );
    }

    #[tokio::test]
    async fn group_templates_union_into_one_pattern() {
        let set = builder()
            .build("CLIENT_A", &params(&[("component_0", "RELEASE")]), "Etc/UTC")
            .await
            .unwrap();
        assert_eq!(
            set,
            expected([
                Predicate::FileListMatches(r"distr/.+\.zip|docs/.+\.pdf".into()),
                Predicate::GroupIdEndsWith("CLIENT_A".into()),
            ])
        );
    }

    #[tokio::test]
    async fn version_selects_the_specific_template() {
        let set = builder()
            .build(
                "CLIENT_A",
                &params(&[("component_0", "DSTR"), ("component_1", "1.0")]),
                "Etc/UTC",
            )
            .await
            .unwrap();
        assert_eq!(
            set,
            expected([
                Predicate::FileListMatches(r"distr/.+-1\.0\.zip".into()),
                Predicate::GroupIdEndsWith("CLIENT_A".into()),
            ])
        );
    }

    #[tokio::test]
    async fn unresolvable_component_leaves_the_set_unchanged() {
        let with_unknown = builder()
            .build(
                "CLIENT_A",
                &params(&[("component_0", "NOPE"), ("created_by", "jdoe")]),
                "Etc/UTC",
            )
            .await
            .unwrap();
        let without = builder()
            .build("CLIENT_A", &params(&[("created_by", "jdoe")]), "Etc/UTC")
            .await
            .unwrap();
        assert_eq!(with_unknown, without);
    }

    #[tokio::test]
    async fn type_without_templates_adds_no_pattern() {
        let set = builder()
            .build("CLIENT_A", &params(&[("component_0", "BARE")]), "Etc/UTC")
            .await
            .unwrap();
        assert_eq!(
            set,
            expected([Predicate::GroupIdEndsWith("CLIENT_A".into())])
        );
    }

    #[tokio::test]
    async fn date_range_is_localized_and_runs_to_end_of_day() {
        let set = builder()
            .build(
                "CLIENT_A",
                &params(&[
                    ("date_range_after", "01-03-2024"),
                    ("date_range_before", "05-03-2024"),
                ]),
                "Europe/Berlin",
            )
            .await
            .unwrap();
        // Berlin is UTC+1 in March.
        assert_eq!(
            set,
            expected([
                Predicate::CreatedBetween(
                    Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap(),
                    Utc.with_ymd_and_hms(2024, 3, 5, 22, 59, 59).unwrap(),
                ),
                Predicate::GroupIdEndsWith("CLIENT_A".into()),
            ])
        );
    }

    #[tokio::test]
    async fn legacy_date_keys_feed_the_range() {
        let canonical = builder()
            .build(
                "CLIENT_A",
                &params(&[
                    ("date_range_after", "01-03-2024"),
                    ("date_range_before", "05-03-2024"),
                ]),
                "Etc/UTC",
            )
            .await
            .unwrap();
        let legacy = builder()
            .build(
                "CLIENT_A",
                &params(&[("date_from", "01-03-2024"), ("date_to", "05-03-2024")]),
                "Etc/UTC",
            )
            .await
            .unwrap();
        assert_eq!(canonical, legacy);
    }

    #[tokio::test]
    async fn missing_after_bound_defaults_to_the_minimum_instant() {
        let set = builder()
            .build(
                "CLIENT_A",
                &params(&[("date_range_before", "05-03-2024")]),
                "Etc/UTC",
            )
            .await
            .unwrap();
        assert_eq!(
            set,
            expected([
                Predicate::CreatedBetween(
                    DateTime::<Utc>::MIN_UTC,
                    Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 59).unwrap(),
                ),
                Predicate::GroupIdEndsWith("CLIENT_A".into()),
            ])
        );
    }

    #[tokio::test]
    async fn missing_before_bound_defaults_to_the_end_of_today() {
        let set = builder()
            .build(
                "CLIENT_A",
                &params(&[("date_range_after", "01-03-2024")]),
                "Etc/UTC",
            )
            .await
            .unwrap();
        let range = set
            .iter()
            .find_map(|predicate| match predicate {
                Predicate::CreatedBetween(start, end) => Some((*start, *end)),
                _ => None,
            })
            .unwrap();
        assert_eq!(range.0, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(range.1.date_naive(), Utc::now().date_naive());
        assert_eq!(
            range.1.time(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[tokio::test]
    async fn malformed_date_is_fatal() {
        let err = builder()
            .build(
                "CLIENT_A",
                &params(&[("date_range_after", "2024-03-01")]),
                "Etc/UTC",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidDate(value) if value == "2024-03-01"));
    }

    #[tokio::test]
    async fn unknown_timezone_is_fatal_when_dates_are_present() {
        let err = builder()
            .build(
                "CLIENT_A",
                &params(&[("date_range_after", "01-03-2024")]),
                "Mars/Olympus",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownTimezone(name) if name == "Mars/Olympus"));
    }

    #[tokio::test]
    async fn timezone_is_not_touched_without_date_params() {
        let set = builder()
            .build("CLIENT_A", &params(&[("created_by", "jdoe")]), "Mars/Olympus")
            .await
            .unwrap();
        assert_eq!(
            set,
            expected([
                Predicate::AuthorContains("jdoe".into()),
                Predicate::GroupIdEndsWith("CLIENT_A".into()),
            ])
        );
    }
}
