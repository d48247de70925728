//! Turns store API request input into a [`SearchCriteria`].

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::api::types::{CriteriaRequest, ShippingMethodQuery};
use crate::domain::SearchCriteria;
use crate::error::{StoreApiError, StoreApiResult};

/// Parse a request body into a JSON object. An empty body is an empty object.
pub fn parse_body(body: &[u8]) -> StoreApiResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Build the criteria from query parameters and the body.
///
/// Query parameters take precedence over body values for `limit`, `page`
/// and `ids`.
pub fn build_criteria(
    query: &ShippingMethodQuery,
    body: &Map<String, Value>,
    max_limit: u32,
) -> StoreApiResult<SearchCriteria> {
    let request: CriteriaRequest = if body.is_empty() {
        CriteriaRequest::default()
    } else {
        serde_json::from_value(Value::Object(body.clone()))?
    };

    let limit = match &query.limit {
        Some(raw) => Some(parse_number("limit", raw)?),
        None => request.limit,
    };
    let page = match &query.page {
        Some(raw) => Some(parse_number("page", raw)?),
        None => request.page,
    };
    let ids = match &query.ids {
        Some(raw) => parse_ids(raw)?,
        None => request.ids,
    };

    if let Some(limit) = limit {
        if limit == 0 || limit > max_limit {
            return Err(StoreApiError::BadRequest(format!(
                "limit must be between 1 and {}",
                max_limit
            )));
        }
    }
    if page == Some(0) {
        return Err(StoreApiError::BadRequest("page must be at least 1".to_string()));
    }

    let mut criteria = SearchCriteria::with_ids(ids);
    criteria.set_limit(limit).set_page(page);

    for filter in request.filter {
        criteria.add_filter(filter);
    }
    for sorting in request.sort {
        criteria.add_sorting(sorting);
    }
    for association in request.associations.into_keys() {
        criteria.add_association(association);
    }
    for aggregation in request.aggregations {
        criteria.add_aggregation(aggregation);
    }

    Ok(criteria)
}

fn parse_number(name: &str, raw: &str) -> StoreApiResult<u32> {
    raw.trim()
        .parse()
        .map_err(|_| StoreApiError::BadRequest(format!("{} must be a positive integer", name)))
}

fn parse_ids(raw: &str) -> StoreApiResult<Vec<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            Uuid::parse_str(id)
                .map_err(|_| StoreApiError::BadRequest(format!("Invalid id: {}", id)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Filter, SortOrder, Sorting};
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_parse_body() {
        assert!(parse_body(b"").unwrap().is_empty());
        assert!(parse_body(b"  \n").unwrap().is_empty());
        assert_eq!(parse_body(br#"{"limit": 2}"#).unwrap()["limit"], json!(2));
        assert!(matches!(
            parse_body(b"[1, 2]"),
            Err(StoreApiError::BadRequest(_))
        ));
        assert!(matches!(
            parse_body(b"{not json"),
            Err(StoreApiError::Serialization(_))
        ));
    }

    #[test]
    fn test_query_parameters() {
        let id = Uuid::new_v4();
        let query = ShippingMethodQuery {
            limit: Some("10".to_string()),
            page: Some("2".to_string()),
            ids: Some(format!("{}, ", id)),
            only_available: None,
        };

        let criteria = build_criteria(&query, &Map::new(), 100).unwrap();

        assert_eq!(criteria.limit(), Some(10));
        assert_eq!(criteria.page(), 2);
        assert_eq!(criteria.ids(), &[id]);
    }

    #[test]
    fn test_body_criteria() {
        let body = object(json!({
            "limit": 5,
            "filter": [{"type": "contains", "field": "name", "value": "Exp"}],
            "sort": [{"field": "name", "order": "DESC"}],
            "associations": {"availabilityRule": {}},
            "aggregations": [{"name": "count", "type": "count", "field": "id"}],
            "onlyAvailable": true
        }));

        let criteria = build_criteria(&ShippingMethodQuery::default(), &body, 100).unwrap();

        assert_eq!(criteria.limit(), Some(5));
        assert_eq!(
            criteria.filters(),
            &[Filter::Contains {
                field: "name".to_string(),
                value: "Exp".to_string()
            }]
        );
        assert_eq!(
            criteria.sorting(),
            &[Sorting {
                field: "name".to_string(),
                order: SortOrder::Desc
            }]
        );
        assert!(criteria.has_association("availabilityRule"));
        assert_eq!(criteria.aggregations().len(), 1);
    }

    #[test]
    fn test_query_limit_wins_over_body() {
        let query = ShippingMethodQuery {
            limit: Some("3".to_string()),
            ..ShippingMethodQuery::default()
        };
        let body = object(json!({"limit": 50}));

        let criteria = build_criteria(&query, &body, 100).unwrap();
        assert_eq!(criteria.limit(), Some(3));
    }

    #[test]
    fn test_invalid_pagination_rejected() {
        for (limit, page) in [("0", "1"), ("101", "1"), ("abc", "1"), ("10", "0")] {
            let query = ShippingMethodQuery {
                limit: Some(limit.to_string()),
                page: Some(page.to_string()),
                ..ShippingMethodQuery::default()
            };
            assert!(
                matches!(
                    build_criteria(&query, &Map::new(), 100),
                    Err(StoreApiError::BadRequest(_))
                ),
                "limit={} page={} should be rejected",
                limit,
                page
            );
        }
    }

    #[test]
    fn test_malformed_body_fields_rejected() {
        let body = object(json!({"filter": [{"type": "regex", "field": "name"}]}));
        assert!(matches!(
            build_criteria(&ShippingMethodQuery::default(), &body, 100),
            Err(StoreApiError::Serialization(_))
        ));

        let query = ShippingMethodQuery {
            ids: Some("not-an-id".to_string()),
            ..ShippingMethodQuery::default()
        };
        assert!(matches!(
            build_criteria(&query, &Map::new(), 100),
            Err(StoreApiError::BadRequest(_))
        ));
    }
}
