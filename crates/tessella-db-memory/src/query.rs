//! Query execution against in-memory records: filter, sort, paginate.

use serde_json::Value;
use std::cmp::Ordering;
use tessella_core::Record;
use tessella_storage::{RecordQuery, SortOrder};

/// Applies a translated query to a full record set, returning the requested
/// page and the total match count.
pub fn run_query(mut records: Vec<Record>, query: &RecordQuery) -> (Vec<Record>, usize) {
    records.retain(|r| query.matches(r));
    let total = records.len();

    sort_records(&mut records, query);

    let page = records
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();
    (page, total)
}

fn sort_records(records: &mut [Record], query: &RecordQuery) {
    records.sort_by(|a, b| {
        let primary = match &query.sort.field {
            Some(field) => cmp_field_values(a.get_field(field), b.get_field(field)),
            None => a.created_at.cmp(&b.created_at),
        };
        let primary = match query.sort.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        // Ties always break by created_at ascending, then id, for
        // deterministic paging.
        primary
            .then(a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Orders loosely-typed field values: numbers before strings, missing values
/// last.
fn cmp_field_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(_), _) => Ordering::Less,
            (_, Value::Number(_)) => Ordering::Greater,
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessella_core::{Entity, FieldDefinition, FieldType};
    use tessella_storage::ListParams;

    fn entity() -> Entity {
        Entity::new(
            "e1",
            "ws1",
            "leads",
            "Leads",
            vec![
                FieldDefinition::new("full_name", "Full Name", FieldType::Text).unwrap(),
                FieldDefinition::new("score", "Score", FieldType::Number).unwrap(),
            ],
        )
        .unwrap()
    }

    fn record(id: &str, name: &str, score: i64) -> Record {
        let mut data = serde_json::Map::new();
        data.insert("full_name".into(), json!(name));
        data.insert("score".into(), json!(score));
        Record::new(id, "ws1", "e1", data)
    }

    #[test]
    fn test_sort_by_numeric_field() {
        let records = vec![
            record("a", "Ada", 30),
            record("b", "Grace", 10),
            record("c", "Alan", 20),
        ];
        let query = ListParams::default()
            .with_sort("score", SortOrder::Asc)
            .to_query(&entity());
        let (page, total) = run_query(records, &query);
        assert_eq!(total, 3);
        let scores: Vec<_> = page.iter().map(|r| r.data["score"].as_i64().unwrap()).collect();
        assert_eq!(scores, vec![10, 20, 30]);
    }

    #[test]
    fn test_sort_desc_keeps_stable_ties() {
        // Pin created_at so the tie reaches the id tiebreak.
        let mut b = record("b", "Grace", 10);
        let a = record("a", "Ada", 10);
        b.created_at = a.created_at;
        let records = vec![b, a, record("c", "Alan", 20)];
        let query = ListParams::default()
            .with_sort("score", SortOrder::Desc)
            .to_query(&entity());
        let (page, _) = run_query(records, &query);
        assert_eq!(page[0].data["score"], json!(20));
        // Equal scores and timestamps fall back to id ascending.
        assert_eq!(page[1].id, "a");
        assert_eq!(page[2].id, "b");
    }

    #[test]
    fn test_pagination_window() {
        let records: Vec<_> = (0..7).map(|i| record(&format!("r{i}"), "X", i)).collect();
        let query = ListParams::default()
            .with_page(2, 3)
            .with_sort("score", SortOrder::Asc)
            .to_query(&entity());
        let (page, total) = run_query(records, &query);
        assert_eq!(total, 7);
        let scores: Vec<_> = page.iter().map(|r| r.data["score"].as_i64().unwrap()).collect();
        assert_eq!(scores, vec![3, 4, 5]);
    }

    #[test]
    fn test_missing_sort_values_sort_last() {
        let mut no_score = record("z", "Zed", 0);
        no_score.data.remove("score");
        let records = vec![no_score, record("a", "Ada", 5)];
        let query = ListParams::default()
            .with_sort("score", SortOrder::Asc)
            .to_query(&entity());
        let (page, _) = run_query(records, &query);
        assert_eq!(page[0].id, "a");
        assert_eq!(page[1].id, "z");
    }
}
