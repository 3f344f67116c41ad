#[cfg(test)]
mod tests {
    use {
        crate::record_core::{
            CombinationKey, Pipeline, PipelineOutput, RecordingDiagnostics, COMBINATION_FIELDS,
        },
        serde_json::{json, Value},
        std::{collections::HashMap, io::Cursor},
    };

    fn sample() -> Vec<Value> {
        vec![
            json!({"id": 1, "owner": "ann", "price": 10, "category": "books"}),
            json!({"id": 2, "owner": "ann", "price": 10, "category": "books"}),
            json!({"id": 3, "owner": "bob", "price": 4.5, "category": "books"}),
            json!({"id": 4, "owner": "bob", "price": 7, "category": "games"}),
            json!({"id": 5, "owner": "cy", "price": "free", "category": "games"}),
            json!({"id": 6, "owner": "cy", "price": 3}),
            json!({"id": 7, "owner": "dee", "price": 3, "category": "toys", "note": "x"}),
            json!({"id": 8, "owner": "dee", "price": 3.0, "category": "toys"}),
            json!([1, 2, 3]),
        ]
    }

    fn run(elements: &[Value]) -> (PipelineOutput, RecordingDiagnostics) {
        let input = serde_json::to_vec(elements).unwrap();
        let mut diag = RecordingDiagnostics::new();
        let output = Pipeline::new()
            .run_reader(Cursor::new(input), &mut diag)
            .unwrap();
        (output, diag)
    }

    /// Every key in the unique set occurs exactly once in the input
    #[test]
    fn test_uniqueness_invariant() {
        let elements = sample();
        let fields: Vec<String> = COMBINATION_FIELDS.iter().map(|f| f.to_string()).collect();

        let mut counts: HashMap<CombinationKey, usize> = HashMap::new();
        for element in &elements {
            if let Value::Object(record) = element {
                if let Ok(key) = CombinationKey::extract(record, &fields) {
                    *counts.entry(key).or_insert(0) += 1;
                }
            }
        }

        let (output, _) = run(&elements);
        assert_eq!(output.uniques.len(), 3);
        for (key, _) in output.uniques.iter() {
            assert_eq!(counts[key], 1, "key {} is not unique", key);
        }
        assert_eq!(output.totals.item_totals.values().sum::<u64>(), 3);
    }

    /// Skipped plus grouped covers every element
    #[test]
    fn test_no_record_vanishes() {
        let elements = sample();
        let (output, diag) = run(&elements);
        let stats = output.uniques.stats();

        assert_eq!(stats.elements_seen, elements.len());
        assert_eq!(stats.records_grouped + stats.skipped_total(), elements.len());
        assert_eq!(stats.skipped_total(), 2);
        assert_eq!(diag.scans, vec![stats.clone()]);
    }

    #[test]
    fn test_idempotent() {
        let elements = sample();
        let (first, _) = run(&elements);
        let (second, _) = run(&elements);
        assert_eq!(first, second);
    }

    #[test]
    fn test_order_independent() {
        let elements = sample();
        let (forward, _) = run(&elements);

        let mut reversed = elements.clone();
        reversed.reverse();
        let (backward, _) = run(&reversed);

        let mut rotated = elements;
        rotated.rotate_left(4);
        let (shifted, _) = run(&rotated);

        assert_eq!(forward.uniques.to_records(), backward.uniques.to_records());
        assert_eq!(forward.totals, backward.totals);
        assert_eq!(forward.totals, shifted.totals);
    }

    #[test]
    fn test_sample_totals() {
        let (output, _) = run(&sample());

        let rendered = serde_json::to_value(&output.totals).unwrap();
        assert_eq!(
            rendered,
            json!({
                "price_totals": {"books": 4.5, "games": 7},
                "item_totals": {"books": 1, "games": 2},
            })
        );
    }
}
