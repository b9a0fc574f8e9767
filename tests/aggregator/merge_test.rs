//! Integration tests for fetching and merging group data.

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use shortcode::prelude::*;

    fn loader() -> MemoryLoader {
        MemoryLoader::new()
            .with(
                "order",
                FieldSpecConfig::new("orders", "o")
                    .with_fields(["id"])
                    .with_field(FieldConfig::new("status").postprocess("upper")),
            )
            .with(
                "product",
                FieldSpecConfig::new("product", "p").with_fields(["id", "name"]),
            )
            .with("global", FieldSpecConfig::nosql().with_fields(["site"]))
    }

    fn requests() -> Vec<SpecRequest> {
        vec![
            "order".into(),
            SpecRequest::new("product").plural("order.products"),
            SpecRequest::new("product")
                .key_alias("featured")
                .plural("order.products"),
        ]
    }

    fn aggregator(exec: RecordingExecutor) -> Aggregator {
        let mut agg = Aggregator::new(loader(), exec, Mustache::new());
        agg.init_specs(requests(), None).unwrap();
        agg
    }

    fn rows(values: Vec<Value>) -> QueryResult {
        QueryResult::from_values(values)
    }

    #[test]
    fn test_plural_paths_concatenate() {
        let exec = RecordingExecutor::new()
            .with_response(rows(vec![json!({"order___id": 7, "order___status": "paid"})]))
            .with_response(rows(vec![
                json!({"product___id": 1, "product___name": "Pen"}),
                json!({"product___id": 2, "product___name": "Ink"}),
            ]))
            .with_response(rows(vec![json!({"featured___id": 9, "featured___name": "Pad"})]));
        let mut agg = aggregator(exec.clone());
        agg.set_data_params(vec![
            DataParamGroup::new(["order"]),
            DataParamGroup::new(["product"]),
            DataParamGroup::new(["featured"]),
        ]);
        agg.fetch().unwrap();

        assert_eq!(exec.queries().len(), 3);
        assert_eq!(
            agg.data(),
            &json!({
                "order": {
                    "id": 7,
                    "status": "PAID",
                    "products": [
                        {"product": {"id": 1, "name": "Pen"}},
                        {"product": {"id": 2, "name": "Ink"}},
                        {"featured": {"id": 9, "name": "Pad"}}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_flat_keys_last_write_wins() {
        let mut agg = aggregator(RecordingExecutor::new());
        agg.set_external_data_getter("first", |_, _| {
            Ok(GroupData::from_value(json!({"order": {"id": 1}, "note": "a"})))
        });
        agg.set_external_data_getter("second", |_, _| {
            Ok(GroupData::from_value(json!({"order": {"id": 2}})))
        });
        agg.set_data_params(vec![
            DataParamGroup::new(["order"]).key_alias("first"),
            DataParamGroup::new(["order"]).key_alias("second"),
        ]);
        agg.fetch().unwrap();
        assert_eq!(agg.data(), &json!({"order": {"id": 2}, "note": "a"}));
    }

    #[test]
    fn test_input_rows_replace_sql() {
        let exec = RecordingExecutor::new();
        let mut agg = aggregator(exec.clone());
        agg.set_data_params(vec![
            DataParamGroup::new(["order"]),
            DataParamGroup::new(["product"]).postprocess("name", |v: Value| {
                json!(v.as_str().unwrap_or_default().to_lowercase())
            }),
        ]);
        agg.fetch_with(&[
            json!({"order___id": 5, "order___status": "new", "order___other": 1}),
            json!([{"product___id": 1, "product___name": "PEN"}]),
        ])
        .unwrap();

        assert!(exec.queries().is_empty());
        assert_eq!(
            agg.data(),
            &json!({
                "order": {
                    "id": 5,
                    "status": "NEW",
                    "products": [{"product": {"id": 1, "name": "pen"}}]
                }
            })
        );
    }

    #[test]
    fn test_empty_input_falls_back_to_sql() {
        let exec = RecordingExecutor::new();
        let mut agg = aggregator(exec.clone());
        agg.set_data_params(vec![DataParamGroup::new(["order"])]);
        agg.fetch_with(&[json!([])]).unwrap();
        assert_eq!(exec.queries().len(), 1);
    }

    #[test]
    fn test_external_beats_custom() {
        let mut agg = aggregator(RecordingExecutor::new());
        agg.register_fetcher("order", |_, _| Ok(GroupData::from_value(json!({"src": "custom"}))));
        agg.set_external_data_getter("order", |group, plural| {
            assert!(!plural);
            let tag = group.extra.get("tag").cloned().unwrap_or(Value::Null);
            Ok(GroupData::from_value(json!({"src": "external", "tag": tag})))
        });
        agg.set_data_params(vec![DataParamGroup::new(["order"]).extra("tag", json!("x"))]);
        agg.fetch().unwrap();
        assert_eq!(agg.data(), &json!({"src": "external", "tag": "x"}));
    }

    #[test]
    fn test_fetcher_error_propagates() {
        let mut agg = aggregator(RecordingExecutor::new());
        agg.register_fetcher("order", |_, _| Err(ShortcodeError::fetcher("order", "backend down")));
        agg.set_data_params(vec![DataParamGroup::new(["order"])]);
        let err = agg.fetch().unwrap_err();
        assert!(matches!(err, ShortcodeError::Fetcher { ref alias, .. } if alias == "order"));
    }

    #[test]
    fn test_executor_error_propagates() {
        let failing = |sql: &str| -> Result<QueryResult, shortcode::executor::ExecutorError> {
            Err(shortcode::executor::ExecutorError::Query {
                sql: sql.to_string(),
                message: "no such table".into(),
            })
        };
        let mut agg = Aggregator::new(loader(), failing, Mustache::new());
        agg.init_specs(requests(), None).unwrap();
        agg.set_data_params(vec![DataParamGroup::new(["order"])]);
        assert!(matches!(agg.fetch(), Err(ShortcodeError::Executor(_))));
    }

    #[test]
    fn test_processor_runs_once_on_whole_tree() {
        let exec = RecordingExecutor::new()
            .with_response(rows(vec![json!({"order___id": 1, "order___status": "a"})]));
        let mut agg = aggregator(exec);
        agg.set_external_data_processor(|mut data| {
            data["processed"] = json!(true);
            data
        });
        agg.set_data_params(vec![DataParamGroup::new(["order"])]);
        agg.fetch().unwrap();
        assert_eq!(agg.data()["processed"], json!(true));
        assert_eq!(agg.data()["order"]["id"], json!(1));
    }

    #[test]
    fn test_no_results_flag_is_sticky() {
        let exec = RecordingExecutor::new()
            .with_response(QueryResult::empty())
            .with_response(rows(vec![json!({"order___id": 1})]));
        let mut agg = aggregator(exec);
        agg.set_data_params(vec![DataParamGroup::new(["order"])]);

        agg.fetch().unwrap();
        assert!(agg.has_no_results());
        assert_eq!(agg.data(), &json!({}));

        agg.fetch().unwrap();
        assert!(agg.has_no_results());
        assert_eq!(agg.data()["order"]["id"], json!(1));

        agg.reset();
        assert!(!agg.has_no_results());
    }

    #[test]
    fn test_no_results_flag_survives_later_plural_rows() {
        let exec = RecordingExecutor::new()
            .with_response(QueryResult::empty())
            .with_response(rows(vec![json!({"product___id": 1, "product___name": "Pen"})]));
        let mut agg = aggregator(exec);
        agg.set_data_params(vec![
            DataParamGroup::new(["order"]),
            DataParamGroup::new(["product"]),
        ]);

        agg.fetch().unwrap();
        assert!(agg.has_no_results());
        assert_eq!(
            agg.data(),
            &json!({"order": {"products": [{"product": {"id": 1, "name": "Pen"}}]}})
        );
    }

    #[test]
    fn test_fetchers_see_only_aliases_with_specs() {
        let mut agg = aggregator(RecordingExecutor::new());
        agg.set_external_data_getter("order", |group, _| {
            Ok(GroupData::from_value(json!({"seen": group.key_aliases})))
        });
        agg.register_fetcher("product", |group, _| {
            Ok(GroupData::Rows(vec![json!({"seen": group.key_aliases})]))
        });
        agg.set_data_params(vec![
            DataParamGroup::new(["order", "ghost"]),
            DataParamGroup::new(["ghost", "product"]),
        ]);
        agg.fetch().unwrap();

        assert_eq!(agg.data()["seen"], json!(["order"]));
        assert_eq!(agg.data()["order"]["products"], json!([{"seen": ["product"]}]));
    }

    #[test]
    fn test_global_spec_is_added_and_served_externally() {
        let mut agg = aggregator(RecordingExecutor::new());
        assert!(agg.specs().contains("global"));

        agg.set_external_data_getter("global", |_, _| {
            Ok(GroupData::from_value(json!({"global": {"site": "Shop"}})))
        });
        agg.set_data_params(vec![DataParamGroup::new(["global"])]);
        agg.fetch().unwrap();
        assert_eq!(agg.data(), &json!({"global": {"site": "Shop"}}));
    }
}
