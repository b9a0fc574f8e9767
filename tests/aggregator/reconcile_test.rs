//! Integration tests for template-field reconciliation.

#[cfg(test)]
mod tests {
    use shortcode::prelude::*;

    fn loader() -> MemoryLoader {
        MemoryLoader::new()
            .with("a", FieldSpecConfig::new("ta", "a").with_fields(["f1", "f2"]))
            .with("b", FieldSpecConfig::new("tb", "b").with_fields(["f1", "f2"]))
            .with("c", FieldSpecConfig::new("tc", "c").with_fields(["f1"]))
            .with("item", FieldSpecConfig::new("item", "i").with_fields(["name", "qty"]))
    }

    fn aggregator() -> Aggregator {
        let mut agg = Aggregator::new(loader(), RecordingExecutor::new(), Mustache::new());
        agg.init_specs(
            vec![
                "a".into(),
                "b".into(),
                "c".into(),
                SpecRequest::new("item").plural("items"),
            ],
            Some(false),
        )
        .unwrap();
        agg
    }

    #[test]
    fn test_round_trip_pruning() {
        let mut agg = aggregator();
        agg.set_template("{{a.f1}} {{b.f2}}")
            .extract_fields_from_template(&[] as &[&str], true)
            .unwrap();

        assert_eq!(agg.specs().aliases().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(agg.specs().get("a").unwrap().filtered_field_keys(), ["f1"]);
        assert_eq!(agg.specs().get("b").unwrap().filtered_field_keys(), ["f2"]);

        let sql = agg.sql_for(&DataParamGroup::new(["a"])).unwrap();
        assert_eq!(sql, "SELECT a.f1 AS `a___f1` FROM `ta` `a`");
    }

    #[test]
    fn test_extract_fields() {
        let mut agg = aggregator();
        agg.set_template(
            "{{! comment }}{{a.f1}}{{{b.f2}}}{{#items}}{{item.name}}{{#separator}}, {{/separator}}{{/items}}{{^items}}none{{/items}}{{a.f1}}",
        );
        assert_eq!(
            agg.extract_fields().unwrap(),
            vec!["a.f1", "b.f2", "items", "item.name", "separator"]
        );
        assert!(agg.check_fields_from_template().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_fields_reported() {
        let mut agg = aggregator();
        agg.set_template("{{a.f1}} {{a.nope}} {{ghost}} {{c.f1.deep}}");
        assert_eq!(
            agg.check_fields_from_template().unwrap(),
            vec!["ghost", "c.f1.deep", "a.nope"]
        );
    }

    #[test]
    fn test_unknown_fields_ignored_when_pruning() {
        let mut agg = aggregator();
        agg.set_template("{{a.f1}} {{a.nope}}")
            .extract_fields_from_template(&["item.qty"], true)
            .unwrap();

        assert_eq!(agg.specs().aliases().collect::<Vec<_>>(), vec!["a", "item"]);
        assert_eq!(agg.specs().get("a").unwrap().filtered_field_keys(), ["f1"]);
        assert_eq!(agg.specs().get("item").unwrap().filtered_field_keys(), ["qty"]);
    }

    #[test]
    fn test_set_fields_ignores_template() {
        let mut agg = aggregator();
        agg.set_template("{{a.f1}}").set_fields(&["c.f1"]);
        assert_eq!(agg.specs().aliases().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_no_template_keeps_everything() {
        let mut agg = aggregator();
        agg.extract_fields_from_template(&[] as &[&str], true).unwrap();
        assert_eq!(agg.specs().len(), 4);
    }

    #[test]
    fn test_malformed_template_is_an_error() {
        let mut agg = aggregator();
        agg.set_template("{{a.f1");
        assert!(agg.extract_fields().is_err());
    }
}
