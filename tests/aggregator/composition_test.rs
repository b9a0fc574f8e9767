//! Integration tests for SQL composition through the Aggregator.

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use serde_json::json;
    use shortcode::prelude::*;
    use sqlparser::dialect::MySqlDialect;
    use sqlparser::parser::Parser;

    fn loader() -> MemoryLoader {
        MemoryLoader::new()
            .with(
                "customer",
                FieldSpecConfig::new("customer", "c").with_fields(["id", "name"]),
            )
            .with(
                "customer_group",
                FieldSpecConfig::new("customer_group", "cg").with_fields(["id", "name"]),
            )
            .with(
                "product",
                FieldSpecConfig::new("product", "p")
                    .with_fields(["id", "name"])
                    .with_field(FieldConfig::new("brand").sql("b.name").table_alias("b"))
                    .with_join(JoinConfig::new("brand", "b").on("b.id = <TABLE>.brand_id")),
            )
    }

    fn aggregator(exec: RecordingExecutor, requests: Vec<SpecRequest>) -> Aggregator {
        let mut agg = Aggregator::new(loader(), exec, Mustache::new());
        agg.init_specs(requests, Some(false)).unwrap();
        agg
    }

    fn assert_parses(sql: &str) {
        Parser::parse_sql(&MySqlDialect {}, sql).unwrap();
    }

    #[test]
    fn test_join_scenario() {
        let exec = RecordingExecutor::new().with_response(QueryResult::from_values(vec![json!({
            "customer___id": 3,
            "customer___name": "Ann",
            "customer_group___id": 1,
            "customer_group___name": "Retail"
        })]));
        let mut agg = aggregator(exec.clone(), vec!["customer".into(), "customer_group".into()]);
        agg.set_data_params(vec![DataParamGroup::new(["customer", "customer_group"])
            .key_alias("customer")
            .join(true)
            .where_all("c.id < 5")
            .on("customer_group", "cg.id = c.group_id")]);
        agg.fetch().unwrap();

        let sql = exec.last_query().unwrap();
        assert_snapshot!(sql, @"SELECT c.id AS `customer___id`, c.name AS `customer___name`, cg.id AS `customer_group___id`, cg.name AS `customer_group___name` FROM `customer` `c` LEFT JOIN `customer_group` `cg` ON (cg.id = c.group_id) WHERE c.id < 5");
        assert_parses(&sql);

        assert_eq!(
            agg.data(),
            &json!({
                "customer": {"id": 3, "name": "Ann"},
                "customer_group": {"id": 1, "name": "Retail"}
            })
        );
        assert!(!agg.has_no_results());
    }

    #[test]
    fn test_per_alias_where_and_spec_joins() {
        let exec = RecordingExecutor::new();
        let agg = aggregator(exec.clone(), vec!["product".into(), "customer".into()]);
        let group = DataParamGroup::new(["product", "customer"])
            .key_alias("listing")
            .where_for("product", "p.active = 1")
            .where_for("customer", "c.id = 9")
            .order_by("p.name")
            .limit(20);

        let sql = agg.sql_for(&group).unwrap();
        assert_snapshot!(sql, @"SELECT p.id AS `product___id`, p.name AS `product___name`, b.name AS `product___brand`, c.id AS `customer___id`, c.name AS `customer___name` FROM `product` `p`, `brand` `b`, `customer` `c` WHERE p.active = 1 AND (b.id = p.brand_id) AND c.id = 9 ORDER BY p.name LIMIT 20");
        assert_parses(&sql);
        assert!(exec.queries().is_empty());
    }

    #[test]
    fn test_excluded_join_field_prunes_join() {
        let agg = aggregator(
            RecordingExecutor::new(),
            vec![SpecRequest::new("product").exclude(["brand"])],
        );
        let sql = agg.sql_for(&DataParamGroup::new(["product"])).unwrap();
        assert!(!sql.contains("brand"));
        assert_eq!(
            sql,
            "SELECT p.id AS `product___id`, p.name AS `product___name` FROM `product` `p`"
        );
    }

    #[test]
    fn test_on_pred_drops_condition_without_spec() {
        let agg = aggregator(RecordingExecutor::new(), vec!["customer".into(), "customer_group".into()]);
        let group = DataParamGroup::new(["customer", "customer_group"])
            .key_alias("c")
            .join(true)
            .on("customer_group", "cg.id = c.group_id")
            .on_pred("customer_group", ["customer"]);
        assert!(agg.sql_for(&group).unwrap().contains("ON (cg.id = c.group_id)"));

        let group = group.on_pred("customer_group", ["missing_alias"]);
        let sql = agg.sql_for(&group).unwrap();
        assert!(sql.contains("LEFT JOIN `customer_group` `cg`"));
        assert!(!sql.contains("ON ("));
    }

    #[test]
    fn test_postgres_dialect() {
        let agg = aggregator(RecordingExecutor::new(), vec!["customer".into()])
            .with_dialect(Dialect::Postgres);
        let sql = agg
            .sql_for(&DataParamGroup::new(["customer"]).limit("10, 5"))
            .unwrap();
        assert_eq!(
            sql,
            "SELECT c.id AS \"customer___id\", c.name AS \"customer___name\" FROM \"customer\" \"c\" LIMIT 5 OFFSET 10"
        );
    }

    #[test]
    fn test_count() {
        let exec = RecordingExecutor::new()
            .with_response(QueryResult::from_values(vec![json!({"_count": 42})]));
        let agg = aggregator(exec.clone(), vec!["customer".into()]);
        let group = DataParamGroup::new(["customer"]).where_all("c.id > 1").limit(1);

        assert_eq!(agg.count(&group).unwrap(), 42);
        assert_eq!(
            exec.last_query().unwrap(),
            "SELECT COUNT(*) AS `_count` FROM `customer` `c` WHERE c.id > 1"
        );
    }

    #[test]
    fn test_unresolvable_groups_are_skipped() {
        let exec = RecordingExecutor::new();
        let mut agg = aggregator(exec.clone(), vec!["customer".into(), "customer_group".into()]);
        agg.set_data_params(vec![
            DataParamGroup::new(["ghost"]),
            // Two aliases and no key alias
            DataParamGroup::new(["customer", "customer_group"]),
        ]);
        agg.fetch().unwrap();
        assert!(exec.queries().is_empty());
        assert_eq!(agg.data(), &json!({}));
    }
}
