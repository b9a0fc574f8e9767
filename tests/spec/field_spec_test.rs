//! Integration tests for FieldSpec filtering and projection.

#[cfg(test)]
mod tests {
    use shortcode::spec::{
        FieldConfig, FieldSpec, FieldSpecConfig, JoinConfig, PostprocessRegistry, SpecRequest,
    };

    fn product_config() -> FieldSpecConfig {
        FieldSpecConfig::new("product", "p")
            .with_field(FieldConfig::new("id"))
            .with_field(FieldConfig::new("name"))
            .with_field(FieldConfig::new("price").sql("ROUND(<TABLE>.price * <rate>, 2)"))
            .with_field(FieldConfig::new("brand").sql("b.name").table_alias("b"))
            .with_field(FieldConfig::new("category").alias_of("name").table_alias("pc"))
            .with_join(JoinConfig::new("brand", "b").on("b.id = <TABLE>.brand_id"))
            .with_join(JoinConfig::new("product_category", "pc").on("pc.id = <TABLE>.category_id"))
    }

    fn spec(request: SpecRequest) -> FieldSpec {
        FieldSpec::new(&request, Some(product_config()), &PostprocessRegistry::default())
    }

    #[test]
    fn test_filtering_idempotent_for_disjoint_lists() {
        let mut s = spec(SpecRequest::new("product").exclude(["price"]));
        let before = s.filtered_field_keys().to_vec();

        s.add_exclude(&["price"]);
        assert_eq!(s.filtered_field_keys(), before.as_slice());

        s.add_include(&["id", "name"]);
        let after_include = s.filtered_field_keys().to_vec();
        assert_eq!(after_include, vec!["id", "name"]);

        s.add_include(&["id", "name"]);
        assert_eq!(s.filtered_field_keys(), after_include.as_slice());
    }

    #[test]
    fn test_filtering_order_independent_for_disjoint_lists() {
        let include = ["id", "name", "category"];
        let exclude = ["price", "brand"];

        let mut exclude_first = spec(SpecRequest::new("product"));
        exclude_first.add_exclude(&exclude);
        exclude_first.add_include(&include);

        let mut include_first = spec(SpecRequest::new("product"));
        include_first.add_include(&include);
        include_first.add_exclude(&exclude);

        assert_eq!(exclude_first.filtered_field_keys(), include_first.filtered_field_keys());
        assert!(!include_first.filtered_field_keys().iter().any(|k| k == "price" || k == "brand"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let mut s = spec(SpecRequest::new("product").include(["id", "price"]));
        s.add_exclude(&["price"]);
        assert_eq!(s.include(), ["id"]);
        assert_eq!(s.filtered_field_keys(), ["id"]);

        // An excluded name cannot be re-included
        s.add_include(&["price"]);
        assert_eq!(s.filtered_field_keys(), ["id"]);
    }

    #[test]
    fn test_set_include_only_resets_exclude() {
        let mut s = spec(SpecRequest::new("product").exclude(["name"]));
        s.set_include_only(&["name", "brand"]);
        assert!(s.exclude().is_empty());
        assert_eq!(s.filtered_field_keys(), ["name", "brand"]);
    }

    #[test]
    fn test_projection_empty_cases() {
        let registry = PostprocessRegistry::default();

        let no_fields = FieldSpec::new(
            &SpecRequest::new("product"),
            Some(FieldSpecConfig::new("product", "p")),
            &registry,
        );
        assert!(no_fields.projection().is_empty());

        let no_table = FieldSpec::new(
            &SpecRequest::new("product"),
            Some(FieldSpecConfig::new("", "p").with_fields(["id"])),
            &registry,
        );
        assert!(no_table.projection().is_empty());

        let no_alias = FieldSpec::new(
            &SpecRequest::new("product"),
            Some(FieldSpecConfig::new("product", "").with_fields(["id"])),
            &registry,
        );
        assert!(no_alias.projection().is_empty());

        let missing = FieldSpec::new(&SpecRequest::new("product"), None, &registry);
        assert!(!missing.is_valid());
        assert!(missing.projection().is_empty());

        let everything_excluded = spec(
            SpecRequest::new("product").exclude(["id", "name", "price", "brand", "category"]),
        );
        assert!(everything_excluded.projection().is_empty());
    }

    #[test]
    fn test_join_pruning() {
        let s = spec(SpecRequest::new("product").include(["id", "brand"]));
        let projection = s.projection();
        let joins: Vec<_> = projection.joins.iter().map(|j| j.table_alias.as_str()).collect();
        assert_eq!(joins, vec!["b"]);
        assert_eq!(projection.joins[0].on.as_deref(), Some("b.id = p.brand_id"));

        let s = spec(SpecRequest::new("product").include(["id", "name"]));
        assert!(s.projection().joins.is_empty());
    }

    #[test]
    fn test_projection_expressions() {
        let s = spec(
            SpecRequest::new("product")
                .key_alias("item")
                .var("rate", "1.2")
                .exclude(["brand"]),
        );
        let exprs: Vec<_> = s
            .projection()
            .fields
            .iter()
            .map(|f| format!("{} AS {}", f.expr, f.column_alias))
            .collect();
        assert_eq!(
            exprs,
            vec![
                "p.id AS item___id",
                "p.name AS item___name",
                "ROUND(p.price * 1.2, 2) AS item___price",
                "pc.name AS item___category",
            ]
        );
    }

    #[test]
    fn test_request_overrides() {
        let s = spec(
            SpecRequest::new("product")
                .table("archived_product")
                .table_alias("ap")
                .joins(vec![])
                .add_field(FieldConfig::new("sku")),
        );
        assert_eq!(s.table(), "archived_product");
        assert_eq!(s.table_alias(), "ap");
        assert_eq!(s.field_keys()[0], "sku");
        // Empty joins in the request keep the configured ones
        assert_eq!(s.config().joins.len(), 2);
    }

    #[test]
    fn test_nosql_fields_are_not_projected() {
        let registry = PostprocessRegistry::default();
        let s = FieldSpec::new(
            &SpecRequest::new("product"),
            Some(
                FieldSpecConfig::new("product", "p")
                    .with_field(FieldConfig::new("id"))
                    .with_field(FieldConfig::new("url").nosql().description("Product page")),
            ),
            &registry,
        );
        let names: Vec<_> = s.projection().fields.iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["id"]);
        assert_eq!(s.descriptions()["url"], "Product page");
    }

    #[test]
    fn test_check_fields() {
        let s = spec(SpecRequest::new("product").include(["id"]));
        assert_eq!(s.check_fields(&["id", "price", "colour"]), vec!["colour"]);
    }
}
