//! Integration tests for DirLoader against real files.

#[cfg(test)]
mod tests {
    use shortcode::spec::{DirLoader, LoadError, SpecLoader};
    use std::fs;
    use tempfile::TempDir;

    fn spec_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("customer.toml"),
            r#"
table = "customer"
table_alias = "c"

[[fields]]
name = "id"

[[fields]]
name = "name"
postprocess = "trim"
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("global.json"),
            r#"{"nosql": true, "fields": [{"name": "site", "description": "Site name"}]}"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("catalog")).unwrap();
        fs::write(
            dir.path().join("catalog").join("product.toml"),
            "table = \"product\"\ntable_alias = \"p\"\n[[fields]]\nname = \"sku\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.toml"), "table = [").unwrap();
        dir
    }

    #[test]
    fn test_load_toml() {
        let dir = spec_dir();
        let loader = DirLoader::new(dir.path());
        let cfg = loader.load("customer").unwrap().unwrap();
        assert_eq!(cfg.table, "customer");
        assert_eq!(cfg.field_names().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(cfg.field("name").unwrap().postprocess.as_deref(), Some("trim"));
    }

    #[test]
    fn test_load_json() {
        let dir = spec_dir();
        let cfg = DirLoader::new(dir.path()).load("global").unwrap().unwrap();
        assert!(cfg.nosql);
        assert_eq!(cfg.field("site").unwrap().description.as_deref(), Some("Site name"));
    }

    #[test]
    fn test_load_nested_key() {
        let dir = spec_dir();
        let cfg = DirLoader::new(dir.path()).load("catalog/product").unwrap().unwrap();
        assert_eq!(cfg.table_alias, "p");
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = spec_dir();
        assert!(DirLoader::new(dir.path()).load("nothing").unwrap().is_none());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = spec_dir();
        let err = DirLoader::new(dir.path()).load("broken").unwrap_err();
        assert!(matches!(err, LoadError::Toml { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_toml_preferred_over_json() {
        let dir = spec_dir();
        fs::write(dir.path().join("customer.json"), r#"{"table": "from_json"}"#).unwrap();
        let cfg = DirLoader::new(dir.path()).load("customer").unwrap().unwrap();
        assert_eq!(cfg.table, "customer");
    }
}
