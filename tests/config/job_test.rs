//! Integration tests for settings and job files driving an Aggregator.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shortcode::config::{JobFile, Settings, SettingsError};
    use shortcode::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    fn workspace() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let specs = dir.path().join("specs");
        fs::create_dir(&specs).unwrap();

        write(
            &specs.join("article.toml"),
            r#"
table = "article"
table_alias = "a"

[[fields]]
name = "title"
postprocess = "upper"

[[fields]]
name = "body"
"#,
        );
        write(
            &specs.join("tag.toml"),
            r#"
table = "tag"
table_alias = "t"

[[fields]]
name = "label"
"#,
        );
        write(
            &specs.join("global.json"),
            r#"{"nosql": true, "fields": [{"name": "site"}]}"#,
        );

        write(
            &dir.path().join("shortcode.toml"),
            &format!(
                "spec_dir = \"{}\"\ndialect = \"duckdb\"\n\n[template]\nescape_html = false\n",
                specs.display()
            ),
        );
        write(
            &dir.path().join("article.mustache"),
            "{{global.site}}: {{article.title}}{{#tags}} #{{tag.label}}{{/tags}}",
        );
        write(
            &dir.path().join("job.toml"),
            r#"
template_file = "article.mustache"
specs = ["article", { key = "tag", plural = "tags" }]
input = [
    { "article___title" = "hello", "article___body" = "unused" },
    [{ "tag___label" = "rust" }, { "tag___label" = "sql" }],
]

[[groups]]
key_aliases = "article"
where = "a.id = 1"

[[groups]]
key_aliases = ["tag"]
order_by = "t.label"

[[groups]]
key_aliases = "global"

[fixtures]
global = { global = { site = "Blog" } }
"#,
        );
        dir
    }

    fn prepared(dir: &TempDir) -> (Aggregator, JobFile) {
        let settings = Settings::from_file(dir.path().join("shortcode.toml")).unwrap();
        let job = JobFile::from_file(dir.path().join("job.toml")).unwrap();
        let mut agg = Aggregator::from_settings(&settings, RecordingExecutor::new()).unwrap();
        job.apply(&mut agg).unwrap();
        (agg, job)
    }

    #[test]
    fn test_job_renders_from_input_and_fixtures() {
        let dir = workspace();
        let (mut agg, job) = prepared(&dir);

        assert_eq!(agg.dialect(), Dialect::DuckDb);
        assert_eq!(
            agg.specs().aliases().collect::<Vec<_>>(),
            vec!["article", "tag", "global"]
        );

        agg.fetch_with(&job.input).unwrap();
        assert_eq!(agg.render().unwrap(), "Blog: HELLO #rust #sql");
        assert_eq!(agg.data()["article"], json!({"title": "HELLO"}));
    }

    #[test]
    fn test_job_sql_uses_settings_dialect() {
        let dir = workspace();
        let (agg, _) = prepared(&dir);

        assert_eq!(
            agg.sql_for(&agg.groups()[0]).unwrap(),
            "SELECT a.title AS \"article___title\" FROM \"article\" \"a\" WHERE a.id = 1"
        );
        assert_eq!(
            agg.sql_for(&agg.groups()[1]).unwrap(),
            "SELECT t.label AS \"tag___label\" FROM \"tag\" \"t\" ORDER BY t.label"
        );
        assert!(agg.sql_for(&agg.groups()[2]).is_none());
    }

    #[test]
    fn test_job_without_template_keeps_all_fields() {
        let dir = workspace();
        write(
            &dir.path().join("plain.toml"),
            "add_global = false\nspecs = [\"article\"]\n",
        );
        let settings = Settings::from_file(dir.path().join("shortcode.toml")).unwrap();
        let job = JobFile::from_file(dir.path().join("plain.toml")).unwrap();
        let mut agg = Aggregator::from_settings(&settings, RecordingExecutor::new()).unwrap();
        job.apply(&mut agg).unwrap();

        assert!(job.template.is_none());
        assert_eq!(agg.specs().len(), 1);
        assert_eq!(
            agg.specs().get("article").unwrap().filtered_field_keys(),
            ["title", "body"]
        );
        assert_eq!(agg.render().unwrap(), "");
    }

    #[test]
    fn test_missing_template_file() {
        let dir = workspace();
        write(&dir.path().join("bad.toml"), "template_file = \"nope.mustache\"\n");
        let err = JobFile::from_file(dir.path().join("bad.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::FileNotFound(p) if p.ends_with("nope.mustache")));
    }

    #[test]
    fn test_missing_spec_dir_skips_specs() {
        let dir = workspace();
        let settings: Settings = toml::from_str(&format!(
            "spec_dir = \"{}\"",
            dir.path().join("elsewhere").display()
        ))
        .unwrap();
        let mut agg = Aggregator::from_settings(&settings, RecordingExecutor::new()).unwrap();
        agg.init_specs(vec!["article".into()], None).unwrap();
        assert!(agg.specs().is_empty());
    }
}
