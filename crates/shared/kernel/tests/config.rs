use spire_domain::config::{
    AppConfig, CacheSettings, CorsConfig, GzipConfig, OpenApiConfig, StaticFilesConfig, TemplateSettings,
};
use spire_kernel::config::{
    ConfigError, load_app_config, load_config, validate, validate_cors, validate_gzip, validate_openapi,
    validate_mounts, validate_static_files,
};
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_sections_from_toml() {
    let file = write_config(
        r#"
        [server]
        port = 9000

        [cors]
        allow_origins = ["https://app.example.com"]
        allow_credentials = true

        [openapi]
        title = "Inventory"
        version = "3.0.0"

        [cache]
        expiration = 5
        "#,
    );

    let config = load_app_config(Some(file.path())).expect("config");

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.openapi.title, "Inventory");
    assert_eq!(config.cache.expiration, 5);
    assert_eq!(config.cache.capacity, CacheSettings::default().capacity);
    let cors = config.cors.as_ref().expect("cors section");
    assert!(cors.allow_credentials);
    assert_eq!(cors.allow_methods, ["*"]);
    assert!(config.gzip.is_none());
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result: Result<AppConfig, _> = load_config(Some(dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::Config { .. })));
}

#[test]
fn invalid_sections_fail_at_load() {
    let file = write_config(
        r"
        [gzip]
        compression_level = 12
        ",
    );

    let err = load_app_config(Some(file.path())).expect_err("level out of range");
    assert!(matches!(err, ConfigError::Invalid { .. }));
    assert!(err.to_string().contains("gzip"));
}

#[test]
fn defaults_are_valid() {
    validate(&AppConfig::default()).expect("default config");
}

#[test]
fn cors_rejects_malformed_values() {
    let bad_regex = CorsConfig { allow_origin_regex: Some("https://(".to_owned()), ..CorsConfig::default() };
    assert!(validate_cors(&bad_regex).is_err());

    let bad_method = CorsConfig { allow_methods: vec!["GE T".to_owned()], ..CorsConfig::default() };
    assert!(validate_cors(&bad_method).is_err());

    let bad_header = CorsConfig { expose_headers: vec!["x bad".to_owned()], ..CorsConfig::default() };
    assert!(validate_cors(&bad_header).is_err());

    let good = CorsConfig {
        allow_origins: vec!["https://a.example.com".to_owned()],
        allow_origin_regex: Some(r"https://.*\.example\.org".to_owned()),
        allow_headers: vec!["x-token".to_owned()],
        ..CorsConfig::default()
    };
    validate_cors(&good).expect("valid cors");
}

#[test]
fn gzip_level_and_size_are_bounded() {
    validate_gzip(&GzipConfig { minimum_size: 0, compression_level: 0 }).expect("level 0");
    validate_gzip(&GzipConfig { minimum_size: 500, compression_level: 9 }).expect("level 9");
    assert!(validate_gzip(&GzipConfig { minimum_size: 500, compression_level: 10 }).is_err());
    assert!(validate_gzip(&GzipConfig { minimum_size: 70_000, compression_level: 5 }).is_err());
}

#[test]
fn openapi_requires_title_version_and_absolute_path() {
    assert!(validate_openapi(&OpenApiConfig { title: " ".to_owned(), ..OpenApiConfig::default() }).is_err());
    assert!(validate_openapi(&OpenApiConfig { version: String::new(), ..OpenApiConfig::default() }).is_err());
    assert!(validate_openapi(&OpenApiConfig { path: "docs".to_owned(), ..OpenApiConfig::default() }).is_err());
}

#[test]
fn static_files_need_existing_directories() {
    let dir = tempfile::tempdir().expect("tempdir");

    let ok = StaticFilesConfig { path: "/static".to_owned(), directories: vec![dir.path().to_path_buf()], html_mode: false };
    validate_static_files(&ok).expect("valid mount");

    let missing = StaticFilesConfig { directories: vec![dir.path().join("nope")], ..ok.clone() };
    assert!(validate_static_files(&missing).is_err());

    let empty = StaticFilesConfig { directories: Vec::new(), ..ok.clone() };
    assert!(validate_static_files(&empty).is_err());

    let relative = StaticFilesConfig { path: "static".to_owned(), ..ok };
    assert!(validate_static_files(&relative).is_err());
}

#[test]
fn mount_paths_must_be_plain_and_distinct() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mount = |path: &str| StaticFilesConfig {
        path: path.to_owned(),
        directories: vec![dir.path().to_path_buf()],
        html_mode: false,
    };
    let docs = OpenApiConfig::default();

    for path in ["", "/files/{name}", "/assets/*", "/a//b", "/static/"] {
        assert!(validate_static_files(&mount(path)).is_err(), "{path:?} should be rejected");
    }
    assert!(validate_openapi(&OpenApiConfig { path: String::new(), ..OpenApiConfig::default() }).is_err());

    validate_mounts(&docs, &[mount("/"), mount("/static"), mount("/statics")]).expect("distinct mounts");
    assert!(validate_mounts(&docs, &[mount("/static"), mount("/static")]).is_err());
    assert!(validate_mounts(&docs, &[mount("/static"), mount("/static/img")]).is_err());
    assert!(validate_mounts(&docs, &[mount("/"), mount("/")]).is_err());
    assert!(validate_mounts(&docs, &[mount("/schema")]).is_err());
    assert!(validate_mounts(&docs, &[mount("/schema/openapi.json")]).is_err());
    validate_mounts(&docs, &[mount("/schema/assets")]).expect("below the docs page");

    let mut config = AppConfig::default();
    config.static_files = vec![mount("/schema")];
    let err = validate(&config).expect_err("shadows the docs");
    assert!(err.to_string().contains("/schema"));
}

#[test]
fn templates_and_cache_are_validated() {
    let mut config = AppConfig::default();
    config.templates = Some(TemplateSettings { directories: vec!["/definitely/not/here".into()], ..TemplateSettings::default() });
    assert!(validate(&config).is_err());

    let mut config = AppConfig::default();
    config.cache = CacheSettings { expiration: 0, ..CacheSettings::default() };
    assert!(validate(&config).is_err());
}
