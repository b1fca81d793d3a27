use std::path::PathBuf;

use semver::Version;

use super::*;

#[test]
fn default_url_uses_latest_release_download() {
    assert_eq!(
        resolve_archive_url(None).expect("default url"),
        "https://github.com/paymenter/paymenter/releases/latest/download/paymenter.tar.gz"
    );
}

#[test]
fn explicit_url_bypasses_template() {
    let url = "https://mirror.example.test/panel/v1.2.3.tar.gz";
    assert_eq!(resolve_archive_url(Some(url)).expect("explicit url"), url);
}

#[test]
fn blank_url_override_falls_back_to_template() {
    assert_eq!(
        resolve_archive_url(Some("  ")).expect("blank url"),
        resolve_archive_url(None).expect("default url")
    );
}

#[test]
fn url_override_that_looks_like_an_option_is_rejected() {
    for url in ["-o/etc/passwd", " --config=/tmp/x", "-"] {
        let err = resolve_archive_url(Some(url)).expect_err("option-like url must fail");
        assert!(
            err.to_string().contains("must not start with '-'"),
            "unexpected error: {err}"
        );
    }
}

#[test]
fn archive_type_inferred_from_url_suffix() {
    assert_eq!(
        ArchiveType::infer_from_url("https://x.test/a/paymenter.tar.gz"),
        Some(ArchiveType::TarGz)
    );
    assert_eq!(
        ArchiveType::infer_from_url("https://x.test/a/paymenter.TGZ?sig=abc#frag"),
        Some(ArchiveType::TarGz)
    );
    assert_eq!(
        ArchiveType::infer_from_url("https://x.test/a/paymenter.tar.zst"),
        Some(ArchiveType::TarZst)
    );
    assert_eq!(
        ArchiveType::infer_from_url("https://x.test/a/paymenter.tar"),
        Some(ArchiveType::Tar)
    );
    assert_eq!(ArchiveType::infer_from_url("https://x.test/download"), None);
}

#[test]
fn unknown_archive_suffix_defaults_to_gzip() {
    let archive = ArchiveType::for_url("https://x.test/releases/latest");
    assert_eq!(archive, ArchiveType::TarGz);
    assert_eq!(archive.tar_extract_args(), &["-xzv"]);
}

#[test]
fn ownership_defaults_to_www_data() {
    let ownership = Ownership::with_defaults(None, None).expect("defaults must be valid");
    assert_eq!(ownership.user, DEFAULT_USER);
    assert_eq!(ownership.group, DEFAULT_GROUP);
    assert_eq!(ownership.chown_spec(), "www-data:www-data");
}

#[test]
fn ownership_keeps_explicit_values() {
    let ownership =
        Ownership::with_defaults(Some("nginx"), Some("nginx")).expect("names must be valid");
    assert_eq!(ownership.chown_spec(), "nginx:nginx");
    assert_eq!(ownership.to_string(), "nginx:nginx");
}

#[test]
fn ownership_rejects_separator_whitespace_and_flags() {
    for (user, group) in [
        ("ng:inx", "nginx"),
        ("nginx", "www data"),
        ("", "nginx"),
        ("-R", "x"),
    ] {
        let err = Ownership::new(user, group).expect_err("invalid name must be rejected");
        assert!(err.to_string().contains("name"), "unexpected error: {err}");
    }
}

#[test]
fn suggested_accounts_match_common_webservers() {
    assert_eq!(SUGGESTED_ACCOUNTS, ["www-data", "nginx", "apache"]);
}

#[test]
fn runtime_version_tolerates_distro_suffixes() {
    assert_eq!(
        parse_runtime_version("8.2.12-1ubuntu1").expect("must parse"),
        Version::new(8, 2, 12)
    );
    assert_eq!(
        parse_runtime_version("8.3.0RC1\n").expect("must parse"),
        Version::new(8, 3, 0)
    );
    assert_eq!(
        parse_runtime_version("8.1").expect("must parse"),
        Version::new(8, 1, 0)
    );
    assert!(parse_runtime_version("PHP").is_err());
}

#[test]
fn runtime_check_gates_on_minimum_version() {
    assert!(RuntimeCheck::from_reported("8.1.0").is_supported());
    assert!(RuntimeCheck::from_reported("8.3.4").is_supported());

    let old = RuntimeCheck::from_reported("7.4.33");
    assert_eq!(old, RuntimeCheck::Unsupported(Version::new(7, 4, 33)));
    let message = old.message();
    assert!(message.contains("minimum required PHP version required is 8.1"));
    assert!(message.contains("[7.4.33]"));

    let unknown = RuntimeCheck::from_reported("");
    assert!(matches!(unknown, RuntimeCheck::Unknown(_)));
    assert!(!unknown.is_supported());
}

#[test]
fn failure_policy_defaults_to_continue() {
    assert_eq!(FailurePolicy::default(), FailurePolicy::Continue);
    assert_eq!(FailurePolicy::Halt.as_str(), "halt");
}

#[test]
fn parse_config() {
    let content = r#"
root = "/var/www/paymenter"
user = "nginx"
group = "nginx"
php = "/usr/bin/php8.2"
on_failure = "halt"
"#;

    let config = UpgradeConfig::from_toml_str(content).expect("config must parse");
    assert_eq!(config.root, Some(PathBuf::from("/var/www/paymenter")));
    assert_eq!(config.user.as_deref(), Some("nginx"));
    assert_eq!(config.group.as_deref(), Some("nginx"));
    assert_eq!(config.url, None);
    assert_eq!(config.php.as_deref(), Some("/usr/bin/php8.2"));
    assert_eq!(config.on_failure, Some(FailurePolicy::Halt));
}

#[test]
fn parse_config_rejects_unknown_keys() {
    let err = UpgradeConfig::from_toml_str("usr = \"nginx\"\n")
        .expect_err("unknown key must be rejected");
    assert!(err.to_string().contains("failed to parse panelup config"));
}

#[test]
fn load_default_config_is_optional() {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let root = std::env::temp_dir().join(format!(
        "panelup-core-config-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&root).expect("must create root");

    assert_eq!(UpgradeConfig::load_default(&root).expect("must load"), None);

    std::fs::write(
        root.join(CONFIG_FILE_NAME),
        "url = \"https://x.test/p.tar.gz\"\n",
    )
    .expect("must write config");
    let config = UpgradeConfig::load_default(&root)
        .expect("must load")
        .expect("config must exist");
    assert_eq!(config.url.as_deref(), Some("https://x.test/p.tar.gz"));

    let _ = std::fs::remove_dir_all(&root);
}
