use packserve::http::api::{ApiError, ConfigUpdate};
use packserve::http::json::{scan, scan_bool, scan_string, scan_text, Scalar, ScanError};

#[test]
fn scan_string_value() {
    assert_eq!(scan(r#"{"server_ip":"1.2.3.4"}"#, "server_ip"), Some(Scalar::Str("1.2.3.4".into())));
}

#[test]
fn scan_string_with_escaped_quote() {
    let body = r#"{"name": "say \"hi\"", "x": 1}"#;
    assert_eq!(scan_string(body, "name").unwrap(), "say \"hi\"");
}

#[test]
fn scan_empty_string() {
    assert_eq!(scan_string(r#"{"server_ip":""}"#, "server_ip").unwrap(), "");
}

#[test]
fn scan_bool_literals() {
    let body = r#"{"force_pack":true,"auto_apply":false}"#;
    assert!(scan_bool(body, "force_pack").unwrap());
    assert!(!scan_bool(body, "auto_apply").unwrap());
}

#[test]
fn scan_bool_rejects_other_words() {
    let err = scan_bool(r#"{"force_pack":yes}"#, "force_pack").unwrap_err();
    assert!(matches!(err, ScanError::Invalid { .. }));
}

#[test]
fn scan_number_and_string_number() {
    assert_eq!(scan_text(r#"{"http_port":9090}"#, "http_port").unwrap(), "9090");
    assert_eq!(scan_text(r#"{"http_port":"9090"}"#, "http_port").unwrap(), "9090");
    assert_eq!(scan(r#"{"v":1.5}"#, "v"), Some(Scalar::Number("1.5".into())));
}

#[test]
fn scan_tolerates_whitespace_around_colon() {
    let body = "{ \"http_port\"  :\n  8081 , }";
    assert_eq!(scan_text(body, "http_port").unwrap(), "8081");
}

#[test]
fn scan_skips_key_text_used_as_a_value() {
    let body = r#"{"label":"http_port","http_port":"7000"}"#;
    assert_eq!(scan_text(body, "http_port").unwrap(), "7000");
}

#[test]
fn scan_missing_key() {
    assert_eq!(
        scan_string(r#"{"other":"x"}"#, "server_ip").unwrap_err(),
        ScanError::Missing("server_ip".into())
    );
}

#[test]
fn scan_unterminated_string_is_none() {
    assert_eq!(scan(r#"{"server_ip":"abc"#, "server_ip"), None);
}

#[test]
fn config_update_any_key_order_and_extra_fields() {
    let body = r#"{"auto_apply":false,"extra":[1,2],"force_pack":true,"http_port":"9090","server_ip":"", "unknown": {"a": 1},}"#;
    let update = ConfigUpdate::from_json(body).unwrap();
    assert_eq!(
        update,
        ConfigUpdate {
            server_ip: String::new(),
            http_port: 9090,
            force_pack: true,
            auto_apply: false,
        }
    );
}

#[test]
fn config_update_missing_port_fails() {
    let body = r#"{"server_ip":"","force_pack":true,"auto_apply":false}"#;
    let err = ConfigUpdate::from_json(body).unwrap_err();
    assert!(err.to_string().contains("http_port"), "got: {err}");
}

#[test]
fn config_update_rejects_out_of_range_port() {
    for port in ["0", "70000", "80.5"] {
        let body = format!(
            r#"{{"server_ip":"","http_port":"{}","force_pack":true,"auto_apply":false}}"#,
            port
        );
        let err = ConfigUpdate::from_json(&body).unwrap_err();
        assert!(matches!(err, ApiError::InvalidPort(_)), "port {port}: {err}");
    }
}

#[test]
fn present_key_with_unreadable_value_is_invalid() {
    let err = scan_text(r#"{"http_port": -1}"#, "http_port").unwrap_err();
    assert_eq!(
        err,
        ScanError::Invalid {
            field: "http_port".into(),
            found: "-1".into(),
        }
    );

    let err = scan_bool(r#"{"force_pack": null}"#, "force_pack").unwrap_err();
    assert!(matches!(err, ScanError::Invalid { .. }));
}

#[test]
fn config_update_negative_port_is_not_reported_missing() {
    let body = r#"{"server_ip":"","http_port":-1,"force_pack":true,"auto_apply":false}"#;
    let err = ConfigUpdate::from_json(body).unwrap_err();
    assert!(matches!(err, ApiError::Field(ScanError::Invalid { .. })), "got: {err}");
    assert!(!err.to_string().contains("missing"));
}
