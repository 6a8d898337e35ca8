//! Unit tests for the application error type.

use task_relay::AppError;

#[test]
fn display_prefixes_each_variant() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Validation("bad".into()), "validation: bad"),
        (AppError::Spawn("bad".into()), "spawn: bad"),
        (AppError::Stream("bad".into()), "stream: bad"),
        (AppError::Write("bad".into()), "write: bad"),
        (AppError::Io("bad".into()), "io: bad"),
    ];

    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn io_errors_convert() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: AppError = io_err.into();
    assert!(matches!(err, AppError::Io(_)));
    assert!(err.to_string().contains("gone"));
}

#[test]
fn toml_errors_convert_to_config() {
    let toml_err = toml::from_str::<toml::Value>("= broken").expect_err("invalid toml");
    let err: AppError = toml_err.into();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn implements_std_error() {
    let err = AppError::Spawn("no such file".into());
    let dyn_err: &dyn std::error::Error = &err;
    assert!(dyn_err.to_string().contains("no such file"));
}
