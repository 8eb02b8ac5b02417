use std::io::Write;

use ceres::arma::ArmaFilterKind;
use ceres::config::CeresConfig;

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    writeln!(
        file,
        r#"
[cholesky]
zero_tolerance = 1e-10

[arma]
filter = "ansley"
max_iters = 250
sd_tolerance = 1e-6

[kalman]
variance_tolerance = 1e-14
diffuse_tolerance = 1e-8
retain_history = false
"#
    )
    .expect("write config");

    let config = CeresConfig::load(file.path()).expect("load config");
    assert_eq!(config.cholesky.options().zero_tolerance(), Some(1e-10));

    let fit = config.arma.options();
    assert_eq!(fit.filter(), Some(ArmaFilterKind::Ansley));
    assert_eq!(fit.max_iters(), 250);
    assert_eq!(fit.sd_tolerance(), 1e-6);

    let kalman = config.kalman.options();
    assert_eq!(kalman.variance_tolerance(), 1e-14);
    assert_eq!(kalman.diffuse_tolerance(), 1e-8);
    assert!(!kalman.retain_history());
}

#[test]
fn partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("ceres.toml");
    std::fs::write(&path, "[kalman]\nretain_history = false\n").expect("write config");

    let config = CeresConfig::load(&path).expect("load config");
    assert_eq!(config.kalman.options().diffuse_tolerance(), 1e-9);
    assert_eq!(config.arma.options().max_iters(), 1000);
    assert_eq!(config.cholesky.options().zero_tolerance(), None);
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("absent.toml");
    let err = CeresConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));
}

#[test]
fn invalid_file_is_rejected_with_context() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[kalman]\nvariance_tolerance = -1.0\n").expect("write config");

    let err = CeresConfig::load(&path).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("bad.toml"), "{message}");
    assert!(message.contains("[kalman]"), "{message}");
}
