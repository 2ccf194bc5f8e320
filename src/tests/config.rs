use std::{fs, path::PathBuf};

use crate::config::{Config, Error, DEFAULT_LIST_LIMIT};

#[test]
fn defaults() {
	let config = Config::default();
	assert_eq!(config.roll_log, PathBuf::from("dice_rolls.json"));
	assert_eq!(config.log_capacity, 500);
	assert_eq!(config.roll_limit, 10_000);
	assert_eq!(config.watermark, None);
	assert_eq!(config.list_limit, DEFAULT_LIST_LIMIT);
	assert_eq!(Config::from_toml("").unwrap(), config);
}

#[test]
fn missing_file_is_default() {
	let dir = tempfile::tempdir().unwrap();
	assert_eq!(Config::load(dir.path().join("rollbot.toml")).unwrap(), Config::default());
}

#[test]
fn loads_every_field() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("rollbot.toml");
	fs::write(
		&path,
		r#"
roll_log = "/tmp/rolls.json"
log_capacity = 20
roll_limit = 64
watermark = "/tmp/last_seen"
list_limit = 8
"#,
	)
	.unwrap();

	let config = Config::load(&path).unwrap();
	assert_eq!(
		config,
		Config {
			roll_log: PathBuf::from("/tmp/rolls.json"),
			log_capacity: 20,
			roll_limit: 64,
			watermark: Some(PathBuf::from("/tmp/last_seen")),
			list_limit: 8,
		}
	);
}

#[test]
fn rejects_unknown_and_mistyped_fields() {
	assert!(Config::from_toml("roll_logs = \"typo.json\"").is_err());
	assert!(Config::from_toml("log_capacity = \"lots\"").is_err());

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("rollbot.toml");
	fs::write(&path, "list_limit = -1").unwrap();
	assert!(matches!(Config::load(&path), Err(Error::Parse { .. })));
}
