use std::fs;

use chrono::{TimeZone, Utc};

use crate::{
	dice::{DieOutcome, RollOutcome, RollRequest, RollType},
	log::{
		store::{JsonFile, Memory},
		Error, RollLog, DEFAULT_CAPACITY,
	},
	tests::Failing,
};

#[test]
fn evicts_oldest_past_capacity() {
	let mut log = RollLog::open(Memory::default());
	let references = (0..=DEFAULT_CAPACITY)
		.map(|n| {
			let sides = u16::try_from(n % 998).unwrap() + 2;
			log.record(RollRequest::new(1, sides), &RollOutcome::from_values([1], 0)).unwrap()
		})
		.collect::<Vec<_>>();

	assert_eq!(log.len(), DEFAULT_CAPACITY);
	assert_eq!(log.lookup(&references[0]), None);
	assert_eq!(log.lookup(&references[1]), Some(RollRequest::new(1, 3)));

	let remaining = log.entries().map(|entry| entry.hash.clone()).collect::<Vec<_>>();
	assert_eq!(remaining, references[1..]);
	assert_eq!(log.store().snapshot().len(), DEFAULT_CAPACITY);
	assert_eq!(log.store().saves(), DEFAULT_CAPACITY + 1);
}

#[test]
fn small_capacity() {
	let mut log = RollLog::with_capacity(Memory::default(), 2);
	let first = log.record(RollRequest::new(1, 4), &RollOutcome::from_values([2], 0)).unwrap();
	let second = log.record(RollRequest::new(1, 6), &RollOutcome::from_values([3], 0)).unwrap();
	let third = log.record(RollRequest::new(1, 8), &RollOutcome::from_values([4], 0)).unwrap();

	assert_eq!(log.len(), 2);
	assert_eq!(log.lookup(&first), None);
	assert_eq!(log.lookup(&second), Some(RollRequest::new(1, 6)));
	assert_eq!(log.lookup(&third), Some(RollRequest::new(1, 8)));
}

#[test]
fn zero_capacity_still_keeps_one() {
	let mut log = RollLog::with_capacity(Memory::default(), 0);
	assert_eq!(log.capacity(), 1);
	let reference = log.record(RollRequest::new(1, 4), &RollOutcome::from_values([2], 0)).unwrap();
	assert_eq!(log.lookup(&reference), Some(RollRequest::new(1, 4)));
}

#[test]
fn opening_trims_oversized_store() {
	let mut seed = RollLog::open(Memory::default());
	for sides in 2..12 {
		seed.record(RollRequest::new(1, sides), &RollOutcome::from_values([1], 0)).unwrap();
	}

	let log = RollLog::with_capacity(Memory::with_entries(seed.store().snapshot()), 3);
	let sides = log.entries().map(|entry| entry.roll_data.request.sides).collect::<Vec<_>>();
	assert_eq!(sides, [9, 10, 11]);
}

#[test]
fn references_are_unique_hex() {
	let mut log = RollLog::open(Memory::default());
	let mut references = (0..100)
		.map(|_| log.record(RollRequest::new(1, 6), &RollOutcome::from_values([6], 0)).unwrap())
		.collect::<Vec<_>>();

	assert!(references.iter().all(|reference| {
		reference.as_str().len() == 32 && reference.as_str().chars().all(|c| c.is_ascii_hexdigit())
	}));

	references.sort_by(|a, b| a.as_str().cmp(b.as_str()));
	references.dedup();
	assert_eq!(references.len(), 100);
}

#[test]
fn missing_reference() {
	let mut log = RollLog::open(Memory::default());
	log.record(RollRequest::new(2, 6), &RollOutcome::from_values([1, 2], 0)).unwrap();
	assert_eq!(log.lookup("0123456789abcdef0123456789abcdef"), None);
	assert!(log.get("").is_none());
}

#[test]
fn json_file_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("dice_rolls.json");
	let request = RollRequest::builder().count(4).sides(6).modifier(2).roll_type(RollType::DropLow).build();
	let outcome = RollOutcome::new(
		vec![DieOutcome::Numeric(5), DieOutcome::Dropped, DieOutcome::Numeric(3), DieOutcome::Numeric(4)],
		2,
	);

	let reference = RollLog::open(JsonFile::new(&path)).record(request, &outcome).unwrap();

	let reopened = RollLog::open(JsonFile::new(&path));
	let entry = reopened.get(&reference).unwrap();
	assert_eq!(entry.roll_data.request, request);
	assert_eq!(entry.roll_data.results, outcome);
}

#[test]
fn json_file_layout() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("dice_rolls.json");
	let request = RollRequest::builder().count(2).sides(6).roll_type(RollType::KeepHigh).build();
	let outcome = RollOutcome::new(vec![DieOutcome::KeptOut, DieOutcome::Numeric(6)], 0);
	let reference = RollLog::open(JsonFile::new(&path)).record(request, &outcome).unwrap();

	let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
	let entry = &json[0];
	assert_eq!(entry["hash"], reference.as_str());
	assert!(entry["time"].is_string());
	assert_eq!(
		entry["roll_data"],
		serde_json::json!({
			"type": "kh",
			"num_dice": 2,
			"sides": 6,
			"modifier": 0,
			"threshold": null,
			"results": { "die_results": ["kept-out", 6], "total": 6, "modifier": 0 },
		})
	);
}

#[test]
fn missing_file_loads_empty() {
	let dir = tempfile::tempdir().unwrap();
	let log = RollLog::open(JsonFile::new(dir.path().join("nope.json")));
	assert!(log.is_empty());
}

#[test]
fn corrupt_file_loads_empty() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("dice_rolls.json");

	fs::write(&path, "{ this is not json").unwrap();
	assert!(RollLog::open(JsonFile::new(&path)).is_empty());

	fs::write(&path, r#"{"hash": "abc"}"#).unwrap();
	assert!(RollLog::open(JsonFile::new(&path)).is_empty());
}

#[test]
fn malformed_entries_are_skipped() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("dice_rolls.json");
	let reference = RollLog::open(JsonFile::new(&path))
		.record(RollRequest::new(1, 20), &RollOutcome::from_values([12], 0))
		.unwrap();

	let mut json: Vec<serde_json::Value> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
	json.insert(0, serde_json::json!({ "hash": "broken", "time": "yesterday" }));
	json.push(serde_json::json!(42));
	fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

	let log = RollLog::open(JsonFile::new(&path));
	assert_eq!(log.len(), 1);
	assert_eq!(log.lookup(&reference), Some(RollRequest::new(1, 20)));
}

#[test]
fn unwritable_file_surfaces_error() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("missing-dir").join("dice_rolls.json");
	let mut log = RollLog::open(JsonFile::new(&path));

	let result = log.record(RollRequest::new(1, 6), &RollOutcome::from_values([3], 0));
	assert!(matches!(result, Err(Error::Io { path: ref failed, .. }) if *failed == path));
	assert!(log.is_empty());
}

#[test]
fn failed_save_rolls_back() {
	let mut seed = RollLog::with_capacity(Memory::default(), 2);
	let first = seed.record(RollRequest::new(1, 4), &RollOutcome::from_values([1], 0)).unwrap();
	let second = seed.record(RollRequest::new(1, 6), &RollOutcome::from_values([2], 0)).unwrap();

	let mut log = RollLog::with_capacity(Failing(seed.store().snapshot()), 2);
	assert!(log.record(RollRequest::new(1, 8), &RollOutcome::from_values([3], 0)).is_err());

	// The evicted entry is restored and nothing new was added
	assert_eq!(log.len(), 2);
	assert_eq!(log.lookup(&first), Some(RollRequest::new(1, 4)));
	assert_eq!(log.lookup(&second), Some(RollRequest::new(1, 6)));
	assert!(log.flush().is_err());
}

#[test]
fn loads_entries_from_older_bot() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("dice_rolls.json");
	fs::write(
		&path,
		r#"[
			{"hash": "6f1c0e3b2a9d4e5f6a7b8c9d0e1f2a3b", "time": "2023-10-01T12:00:00.123456",
			 "roll_data": {"type": "dh", "num_dice": 3, "sides": 6, "modifier": 2, "threshold": null,
			               "results": [[4, "DH", 1], [7, 2]]}},
			{"hash": "0a1b2c3d4e5f60718293a4b5c6d7e8f9", "time": "2023-10-01T12:05:00+00:00",
			 "roll_data": {"type": "kl", "num_dice": 2, "sides": 20, "modifier": 0, "threshold": null,
			               "results": [["KL", 3], [3, 0]]}}
		]"#,
	)
	.unwrap();

	let log = RollLog::open(JsonFile::new(&path));
	assert_eq!(log.len(), 2);

	let first = log.get("6f1c0e3b2a9d4e5f6a7b8c9d0e1f2a3b").unwrap();
	assert_eq!(first.time, Utc.with_ymd_and_hms(2023, 10, 1, 12, 0, 0).unwrap() + chrono::Duration::microseconds(123_456));
	assert_eq!(
		first.roll_data.request,
		RollRequest::builder().count(3).sides(6).modifier(2).roll_type(RollType::DropHigh).build()
	);
	assert_eq!(
		first.roll_data.results,
		RollOutcome::new(vec![DieOutcome::Numeric(4), DieOutcome::Dropped, DieOutcome::Numeric(1)], 2)
	);

	let second = log.get("0a1b2c3d4e5f60718293a4b5c6d7e8f9").unwrap();
	assert_eq!(second.roll_data.results.die_results, vec![DieOutcome::KeptOut, DieOutcome::Numeric(3)]);
	assert_eq!(second.roll_data.results.total, 3);
}

#[test]
fn older_entries_survive_the_next_save() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("dice_rolls.json");
	fs::write(
		&path,
		r#"[{"hash": "abc123", "time": "2023-10-01T12:00:00",
		     "roll_data": {"type": "normal", "num_dice": 1, "sides": 20, "modifier": 0, "threshold": null,
		                   "results": [[17], [17, 0]]}}]"#,
	)
	.unwrap();

	RollLog::open(JsonFile::new(&path))
		.record(RollRequest::new(2, 6), &RollOutcome::from_values([3, 4], 0))
		.unwrap();

	let reopened = RollLog::open(JsonFile::new(&path));
	assert_eq!(reopened.len(), 2);
	assert_eq!(reopened.lookup("abc123"), Some(RollRequest::new(1, 20)));
}

#[test]
fn unknown_markers_are_skipped() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("dice_rolls.json");
	fs::write(
		&path,
		r#"[{"hash": "abc123", "time": "2023-10-01T12:00:00",
		     "roll_data": {"type": "dh", "num_dice": 2, "sides": 6, "modifier": 0, "threshold": null,
		                   "results": [["XX", 3], [3, 0]]}}]"#,
	)
	.unwrap();
	assert!(RollLog::open(JsonFile::new(&path)).is_empty());
}
