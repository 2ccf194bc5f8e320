use crate::{
	app::DiceRoller,
	dice::{
		roller::{FastRand, Iter as IterRoller, Max as MaxRoller},
		DieOutcome, Error as DiceError, RollOutcome, RollRequest, RollType,
	},
	error::Error,
	log::{store::Memory, RollLog},
	tests::Failing,
};

fn roller_with(values: Vec<u16>) -> DiceRoller<IterRoller<std::vec::IntoIter<u16>>, Memory> {
	DiceRoller::new(IterRoller::new(values), RollLog::open(Memory::default()))
}

#[test]
fn roll_records_request() {
	let roller = roller_with(vec![3, 6, 1, 2]);
	let request = RollRequest::builder().count(4).sides(6).modifier(1).roll_type(RollType::DropLow).build();

	let (outcome, reference) = roller.roll(request).unwrap();
	assert_eq!(
		outcome.die_results,
		vec![DieOutcome::Numeric(3), DieOutcome::Numeric(6), DieOutcome::Dropped, DieOutcome::Numeric(2)]
	);
	assert_eq!(outcome.total, 12);
	assert_eq!(roller.lookup(&reference), Some(request));
	assert_eq!(roller.log().get(&reference).unwrap().roll_data.results, outcome);
}

#[test]
fn reroll_replays_request_with_fresh_dice() {
	let roller = roller_with(vec![1, 1, 5, 6]);
	let request = RollRequest::builder().count(2).sides(6).modifier(-1).build();

	let (first, reference) = roller.roll(request).unwrap();
	let (second, new_reference) = roller.reroll(&reference).unwrap();

	assert_eq!(first, RollOutcome::from_values([1, 1], -1));
	assert_eq!(second, RollOutcome::from_values([5, 6], -1));
	assert_ne!(reference, new_reference);
	assert_eq!(roller.lookup(&new_reference), Some(request));
	assert_eq!(roller.log().len(), 2);
}

#[test]
fn reroll_of_a_reroll() {
	let roller = DiceRoller::with_log(RollLog::open(Memory::default()));
	let request = RollRequest::builder().count(5).sides(10).exploding(Some(9)).build();

	let (_, first) = roller.roll(request).unwrap();
	let (_, second) = roller.reroll(&first).unwrap();
	let (outcome, third) = roller.reroll(&second).unwrap();

	assert_eq!(roller.lookup(&third), Some(request));
	assert!(outcome.die_results.len() >= 5);
	assert_eq!(roller.log().len(), 3);
}

#[test]
fn reroll_unknown_reference() {
	let roller = DiceRoller::new(FastRand::with_seed(7), RollLog::open(Memory::default()));
	let result = roller.reroll("deadbeef");
	assert!(matches!(result, Err(Error::NotFound(ref reference)) if reference.as_str() == "deadbeef"));
	assert!(roller.log().is_empty());
}

#[test]
fn invalid_requests_are_not_logged() {
	let roller = DiceRoller::new(MaxRoller, RollLog::open(Memory::default()));

	let result = roller.roll(RollRequest::new(2, 1));
	assert!(matches!(result, Err(Error::InvalidConfiguration(DiceError::InvalidSides(1)))));

	let result = roller.roll(RollRequest::builder().count(0).sides(6).roll_type(RollType::KeepHigh).build());
	assert!(matches!(result, Err(Error::InvalidConfiguration(DiceError::EmptyRoll(RollType::KeepHigh)))));

	assert!(roller.log().is_empty());
	assert_eq!(roller.log().store().saves(), 0);
}

#[test]
fn roll_limit_applies() {
	let roller = DiceRoller::new(MaxRoller, RollLog::open(Memory::default())).with_roll_limit(5);
	let result = roller.roll(RollRequest::builder().count(1).sides(4).exploding(None).build());
	assert!(matches!(
		result,
		Err(Error::InvalidConfiguration(DiceError::TooManyRolls { limit: 5 }))
	));
}

#[test]
fn shared_between_threads() {
	let roller = DiceRoller::with_log(RollLog::open(Memory::default()));

	std::thread::scope(|scope| {
		for _ in 0..4 {
			scope.spawn(|| {
				for _ in 0..25 {
					roller.roll(RollRequest::new(3, 6)).unwrap();
				}
			});
		}
	});

	assert_eq!(roller.log().len(), 100);
	assert_eq!(roller.log().store().snapshot().len(), 100);
}

#[test]
fn failed_save_surfaces_storage_error() {
	let roller = DiceRoller::new(MaxRoller, RollLog::open(Failing::default()));
	let result = roller.roll(RollRequest::new(2, 6));
	assert!(matches!(result, Err(Error::Storage(..))), "{result:?}");
	assert!(roller.log().is_empty());
}

#[test]
fn replay_hands_back_the_request() {
	let roller = DiceRoller::new(MaxRoller, RollLog::with_capacity(Memory::default(), 1));
	let request = RollRequest::builder().count(3).sides(8).modifier(2).roll_type(RollType::DropLow).build();
	let (_, reference) = roller.roll(request).unwrap();

	let (replayed, outcome, new_reference) = roller.replay(&reference).unwrap();
	assert_eq!(replayed, request);
	assert_eq!(outcome.total, 18);
	assert_eq!(roller.lookup(&reference), None);
	assert_eq!(roller.lookup(&new_reference), Some(request));
}
