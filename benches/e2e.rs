#![feature(test)]

extern crate test;

use test::Bencher;

use chrono::Utc;
use rollbot::{
	app::DiceRoller,
	bot::{Bot, Message, Watermark},
	log::{store::Memory, RollLog},
	parse::parse_roll,
};

#[bench]
fn e2e_roll(b: &mut Bencher) {
	let roller = DiceRoller::with_log(RollLog::open(Memory::default()));
	b.iter(|| roller.roll(parse_roll("/roll 4d8+4").unwrap()).unwrap());
}

#[bench]
fn e2e_roll_and_reroll(b: &mut Bencher) {
	let roller = DiceRoller::with_log(RollLog::open(Memory::default()));
	b.iter(|| {
		let (_, reference) = roller.roll(parse_roll("/roll 8d6e").unwrap()).unwrap();
		roller.reroll(&reference).unwrap()
	});
}

#[bench]
fn e2e_bot_message(b: &mut Bencher) {
	let bot = Bot::new(DiceRoller::with_log(RollLog::open(Memory::default())), Watermark::in_memory());
	b.iter(|| {
		bot.handle(&Message {
			body: "/roll 10d20+3kh",
			sender: "@bench:localhost",
			timestamp: Utc::now(),
		})
	});
}
