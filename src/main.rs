//! Console front end for the dice bot: every line on stdin is handled as a chat message, replies go to stdout.

use std::{
	io::{self, BufRead, Write},
	path::PathBuf,
	process::ExitCode,
};

use ariadne::{Color, Label, Report, ReportKind, Source};
use chrono::{Duration, Utc};
use chumsky::Parser as _;
use clap::Parser;
use rollbot::{
	bot::{Bot, Message},
	config::Config,
	parse::{is_roll_command, roll_command},
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rollbot")]
#[command(version)]
#[command(about = "Dice roll bot that answers /roll and /reroll commands read from stdin")]
struct Args {
	/// Configuration file
	#[arg(short, long, env = "ROLLBOT_CONFIG", default_value = "rollbot.toml")]
	config: PathBuf,

	/// Sender the messages are attributed to
	#[arg(short, long, default_value = "@you:localhost")]
	user: String,
}

fn main() -> ExitCode {
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "rollbot=info".into()))
		.with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
		.init();

	let args = Args::parse();
	let config = match Config::load(&args.config) {
		Ok(config) => config,
		Err(err) => {
			error!(error = %err, "unable to load configuration");
			return ExitCode::FAILURE;
		}
	};
	info!(config = %args.config.display(), roll_log = %config.roll_log.display(), "starting");

	let bot = Bot::from_config(&config);
	let mut last = Utc::now();
	let mut stdout = io::stdout().lock();

	for line in io::stdin().lock().lines() {
		let body = match line {
			Ok(body) => body,
			Err(err) => {
				error!(error = %err, "unable to read from stdin");
				return ExitCode::FAILURE;
			}
		};

		// Lines read in quick succession must still be strictly newer than the previous one
		let timestamp = Utc::now().max(last + Duration::nanoseconds(1));
		last = timestamp;

		let message = Message {
			body: &body,
			sender: &args.user,
			timestamp,
		};
		let Some(reply) = bot.handle(&message) else {
			continue;
		};

		if is_roll_command(body.trim()) {
			report_parse_errors(body.trim());
		}
		if writeln!(stdout, "{reply}").is_err() {
			return ExitCode::FAILURE;
		}
	}

	if let Err(err) = bot.roller().flush() {
		error!(error = %err, "unable to save roll log on shutdown");
		return ExitCode::FAILURE;
	}
	ExitCode::SUCCESS
}

/// Prints a detailed report to stderr for each problem with a roll command that didn't parse.
fn report_parse_errors(command: &str) {
	let lowercase = command.to_lowercase();
	let Err(errs) = roll_command().parse(&lowercase).into_result() else {
		return;
	};

	for err in errs {
		let span = err.span().into_range();
		let report = Report::build(ReportKind::Error, span.clone())
			.with_message("invalid roll command")
			.with_label(Label::new(span).with_message(err.reason().to_string()).with_color(Color::Red))
			.finish();
		if let Err(io_err) = report.eprint(Source::from(&lowercase)) {
			error!(error = %io_err, "unable to print parse error report");
		}
	}
}
