use std::{
  io::{self, Read},
  path::PathBuf,
  time::Duration,
};

use clap::Parser;
use notify::{
  Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use tracing::info;
use tracing_subscriber::EnvFilter;
use turing_cli::{clear_screen, ok_or_exit, Host, DEMO_PROGRAM};
use turing_core::prelude::*;

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let host = Host {
    timeout: cli.timeout.map(Duration::from_millis),
    journal: cli.journal,
    json: cli.json,
  };

  match cli.subcommand.unwrap_or_default() {
    Subcommand::Eval { program } => {
      let source =
        Source::new("eval", program.as_deref().unwrap_or(DEMO_PROGRAM));
      let status = host.report(&host.evaluate(source));

      std::process::exit(status.exit_code());
    }
    Subcommand::Stdin => {
      let mut text = String::new();
      ok_or_exit(io::stdin().read_to_string(&mut text));

      let status = host.report(&host.evaluate(Source::new("stdin", text)));

      std::process::exit(status.exit_code());
    }
    Subcommand::Run { input, watch } => {
      if !watch {
        let source = ok_or_exit(Source::from_path(&input));
        let status = host.report(&host.evaluate(source));

        std::process::exit(status.exit_code());
      }

      let (tx, rx) = std::sync::mpsc::channel();

      let mut watcher =
        ok_or_exit(RecommendedWatcher::new(tx, Config::default()));
      ok_or_exit(watcher.watch(&input, RecursiveMode::NonRecursive));

      let run_file = |input: &PathBuf| match Source::from_path(input) {
        Ok(source) => {
          host.report(&host.evaluate(source));
        }
        Err(e) => eprintln!("error: {e}"),
      };

      ok_or_exit(clear_screen());
      run_file(&input);

      for event in rx {
        if let Event {
          kind: EventKind::Modify(_),
          ..
        } = ok_or_exit(event)
        {
          ok_or_exit(clear_screen());
          info!(path = %input.display(), "re-running after change");
          run_file(&input);
        }
      }
    }
    Subcommand::Repl => {
      let mut repl = Reedline::create();
      let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Empty,
        DefaultPromptSegment::Empty,
      );

      loop {
        let signal = ok_or_exit(repl.read_line(&prompt));

        match signal {
          Signal::CtrlC | Signal::CtrlD => {
            println!("aborted");
            break;
          }
          Signal::Success(line) => match line.strip_prefix(':') {
            Some("exit") => break,
            Some("clear") => ok_or_exit(repl.clear_screen()),
            Some(command) => eprintln!("error: unknown command '{command}'"),
            None => {
              host.report(&host.evaluate(Source::new("repl", line)));
            }
          },
        }
      }
    }
  }
}

/// `RUST_LOG` wins over the `-v` count when it is set.
fn init_tracing(verbose: u8) {
  let level = match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .init();
}

#[derive(Debug, Clone, PartialEq, Eq, Default, clap::Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
  #[command(subcommand)]
  subcommand: Option<Subcommand>,

  /// Print the history of stack activity after each evaluation.
  #[arg(short, long, global = true)]
  journal: bool,

  /// Cancel an evaluation that runs for longer than this many milliseconds.
  #[arg(short, long, global = true, value_name = "MS")]
  timeout: Option<u64>,

  /// Print outcomes as JSON.
  #[arg(long, global = true)]
  json: bool,

  /// Log more (-v, -vv, -vvv).
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, clap::Subcommand)]
enum Subcommand {
  /// Runs a REPL [alias >].
  #[default]
  #[command(alias = ">")]
  Repl,
  /// Runs the code supplied via STDIN [alias -].
  #[command(alias = "-")]
  Stdin,
  /// Runs a program given as an argument, or the demo program.
  Eval {
    /// The program text.
    #[arg(allow_hyphen_values = true)]
    program: Option<String>,
  },
  /// Runs the code from an input file path.
  Run {
    /// The input file path.
    input: PathBuf,

    /// Whether to watch the file and re-run it if there are changes.
    #[arg(short, long)]
    watch: bool,
  },
}
