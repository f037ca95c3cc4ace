//! Main entry point for the audit desk console.
//!
//! Loads the configuration, builds the desk context (storage, REST client,
//! restored session, workflows and cart) and runs one operator command.

use clap::{Parser, Subcommand};
use desk_config::Config;
use desk_core::{DeskBuilder, DeskFactories};
use desk_types::{RecordStatus, Role};
use std::path::PathBuf;

mod commands;

/// Command-line arguments for the desk console.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, env = "DESK_CONFIG", default_value = "config/desk.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "warn")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Price a cart saved as JSON
	Total {
		#[arg(long)]
		cart: PathBuf,
	},
	/// List the status changes offered from a status
	Transitions {
		#[arg(long)]
		status: RecordStatus,
		/// Role to check; defaults to the signed-in user's role
		#[arg(long)]
		role: Option<Role>,
	},
	/// Sign in and keep the session for later commands
	Login {
		#[arg(long)]
		email: String,
		#[arg(long, env = "DESK_PASSWORD", hide_env_values = true)]
		password: String,
	},
	/// Forget the stored session
	Logout,
	/// Work with quotations
	#[command(subcommand)]
	Quotations(QuotationCommand),
	/// Work with services
	#[command(subcommand)]
	Services(ServiceCommand),
	/// Search establishments interactively, one query per line
	Establishments,
}

#[derive(Subcommand, Debug)]
enum QuotationCommand {
	List(commands::ListArgs),
	Show {
		id: String,
	},
	Transition {
		id: String,
		#[arg(long)]
		to: RecordStatus,
		#[arg(long)]
		comment: Option<String>,
	},
	Delete {
		id: String,
	},
}

#[derive(Subcommand, Debug)]
enum ServiceCommand {
	List(commands::ListArgs),
	Transition {
		id: String,
		#[arg(long)]
		to: RecordStatus,
		#[arg(long)]
		comment: Option<String>,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	// Logs go to stderr so command output stays clean
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.desk.id);

	let desk = DeskBuilder::new(config)
		.build(DeskFactories::standard())
		.await?;

	match args.command {
		Command::Total { cart } => commands::total(&desk, &cart).await,
		Command::Transitions { status, role } => {
			commands::transitions(role.unwrap_or_else(|| desk.role()), status);
			Ok(())
		}
		Command::Login { email, password } => commands::login(&desk, &email, &password).await,
		Command::Logout => commands::logout(&desk).await,
		Command::Quotations(command) => match command {
			QuotationCommand::List(list) => commands::list_quotations(&desk, list).await,
			QuotationCommand::Show { id } => commands::show_quotation(&desk, &id).await,
			QuotationCommand::Transition { id, to, comment } => {
				commands::transition_quotation(&desk, &id, to, comment).await
			}
			QuotationCommand::Delete { id } => commands::delete_quotation(&desk, &id).await,
		},
		Command::Services(command) => match command {
			ServiceCommand::List(list) => commands::list_services(&desk, list).await,
			ServiceCommand::Transition { id, to, comment } => {
				commands::transition_service(&desk, &id, to, comment).await
			}
		},
		Command::Establishments => commands::search_establishments(&desk).await,
	}
}
