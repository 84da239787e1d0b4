use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use propload::loader::{LoaderSettings, PropertiesLoader, discover_settings};
use propload::resource::FsResourceResolver;
use propload::sources::{PropertyLayer, PropertySources};
use propload::startup::StartupDispatcher;

/// Name of the layer built from `--set` flags.
const COMMAND_LINE_LAYER: &str = "commandLineArgs";

/// Classpath root used when none is configured.
const DEFAULT_CLASSPATH_DIR: &str = "resources";

#[derive(Parser)]
#[command(name = "propload")]
#[command(
	author,
	version,
	about = "Discovers extra .properties files and merges them into a configuration layer"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Directory searched for classpath: locations; the first one is scanned
	#[arg(long = "classpath", value_name = "DIR", global = true)]
	classpath: Vec<PathBuf>,

	/// Directory that file: locations are relative to
	#[arg(long, value_name = "DIR", global = true)]
	cwd: Option<PathBuf>,

	/// Search location, tried in the order given (comma-separated lists allowed)
	#[arg(long = "location", value_name = "LOC", global = true)]
	locations: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// List candidate file names discovered under the classpath root
	Scan,
	/// Run a discovery pass and print every layer in precedence order
	Show {
		/// Pre-register an explicit property that outranks discovered files
		#[arg(long = "set", value_name = "KEY=VALUE")]
		set: Vec<String>,
	},
	/// Run a discovery pass and print the effective value of a property
	Get {
		/// Property name
		key: String,

		/// Pre-register an explicit property that outranks discovered files
		#[arg(long = "set", value_name = "KEY=VALUE")]
		set: Vec<String>,
	},
	/// Print the effective search locations in the order they are tried
	Locations,
}

fn main() -> ExitCode {
	init_tracing();

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::registry()
		.with(filter)
		.with(
			fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(std::io::stderr().is_terminal()),
		)
		.init();
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	let loader = build_loader(&cli)?;

	match cli.command {
		Commands::Scan => handle_scan(&loader),
		Commands::Show { ref set } => handle_show(loader, set),
		Commands::Get { ref key, ref set } => handle_get(loader, key, set),
		Commands::Locations => handle_locations(&loader),
	}
}

fn build_loader(cli: &Cli) -> Result<PropertiesLoader> {
	let cwd = match cli.cwd {
		Some(ref dir) => dir.clone(),
		None => std::env::current_dir().context("Failed to get current directory")?,
	};

	let loaded = discover_settings(&cwd).context("Failed to load settings")?;

	let mut settings = match loaded {
		Some(ref loaded) => LoaderSettings::from_file(&loaded.settings)
			.with_context(|| format!("Invalid settings in {}", loaded.path.display()))?,
		None => LoaderSettings::default(),
	};

	if !cli.locations.is_empty() {
		settings =
			settings.with_search_locations(cli.locations.iter().flat_map(|l| l.split(',')));
		settings.validate().context("Invalid --location values")?;
	}

	let configured_roots = loaded
		.and_then(|loaded| loaded.settings.classpath_roots)
		.unwrap_or_default();
	let roots = if !cli.classpath.is_empty() {
		cli.classpath.clone()
	} else if !configured_roots.is_empty() {
		configured_roots
	} else {
		vec![PathBuf::from(DEFAULT_CLASSPATH_DIR)]
	};
	let roots = roots.iter().map(|root| absolutize(&cwd, root)).collect();

	Ok(PropertiesLoader::new(
		settings,
		FsResourceResolver::new(roots, cwd),
	))
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
	if path.is_absolute() {
		path.to_path_buf()
	} else {
		cwd.join(path)
	}
}

fn handle_scan(loader: &PropertiesLoader) -> Result<ExitCode> {
	let names = loader
		.discover()
		.context("Failed to discover candidate files")?;

	if names.is_empty() {
		println!("No candidate files found.");
		return Ok(ExitCode::SUCCESS);
	}

	for name in names.iter() {
		println!("{}", name);
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_locations(loader: &PropertiesLoader) -> Result<ExitCode> {
	for location in &loader.settings().search_locations {
		println!("{}", location);
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_show(loader: PropertiesLoader, set: &[String]) -> Result<ExitCode> {
	let sources = prepare_environment(loader, set)?;

	if sources.is_empty() {
		println!("No property layers.");
		return Ok(ExitCode::SUCCESS);
	}

	println!("Property layers (in precedence order):\n");
	for layer in sources.iter() {
		println!("# Layer: {} ({} keys)", layer.name(), layer.map().len());
		for (key, value) in layer.map() {
			println!("{}={}", key, value);
		}
		println!();
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_get(loader: PropertiesLoader, key: &str, set: &[String]) -> Result<ExitCode> {
	let sources = prepare_environment(loader, set)?;

	match sources.get_property(key) {
		Some(value) => {
			println!("{}", value);
			Ok(ExitCode::SUCCESS)
		}
		None => {
			eprintln!("Property not found: {}", key);
			Ok(ExitCode::FAILURE)
		}
	}
}

/// Build the store the way a host would: explicit layers first, then the
/// environment-prepared dispatch.
fn prepare_environment(loader: PropertiesLoader, set: &[String]) -> Result<PropertySources> {
	let mut sources = PropertySources::new();

	if !set.is_empty() {
		let mut map = propload::properties::PropertyMap::new();
		for pair in set {
			let (key, value) = pair
				.split_once('=')
				.ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got: {}", pair))?;
			map.insert(key.trim().to_string(), value.to_string());
		}
		sources.add_first(PropertyLayer::new(COMMAND_LINE_LAYER, map));
	}

	let mut dispatcher = StartupDispatcher::new();
	dispatcher.register(Box::new(loader));
	dispatcher
		.dispatch_environment_prepared(&mut sources)
		.context("Failed to load custom properties")?;

	Ok(sources)
}
