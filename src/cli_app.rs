// cli_app.rs
use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Subcommand};
use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::debug;

use macros_nx::{
    config::{self, AppConfig},
    executor::RunOutcome,
    library::{MacroEntry, MacroLibrary},
    logging,
    macro_worker::MacroWorker,
    network::SysBotSink,
    parser::MacroSeq,
    sink::{InputSink, LogSink},
};

/// Exit status for a run stopped with Ctrl+C.
const EXIT_CANCELLED: u8 = 130;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Macro text file, `-` for stdin
    #[arg(required_unless_present = "name", conflicts_with = "name")]
    pub file: Option<PathBuf>,

    /// Macro name or trigger to take from the library
    #[arg(long, short)]
    pub name: Option<String>,

    /// JSON macro library (defaults to the configured one)
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// Switch IP or host name (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// sys-botbase port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Log the commands instead of connecting
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Subcommand)]
pub enum LibraryCmd {
    /// List macros in the library
    List {
        #[arg(long)]
        library: Option<PathBuf>,
    },
    /// Print one macro as text
    Show {
        /// Name or trigger
        name: String,
        #[arg(long)]
        library: Option<PathBuf>,
    },
    /// Add (or replace) a macro from a text file
    Add {
        /// Macro text file, `-` for stdin
        file: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        trigger: String,
        #[arg(long)]
        library: Option<PathBuf>,
    },
    /// Remove a macro by name
    Remove {
        name: String,
        #[arg(long)]
        library: Option<PathBuf>,
    },
    /// Append every macro from another exported JSON file
    Import {
        source: PathBuf,
        #[arg(long)]
        library: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    /// Print the config file location and contents
    Show,
    /// Change and save settings
    Set {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        settle_ms: Option<u64>,
        #[arg(long)]
        log_level: Option<String>,
        #[arg(long)]
        library: Option<PathBuf>,
    },
}

/// Command-line host: owns the config and runs one command.
pub struct CliApp {
    cfg: AppConfig,
    config_path: PathBuf,
}

impl CliApp {
    /// Load config (from `config_override` if given) and start logging.
    pub fn new(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(path) => path,
            None => config::config_path()?,
        };
        let cfg = AppConfig::load_from(&config_path)
            .with_context(|| format!("Could not load config from {}", config_path.display()))?;

        logging::init(&cfg.log_level);
        debug!(path = %config_path.display(), "config loaded");

        Ok(Self { cfg, config_path })
    }

    pub fn check(&self, file: &Path) -> Result<ExitCode> {
        let seq = parse_file(file)?;
        for (i, step) in seq.steps.iter().enumerate() {
            println!("{:>4}  {:<18} {}", i + 1, step.to_string(), step.describe());
        }
        println!("{}: {} steps OK", file.display(), seq.len());
        Ok(ExitCode::SUCCESS)
    }

    pub fn fmt(&self, file: &Path, inline: bool) -> Result<ExitCode> {
        let seq = parse_file(file)?;
        if inline {
            println!("{}", seq.to_inline());
        } else if !seq.is_empty() {
            println!("{seq}");
        }
        Ok(ExitCode::SUCCESS)
    }

    /// Parse first, then connect, then run on a worker thread. Ctrl+C cancels.
    pub fn run_macro(&self, args: RunArgs) -> Result<ExitCode> {
        let (label, seq) = self.resolve_macro(&args)?;
        if seq.is_empty() {
            println!("{label} has no steps, nothing to send.");
            return Ok(ExitCode::SUCCESS);
        }

        let sink: Box<dyn InputSink + Send> = if args.dry_run {
            println!("Dry run: commands are logged, not sent.");
            Box::new(LogSink::new())
        } else {
            let host = args.host.as_deref().unwrap_or(&self.cfg.switch_ip);
            let port = args.port.unwrap_or(self.cfg.switch_port);
            let sink = SysBotSink::connect(host, port, self.cfg.connect_timeout())
                .with_context(|| format!("Could not connect to {host}:{port}"))?
                .with_settle(self.cfg.settle());
            println!("Connected to {}", sink.peer());
            Box::new(sink)
        };

        let total = seq.len();
        let worker = MacroWorker::new(sink, seq.steps);

        let cancel = worker.cancel_token();
        ctrlc::set_handler(move || {
            if cancel.is_cancelled() {
                println!("\nCtrl+C pressed again. Macro is already stopping.");
            } else {
                println!("\nCtrl+C pressed. Stopping macro...");
                cancel.cancel();
            }
        })?;

        println!("Running {label} ({total} steps). Press Ctrl+C to stop.");

        let finished = worker.spawn().join()?;
        match finished.result {
            Ok(RunOutcome::Completed) => {
                println!("Macro sent!");
                Ok(ExitCode::SUCCESS)
            }
            Ok(RunOutcome::Cancelled { completed }) => {
                println!("Stopped after {completed} of {total} steps.");
                let stuck = finished.status.pad.held();
                if stuck.is_empty() {
                    println!("Held buttons released.");
                } else {
                    let names: Vec<&str> = stuck.iter().map(|b| b.as_str()).collect();
                    eprintln!("Could not release: {}", names.join(", "));
                }
                Ok(ExitCode::from(EXIT_CANCELLED))
            }
            Err(failed) => Err(anyhow!(failed).context(format!("{label} failed"))),
        }
    }

    pub fn library(&self, cmd: LibraryCmd) -> Result<ExitCode> {
        match cmd {
            LibraryCmd::List { library } => {
                let path = self.library_path(library)?;
                let lib = load_library(&path)?;
                if lib.is_empty() {
                    println!("No macros in {}", path.display());
                }
                for m in lib.macros() {
                    println!("{}  ({}, {} steps)", m.name, m.trigger, m.steps.len());
                }
            }
            LibraryCmd::Show { name, library } => {
                let path = self.library_path(library)?;
                let lib = load_library(&path)?;
                let entry = lib
                    .find(&name)
                    .ok_or_else(|| anyhow!("No macro named '{name}' in {}", path.display()))?;
                println!("{}", entry.to_seq());
            }
            LibraryCmd::Add {
                file,
                name,
                trigger,
                library,
            } => {
                let path = self.library_path(library)?;
                let mut lib = load_library(&path)?;
                let seq = parse_file(&file)?;
                lib.insert(MacroEntry::new(name.trim(), trigger.trim(), seq.steps))?;
                lib.save(&path)
                    .with_context(|| format!("Could not write {}", path.display()))?;
                println!("Macro '{}' saved to {}", name.trim(), path.display());
            }
            LibraryCmd::Remove { name, library } => {
                let path = self.library_path(library)?;
                let mut lib = load_library(&path)?;
                if lib.remove(&name).is_none() {
                    bail!("No macro named '{name}' in {}", path.display());
                }
                lib.save(&path)
                    .with_context(|| format!("Could not write {}", path.display()))?;
                println!("Removed '{name}'");
            }
            LibraryCmd::Import { source, library } => {
                let path = self.library_path(library)?;
                let mut lib = load_library(&path)?;
                let text = fs::read_to_string(&source)
                    .with_context(|| format!("Could not read {}", source.display()))?;
                let incoming = MacroLibrary::from_json(&text)
                    .with_context(|| format!("Could not import {}", source.display()))?;
                let added = lib.extend(incoming);
                lib.save(&path)
                    .with_context(|| format!("Could not write {}", path.display()))?;
                println!("Imported {added} macros from {}", source.display());
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    pub fn config(&mut self, cmd: ConfigCmd) -> Result<ExitCode> {
        match cmd {
            ConfigCmd::Show => {
                println!("# {}", self.config_path.display());
                print!("{}", toml::to_string_pretty(&self.cfg)?);
            }
            ConfigCmd::Set {
                host,
                port,
                timeout_ms,
                settle_ms,
                log_level,
                library,
            } => {
                if let Some(host) = host {
                    self.cfg.switch_ip = host;
                }
                if let Some(port) = port {
                    self.cfg.switch_port = port;
                }
                if let Some(ms) = timeout_ms {
                    self.cfg.connect_timeout_ms = ms;
                }
                if let Some(ms) = settle_ms {
                    self.cfg.settle_ms = ms;
                }
                if let Some(level) = log_level {
                    if logging::parse_level(&level).is_none() {
                        bail!("Unknown log level '{level}'");
                    }
                    self.cfg.log_level = level;
                }
                if let Some(library) = library {
                    self.cfg.library = Some(library);
                }
                self.cfg
                    .save_to(&self.config_path)
                    .with_context(|| format!("Could not write {}", self.config_path.display()))?;
                println!("Saved {}", self.config_path.display());
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    fn resolve_macro(&self, args: &RunArgs) -> Result<(String, MacroSeq)> {
        if let Some(file) = &args.file {
            return Ok((file.display().to_string(), parse_file(file)?));
        }
        let name = args
            .name
            .as_deref()
            .ok_or_else(|| anyhow!("Give a macro file or --name"))?;
        let path = self.library_path(args.library.clone())?;
        let lib = load_library(&path)?;
        let entry = lib
            .find(name)
            .ok_or_else(|| anyhow!("No macro named '{name}' in {}", path.display()))?;
        Ok((format!("'{}'", entry.name), entry.to_seq()))
    }

    fn library_path(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        explicit.or_else(|| self.cfg.library.clone()).ok_or_else(|| {
            anyhow!("No macro library given. Pass --library or run `config set --library <FILE>`")
        })
    }
}

fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))
}

fn parse_file(path: &Path) -> Result<MacroSeq> {
    let text = read_source(path)?;
    text.parse::<MacroSeq>()
        .with_context(|| format!("{} is not a valid macro", path.display()))
}

fn load_library(path: &Path) -> Result<MacroLibrary> {
    MacroLibrary::load(path).with_context(|| format!("Could not load {}", path.display()))
}
