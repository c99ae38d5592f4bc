//! Command-line surface
//!
//! The registry is loaded once here, handed to the command by reference and
//! saved once afterwards if the command changed it.

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::{Shell, generate};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{PrefDeclaration, Registry, ThemeEntry};
use crate::constants::config::PATH_ENV;
use crate::constants::profile::{CHROME_DIR, SWITCH_OUT};
use crate::sync::{self, SourceFetcher, canonical_source};
use crate::{firefox, presets};

#[derive(Parser, Debug)]
#[command(author, version, about = "nyoom · Firefox userchrome manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use
    #[arg(short, long, global = true, env = PATH_ENV, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Don't refuse to touch the profile while Firefox is running
    #[arg(long, global = true)]
    pub no_running_check: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List userchromes
    List,

    /// Add a new userchrome
    Add {
        /// Name of the userchrome
        name: String,
        /// Git clone URL, github:/codeberg:/gitlab: shorthand or local directory
        source: String,
    },

    /// Remove a userchrome
    Remove {
        /// Name of the userchrome
        name: String,
    },

    /// Switch to a userchrome
    Switch {
        /// Name of the userchrome (`out` removes the installed one)
        name: String,
    },

    /// Reinstall the userchrome currently in use
    Update,

    /// Import a preset as a userchrome or list presets
    Preset {
        /// Name of the preset
        name: Option<String>,
    },

    /// Configure the Firefox profile or print the current one
    Profile {
        /// Path to the profile directory
        #[arg(value_hint = ValueHint::DirPath)]
        path: Option<PathBuf>,
    },

    /// Manage userchrome-linked configs
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// List Firefox configs
    List {
        /// Name of the userchrome
        name: String,
    },

    /// Set a Firefox config
    Set {
        /// Name of the userchrome
        name: String,
        /// Config key
        key: String,
        /// Config value
        value: String,
        /// Whether the value is a raw JavaScript value or a string
        #[arg(short, long)]
        raw: bool,
    },

    /// Unset a Firefox config
    Unset {
        /// Name of the userchrome
        name: String,
        /// Config key
        key: String,
    },
}

/// Whether a command changed the registry
type Changed = bool;

pub fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        completions(shell, &mut io::stdout());
        return Ok(());
    }

    let check_running = !cli.no_running_check;
    let path = cli.config.unwrap_or_else(Registry::default_path);
    debug!(path = %path.display(), "Using registry");
    let mut registry = Registry::load(&path)?;

    let changed: Changed = match cli.command {
        Commands::List => {
            list(&registry);
            false
        }
        Commands::Add { name, source } => {
            if name == SWITCH_OUT {
                bail!("the name {SWITCH_OUT:?} is reserved for `nyoom switch {SWITCH_OUT}`");
            }
            let entry = registry.add(ThemeEntry::new(name, canonical_source(&source)?))?;
            print_entry(entry, false, '+');
            true
        }
        Commands::Remove { name } => {
            let removed = registry.remove(&name)?;
            print_entry(&removed, true, '-');
            true
        }
        Commands::Switch { name } => {
            if check_running {
                firefox::ensure_not_running()?;
            }
            switch(&registry, &name)?;
            false
        }
        Commands::Update => {
            if check_running {
                firefox::ensure_not_running()?;
            }
            let profile = registry.profile()?;
            let name = sync::installed_theme(&profile.join(CHROME_DIR))?;
            switch(&registry, &name)?;
            false
        }
        Commands::Preset { name: None } => {
            for preset in presets::all()? {
                print_entry(&preset, true, '·');
            }
            false
        }
        Commands::Preset { name: Some(name) } => {
            let mut preset = presets::find(&name)?;
            preset.source = canonical_source(&preset.source)?;
            let entry = registry.add(preset)?;
            print_entry(entry, false, '+');
            println!("Run `nyoom switch {name}` to switch to this userchrome.");
            true
        }
        Commands::Profile { path: new_path } => profile(&mut registry, new_path.as_deref())?,
        Commands::Config { command } => config(&mut registry, command)?,
        Commands::Completions { .. } => false,
    };

    if changed {
        registry.save(&path)?;
    }
    Ok(())
}

fn list(registry: &Registry) {
    if registry.entries.is_empty() {
        println!("No userchromes yet! Use `nyoom add` or `nyoom preset` to add one.");
        return;
    }
    for entry in &registry.entries {
        print_entry(entry, false, '·');
    }
}

fn switch(registry: &Registry, name: &str) -> Result<()> {
    let entry = match name {
        SWITCH_OUT => None,
        name => Some(registry.get(name)?),
    };
    let profile = registry.profile()?;

    if let Some(entry) = entry {
        print_entry(entry, false, '·');
        println!();
    }

    let mut step = 1;
    sync::switch(entry, profile, &SourceFetcher::default(), |stage| {
        if stage == sync::Stage::Done {
            println!("{stage}");
        } else {
            println!("{step} {stage}");
            step += 1;
        }
    })
    .with_context(|| match entry {
        Some(_) => format!("Failed to switch to {name:?}"),
        None => "Failed to remove the installed userchrome".to_string(),
    })?;

    Ok(())
}

fn completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin, out);
}

fn profile(registry: &mut Registry, new_path: Option<&Path>) -> Result<Changed> {
    let changed = match new_path {
        Some(path) => {
            if !path.is_dir() {
                bail!("profile {} does not exist or is not a directory", path.display());
            }
            let canonical = path
                .canonicalize()
                .with_context(|| format!("Failed to resolve profile path {}", path.display()))?;
            registry.profile = Some(canonical);
            true
        }
        None => false,
    };

    match &registry.profile {
        Some(profile) => println!("{}", profile.display()),
        None => println!("[not set]"),
    }
    Ok(changed)
}

fn config(registry: &mut Registry, command: ConfigCommands) -> Result<Changed> {
    match command {
        ConfigCommands::List { name } => {
            for pref in &registry.get(&name)?.prefs {
                println!("{}", format_pref(pref));
            }
            Ok(false)
        }
        ConfigCommands::Set { name, key, value, raw } => {
            registry.get_mut(&name)?.set_pref(&key, &value, raw);
            Ok(true)
        }
        ConfigCommands::Unset { name, key } => {
            registry.get_mut(&name)?.unset_pref(&key)?;
            Ok(true)
        }
    }
}

fn format_pref(pref: &PrefDeclaration) -> String {
    format!(
        "{}: {}{}",
        pref.key,
        pref.value,
        if pref.raw { " (raw)" } else { "" }
    )
}

/// Short form shows at most three prefs
fn print_entry(entry: &ThemeEntry, short: bool, bullet: char) {
    println!("{bullet} {} {}", entry.name, entry.source);

    let shown = if short { entry.prefs.len().min(3) } else { entry.prefs.len() };
    for pref in &entry.prefs[..shown] {
        println!("    {}", format_pref(pref));
    }
    if shown < entry.prefs.len() {
        println!("    and {} more", entry.prefs.len() - shown);
    }
}
