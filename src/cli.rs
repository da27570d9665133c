// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use directories::ProjectDirs;
use notedown_core::config::Config;
use notedown_core::error::Fallible;
use notedown_core::error::fail;

use crate::cmd::apply::apply_edit_file;
use crate::cmd::check::check_notes;
use crate::cmd::extract::extract_field;
use crate::cmd::render::render_file;
use crate::cmd::show::show_notes;
use crate::cmd::template::note_template;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file. By default, `notedown/config.toml` in the user's config directory is used.
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a note file, or every note file in a directory.
    Check {
        /// Path to a note file or a directory of note files.
        path: String,
    },
    /// Render a note file to stored notes, written as JSON.
    Render {
        /// Path to the note file.
        file: String,
        /// Tags added to every note, separated by spaces.
        #[arg(long, default_value = "")]
        tags: String,
        /// Optional path to the output file. By default, the output is printed to stdout.
        #[arg(long)]
        output: Option<String>,
    },
    /// Print stored notes.
    Show {
        /// Path to a JSON file of stored notes.
        json: String,
        /// Print notes in the note file format, without styling.
        #[arg(long)]
        parseable: bool,
        /// Print one summary line per note, this many columns wide.
        #[arg(long)]
        summary: Option<usize>,
    },
    /// Print the Markdown a rendered field was made from.
    Extract {
        /// Path to a file holding the field's HTML. By default, stdin is read.
        file: Option<String>,
    },
    /// Apply an edited note to the first stored note.
    Apply {
        /// Path to a JSON file of stored notes.
        json: String,
        /// Path to the edited note, as printed by `show --parseable`.
        edited: String,
        /// Optional path to the output file. By default, the output is printed to stdout.
        #[arg(long)]
        output: Option<String>,
    },
    /// Print a skeleton for a new note like the first note in a file.
    Template {
        /// Path to the note file.
        file: String,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let config = load_config(cli.config)?;
    match cli.command {
        Command::Check { path } => {
            let report = check_notes(&path, &config)?;
            print!("{report}");
            Ok(())
        }
        Command::Render { file, tags, output } => render_file(&file, &tags, output, &config),
        Command::Show {
            json,
            parseable,
            summary,
        } => {
            print!("{}", show_notes(&json, parseable, summary)?);
            Ok(())
        }
        Command::Extract { file } => {
            println!("{}", extract_field(file)?);
            Ok(())
        }
        Command::Apply {
            json,
            edited,
            output,
        } => apply_edit_file(&json, &edited, output, &config),
        Command::Template { file } => {
            println!("{}", note_template(&file, &config)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<String>) -> Fallible<Config> {
    if let Some(path) = path {
        let path = PathBuf::from(path);
        if !path.exists() {
            return fail(format!("Config file not found: {}", path.display()));
        }
        return Config::load(&path);
    }
    match default_config_path() {
        Some(path) => Config::load(&path),
        None => Ok(Config::default()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "notedown").map(|dirs| dirs.config_dir().join("config.toml"))
}
