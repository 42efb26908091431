//! CLI argument definitions using clap derive macros.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{ArgMatches, Args as ClapArgs, CommandFactory, FromArgMatches, Parser, Subcommand};

use note_converter_core::packager::DEFAULT_ARCHIVE_NAME;

/// Convert files and web pages into Markdown notes.
///
/// Note Converter sends files, pages, crawled sites and video links to a
/// conversion service and bundles the resulting notes into one zip archive.
#[derive(Parser, Debug)]
#[command(name = "note-converter")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the config file (default: ~/.config/note-converter/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Parses the process arguments, keeping `convert` inputs in the order
    /// they were typed. Exits on invalid arguments like [`Parser::parse`].
    pub fn parse_ordered() -> Self {
        Self::try_parse_ordered_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
    }

    /// Like [`Parser::try_parse_from`], but records the command-line order
    /// of `convert` inputs.
    pub fn try_parse_ordered_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(itr)?;
        let mut args = Self::from_arg_matches(&matches)?;
        if let (Command::Convert(convert), Some(("convert", sub))) =
            (&mut args.command, matches.subcommand())
        {
            convert.record_input_order(sub);
        }
        Ok(args)
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert files and links into notes
    Convert(ConvertArgs),

    /// Check that the conversion service is reachable
    Health(ServiceArgs),

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Service connection overrides shared by subcommands.
#[derive(ClapArgs, Debug, Default)]
pub struct ServiceArgs {
    /// Conversion service base URL (overrides config)
    #[arg(long, value_name = "URL", env = "NOTE_CONVERTER_BASE_URL")]
    pub base_url: Option<String>,

    /// Maximum attempts per request, including the first (1-10, overrides config)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: Option<u32>,
}

/// Arguments for `convert`.
#[derive(ClapArgs, Debug)]
pub struct ConvertArgs {
    /// Local file to convert (repeatable)
    #[arg(short, long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Web page to convert (repeatable)
    #[arg(short, long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Page whose linked pages are crawled as well (repeatable)
    #[arg(short, long = "parent-url", value_name = "URL")]
    pub parent_urls: Vec<String>,

    /// Video link to transcribe (repeatable)
    #[arg(long = "video", value_name = "URL")]
    pub videos: Vec<String>,

    /// Send all items in one batch request
    #[arg(short, long)]
    pub batch: bool,

    /// Archive to write
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_ARCHIVE_NAME)]
    pub output: PathBuf,

    /// API key (falls back to NOTE_CONVERTER_API_KEY, then the stored key)
    #[arg(short = 'k', long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Store the key given with --api-key for later runs
    #[arg(long, requires = "api_key")]
    pub remember: bool,

    /// Crawl depth for parent URLs (default: config, else unlimited)
    #[arg(long, value_name = "N")]
    pub max_depth: Option<u32>,

    /// Do not keep images
    #[arg(long)]
    pub no_images: bool,

    /// Do not emit metadata front matter
    #[arg(long)]
    pub no_metadata: bool,

    #[command(flatten)]
    pub service: ServiceArgs,

    #[arg(skip)]
    input_order: Vec<InputSlot>,
}

/// Position of one input within its flag's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputSlot {
    File(usize),
    Url(usize),
    ParentUrl(usize),
    Video(usize),
}

/// One `convert` input, borrowed from the parsed arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRef<'a> {
    File(&'a Path),
    Url(&'a str),
    ParentUrl(&'a str),
    Video(&'a str),
}

impl ConvertArgs {
    /// Total number of inputs given on the command line.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.files.len() + self.urls.len() + self.parent_urls.len() + self.videos.len()
    }

    /// Inputs in command-line order when it was recorded, otherwise grouped
    /// as files, URLs, parent URLs, then videos.
    #[must_use]
    pub fn ordered_inputs(&self) -> Vec<InputRef<'_>> {
        let slots = if self.input_order.len() == self.input_count() {
            self.input_order.clone()
        } else {
            self.grouped_slots()
        };
        slots
            .into_iter()
            .filter_map(|slot| match slot {
                InputSlot::File(n) => self.files.get(n).map(|p| InputRef::File(p)),
                InputSlot::Url(n) => self.urls.get(n).map(|u| InputRef::Url(u)),
                InputSlot::ParentUrl(n) => self.parent_urls.get(n).map(|u| InputRef::ParentUrl(u)),
                InputSlot::Video(n) => self.videos.get(n).map(|u| InputRef::Video(u)),
            })
            .collect()
    }

    fn grouped_slots(&self) -> Vec<InputSlot> {
        (0..self.files.len())
            .map(InputSlot::File)
            .chain((0..self.urls.len()).map(InputSlot::Url))
            .chain((0..self.parent_urls.len()).map(InputSlot::ParentUrl))
            .chain((0..self.videos.len()).map(InputSlot::Video))
            .collect()
    }

    fn record_input_order(&mut self, matches: &ArgMatches) {
        let groups: [(&str, fn(usize) -> InputSlot); 4] = [
            ("files", InputSlot::File),
            ("urls", InputSlot::Url),
            ("parent_urls", InputSlot::ParentUrl),
            ("videos", InputSlot::Video),
        ];
        let mut positioned: Vec<(usize, InputSlot)> = Vec::with_capacity(self.input_count());
        for (id, slot) in groups {
            if let Some(indices) = matches.indices_of(id) {
                positioned.extend(indices.enumerate().map(|(n, at)| (at, slot(n))));
            }
        }
        positioned.sort_by_key(|(at, _)| *at);
        self.input_order = positioned.into_iter().map(|(_, slot)| slot).collect();
    }
}

/// `key` subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Store an API key
    Set {
        /// The key to store
        key: String,
    },
    /// Print the stored key in masked form
    Show,
    /// Remove the stored key
    Clear,
}

/// `config` subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration and where it was loaded from
    Show,
}
