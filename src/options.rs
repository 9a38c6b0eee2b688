//! Parsing Options.
//! `pn-explore <NET> --mode {mode}` or `-m`, one of reachability, tree, graph, matrices

use clap::{Arg, Command};
use std::error::Error;
use std::path::PathBuf;

use crate::net::core::OrderSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Reachability,
    CoverabilityTree,
    CoverabilityGraph,
    Matrices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Dot,
    Json,
    Text,
}

pub fn make_options_parser() -> clap::Command {
    Command::new("pn-explore")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Reachability and coverability exploration of place/transition nets")
        .arg(
            Arg::new("net")
                .value_name("NET")
                .help("Net definition, .json or .ron")
                .required(true),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .help("What to build")
                .default_value("reachability")
                .value_parser(["reachability", "tree", "graph", "matrices"]),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .default_value("text")
                .value_parser(["dot", "json", "text"]),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the result here instead of stdout"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .default_value("pn-explore.toml"),
        )
        .arg(
            Arg::new("sort-places")
                .long("sort-places")
                .value_name("alpha|LABELS")
                .help("`alpha`, or a comma separated list naming every place"),
        )
        .arg(
            Arg::new("sort-transitions")
                .long("sort-transitions")
                .value_name("alpha|LABELS"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub net: PathBuf,
    pub mode: Mode,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub config: PathBuf,
    pub place_order: OrderSpec,
    pub transition_order: OrderSpec,
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let flags = shellwords::split(s)?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let mode = match matches.get_one::<String>("mode").map(String::as_str) {
            Some("reachability") => Mode::Reachability,
            Some("tree") => Mode::CoverabilityTree,
            Some("graph") => Mode::CoverabilityGraph,
            Some("matrices") => Mode::Matrices,
            _ => return Err("UnsupportedMode")?,
        };
        let format = match matches.get_one::<String>("format").map(String::as_str) {
            Some("dot") => OutputFormat::Dot,
            Some("json") => OutputFormat::Json,
            Some("text") => OutputFormat::Text,
            _ => return Err("UnsupportedFormat")?,
        };

        let net = matches
            .get_one::<String>("net")
            .map(PathBuf::from)
            .ok_or("MissingNet")?;
        let output = matches.get_one::<String>("output").map(PathBuf::from);
        let config = matches
            .get_one::<String>("config")
            .map(PathBuf::from)
            .unwrap_or_default();

        Ok(Options {
            net,
            mode,
            format,
            output,
            config,
            place_order: order_spec(matches.get_one::<String>("sort-places")),
            transition_order: order_spec(matches.get_one::<String>("sort-transitions")),
        })
    }
}

fn order_spec(value: Option<&String>) -> OrderSpec {
    match value.map(|s| s.trim()) {
        None | Some("") => OrderSpec::Keep,
        Some("alpha") => OrderSpec::Alphabetical,
        Some(list) => OrderSpec::Labels(
            list.split(',')
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .collect(),
        ),
    }
}
