use std::fmt::Write as _;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{debug, warn};

use petri_explore::config::ExploreConfig;
use petri_explore::explore::{
    CoverabilityExplorer, CoverabilityGraphReducer, ExplorationOutcome, LabelStyle, MarkingGraph,
    ReachabilityExplorer, UnboundedWitness, node::node_name,
};
use petri_explore::net::NetModel;
use petri_explore::net::incidence::IncidenceMatrices;
use petri_explore::net::io::{read_net, to_json_string, write_text};
use petri_explore::options::{Mode, Options, OutputFormat};

const EXIT_UNBOUNDED: u8 = 2;

fn main() -> ExitCode {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let mut args = shellwords::split(&std::env::var("PN_FLAGS").unwrap_or_default())
        .unwrap_or_else(|err| {
            warn!("ignoring PN_FLAGS: {err}");
            Vec::new()
        });
    args.extend(std::env::args().skip(1));

    let options = match Options::parse_from_args(&args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    debug!("PN options: {:?}", options);

    match run(&options) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(options: &Options) -> Result<ExitCode> {
    let config = ExploreConfig::load_from_file(&options.config)?;
    let net = read_net(&options.net)
        .with_context(|| format!("Failed to load net: {:?}", options.net))?
        .reordered(&options.place_order, &options.transition_order)
        .context("Failed to reorder net")?;
    let matrices = IncidenceMatrices::build(&net);
    let limit = config.explore.node_limit;

    let (content, code) = match options.mode {
        Mode::Matrices => (render_matrices(&matrices, options.format)?, ExitCode::SUCCESS),
        Mode::Reachability => {
            match ReachabilityExplorer::new(&net, &matrices)
                .with_node_limit(limit)
                .run()?
            {
                ExplorationOutcome::Done(graph) => (
                    render_graph(&graph, &config.render, options.format)?,
                    ExitCode::SUCCESS,
                ),
                ExplorationOutcome::Unbounded(witness) => (
                    render_witness(&net, &witness, options.format)?,
                    ExitCode::from(EXIT_UNBOUNDED),
                ),
            }
        }
        Mode::CoverabilityTree | Mode::CoverabilityGraph => {
            let mut graph = CoverabilityExplorer::new(&net, &matrices)
                .with_node_limit(limit)
                .run()?;
            if options.mode == Mode::CoverabilityGraph {
                graph = CoverabilityGraphReducer::new().reduce(&graph)?;
            }
            (
                render_graph(&graph, &config.render, options.format)?,
                ExitCode::SUCCESS,
            )
        }
    };

    match &options.output {
        Some(path) => write_text(path, &content)
            .with_context(|| format!("Failed to write output: {:?}", path))?,
        None => print!("{content}"),
    }
    Ok(code)
}

fn render_matrices(matrices: &IncidenceMatrices, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => to_json_string(matrices)? + "\n",
        OutputFormat::Text => matrices.to_string(),
        OutputFormat::Dot => {
            warn!("matrices have no dot rendering, printing text");
            matrices.to_string()
        }
    })
}

fn render_graph(graph: &MarkingGraph, style: &LabelStyle, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Dot => graph.to_dot(style),
        OutputFormat::Json => to_json_string(&graph.render(style))? + "\n",
        OutputFormat::Text => {
            let model = graph.render(style);
            let stats = graph.stats();
            let mut out = String::new();
            writeln!(
                out,
                "{}: {} nodes, {} edges",
                model.kind, stats.node_count, stats.labeled_edge_count
            )?;
            for node in &model.nodes {
                writeln!(out, "  {node}")?;
            }
            for edge in &model.edges {
                writeln!(
                    out,
                    "  {} -> {} [{}]",
                    node_name(&style.node_prefix, edge.source),
                    node_name(&style.node_prefix, edge.target),
                    edge.label
                )?;
            }
            for (representative, leaves) in &model.merged {
                let leaves = leaves
                    .iter()
                    .map(|&id| node_name(&style.node_prefix, id))
                    .collect::<Vec<_>>();
                writeln!(
                    out,
                    "  {} absorbs {}",
                    node_name(&style.node_prefix, *representative),
                    leaves.join(", ")
                )?;
            }
            out
        }
    })
}

fn render_witness(net: &NetModel, witness: &UnboundedWitness, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(to_json_string(witness)? + "\n");
    }
    let sequence = witness
        .firing_sequence
        .iter()
        .map(|&t| net.transition(t).label.as_str())
        .collect::<Vec<_>>();
    let places = witness
        .growing_places
        .iter()
        .map(|&p| net.place(p).label.as_str())
        .collect::<Vec<_>>();
    let mut out = String::new();
    writeln!(out, "net is unbounded")?;
    writeln!(
        out,
        "  {} covers {} (node {:?})",
        witness.covering_marking, witness.covered_marking, witness.covered
    )?;
    writeln!(out, "  growing places: {}", places.join(", "))?;
    writeln!(out, "  firing sequence: {}", sequence.join(" "))?;
    Ok(out)
}
