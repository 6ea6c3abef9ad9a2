use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use framedump_buffers::{write_fmt_file, Report, SlotSelector};
use framedump_falog::{find_stream_output_vertex_buffers, open_frame_analysis_log};
use framedump_mesh::{
    export_mesh, group_dump_files, import_mesh, load_mesh, write_export, DumpGroup, ImportOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "framedump",
    about = "Inspect and convert frame-analysis buffer dumps."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print layout, topology and counts for each dump group
    Info {
        /// Dump .txt files; sibling buffers of the same draw call are grouped automatically
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Do not widen the selection to directory files sharing a buffer hash
        #[arg(long)]
        no_related: bool,
    },
    /// Write the layout-only .fmt description of a dump group
    Fmt {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output .fmt path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Re-encode text dumps as binary .vb<N>/.ib buffers plus a .fmt sidecar
    Convert {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output path prefix for the .vb<N>/.ib/.fmt set
        #[arg(short, long, value_name = "PREFIX")]
        output: PathBuf,
    },
    /// Print the stream output pass feeding each vertex buffer input
    SoMap {
        /// Frame-analysis dump directory containing log.txt
        dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    match args.command {
        Command::Info { files, no_related } => info(&files, !no_related),
        Command::Fmt { files, output } => fmt(&files, &output),
        Command::Convert { files, output } => convert(&files, &output),
        Command::SoMap { dir } => so_map(&dir),
    }
}

fn print_report(report: &Report) {
    for entry in report.entries() {
        println!("{}: {}", entry.severity, entry.message);
    }
}

fn info(files: &[PathBuf], load_related: bool) -> anyhow::Result<()> {
    let mut report = Report::new();
    let groups = group_dump_files(files, load_related, None, &mut report)?;
    let mut failed = 0usize;
    for group in &groups {
        // One broken group never aborts the batch.
        if let Err(err) = info_group(group, &mut report) {
            eprintln!("{}: {err:#}", group.name());
            failed += 1;
        }
    }
    print_report(&report);
    if failed > 0 {
        anyhow::bail!("{failed} of {} dump groups failed", groups.len());
    }
    Ok(())
}

fn info_group(group: &DumpGroup, report: &mut Report) -> anyhow::Result<()> {
    let (vb, ib) = load_mesh(std::slice::from_ref(group), report)?;
    println!("{}:", group.name());
    println!("  topology: {}", vb.topology);
    println!("  vertices: {} (first vertex {})", vb.len(), vb.first);
    match &ib {
        Some(ib) => println!(
            "  indices: {} faces, format {} (first index {})",
            ib.faces.len(),
            ib.format,
            ib.first
        ),
        None => println!("  indices: none"),
    }
    for (slot, stride) in vb.slot_strides() {
        println!("  vb{slot} stride: {stride}");
    }
    print!("{}", vb.layout);
    Ok(())
}

fn fmt(files: &[PathBuf], output: &Path) -> anyhow::Result<()> {
    let mut report = Report::new();
    let groups = group_dump_files(files, false, None, &mut report)?;
    let group = groups.first().context("no dump group found")?;
    let (vb, ib) = load_mesh(std::slice::from_ref(group), &mut report)?;
    let strides: BTreeMap<SlotSelector, u32> = vb
        .slot_strides()
        .into_iter()
        .map(|(slot, stride)| (SlotSelector::Slot(slot), stride))
        .collect();
    let mut out =
        fs::File::create(output).with_context(|| format!("cannot create {}", output.display()))?;
    write_fmt_file(&mut out, &vb, ib.as_ref(), &strides)?;
    print_report(&report);
    Ok(())
}

fn convert(files: &[PathBuf], output: &Path) -> anyhow::Result<()> {
    let mut report = Report::new();
    let groups = group_dump_files(files, false, None, &mut report)?;
    let mut failed = 0usize;
    for (i, group) in groups.iter().enumerate() {
        let prefix = if groups.len() == 1 {
            output.to_path_buf()
        } else {
            let mut name = output.as_os_str().to_owned();
            name.push(format!("-{i}"));
            PathBuf::from(name)
        };
        if let Err(err) = convert_group(group, &prefix, &mut report) {
            eprintln!("{}: {err:#}", group.name());
            failed += 1;
        }
    }
    print_report(&report);
    if failed > 0 {
        anyhow::bail!("{failed} of {} dump groups failed", groups.len());
    }
    Ok(())
}

fn convert_group(group: &DumpGroup, prefix: &Path, report: &mut Report) -> anyhow::Result<()> {
    let (vb, ib) = load_mesh(std::slice::from_ref(group), report)?;
    let (mesh, metadata) = import_mesh(vb, ib, &ImportOptions::default(), report)?;
    let (vb, ib) = export_mesh(&mesh, &metadata, None, report)?;
    write_export(prefix, &vb, ib.as_ref(), &metadata)?;
    println!("{}: wrote {}.vb*/.fmt", group.name(), prefix.display());
    Ok(())
}

fn so_map(dir: &Path) -> anyhow::Result<()> {
    let log = open_frame_analysis_log(dir)?;
    let map = find_stream_output_vertex_buffers(&log);
    if map.is_empty() {
        println!("no stream output vertex buffers found");
        return Ok(());
    }
    for (vb, so) in &map {
        println!(
            "draw call {} vb{} <- draw call {} so slot {}",
            vb.draw_call, vb.slot, so.draw_call, so.slot
        );
    }
    Ok(())
}
