use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use wf_app::{
    AppError, AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, project_service, query,
    run_service,
};
use wf_core::display::{m3_to_bbl, pa_to_psi};
use wf_results::{Series, UnitSystem, series_csv_in};

#[derive(Parser)]
#[command(name = "wf-cli")]
#[command(about = "WellFlow CLI - wellbore trip and circulation simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// List operations in a project
    Operations {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Run every operation of a project in order
    Run {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List cached reports for a project
    Reports {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Show details of a cached report
    ShowReport {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Report ID to display
        report_id: String,
    },
    /// Export step series from a report as CSV
    ExportSeries {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Report ID
        report_id: String,
        /// Series to export (e.g., bit_md, esd, sabp, pit_gain); all when omitted
        series: Vec<String>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write oilfield units (psi, ppg, bbl) instead of SI
        #[arg(long)]
        oilfield: bool,
    },
    /// Manage operation presets
    #[command(subcommand)]
    Preset(PresetCommands),
}

#[derive(Subcommand)]
enum PresetCommands {
    /// Save the project's operation list as a named preset
    Save {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Preset name
        name: String,
    },
    /// List presets, or the operations of one preset
    Show {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Preset name (lists all presets when omitted)
        name: Option<String>,
    },
    /// Append a preset's operations to the project
    Apply {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Preset name
        name: String,
    },
    /// Write a preset to a stand-alone file
    Export {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Preset name
        name: String,
        /// Output preset file (YAML or JSON by extension)
        output: PathBuf,
    },
    /// Merge presets from a file into the project
    Import {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Preset file to import
        presets_path: PathBuf,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Operations { project_path } => cmd_operations(&project_path),
        Commands::Run {
            project_path,
            no_cache,
        } => cmd_run(&project_path, !no_cache),
        Commands::Reports { project_path } => cmd_reports(&project_path),
        Commands::ShowReport {
            project_path,
            report_id,
        } => cmd_show_report(&project_path, &report_id),
        Commands::ExportSeries {
            project_path,
            report_id,
            series,
            output,
            oilfield,
        } => {
            let units = if oilfield {
                UnitSystem::Oilfield
            } else {
                UnitSystem::Si
            };
            cmd_export_series(&project_path, &report_id, &series, output.as_deref(), units)
        }
        Commands::Preset(preset_cmd) => match preset_cmd {
            PresetCommands::Save { project_path, name } => cmd_preset_save(&project_path, &name),
            PresetCommands::Show { project_path, name } => {
                cmd_preset_show(&project_path, name.as_deref())
            }
            PresetCommands::Apply { project_path, name } => {
                cmd_preset_apply(&project_path, &name)
            }
            PresetCommands::Export {
                project_path,
                name,
                output,
            } => cmd_preset_export(&project_path, &name, &output),
            PresetCommands::Import {
                project_path,
                presets_path,
            } => cmd_preset_import(&project_path, &presets_path),
        },
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_operations(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let operations = project_service::list_operations(&project);

    if operations.is_empty() {
        println!("No operations found in project");
    } else {
        println!("Operations in project:");
        for (i, op) in operations.iter().enumerate() {
            let start = op
                .start_md
                .map(|md| format!("{:.1}", md))
                .unwrap_or_else(|| "bit".to_string());
            println!(
                "  {}. {} - {} [{}] {} -> {:.1} m",
                i + 1,
                op.id,
                op.label,
                op.kind,
                start,
                op.end_md
            );
        }
    }
    Ok(())
}

fn cmd_run(project_path: &Path, use_cache: bool) -> AppResult<()> {
    println!("Running project: {}", project_path.display());
    tracing::debug!(path = %project_path.display(), use_cache, "starting run");

    let request = RunRequest {
        project_path,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let mut last_stage = String::new();
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let stage_key = format!("{:?}", event.stage);
            let emit_now = stage_key != last_stage || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = stage_key;
                last_emit = Instant::now();
            }
        }),
        None,
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.report_id);
    } else {
        println!("✓ Simulation completed: {}", response.report_id);
    }

    for (i, op) in response.manifest.operations.iter().enumerate() {
        match &op.error {
            Some(err) => println!("  {}. {} ({}): {}", i + 1, op.label, op.kind, err),
            None => println!(
                "  {}. {} ({}): {} steps",
                i + 1,
                op.label,
                op.kind,
                op.step_count
            ),
        }
    }

    print_timing_summary(&response.timing);
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(140));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (&event.stage, &event.operation) {
        (RunStage::RunningOperation, Some(op)) => {
            let width = 28usize;
            let filled = ((op.fraction_complete * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  op={}/{}  {}  step={}/{}  bit={:.1}m  elapsed={:.1}s",
                bar,
                op.fraction_complete * 100.0,
                op.operation_index + 1,
                op.operation_count,
                op.label,
                op.step,
                op.total_steps,
                op.bit_md,
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
            let _ = io::stdout().flush();
        }
    }
}

fn print_timing_summary(timing: &wf_app::RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);
    let compile_pct = 100.0 * timing.compile_time_s / total;
    let simulate_pct = 100.0 * timing.simulate_time_s / total;
    let save_pct = 100.0 * timing.save_time_s / total;

    println!("\nTiming summary:");
    println!(
        "  Compile:  {:.3}s ({:.1}%)",
        timing.compile_time_s, compile_pct
    );
    println!(
        "  Simulate: {:.3}s ({:.1}%)",
        timing.simulate_time_s, simulate_pct
    );
    println!("  Save:     {:.3}s ({:.1}%)", timing.save_time_s, save_pct);
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    }
    println!("  Total:    {:.3}s", timing.total_time_s);
    println!("  Steps:    {}", timing.steps);
}

fn cmd_reports(project_path: &Path) -> AppResult<()> {
    let reports = run_service::list_reports(project_path)?;

    if reports.is_empty() {
        println!("No cached reports found for {}", project_path.display());
    } else {
        println!("Cached reports:");
        for manifest in reports {
            println!(
                "  {} ({}, {} steps)",
                manifest.report_id, manifest.timestamp, manifest.total_steps
            );
        }
    }
    Ok(())
}

fn cmd_show_report(project_path: &Path, report_id: &str) -> AppResult<()> {
    println!("Loading report: {}", report_id);

    let (manifest, timeline) = run_service::load_report(project_path, report_id)?;
    let summary = query::get_report_summary(&timeline)?;

    println!("\nReport Summary:");
    println!("  Project: {}", manifest.project_name);
    println!("  Engine: {}", manifest.engine_version);
    println!("  Steps: {}", summary.record_count);
    println!(
        "  Bit MD range: {:.1} - {:.1} m",
        summary.bit_md_range.0, summary.bit_md_range.1
    );
    println!(
        "  Max SABP: {:.0} Pa ({:.0} psi)",
        summary.max_sabp_pa,
        pa_to_psi(summary.max_sabp_pa)
    );
    println!(
        "  Final pit gain: {:.3} m3 ({:.2} bbl)",
        summary.final_pit_gain_m3,
        m3_to_bbl(summary.final_pit_gain_m3)
    );

    println!("\nOperations:");
    for op in &manifest.operations {
        let status = op.error.as_deref().unwrap_or("complete");
        println!(
            "  [{}..{}) {} ({}) - {}",
            op.first_index,
            op.first_index + op.step_count,
            op.label,
            op.kind,
            status
        );
    }

    Ok(())
}

fn cmd_export_series(
    project_path: &Path,
    report_id: &str,
    names: &[String],
    output: Option<&Path>,
    units: UnitSystem,
) -> AppResult<()> {
    let (_manifest, timeline) = run_service::load_report(project_path, report_id)?;

    let columns = if names.is_empty() {
        Series::ALL.to_vec()
    } else {
        names
            .iter()
            .map(|name| name.parse::<Series>())
            .collect::<Result<Vec<_>, _>>()?
    };
    let csv = series_csv_in(&timeline, &columns, units);

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} rows to {}",
            timeline.len(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }

    Ok(())
}

fn cmd_preset_save(project_path: &Path, name: &str) -> AppResult<()> {
    let project = project_service::save_preset(project_path, name)?;
    println!(
        "✓ Saved preset '{}' with {} operations",
        name,
        project.operations.len()
    );
    Ok(())
}

fn cmd_preset_show(project_path: &Path, name: Option<&str>) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;

    let Some(name) = name else {
        if project.presets.is_empty() {
            println!("No presets found in project");
        } else {
            println!("Presets in project:");
            for preset in &project.presets {
                println!(
                    "  {} ({} operations){}",
                    preset.name,
                    preset.operations.len(),
                    preset
                        .description
                        .as_ref()
                        .map(|d| format!(" - {}", d))
                        .unwrap_or_default()
                );
            }
        }
        return Ok(());
    };

    let preset = project
        .preset(name)
        .ok_or_else(|| AppError::InvalidInput(format!("Preset not found: {}", name)))?;
    println!("Preset '{}':", preset.name);
    for (i, op) in preset.operations.iter().enumerate() {
        println!(
            "  {}. {} ({:?}) -> {:.1} m",
            i + 1,
            op.label,
            op.kind,
            op.end_md
        );
    }
    Ok(())
}

fn cmd_preset_apply(project_path: &Path, name: &str) -> AppResult<()> {
    let added = project_service::apply_preset(project_path, name)?;
    println!("✓ Appended {} operations from preset '{}'", added, name);
    Ok(())
}

fn cmd_preset_export(project_path: &Path, name: &str, output: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    project_service::export_preset(&project, name, output)?;
    println!("✓ Exported preset '{}' to {}", name, output.display());
    Ok(())
}

fn cmd_preset_import(project_path: &Path, presets_path: &Path) -> AppResult<()> {
    let project = project_service::import_presets(project_path, presets_path)?;
    println!(
        "✓ Imported presets; project now has {} presets",
        project.presets.len()
    );
    Ok(())
}
