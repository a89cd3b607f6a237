mod cli;
mod config;
mod core;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{
    AverageSubcommand, CalcArgs, ChartArgs, Cli, ClassifyArgs, Commands, EditArgs, OutputArgs,
    ScaleSubcommand,
};
use crate::core::Session;
use crate::core::average::{self, TestUpdate};
use crate::core::editor::{ScaleEditor, validate_scale};
use crate::core::engine::CalculationError;
use crate::core::report::{
    self, AverageReport, CalculationReport, ClassificationReport, EditReport, JsonOutcome,
};
use crate::core::scale::classify;
use config::Config;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir()?;
    let config_path = cli.config.clone();
    let session = || open_session(config_path.as_deref(), &cwd);

    match cli.command {
        Commands::Init => {
            if config_path.is_some() {
                tracing::warn!("--config is ignored by `gradecalc init`; writing ./gradecalc.toml");
            }

            let path = cwd.join(config::CONFIG_FILE_NAME);
            config::write_default_config(&path)?;
            println!("created {}", path.display());
            Ok(0)
        }
        Commands::Calc(args) => run_calc(args, &session()?),
        Commands::Last(args) => run_last(&args, &session()?),
        Commands::Chart(args) => run_chart(args, &session()?),
        Commands::Average { command } => run_average(command, &session()?),
        Commands::Scale { command } => match command {
            ScaleSubcommand::Show(args) => run_scale_show(&args, &session()?),
            ScaleSubcommand::Classify(args) => run_scale_classify(args, &session()?),
            ScaleSubcommand::Edit(args) => run_scale_edit(args, &session()?),
            ScaleSubcommand::Reset => {
                session()?.reset_scale()?;
                println!("Reset to default grading scale");
                Ok(0)
            }
        },
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("GRADECALC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn open_session(config_path: Option<&Path>, cwd: &Path) -> Result<Session> {
    let loaded = config::load_config(config_path, cwd)?;
    tracing::debug!(source = ?loaded.source, "loaded configuration");

    let session = Session::new(loaded.config, cwd);
    tracing::debug!(store = %session.store.path().display(), "using preference store");
    Ok(session)
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
    decimals: bool,
}

impl Output {
    fn new(args: &OutputArgs, cfg: &Config) -> Self {
        Self {
            json: args.json || cfg.general.json,
            decimals: args.decimals || cfg.general.decimals,
        }
    }

    fn emit<T: Serialize>(&self, outcome: &JsonOutcome<T>) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        Ok(())
    }

    fn failure(&self, message: &str) -> Result<i32> {
        if self.json {
            self.emit(&JsonOutcome::<()>::failure(message))?;
        } else {
            report::print_error(message);
        }
        Ok(1)
    }
}

fn warn_if_not_saved(saved: bool) {
    if !saved {
        tracing::warn!("preference store is disabled; nothing was saved");
    }
}

fn run_calc(args: CalcArgs, session: &Session) -> Result<i32> {
    let out = Output::new(&args.output, &session.config);
    let result = match session.calculate(&args.total, &args.wrong) {
        Ok(result) => result,
        Err(err) => return out.failure(&err.to_string()),
    };

    let chart = args
        .chart
        .then(|| session.chart(result.total_questions as i64));

    if out.json {
        out.emit(&JsonOutcome::success(CalculationReport {
            result: &result,
            chart: chart.as_deref(),
        }))?;
        return Ok(0);
    }

    report::print_calculation(&result, out.decimals);
    match chart {
        Some(rows) if rows.is_empty() => println!(
            "\nchart is limited to {} questions",
            session.config.general.chart_limit
        ),
        Some(rows) => report::print_chart(result.total_questions, &rows, out.decimals),
        None => {}
    }
    Ok(0)
}

fn run_last(args: &OutputArgs, session: &Session) -> Result<i32> {
    let out = Output::new(args, &session.config);
    let Some(result) = session.last_result() else {
        return out.failure("no saved calculation");
    };

    if out.json {
        out.emit(&JsonOutcome::success(CalculationReport {
            result: &result,
            chart: None,
        }))?;
    } else {
        report::print_calculation(&result, out.decimals);
    }
    Ok(0)
}

fn run_chart(args: ChartArgs, session: &Session) -> Result<i32> {
    let out = Output::new(&args.output, &session.config);
    let Some(total) = utils::input::parse_count(&args.total).filter(|total| *total > 0) else {
        return out.failure(&CalculationError::InvalidTotal.to_string());
    };

    let rows = session.chart(total);
    if rows.is_empty() {
        return out.failure(&format!(
            "chart is limited to {} questions",
            session.config.general.chart_limit
        ));
    }

    if out.json {
        out.emit(&JsonOutcome::success(&rows))?;
    } else {
        report::print_chart(total.unsigned_abs(), &rows, out.decimals);
    }
    Ok(0)
}

fn run_average(command: AverageSubcommand, session: &Session) -> Result<i32> {
    let mut book = session.test_book();

    let output = match command {
        AverageSubcommand::Show(output) => output,
        AverageSubcommand::Add(args) => {
            let id = book.add().id.clone();
            if let Err(err) = book.update(
                &id,
                TestUpdate {
                    name: args.name,
                    score: args.score,
                    max_score: args.max,
                },
            ) {
                return Output::new(&args.output, &session.config).failure(&err.to_string());
            }
            warn_if_not_saved(session.save_test_book(&book)?);
            args.output
        }
        AverageSubcommand::Update(args) => {
            let update = TestUpdate {
                name: args.name,
                score: args.score,
                max_score: args.max,
            };
            if let Err(err) = book.update(&args.id, update) {
                return Output::new(&args.output, &session.config).failure(&err.to_string());
            }
            warn_if_not_saved(session.save_test_book(&book)?);
            args.output
        }
        AverageSubcommand::Remove(args) => {
            if let Err(err) = book.remove(&args.id) {
                return Output::new(&args.output, &session.config).failure(&err.to_string());
            }
            warn_if_not_saved(session.save_test_book(&book)?);
            args.output
        }
        AverageSubcommand::Clear => {
            session.clear_test_book()?;
            println!("cleared saved tests");
            return Ok(0);
        }
        AverageSubcommand::Export(args) => {
            let now = chrono::Utc::now();
            let path = args
                .path
                .unwrap_or_else(|| average::export_file_name(now).into());
            let export = book.export(&session.active_scale(), now);
            let content = serde_json::to_string_pretty(&export)?;
            fs::write(&path, content)
                .with_context(|| format!("failed writing {}", path.display()))?;
            println!("exported {} tests to {}", book.tests().len(), path.display());
            return Ok(0);
        }
        AverageSubcommand::Backup => {
            if session.backup_test_book(&book)? {
                println!("Data saved successfully!");
            } else {
                warn_if_not_saved(false);
            }
            return Ok(0);
        }
    };

    let out = Output::new(&output, &session.config);
    let summary = book.summary(&session.active_scale());
    if out.json {
        out.emit(
            &JsonOutcome::success(AverageReport {
                tests: &book,
                summary: &summary,
            })
            .with_issues(book.errors()),
        )?;
    } else {
        report::print_average(&book, &summary, out.decimals);
    }
    Ok(0)
}

fn run_scale_show(args: &OutputArgs, session: &Session) -> Result<i32> {
    let out = Output::new(args, &session.config);
    let scale = session.active_scale();
    let issues = validate_scale(&scale);

    if out.json {
        out.emit(
            &JsonOutcome::success(&scale).with_issues(report::scale_issues_for_json(&issues)),
        )?;
    } else {
        report::print_scale(&scale, &issues);
    }
    Ok(0)
}

fn run_scale_classify(args: ClassifyArgs, session: &Session) -> Result<i32> {
    let out = Output::new(&args.output, &session.config);
    let scale = session.active_scale();
    let grade = classify(args.percentage, &scale);
    let classification = ClassificationReport::new(args.percentage, grade);

    if out.json {
        out.emit(&JsonOutcome::success(&classification))?;
    } else {
        report::print_classification(&classification, out.decimals);
    }
    Ok(0)
}

fn run_scale_edit(args: EditArgs, session: &Session) -> Result<i32> {
    let out = Output::new(&args.output, &session.config);
    let mut editor = ScaleEditor::new(session.active_scale());

    for op in &args.edits {
        if let Err(err) = editor.apply(op) {
            return out.failure(&err.to_string());
        }
    }

    let scale = match editor.clone().into_savable() {
        Ok(scale) => scale,
        Err(issues) => {
            const MESSAGE: &str = "Please fix the errors before saving";
            if out.json {
                out.emit(
                    &JsonOutcome::<()>::failure(MESSAGE)
                        .with_issues(report::scale_issues_for_json(&issues)),
                )?;
            } else {
                report::print_scale(editor.scale(), &issues);
                println!();
                report::print_error(MESSAGE);
            }
            return Ok(1);
        }
    };

    if !args.dry_run {
        warn_if_not_saved(session.save_scale(&scale)?);
    }

    let preview = args
        .preview
        .map(|percentage| ClassificationReport::new(percentage, editor.preview(percentage)));

    if out.json {
        out.emit(&JsonOutcome::success(EditReport {
            scale: &scale,
            preview,
        }))?;
    } else {
        report::print_scale(&scale, &Default::default());
        if let Some(preview) = &preview {
            println!();
            report::print_classification(preview, out.decimals);
        }
        println!();
        if args.dry_run {
            println!("dry run: grading scale not saved");
        } else {
            println!("Custom grading scale saved!");
        }
    }
    Ok(0)
}
