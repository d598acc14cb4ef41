//! CLI geobin
//!
//! Утилита командной строки для работы с потоками записей: статистика,
//! вывод записей в читаемом виде или JSON, перевод старых файлов в текущий
//! формат.

use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geobin::{
    copy_records, logging::init_logging, open_reader, CompressedWriter, Compression, GeoRecord,
    KindFilter, RecordKind, RecordReader, RecordWriter, Settings, StackError, WireFormat,
};
use serde::Serialize;
use tracing::{debug, info};

/// Основная структура CLI аргументов
#[derive(Parser)]
#[command(name = "geobin-cli")]
#[command(author = "Geobin Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Geobin CLI - inspect and convert binary geo record streams", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Путь к файлу настроек
    #[arg(
        short,
        long,
        env = "GEOBIN_CONFIG",
        help = "Файл настроек (по умолчанию geobin.* в текущем каталоге)"
    )]
    config: Option<PathBuf>,
    /// Формат входного потока
    #[arg(long, value_enum, help = "Формат входного потока (current, legacy или unflagged)")]
    format: Option<WireFormat>,
    /// Сжатие входного потока
    #[arg(
        long,
        value_enum,
        help = "Сжатие входа (по умолчанию определяется по расширению)"
    )]
    compression: Option<Compression>,
    /// Подробный вывод: -v для debug, -vv для trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Подавить логирование (только error)
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,
    /// Формат вывода результатов
    #[arg(long, value_enum, default_value = "pretty")]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

/// Формат вывода CLI
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Человекочитаемый формат
    Pretty,
    /// JSON, одна запись на строку
    Json,
}

/// Флаги пропуска видов записей
#[derive(clap::Args, Debug, Clone, Copy)]
struct SkipArgs {
    #[arg(long, help = "Пропускать точки")]
    skip_points: bool,
    #[arg(long, help = "Пропускать линии")]
    skip_lines: bool,
    #[arg(long, help = "Пропускать отношения")]
    skip_relations: bool,
}

/// Подкоманды CLI
#[derive(Subcommand)]
enum Commands {
    /// Посчитать записи по видам
    Stats {
        /// Входной файл, `-` для stdin
        input: PathBuf,
        #[command(flatten)]
        skip: SkipArgs,
    },
    /// Вывести записи
    #[command(alias = "dump")]
    Cat {
        /// Входной файл, `-` для stdin
        input: PathBuf,
        #[command(flatten)]
        skip: SkipArgs,
        /// Остановиться после N записей
        #[arg(short = 'n', long)]
        limit: Option<u64>,
    },
    /// Перекодировать поток в текущий формат
    Migrate {
        /// Входной файл, `-` для stdin
        input: PathBuf,
        /// Выходной файл, `-` для stdout
        output: PathBuf,
        #[command(flatten)]
        skip: SkipArgs,
        /// Сжатие выхода (по умолчанию определяется по расширению)
        #[arg(long, value_enum)]
        output_compression: Option<Compression>,
    },
}

/// Итоги подкоманды stats
#[derive(Debug, Default, Serialize)]
struct StreamSummary {
    points: u64,
    lines: u64,
    relations: u64,
    skipped: u64,
    bytes_read: u64,
}

////////////////////////////////////////////////////////////////////////////////
// Точка входа
////////////////////////////////////////////////////////////////////////////////

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        let stack = e.downcast_ref::<StackError>();
        if cli.output == OutputFormat::Json {
            if let Some(stack) = stack {
                if let Ok(json) = serde_json::to_string(&stack.to_response()) {
                    eprintln!("{json}");
                }
            } else {
                eprintln!("{}", serde_json::json!({ "message": format!("{e:#}") }));
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        let code = stack.map(|s| s.status_code().exit_code()).unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref()).map_err(StackError::from)?;

    if cli.quiet {
        settings.logging.level = "error".to_string();
    } else if cli.verbose > 0 {
        settings.logging.level = if cli.verbose == 1 { "debug" } else { "trace" }.to_string();
    }
    init_logging(&settings.logging).map_err(StackError::from)?;
    debug!(?settings, "Settings loaded");

    match &cli.command {
        Commands::Stats { input, skip } => stats(cli, &settings, input, filter_of(skip)),
        Commands::Cat { input, skip, limit } => {
            cat(cli, &settings, input, filter_of(skip), *limit)
        }
        Commands::Migrate {
            input,
            output,
            skip,
            output_compression,
        } => migrate(
            cli,
            &settings,
            input,
            output,
            filter_of(skip),
            *output_compression,
        ),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Подкоманды
////////////////////////////////////////////////////////////////////////////////

fn stats(
    cli: &Cli,
    settings: &Settings,
    input: &Path,
    filter: KindFilter,
) -> Result<()> {
    let format = cli.format.unwrap_or(settings.format);
    let mut reader = open_records(cli, settings, input, format)?;

    let mut summary = StreamSummary::default();
    while reader.advance_filtered(filter)? {
        match reader.current().map(GeoRecord::kind) {
            Some(RecordKind::Point) => summary.points += 1,
            Some(RecordKind::Line) => summary.lines += 1,
            Some(RecordKind::Relation) => summary.relations += 1,
            None => {}
        }
    }
    summary.skipped = reader.stats().skipped();
    summary.bytes_read = reader.stats().bytes_read;

    match cli.output {
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
        OutputFormat::Pretty => {
            println!("points:    {}", summary.points);
            println!("lines:     {}", summary.lines);
            println!("relations: {}", summary.relations);
            println!("skipped:   {}", summary.skipped);
            println!("bytes:     {}", summary.bytes_read);
        }
    }
    Ok(())
}

fn cat(
    cli: &Cli,
    settings: &Settings,
    input: &Path,
    filter: KindFilter,
    limit: Option<u64>,
) -> Result<()> {
    let format = cli.format.unwrap_or(settings.format);
    let mut reader = open_records(cli, settings, input, format)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut printed = 0u64;

    while limit.map_or(true, |n| printed < n) && reader.advance_filtered(filter)? {
        let Some(record) = reader.current() else {
            continue;
        };
        match cli.output {
            OutputFormat::Json => {
                serde_json::to_writer(&mut out, record)?;
                writeln!(out)?;
            }
            OutputFormat::Pretty => print_record(&mut out, record)?,
        }
        printed += 1;
    }

    out.flush()?;
    debug!(printed, "Records printed");
    Ok(())
}

fn migrate(
    cli: &Cli,
    settings: &Settings,
    input: &Path,
    output: &Path,
    filter: KindFilter,
    output_compression: Option<Compression>,
) -> Result<()> {
    // Старые файлы читаются по умолчанию в legacy-формате
    let format = cli.format.unwrap_or(WireFormat::Legacy);
    let mut reader = open_records(cli, settings, input, format)?;

    let compression = output_compression.unwrap_or_else(|| guess_compression(output, settings));
    let sink: Box<dyn Write> = if is_stdio(output) {
        Box::new(io::stdout().lock())
    } else {
        Box::new(
            File::create(output)
                .with_context(|| format!("Не удалось создать {}", output.display()))?,
        )
    };
    let sink = CompressedWriter::new(BufWriter::new(sink), compression, settings.zstd_level)?;

    let mut writer = RecordWriter::new(sink);
    let copied = copy_records(&mut reader, &mut writer, filter)?;
    let written = *writer.stats();
    writer.into_inner()?.finish()?;

    info!(
        copied,
        bytes_in = reader.stats().bytes_read,
        bytes_out = written.bytes_written,
        %compression,
        "Migration finished"
    );
    if let Some(line) = migrate_summary(cli.output, output, copied, written.bytes_written) {
        println!("{line}");
    }
    Ok(())
}

/// Итоговая строка migrate. Если записи идут в stdout, итог не печатается:
/// он испортил бы бинарный поток.
fn migrate_summary(
    format: OutputFormat,
    output: &Path,
    copied: u64,
    bytes: u64,
) -> Option<String> {
    if is_stdio(output) {
        return None;
    }
    Some(match format {
        OutputFormat::Json => serde_json::json!({ "records": copied, "bytes": bytes }).to_string(),
        OutputFormat::Pretty => format!("{copied} records written to {}", output.display()),
    })
}

////////////////////////////////////////////////////////////////////////////////
// Вспомогательные функции
////////////////////////////////////////////////////////////////////////////////

fn filter_of(skip: &SkipArgs) -> KindFilter {
    KindFilter {
        skip_points: skip.skip_points,
        skip_lines: skip.skip_lines,
        skip_relations: skip.skip_relations,
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn guess_compression(
    path: &Path,
    settings: &Settings,
) -> Compression {
    match Compression::from_extension(path) {
        Compression::None => settings.compression,
        found => found,
    }
}

/// Открывает вход с распаковкой. Файлы на диске после распаковки уже не
/// перематываются, поэтому читатель всегда создаётся без `reset`.
fn open_records(
    cli: &Cli,
    settings: &Settings,
    input: &Path,
    format: WireFormat,
) -> Result<RecordReader<Box<dyn Read>>> {
    let compression = cli
        .compression
        .unwrap_or_else(|| guess_compression(input, settings));

    let source: Box<dyn Read> = if is_stdio(input) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(
            File::open(input).with_context(|| format!("Не удалось открыть {}", input.display()))?,
        )
    };
    debug!(input = %input.display(), %format, %compression, "Opening input");

    let source = open_reader(source, compression)?;
    Ok(RecordReader::with_capacity(settings.read_buffer_size, source).with_format(format))
}

fn print_record(
    out: &mut impl Write,
    record: &GeoRecord,
) -> io::Result<()> {
    writeln!(out, "{record}")?;

    let meta = record.meta();
    if let Some(ts) = meta.timestamp {
        writeln!(out, "  timestamp: {ts}")?;
    }
    if let Some(cs) = meta.changeset_id {
        writeln!(out, "  changeset: {cs}")?;
    }
    match (&meta.user_name, meta.user_id) {
        (Some(name), Some(uid)) => writeln!(out, "  user: {name} ({uid})")?,
        (Some(name), None) => writeln!(out, "  user: {name}")?,
        (None, Some(uid)) => writeln!(out, "  user: ({uid})")?,
        (None, None) => {}
    }
    if let Some(v) = meta.version {
        writeln!(out, "  version: {v}")?;
    }
    if let Some(visible) = meta.visible {
        writeln!(out, "  visible: {visible}")?;
    }
    for tag in meta.tags.iter() {
        writeln!(out, "  {}={}", tag.key, tag.value)?;
    }

    match record {
        GeoRecord::Line(line) if !line.node_refs.is_empty() => {
            let refs: Vec<String> = line.node_refs.iter().map(i64::to_string).collect();
            writeln!(out, "  nodes: {}", refs.join(" "))?;
        }
        GeoRecord::Relation(rel) => {
            for m in &rel.members {
                writeln!(out, "  member: {} {} {}", m.kind, m.ref_id, m.role)?;
            }
        }
        _ => {}
    }
    Ok(())
}
