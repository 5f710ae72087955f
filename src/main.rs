use std::path;
use std::process;

use bytesize::{ByteSize, MIB};
use clap::ArgEnum;
use env_logger;
use log;

use line_sort::LineSorterBuilder;

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let input = arg_parser.value_of("input").expect("value has default");
    let output = arg_parser.value_of("output").expect("value has default");
    let chunk_size: u64 = arg_parser.value_of_t_or_exit("chunk_size");
    let tmp_dir: Option<&str> = arg_parser.value_of("tmp_dir");
    let dedup = arg_parser.is_present("unique");

    let chunk_size = chunk_size.saturating_mul(MIB);
    log::info!("chunk size: {}, deduplication: {}", ByteSize(chunk_size), dedup);

    let mut sorter_builder = LineSorterBuilder::new()
        .with_chunk_size(chunk_size)
        .with_dedup(dedup);

    if let Some(tmp_dir) = tmp_dir {
        sorter_builder = sorter_builder.with_tmp_dir(path::Path::new(tmp_dir));
    }

    let sorter = sorter_builder.build();

    match sorter.sort_file(path::Path::new(input), path::Path::new(output)) {
        Ok(stats) => log::info!(
            "lines read: {}, chunks: {}, lines written: {}",
            stats.lines_read,
            stats.chunks,
            stats.lines_written
        ),
        Err(err) => {
            log::error!("data sorting error: {}", err);
            process::exit(1);
        }
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as clap::ArgEnum>::from_str(s, false)
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("line-sort")
        .about("sorts text files that do not fit in memory, line by line")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("file to be sorted")
                .takes_value(true)
                .default_value("input.txt"),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("result file")
                .takes_value(true)
                .default_value("output.txt"),
        )
        .arg(
            clap::Arg::new("chunk_size")
                .short('c')
                .long("chunkSize")
                .help("chunk size in megabytes")
                .takes_value(true)
                .default_value("10")
                .validator(|v| match v.parse::<u64>() {
                    Ok(size) if size > 0 => Ok(()),
                    Ok(_) => Err("Chunk size must be positive".to_string()),
                    Err(err) => Err(format!("Chunk size format incorrect: {}", err)),
                }),
        )
        .arg(
            clap::Arg::new("unique")
                .short('u')
                .long("unique")
                .help("output only the first of consecutive equal lines"),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LogLevel::possible_values()),
        )
        .arg(
            clap::Arg::new("tmp_dir")
                .short('d')
                .long("tmp-dir")
                .help("directory to be used to store temporary data")
                .takes_value(true),
        )
        .get_matches()
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(match log_level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        })
        .format_timestamp_millis()
        .init();
}
