//! Random text file generator producing inputs for `line-sort`.

use std::fs;
use std::process;

use bytesize::{ByteSize, MIB};
use clap::ArgEnum;
use rand::seq::SliceRandom;
use rand::Rng;

use line_sort::LineSink;

const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()_+{}[]|:;<>,.?/~`\
                        АБВГДЕЁЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯабвгдеёжзийклмнопрстуфхцчшщъыьэюя";

const MIN_LINE_LEN: usize = 5;
const MAX_LINE_LEN: usize = 100;

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let output = arg_parser.value_of("output").expect("value has default");
    let file_size = arg_parser.value_of_t_or_exit::<u64>("file_size").saturating_mul(MIB);
    let batch_size = arg_parser.value_of_t_or_exit::<u64>("chunk_size").saturating_mul(MIB);

    log::info!("generating {} file {} ...", ByteSize(file_size), output);

    if let Err(err) = generate(output, file_size, batch_size) {
        log::error!("file generation error: {}", err);
        process::exit(1);
    }

    log::info!("file generation done");
}

fn generate(output: &str, file_size: u64, batch_size: u64) -> std::io::Result<()> {
    let alphabet: Vec<char> = ALPHABET.chars().collect();
    let mut rng = rand::thread_rng();

    // batches are flushed explicitly
    let mut sink = LineSink::with_threshold(fs::File::create(output)?, usize::MAX);
    let mut written: u64 = 0;

    while written < file_size {
        let batch_end = written.saturating_add(batch_size).min(file_size);

        while written < batch_end {
            let len = rng.gen_range(MIN_LINE_LEN..MAX_LINE_LEN);
            let line: String = (0..len).filter_map(|_| alphabet.choose(&mut rng)).collect();
            sink.push_line(&line)?;
            written += line.len() as u64 + 1;
        }

        sink.flush()?;
        log::info!("progress: {:.2}%", written.min(file_size) as f64 / file_size as f64 * 100.0);
    }

    sink.into_inner()?;

    return Ok(());
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

fn positive_number(v: &str) -> Result<(), String> {
    match v.parse::<u64>() {
        Ok(size) if size > 0 => Ok(()),
        Ok(_) => Err("size must be positive".to_string()),
        Err(err) => Err(format!("size format incorrect: {}", err)),
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("line-gen")
        .about("random text file generator")
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("generated file")
                .takes_value(true)
                .default_value("input.txt"),
        )
        .arg(
            clap::Arg::new("file_size")
                .short('s')
                .long("fileSize")
                .help("file size in megabytes")
                .takes_value(true)
                .default_value("100")
                .validator(positive_number),
        )
        .arg(
            clap::Arg::new("chunk_size")
                .short('c')
                .long("chunkSize")
                .help("generation buffer size in megabytes")
                .takes_value(true)
                .default_value("10")
                .validator(positive_number),
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
