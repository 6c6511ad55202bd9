//! Shared front end of the `urftobmp` and `urftotiff` converters.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use futures::io::AllowStdIo;
use log::{error, info};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::ExitCode;
use urf_raster::convert::{convert, ConvertOptions, ConvertSummary, OutputFormat};
use urf_raster::decode::Limits;
use urf_raster::error::UrfError;

pub fn command(name: &'static str, format: OutputFormat) -> Command {
    Command::new(name)
        .version(env!("CARGO_PKG_VERSION"))
        .about(format!(
            "Convert every page of a URF (UNIRAST) file to page%04d.{}",
            format.extension()
        ))
        .arg(
            Arg::new("input")
                .help("Input URF file")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .help("Directory receiving the page files")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value("."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log every decoded line")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-width")
                .long("max-width")
                .help("Reject pages wider than this many pixels")
                .value_name("PIXELS")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("max-height")
                .long("max-height")
                .help("Reject pages taller than this many pixels")
                .value_name("PIXELS")
                .value_parser(value_parser!(u32)),
        )
}

pub fn options_from_matches(format: OutputFormat, matches: &ArgMatches) -> ConvertOptions {
    let mut options = ConvertOptions::new(format);
    if let Some(output_dir) = matches.get_one::<PathBuf>("output-dir") {
        options.output_dir = output_dir.clone();
    }
    let max_width = matches.get_one::<u32>("max-width").copied();
    let max_height = matches.get_one::<u32>("max-height").copied();
    if max_width.is_some() || max_height.is_some() {
        options.limits = Limits::for_page_size(
            max_width.unwrap_or(u32::MAX),
            max_height.unwrap_or(u32::MAX),
        );
    }
    options
}

/// Convert `input` with a blocking file reader.
pub fn convert_file(input: &Path, options: &ConvertOptions) -> Result<ConvertSummary, UrfError> {
    let mut reader = AllowStdIo::new(BufReader::new(File::open(input)?));
    futures::executor::block_on(convert(Pin::new(&mut reader), options))
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Entry point of both binaries. Exits with 1 on any failure.
pub fn run(name: &'static str, format: OutputFormat) -> ExitCode {
    let matches = command(name, format).get_matches();
    init_logger(matches.get_flag("verbose"));

    let options = options_from_matches(format, &matches);
    let input = match matches.get_one::<PathBuf>("input") {
        Some(input) => input,
        None => return ExitCode::from(1),
    };

    match convert_file(input, &options) {
        Ok(summary) => {
            info!(
                "{}: {} page(s) written{}",
                input.display(),
                summary.pages_written,
                if summary.truncated {
                    ", last page truncated"
                } else {
                    ""
                }
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}: {}", input.display(), e);
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urf_raster::decode::UrfRasterDecoder;
    use urf_raster::error::DecodeError;
    use urf_raster::model::pixel::PixelFormat;

    #[test]
    fn test_defaults() {
        let matches = command("urftobmp", OutputFormat::Bmp)
            .try_get_matches_from(["urftobmp", "in.urf"])
            .unwrap();
        let options = options_from_matches(OutputFormat::Bmp, &matches);
        assert_eq!(options.format, OutputFormat::Bmp);
        assert_eq!(options.output_dir, PathBuf::from("."));
        assert_eq!(options.limits.bytes_per_line, u64::MAX);
        assert_eq!(options.limits.max_width, u32::MAX);
        assert!(!matches.get_flag("verbose"));
    }

    #[test]
    fn test_limits_and_output_dir() {
        let matches = command("urftotiff", OutputFormat::Tiff)
            .try_get_matches_from([
                "urftotiff",
                "-v",
                "-o",
                "out",
                "--max-width",
                "100",
                "--max-height",
                "10",
                "in.urf",
            ])
            .unwrap();
        let options = options_from_matches(OutputFormat::Tiff, &matches);
        assert_eq!(options.output_dir, PathBuf::from("out"));
        assert_eq!(options.limits.max_width, 100);
        assert_eq!(options.limits.max_height, 10);
        assert_eq!(options.limits.bytes_per_line, u64::MAX);
        assert!(matches.get_flag("verbose"));
    }

    #[test]
    fn test_max_width_counts_pixels() {
        let matches = command("urftobmp", OutputFormat::Bmp)
            .try_get_matches_from(["urftobmp", "--max-width", "100", "in.urf"])
            .unwrap();
        let options = options_from_matches(OutputFormat::Bmp, &matches);
        assert_eq!(options.limits.max_height, u32::MAX);
        assert!(UrfRasterDecoder::new(100, 10, PixelFormat::GRAY8, &options.limits).is_ok());
        assert!(matches!(
            UrfRasterDecoder::new(400, 10, PixelFormat::GRAY8, &options.limits),
            Err(DecodeError::LimitExceeded)
        ));
    }

    #[test]
    fn test_input_is_required() {
        assert!(command("urftobmp", OutputFormat::Bmp)
            .try_get_matches_from(["urftobmp"])
            .is_err());
    }

    #[test]
    fn test_missing_input_file() {
        let options = ConvertOptions::new(OutputFormat::Bmp);
        let result = convert_file(Path::new("does/not/exist.urf"), &options);
        assert!(matches!(result, Err(UrfError::IoError(_))));
    }
}
