use std::process::ExitCode;
use urf_raster::convert::OutputFormat;

fn main() -> ExitCode {
    urf_raster_cli::run("urftobmp", OutputFormat::Bmp)
}
