use ghead_frame::FrameReader;
use tracing::debug;

use crate::cmd::ReadArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.limits.frame_config()?;
    debug!(?config, "reading one frame from stdin");

    let mut reader = FrameReader::with_config(std::io::stdin(), config);
    let frame = reader
        .read_frame()
        .map_err(|err| frame_error("read failed", err))?;

    print_frame(&frame, "stdin", format);
    Ok(SUCCESS)
}
