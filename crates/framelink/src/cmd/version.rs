use framelink_frame::HEADER_SIZE;
use framelink_transport::MAX_DATAGRAM_SIZE;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("framelink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: framelink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("FRAMELINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("FRAMELINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("stream_header: {HEADER_SIZE} bytes, big-endian u32 length");
    println!("datagram_max: {MAX_DATAGRAM_SIZE} bytes");
    println!("text_encoding: utf-16le with bom");

    Ok(SUCCESS)
}
