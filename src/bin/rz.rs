/// rz – rANS file compression tool.
///
///   rz file.txt            → compress to file.txt.rans
///   rz -d file.txt.rans    → decompress to file.txt.rans.orig
///   rz file.txt out.rz     → compress to an explicit output path
///   rz -b file.txt         → compress and report codec timing
use std::env;
use std::fs;
use std::process::ExitCode;
use std::time::Instant;

use rz::rans;

fn usage() {
    eprintln!("rz - rANS entropy compression tool");
    eprintln!();
    eprintln!("Usage: rz [OPTIONS] <input> [<output>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -d, --decode       Decode mode");
    eprintln!("  -b, --benchmark    Report codec timing and throughput");
    eprintln!("  -h, --help         Show this help");
    eprintln!();
    eprintln!("Without an explicit output, compression writes <input>.rans");
    eprintln!("and decompression writes <input>.orig.");
}

#[derive(Debug, Default)]
struct Opts {
    decode: bool,
    benchmark: bool,
    input: Option<String>,
    output: Option<String>,
}

fn parse_args() -> Result<Opts, String> {
    let mut opts = Opts::default();

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-d" | "--decode" => opts.decode = true,
            "-b" | "--benchmark" => opts.benchmark = true,
            "-h" | "--help" => {
                usage();
                std::process::exit(0);
            }
            // Combined short flags like -db.
            s if s.starts_with('-') && !s.starts_with("--") && s.len() > 2 => {
                for ch in s[1..].chars() {
                    match ch {
                        'd' => opts.decode = true,
                        'b' => opts.benchmark = true,
                        _ => return Err(format!("unknown flag '-{ch}'")),
                    }
                }
            }
            s if s.starts_with('-') && s.len() > 1 => {
                return Err(format!("unknown option '{s}'"));
            }
            _ => {
                if opts.input.is_none() {
                    opts.input = Some(arg);
                } else if opts.output.is_none() {
                    opts.output = Some(arg);
                } else {
                    return Err(format!("unexpected argument '{arg}'"));
                }
            }
        }
    }

    Ok(opts)
}

/// Write the result, leaving nothing behind if the write fails partway.
fn write_output(path: &str, data: &[u8]) -> Result<(), String> {
    if let Err(e) = fs::write(path, data) {
        let _ = fs::remove_file(path);
        return Err(format!("{path}: {e}"));
    }
    Ok(())
}

fn run() -> Result<(), String> {
    let opts = parse_args()?;
    let Some(input_path) = opts.input else {
        usage();
        return Err("missing input file".to_string());
    };

    let suffix = if opts.decode { "orig" } else { "rans" };
    let output_path = opts
        .output
        .unwrap_or_else(|| format!("{input_path}.{suffix}"));

    let data = fs::read(&input_path).map_err(|e| format!("{input_path}: {e}"))?;

    let started = Instant::now();
    let result = if opts.decode {
        rans::decode(&data).map_err(|e| format!("{input_path}: {e}"))?
    } else {
        rans::encode(&data)
    };
    let elapsed = started.elapsed().as_secs_f64();

    write_output(&output_path, &result)?;

    if opts.benchmark {
        let processed = if opts.decode { result.len() } else { data.len() };
        let mibs = if elapsed > 0.0 {
            processed as f64 / (1024.0 * 1024.0) / elapsed
        } else {
            0.0
        };
        let ratio = if processed > 0 {
            let compressed = if opts.decode { data.len() } else { result.len() };
            compressed as f64 * 100.0 / processed as f64
        } else {
            0.0
        };
        eprintln!(
            "{input_path}: {} -> {} bytes ({ratio:.2}%) in {elapsed:.3}s ({mibs:.2} MiB/s)",
            data.len(),
            result.len(),
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rz: {e}");
            ExitCode::FAILURE
        }
    }
}
