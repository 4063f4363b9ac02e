// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    clap::{Arg, ArgMatches, Command},
    log::{info, warn, LevelFilter},
    rsrc_coff::{
        assemble_resources, package_raw_data, raw_data_accessor_template, raw_data_symbol, Coff,
        OpenedInputs, ResourceInputs, SizedFile,
    },
    std::{
        io::{BufWriter, Write},
        path::{Path, PathBuf},
    },
    thiserror::Error,
};

const ABOUT: &str = "\
Embed Windows resources in a COFF object file.

With --manifest, --ico and/or --version, a .syso object holding a resource
section is written. Go and other toolchains link such objects into Windows
executables automatically.

Resources receive ids in this order: the manifest, then the images and the
icon group of each icon file in the order given. Version information always
has id 1.

With only --data, the file is embedded in a data section between the symbols
_brsrc_NAME and _ersrc_NAME, where NAME is the output file name without its
.syso suffix. NAME may only contain lowercase letters, digits and underscores.
C code for accessing the data is printed to stdout.
";

const ARCHITECTURES: [&str; 4] = ["386", "amd64", "arm", "arm64"];

#[derive(Debug, Error)]
pub enum RsrcError {
    #[error("argument parsing error: {0:?}")]
    Clap(#[from] clap::Error),

    #[error("{0}")]
    Coff(#[from] rsrc_coff::Error),

    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(&'static str),
}

pub type Result<T> = std::result::Result<T, RsrcError>;

fn command() -> Command<'static> {
    Command::new("rsrc")
        .author("Gregory Szorc <gregory.szorc@gmail.com>")
        .about("Embed Windows resources in a COFF object file")
        .long_about(ABOUT)
        .arg(
            Arg::new("manifest")
                .long("manifest")
                .takes_value(true)
                .allow_invalid_utf8(true)
                .value_name("FILE")
                .help("Path to a Windows application manifest"),
        )
        .arg(
            Arg::new("ico")
                .long("ico")
                .takes_value(true)
                .multiple_occurrences(true)
                .value_name("FILE[,FILE...]")
                .help("Comma separated paths of .ico files"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .takes_value(true)
                .allow_invalid_utf8(true)
                .value_name("FILE.json")
                .help("Path to a JSON file describing version information"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .takes_value(true)
                .allow_invalid_utf8(true)
                .value_name("FILE")
                .help("Path to a file to embed as raw data"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .allow_invalid_utf8(true)
                .value_name("OUTFILE")
                .default_value("rsrc.syso")
                .help("Path of the object file to write"),
        )
        .arg(
            Arg::new("arch")
                .long("arch")
                .takes_value(true)
                .possible_values(ARCHITECTURES)
                .default_value("386")
                .help("Architecture of the object file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Increase logging verbosity. Can be specified multiple times."),
        )
}

fn init_logging(verbosity: u64) {
    let log_level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Disable log context except at higher log levels.
    if log_level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    builder.init();
}

fn resource_inputs(args: &ArgMatches) -> ResourceInputs {
    let mut inputs = ResourceInputs {
        manifest: args.value_of_os("manifest").map(PathBuf::from),
        icons: vec![],
        version: args.value_of_os("version").map(PathBuf::from),
    };

    if let Some(values) = args.values_of("ico") {
        for value in values {
            inputs.add_icon_list(value);
        }
    }

    inputs
}

pub fn run_cli() -> Result<()> {
    let matches = command().get_matches();

    init_logging(matches.occurrences_of("verbose"));

    run_matches(&matches)
}

/// Dispatch parsed arguments to resource or raw data mode.
fn run_matches(matches: &ArgMatches) -> Result<()> {
    let output = matches
        .value_of_os("output")
        .map(PathBuf::from)
        .unwrap_or_default();
    let arch = matches.value_of("arch").unwrap_or("386");
    let inputs = resource_inputs(matches);

    if output.as_os_str().is_empty() {
        command().write_help(&mut std::io::stderr())?;
        return Err(RsrcError::Usage("no output file given"));
    }

    if !inputs.is_empty() {
        if matches.is_present("data") {
            warn!("--data is ignored when resources are given");
        }

        command_resources(&inputs, &output, arch)
    } else if let Some(data) = matches.value_of_os("data") {
        command_data(Path::new(data), &output, arch)
    } else {
        command().write_help(&mut std::io::stderr())?;
        Err(RsrcError::Usage("no input given"))
    }
}

fn command_resources(inputs: &ResourceInputs, output: &Path, arch: &str) -> Result<()> {
    // Every input is open and parsed before the output is created.
    let opened = OpenedInputs::open(inputs)?;
    let (coff, report) = assemble_resources(&opened, arch)?;

    for registration in report.registrations() {
        info!("{}", registration);
    }

    write_output(&coff, output)?;

    Ok(())
}

fn command_data(data: &Path, output: &Path, arch: &str) -> Result<()> {
    let symbol = raw_data_symbol(output)?;
    let file = SizedFile::open(data)?;
    let coff = package_raw_data(&file, &symbol, arch)?;

    write_output(&coff, output)?;

    println!("{}", raw_data_accessor_template(&symbol));

    Ok(())
}

fn write_coff(coff: &Coff<'_>, dest: &mut impl Write) -> Result<u64> {
    let written = coff.write_to(dest)?;
    dest.flush()?;

    Ok(written)
}

fn write_output(coff: &Coff<'_>, output: &Path) -> Result<()> {
    let fh = std::fs::File::create(output)
        .map_err(|e| rsrc_coff::Error::IoPath(output.to_path_buf(), e))?;
    let mut writer = BufWriter::new(fh);

    match write_coff(coff, &mut writer) {
        Ok(written) => {
            info!("wrote {} bytes to {}", written, output.display());
            Ok(())
        }
        Err(e) => {
            warn!("{} may be truncated", output.display());
            Err(e)
        }
    }
}
