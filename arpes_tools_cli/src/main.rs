//! # arpes_tools_cli
//!
//! Part of the arpes_tools crate family.
//!
//! Command line access to the ARPES conversion and Themis loading tools.
//!
//! ## Use
//!
//! ```bash
//! arpes_tools_cli new -p config.yml          # write a template load configuration
//! arpes_tools_cli info -p scan.h5            # list the datasets in a Themis file
//! arpes_tools_cli load -p config.yml         # load (and bin) the configured dataset
//! arpes_tools_cli fermi-tof --photon-energy 10.8 --workfunction 4.5
//! arpes_tools_cli tof-to-ek --tof 591.5
//! arpes_tools_cli ek-to-tof --energy 6.3
//! ```
//!
//! Messages from the library are also written to `arpes_tools.log` in the working directory.
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libarpes_tools::config::Config;
use libarpes_tools::convert::{
    kinetic_energy_to_time_of_flight, photon_energy_to_fermi_tof, time_of_flight_to_kinetic_energy,
};
use libarpes_tools::hdf_writer::HDFWriter;
use libarpes_tools::loader::{load_themis, LoadedData};
use libarpes_tools::metadata::list_datasets;
use libarpes_tools::themis_file::ThemisFile;

fn path_arg(help: &'static str) -> Arg {
    Arg::new("path")
        .short('p')
        .long("path")
        .required(true)
        .help(help)
}

fn energy_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(f64))
        .help(help)
}

fn get_path(matches: &ArgMatches) -> PathBuf {
    PathBuf::from(matches.get_one::<String>("path").expect("We require args"))
}

fn get_value(matches: &ArgMatches, name: &str) -> f64 {
    *matches.get_one::<f64>(name).expect("We require args")
}

/// Route the library's spdlog output to a log file
fn init_library_log() {
    let file_sink = spdlog::sink::FileSink::builder()
        .path(PathBuf::from("./arpes_tools.log"))
        .formatter(spdlog::formatter::PatternFormatter::new(spdlog::formatter::pattern!(
            "[{date_short} {time_short}] - [{^{level}}] - {payload}{eol}"
        )))
        .truncate(true)
        .build();
    let logger = file_sink.and_then(|sink| {
        spdlog::Logger::builder()
            .flush_level_filter(spdlog::LevelFilter::All)
            .sink(Arc::new(sink))
            .build()
    });
    match logger {
        Ok(logger) => spdlog::set_default_logger(Arc::new(logger)),
        Err(e) => log::warn!("Could not create library log file: {e}"),
    }
}

fn span(values: &[f64]) -> String {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => String::from("nothing"),
    }
}

fn make_template_config(path: &Path) {
    log::info!("Making a template config at {}...", path.to_string_lossy());
    match Config::default().write_config_file(path) {
        Ok(()) => log::info!("Done."),
        Err(e) => log::error!("{e}"),
    }
}

fn print_info(path: &Path) {
    let file = match ThemisFile::open(path) {
        Ok(f) => f,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    match list_datasets(&file) {
        Ok(infos) => {
            log::info!("{} contains {} datasets", path.to_string_lossy(), infos.len());
            for info in infos {
                log::info!("{info}");
            }
        }
        Err(e) => log::error!("Failed to read metadata: {e}"),
    }
}

fn run_load(config_path: &Path) {
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Data file: {}", config.file_path.to_string_lossy());
    log::info!("Dataset: {}", config.dataset);
    log::info!("Bins: {:?}", config.binning.bins);
    match config.binning.subsample_size {
        Some(size) => log::info!("Subsample size: {size}"),
        None => log::info!("Subsample size: all events"),
    }
    if !config.is_bins_valid() {
        log::error!("Every axis needs at least one bin!");
        return;
    }
    if !config.is_subsample_size_valid() {
        log::error!("Subsample size must be at least one event, or null to bin everything!");
        return;
    }

    let data = match load_themis(&config.file_path, &config.dataset, &config.binning) {
        Ok(d) => d,
        Err(e) => {
            log::error!("Loading failed with error: {e}");
            return;
        }
    };
    match &data {
        LoadedData::Events(hist) => {
            log::info!(
                "Histogrammed {} events into {:?} bins",
                hist.total_counts(),
                hist.counts.dim()
            );
            log::info!("Corrected time spans {}", span(&hist.edges[2].to_vec()));
        }
        LoadedData::Converted(cube) => {
            log::info!("Converted data of shape {:?}", cube.data.dim());
            log::info!("Angles span {} deg", span(&cube.x_axis.to_vec()));
            log::info!("Energies span {} eV", span(&cube.energy_axis.to_vec()));
        }
    }

    if let Some(output_path) = &config.output_path {
        log::info!("Writing result to {}...", output_path.to_string_lossy());
        let result = HDFWriter::new(output_path)
            .and_then(|writer| writer.write(&config.dataset, &data).map(|_| writer))
            .and_then(|writer| writer.close());
        match result {
            Ok(()) => log::info!("Done."),
            Err(e) => log::error!("Writing failed with error: {e}"),
        }
    }
}

fn main() {
    // Create a cli
    let matches = Command::new("arpes_tools_cli")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("new")
                .about("Make a template configuration yaml file")
                .arg(path_arg("Path to the config file")),
        )
        .subcommand(
            Command::new("info")
                .about("List the datasets in a Themis HDF5 file")
                .arg(path_arg("Path to the data file")),
        )
        .subcommand(
            Command::new("load")
                .about("Load the dataset described by a configuration file")
                .arg(path_arg("Path to the config file")),
        )
        .subcommand(
            Command::new("fermi-tof")
                .about("Time-of-flight (ns) of Fermi level electrons")
                .arg(energy_arg("photon-energy", "Photon energy in eV"))
                .arg(energy_arg("workfunction", "Sample workfunction in eV")),
        )
        .subcommand(
            Command::new("tof-to-ek")
                .about("Kinetic energy (eV) for a time-of-flight")
                .arg(energy_arg("tof", "Time-of-flight in ns")),
        )
        .subcommand(
            Command::new("ek-to-tof")
                .about("Time-of-flight (ns) for a kinetic energy")
                .arg(energy_arg("energy", "Kinetic energy in eV")),
        )
        .get_matches();

    // Initialize feedback
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .expect("Could not create logging!");
    init_library_log();

    match matches.subcommand() {
        Some(("new", sub)) => make_template_config(&get_path(sub)),
        Some(("info", sub)) => print_info(&get_path(sub)),
        Some(("load", sub)) => run_load(&get_path(sub)),
        Some(("fermi-tof", sub)) => {
            let photon_energy = get_value(sub, "photon-energy");
            let workfunction = get_value(sub, "workfunction");
            let tof = photon_energy_to_fermi_tof(photon_energy, workfunction);
            log::info!("Fermi level time-of-flight: {tof} ns");
        }
        Some(("tof-to-ek", sub)) => {
            let energy = time_of_flight_to_kinetic_energy(get_value(sub, "tof"));
            log::info!("Kinetic energy: {energy} eV");
        }
        Some(("ek-to-tof", sub)) => {
            let tof = kinetic_energy_to_time_of_flight(get_value(sub, "energy"));
            log::info!("Time-of-flight: {tof} ns");
        }
        _ => (),
    }
}
