use std::path::Path;

use anyhow::{anyhow, bail, Context};
use clap::{Arg, ArgMatches, Command};
use schemars::schema_for;
use serde::{de::DeserializeOwned, Serialize};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use pso_data::Quest;
use pso_data_bb::{parse_quest_with_warnings, write_quest};
use pso_file_readers::{
    prs, ByteCursor, NinjaGeometry, NjFormat, NjReadOptions, PsoFile, QstFile, QstVersion,
    QstWriteOptions,
};

fn src_dst_args(command: Command<'static>) -> Command<'static> {
    command
        .arg(
            Arg::new("src")
                .help("Source file path")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::new("dst")
                .help("Destination file path")
                .takes_value(true)
                .required(true),
        )
}

fn command() -> Command<'static> {
    Command::new("pso-conv")
        .about("PSO quest and model file converter")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Log level")
                .global(true)
                .takes_value(true)
                .value_parser(["off", "error", "warn", "info", "debug", "trace"])
                .default_value("info"),
        )
        .subcommand(
            src_dst_args(Command::new("convert").about(
                "Convert qst to json/yaml, json/yaml to qst, or nj/xj models to json",
            ))
            .arg(
                Arg::new("xj")
                    .long("xj")
                    .help("Read the source model as XJ regardless of its extension"),
            ),
        )
        .subcommand(src_dst_args(
            Command::new("decompress").about("Decompress a PRS compressed file"),
        ))
        .subcommand(src_dst_args(
            Command::new("compress").about("PRS compress a file"),
        ))
        .subcommand(
            src_dst_args(Command::new("repack").about("Read and rewrite a qst file")).arg(
                Arg::new("qst-version")
                    .long("qst-version")
                    .help("Header flavour of the written file, defaults to the source's")
                    .takes_value(true)
                    .value_parser(["dc", "dc-download", "pc", "bb"]),
            ),
        )
        .subcommand(
            Command::new("schema")
                .about("Generate a JSON schema for supported file formats")
                .arg(
                    Arg::new("file_type")
                        .help("quest or model")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::new("dst")
                        .help("Destination file path")
                        .takes_value(true)
                        .required(true),
                ),
        )
}

fn path_arg<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a Path, anyhow::Error> {
    matches
        .get_one::<String>(name)
        .map(|value| Path::new(value))
        .ok_or_else(|| anyhow!("Missing argument {}", name))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn read_file(path: &Path) -> Result<Vec<u8>, anyhow::Error> {
    std::fs::read(path).with_context(|| format!("Failed to read file {}", path.display()))
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), anyhow::Error> {
    std::fs::write(path, data).with_context(|| format!("Failed to write to {}", path.display()))
}

fn write_serialized<T: Serialize>(value: &T, dst: &Path) -> Result<(), anyhow::Error> {
    match extension(dst).as_deref() {
        Some("yaml") => {
            let mut yaml_bytes = Vec::with_capacity(1024 * 1024);
            serde_yaml::with::singleton_map_recursive::serialize(
                value,
                &mut serde_yaml::Serializer::new(&mut yaml_bytes),
            )
            .context("Failed to serialize yaml")?;
            write_file(dst, &yaml_bytes)
        }
        Some("json") => {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize json")?;
            write_file(dst, json.as_bytes())
        }
        _ => bail!("Unknown file extension for dest {}", dst.display()),
    }
}

fn read_serialized<T: DeserializeOwned>(src: &Path) -> Result<T, anyhow::Error> {
    let data = std::fs::read_to_string(src)
        .with_context(|| format!("Failed to read file {}", src.display()))?;
    match extension(src).as_deref() {
        Some("yaml") => Ok(serde_yaml::with::singleton_map_recursive::deserialize(
            serde_yaml::Deserializer::from_str(&data),
        )?),
        Some("json") => Ok(serde_json::from_str(&data)?),
        _ => bail!("Unknown file extension for source {}", src.display()),
    }
}

fn convert(matches: &ArgMatches) -> Result<(), anyhow::Error> {
    let src = path_arg(matches, "src")?;
    let dst = path_arg(matches, "dst")?;

    match extension(src).as_deref() {
        Some("qst") => {
            let mut warnings = Vec::new();
            let quest = parse_quest_with_warnings(ByteCursor::from(read_file(src)?), &mut warnings)
                .with_context(|| format!("Failed to parse quest {}", src.display()))?;
            if !warnings.is_empty() {
                log::info!("{} parsed with {} warnings", src.display(), warnings.len());
            }
            write_serialized(&quest, dst)
        }
        Some("json") | Some("yaml") if extension(dst).as_deref() == Some("qst") => {
            let quest: Quest = read_serialized(src)?;
            let base_file_name = dst
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| anyhow!("Invalid dest file name {}", dst.display()))?;
            let writer = write_quest(&quest, base_file_name)?;
            write_file(dst, writer.as_slice())
        }
        Some(model_extension @ ("nj" | "xj")) => {
            let format = if model_extension == "xj" || matches.is_present("xj") {
                NjFormat::Xj
            } else {
                NjFormat::Nj
            };
            let geometry = NinjaGeometry::read(
                ByteCursor::from(read_file(src)?),
                &NjReadOptions {
                    format,
                    ..Default::default()
                },
            )
            .with_context(|| format!("Failed to parse model {}", src.display()))?;
            log::info!(
                "{}: {} vertices, {} triangles",
                src.display(),
                geometry.positions.len(),
                geometry.indices.len() / 3
            );
            write_serialized(&geometry, dst)
        }
        _ => bail!("Unknown file extension for source {}", src.display()),
    }
}

fn decompress(matches: &ArgMatches) -> Result<(), anyhow::Error> {
    let src = path_arg(matches, "src")?;
    let dst = path_arg(matches, "dst")?;
    let data = prs::decompress_bytes(&read_file(src)?)
        .with_context(|| format!("Failed to decompress {}", src.display()))?;
    write_file(dst, &data)
}

fn compress(matches: &ArgMatches) -> Result<(), anyhow::Error> {
    let src = path_arg(matches, "src")?;
    let dst = path_arg(matches, "dst")?;
    write_file(dst, &prs::compress_bytes(&read_file(src)?))
}

fn repack(matches: &ArgMatches) -> Result<(), anyhow::Error> {
    let src = path_arg(matches, "src")?;
    let dst = path_arg(matches, "dst")?;
    let version = match matches.get_one::<String>("qst-version").map(|s| s.as_str()) {
        Some("dc") => Some(QstVersion::DreamcastGameCube),
        Some("dc-download") => Some(QstVersion::DreamcastDownload),
        Some("pc") => Some(QstVersion::Pc),
        Some("bb") => Some(QstVersion::BlueBurst),
        _ => None,
    };

    let qst = QstFile::read(ByteCursor::from(read_file(src)?), &())
        .with_context(|| format!("Failed to parse qst {}", src.display()))?;
    log::info!("{}: {} quest", src.display(), qst.version);

    let mut writer = ByteCursor::default();
    qst.write(&mut writer, &QstWriteOptions { version })?;
    write_file(dst, writer.as_slice())
}

fn schema(matches: &ArgMatches) -> Result<(), anyhow::Error> {
    let file_type = matches
        .get_one::<String>("file_type")
        .map(|s| s.as_str())
        .unwrap_or_default();
    let dst = path_arg(matches, "dst")?;

    let schema = match file_type {
        "quest" => schema_for!(Quest),
        "model" => schema_for!(NinjaGeometry),
        _ => bail!("Invalid schema file type {}", file_type),
    };
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema json")?;
    write_file(dst, json.as_bytes())
}

fn main() {
    let matches = command().get_matches();

    let log_level = matches
        .get_one::<String>("log-level")
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    if let Err(error) = TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialise logger: {}", error);
    }

    let result = match matches.subcommand() {
        Some(("convert", sub_matches)) => convert(sub_matches),
        Some(("decompress", sub_matches)) => decompress(sub_matches),
        Some(("compress", sub_matches)) => compress(sub_matches),
        Some(("repack", sub_matches)) => repack(sub_matches),
        Some(("schema", sub_matches)) => schema(sub_matches),
        _ => unreachable!(),
    };

    if let Err(error) = result {
        log::error!("{:?}", error);
        std::process::exit(1);
    }
}
