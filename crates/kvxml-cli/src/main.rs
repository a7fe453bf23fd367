use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kvxml::{Object, ReadOptions, Reader, WriteOptions, Writer};

#[derive(Debug, Parser)]
#[command(
    name = "kvxml",
    version,
    about = "Convert nested JSON data to and from XML"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encode a JSON object as a pretty-printed XML document
    Encode {
        /// Input JSON file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        /// Name of the root element
        #[arg(short, long)]
        root: String,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
    /// Stream a JSON object into an XML file
    Write {
        /// Input JSON file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        /// Name of the root element
        #[arg(short, long)]
        root: String,
        /// XML file to write
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Attribute of the root element, as NAME=VALUE
        #[arg(long = "attr", value_name = "NAME=VALUE", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
        /// Append to the file instead of replacing it
        #[arg(long)]
        append: bool,
        /// Always wrap the text of elements with this name in CDATA
        #[arg(long = "force-cdata", value_name = "NAME")]
        force_cdata: Vec<String>,
        /// Version in the XML declaration
        #[arg(long, default_value = "1.0")]
        xml_version: String,
        /// Encoding in the XML declaration and of the written bytes
        #[arg(long, default_value = "UTF-8")]
        encoding: String,
    },
    /// Read an XML file and print it as JSON
    Read {
        /// XML file to read
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Keep null, empty strings and empty containers
        #[arg(long)]
        keep_empty: bool,
        /// Extra parse attempts for a file that is still being written
        #[arg(long, default_value_t = 0)]
        retries: u32,
        /// Pause between attempts in milliseconds
        #[arg(long, default_value_t = 250)]
        retry_pause_ms: u64,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match Args::parse().command {
        Command::Encode {
            input,
            root,
            output,
        } => {
            let data = read_json(&input)?;
            let xml = kvxml::encode_to_xml_text(&data, &root)?;
            write_output(&output, xml.as_bytes())
        }
        Command::Write {
            input,
            root,
            output,
            attributes,
            append,
            force_cdata,
            xml_version,
            encoding,
        } => {
            let data = read_json(&input)?;
            let root_attributes: Object = attributes
                .into_iter()
                .map(|(name, value)| (name, value.into()))
                .collect();

            let options = WriteOptions::default()
                .with_version(xml_version)
                .with_encoding(encoding);
            let mut writer = Writer::new(&output).with_options(options);
            for name in force_cdata {
                writer.add_force_character_data(name);
            }

            writer
                .write(&root, &root_attributes, &data, append)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!("wrote {}", output.display());
            Ok(())
        }
        Command::Read {
            file,
            keep_empty,
            retries,
            retry_pause_ms,
            output,
        } => {
            let options = ReadOptions::new(
                !keep_empty,
                retries,
                Duration::from_millis(retry_pause_ms),
            );
            let data = Reader::new(&file).with_options(options).read()?;

            let mut json = serde_json::to_string_pretty(&data).context("failed to encode JSON")?;
            json.push('\n');
            write_output(&output, json.as_bytes())
        }
    }
}

fn parse_attribute(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {raw:?}")),
    }
}

fn read_json(path: &Option<PathBuf>) -> Result<Object> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.trim().is_empty() {
                bail!("no input provided on stdin");
            }
            buffer
        }
    };
    serde_json::from_str(&content).context("input must be a JSON object")
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
