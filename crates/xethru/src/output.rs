use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use xethru_frame::Frame;
use xethru_module::protocol::tag_name;
use xethru_module::{BaseBandIq, Respiration};
use xethru_transport::PortInfo;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A telemetry record the CLI knows how to print.
pub trait Record: Serialize {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl Record for Respiration {
    fn headers() -> Vec<&'static str> {
        vec!["COUNTER", "STATE", "RPM", "DISTANCE", "QUALITY", "MOVEMENT"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.counter.to_string(),
            self.state.to_string(),
            self.rpm.to_string(),
            format!("{:.2}", self.distance),
            format!("{:.2}", self.signal_quality),
            format!("{:.3}", self.movement),
        ]
    }
}

impl Record for BaseBandIq {
    fn headers() -> Vec<&'static str> {
        vec!["COUNTER", "BINS", "BIN_LENGTH", "FS", "FC", "OFFSET"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.counter.to_string(),
            self.bins.to_string(),
            format!("{:.4}", self.bin_length),
            format!("{:.2}", self.sampling_frequency),
            format!("{:.2}", self.carrier_frequency),
            format!("{:.2}", self.range_offset),
        ]
    }
}

pub fn print_record<R: Record>(record: &R, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => print_table(R::headers(), vec![record.row()]),
        OutputFormat::Pretty => {
            let fields: Vec<String> = R::headers()
                .into_iter()
                .zip(record.row())
                .map(|(name, value)| format!("{}={value}", name.to_lowercase()))
                .collect();
            println!("{}", fields.join(" "));
        }
        OutputFormat::Raw => println!("{}", record.row().join("\t")),
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    tag: Option<u8>,
    tag_name: &'a str,
    payload_size: usize,
    payload: String,
    checksum: String,
    wire: String,
}

/// Print a decoded frame (or a frame about to be sent).
pub fn print_frame(frame: &Frame, wire: &[u8], format: OutputFormat) {
    let tag = frame.tag();
    let name = tag.map(tag_name).unwrap_or("empty");
    match format {
        OutputFormat::Json => print_json(&FrameOutput {
            tag,
            tag_name: name,
            payload_size: frame.payload.len(),
            payload: hex(frame.payload.as_ref()),
            checksum: format!("{:02x}", frame.checksum()),
            wire: hex(wire),
        }),
        OutputFormat::Table => print_table(
            vec!["TAG", "SIZE", "CHECKSUM", "PAYLOAD"],
            vec![vec![
                name.to_string(),
                frame.payload.len().to_string(),
                format!("{:02x}", frame.checksum()),
                hex(frame.payload.as_ref()),
            ]],
        ),
        OutputFormat::Pretty => println!(
            "tag={name} size={} checksum={:02x} payload={} wire={}",
            frame.payload.len(),
            frame.checksum(),
            hex(frame.payload.as_ref()),
            hex(wire)
        ),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for port in ports {
                print_json(&PortOutput::from(port));
            }
        }
        OutputFormat::Table => print_table(
            vec!["PORT", "KIND", "DESCRIPTION"],
            ports
                .iter()
                .map(|port| {
                    vec![
                        port.name.clone(),
                        port.kind.to_string(),
                        port.description.clone().unwrap_or_default(),
                    ]
                })
                .collect(),
        ),
        OutputFormat::Pretty | OutputFormat::Raw => {
            for port in ports {
                match &port.description {
                    Some(description) => println!("{} ({}, {description})", port.name, port.kind),
                    None => println!("{} ({})", port.name, port.kind),
                }
            }
        }
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    description: Option<&'a str>,
}

impl<'a> From<&'a PortInfo> for PortOutput<'a> {
    fn from(port: &'a PortInfo) -> Self {
        Self {
            name: &port.name,
            kind: port.kind,
            description: port.description.as_deref(),
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Lowercase, space-separated hex.
pub fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(headers: Vec<&str>, rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}
