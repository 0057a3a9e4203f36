//! Inspection helpers behind the `condb` command-line tool.
//!
//! - Unpack a raw detector id into named fields, or pack fields into an id
//! - Decode a conditions text file and re-encode it, optionally expanded
//! - Build a resolver from a JSON configuration and resolve one condition
//!
//! # Design Principles
//!
//! - **Human-readable output** - Ids print as `0x%08x` followed by
//!   `name=value` fields.
//! - **Same code paths as production** - Every command goes through the
//!   library crates rather than reimplementing their parsing.

use std::fmt::Write as _;
use std::fs;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use conditions::{ConditionTable, ConditionsConfig, ConditionsResolver, RunContext};
use detid::{subdetector, with_tag, DetectorId, InterpreterRegistry};
use table::{parse_id, ValueKind};

/// Parses a detector id given in decimal or `0x` hexadecimal.
pub fn parse_detector_id(text: &str) -> Result<DetectorId> {
    parse_id(text)
        .map(DetectorId::new)
        .ok_or_else(|| anyhow!("invalid detector id '{text}'"))
}

/// Parses a subdetector given by number or by name (`ecal`, `hcal`,
/// `tagger`, `recoil`, `trigscint`, `simspecial`).
pub fn parse_subdetector(text: &str) -> Result<u8> {
    if let Some(tag) = parse_id(text) {
        return u8::try_from(tag).with_context(|| format!("subdetector {tag} out of range"));
    }
    let tag = match text.to_ascii_lowercase().as_str() {
        "tagger" | "tracker_tagger" => subdetector::TRACKER_TAGGER,
        "trigscint" | "trigger_scint" => subdetector::TRIGGER_SCINT,
        "recoil" | "tracker_recoil" => subdetector::TRACKER_RECOIL,
        "ecal" => subdetector::ECAL,
        "hcal" => subdetector::HCAL,
        "simspecial" | "sim_special" => subdetector::SIM_SPECIAL,
        _ => bail!("unknown subdetector '{text}'"),
    };
    Ok(tag)
}

/// Parses a `name=value` field assignment.
pub fn parse_assignment(text: &str) -> Result<(String, u32)> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got '{text}'"))?;
    let value = parse_id(value.trim())
        .ok_or_else(|| anyhow!("invalid value '{value}' for field '{name}'"))?;
    Ok((name.trim().to_string(), value))
}

/// Formats an id followed by its fields.
pub fn describe_id(registry: &InterpreterRegistry, id: DetectorId) -> String {
    let mut out = id.to_string();
    for (name, value) in registry.unpack(id).iter() {
        let _ = write!(out, " {name}={value}");
    }
    out
}

/// Packs field values for a subdetector, using the first of its layouts
/// that has every named field.
pub fn pack_fields(
    registry: &InterpreterRegistry,
    tag: u8,
    assignments: &[(String, u32)],
) -> Result<DetectorId> {
    let candidates = registry
        .layouts_for_tag(tag)
        .chain(std::iter::once((None, registry.generic())));
    for (signature, layout) in candidates {
        if assignments
            .iter()
            .all(|(name, _)| layout.field(name).is_some())
        {
            let id = layout.pack(assignments.iter().map(|(name, value)| (name.as_str(), *value)))?;
            let raw = id.raw() | signature.map_or(0, |sig| sig.value);
            return Ok(with_tag(DetectorId::new(raw), tag));
        }
    }
    let names: Vec<&str> = assignments.iter().map(|(name, _)| name.as_str()).collect();
    bail!(
        "no layout for subdetector {tag} has fields {}",
        names.join(", ")
    )
}

/// Decodes a conditions text file and re-encodes it.
pub fn dump_file(
    path: &Path,
    columns: &[String],
    kind: ValueKind,
    registry: Option<&InterpreterRegistry>,
    expand: bool,
) -> Result<String> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let def = conditions::ConditionDef::new(file_label(path), kind, columns.iter().cloned());
    let mut table = def.empty_table();
    table
        .decode_from(BufReader::new(file), registry)
        .with_context(|| format!("decode {}", path.display()))?;
    encode_table(&table, registry.filter(|_| expand))
}

/// Encodes a resolved table as text.
pub fn encode_table(
    table: &ConditionTable,
    expand: Option<&InterpreterRegistry>,
) -> Result<String> {
    let mut out = Vec::new();
    table.encode(&mut out, expand).context("encode table")?;
    String::from_utf8(out).context("encoded table is not utf-8")
}

/// Formats the row of one id as `column=value` pairs.
pub fn format_row(table: &ConditionTable, id: DetectorId) -> Result<String> {
    let values: Vec<String> = match table {
        ConditionTable::Integer(table) => {
            let row = table.row_for(id)?;
            table
                .columns()
                .iter()
                .zip(row)
                .map(|(column, value)| format!("{column}={value}"))
                .collect()
        }
        ConditionTable::Double(table) => {
            let row = table.row_for(id)?;
            table
                .columns()
                .iter()
                .zip(row)
                .map(|(column, value)| format!("{column}={value}"))
                .collect()
        }
    };
    Ok(values.join(" "))
}

/// Reads a resolver configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<ConditionsConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_str(&contents).context("parse config json")
}

/// What `resolve` should print.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub name: &'a str,
    pub context: RunContext,
    pub id: Option<DetectorId>,
    pub expand: bool,
}

/// Builds a resolver from `config` and resolves one condition. The output
/// names the matched window, then either one row or the whole table.
pub fn resolve_report(
    config: &ConditionsConfig,
    registry: InterpreterRegistry,
    request: ResolveRequest<'_>,
) -> Result<String> {
    let mut resolver = ConditionsResolver::from_config(config)
        .context("build resolver")?
        .with_registry(registry);
    let window = resolver.resolved_window(request.name, request.context)?;
    let mut out = format!("# {} window {window}\n", request.name);

    let table = resolver.resolve(request.name, request.context)?;
    match request.id {
        Some(id) => {
            let _ = writeln!(out, "{id} {}", format_row(table, id)?);
        }
        None => {
            let table = table.clone();
            let expand = resolver.registry().filter(|_| request.expand);
            out.push_str(&encode_table(&table, expand)?);
        }
    }
    Ok(out)
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "table".to_string(), |stem| stem.to_string_lossy().into_owned())
}
