//! Port catalog decoding.
//!
//! The BMKG harbour catalog (`_payload.json`) is a flat reference table: a
//! JSON array whose entries point at each other by index. Decoding happens in
//! two passes. The body is first read into a generic `serde_json::Value`, then
//! a [`PortCatalogDecoder`] resolves the indirections into flat entries.

use crate::locations::seed::SeedRecord;
use crate::utils::create_slug;
use log::warn;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct PortCatalogEntry {
    pub slug: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl PortCatalogEntry {
    /// Seed record for entries that carry both coordinates.
    pub fn to_seed(&self) -> Option<SeedRecord> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(SeedRecord::new(&self.name, lat, lon).with_slug(&self.slug)),
            _ => None,
        }
    }
}

pub trait PortCatalogDecoder: Send + Sync {
    /// Flattens a catalog payload. A payload that does not have the expected
    /// shape yields an empty list.
    fn decode(&self, payload: &Value) -> Vec<PortCatalogEntry>;
}

/// Decoder for the BMKG reference table layout:
/// `payload[4]` lists province references, each province object has a
/// `ports` reference to a list of port references, and each port object has
/// a `name` reference plus optional `lat`/`lon` fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct BmkgCatalogDecoder;

impl BmkgCatalogDecoder {
    const PROVINCE_LIST_INDEX: usize = 4;

    fn try_decode(&self, payload: &Value) -> Result<Vec<PortCatalogEntry>, String> {
        let table = payload.as_array().ok_or("payload is not an array")?;
        let provinces = table
            .get(Self::PROVINCE_LIST_INDEX)
            .and_then(Value::as_array)
            .ok_or("province list missing")?;

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for province_ref in provinces {
            let province = resolve(table, province_ref).ok_or("dangling province reference")?;
            let ports = province
                .get("ports")
                .and_then(|r| resolve(table, r))
                .and_then(Value::as_array)
                .ok_or("province without a port list")?;

            for port_ref in ports {
                let port = resolve(table, port_ref).ok_or("dangling port reference")?;
                let Some(name) = port
                    .get("name")
                    .and_then(|r| resolve(table, r))
                    .and_then(Value::as_str)
                else {
                    continue;
                };
                let slug = create_slug(name);
                if slug.is_empty() || !seen.insert(slug.clone()) {
                    continue;
                }
                entries.push(PortCatalogEntry {
                    slug,
                    name: name.trim().to_string(),
                    lat: coordinate(table, port, &["lat", "latitude"]),
                    lon: coordinate(table, port, &["lon", "lng", "longitude"]),
                });
            }
        }
        Ok(entries)
    }
}

impl PortCatalogDecoder for BmkgCatalogDecoder {
    fn decode(&self, payload: &Value) -> Vec<PortCatalogEntry> {
        self.try_decode(payload).unwrap_or_else(|reason| {
            warn!("Port catalog has an unexpected layout ({}); ignoring it", reason);
            Vec::new()
        })
    }
}

/// Follows an index reference into the table.
fn resolve<'a>(table: &'a [Value], reference: &Value) -> Option<&'a Value> {
    table.get(usize::try_from(reference.as_u64()?).ok()?)
}

/// Coordinate fields are inline numbers or references to one. An integer is
/// only followed when it lands on a numeric table entry; otherwise it is the
/// coordinate itself.
fn coordinate(table: &[Value], port: &Value, keys: &[&str]) -> Option<f64> {
    let field = keys.iter().find_map(|k| port.get(*k))?;
    if field.is_u64() {
        if let Some(referenced) = resolve(table, field).and_then(numeric) {
            return Some(referenced);
        }
    }
    numeric(field)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
