//! Wire encoding of [`Snapshot`] values.
//!
//! Documents are built from borrowed views of the snapshot and written with
//! `serde_json`, which escapes process names and grows its buffer to fit any
//! number of processes. Fixed-precision numbers go through [`RawValue`] so
//! that `50.00` stays `50.00` on the wire.

use serde::Serialize;
use serde_json::value::RawValue;

use crate::format::{gib, mib};
use crate::system::snapshot::Snapshot;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JsonLayout {
    /// Raw byte counts with pid, page figures and a two-decimal percentage.
    #[default]
    Bytes,
    /// GiB totals, one-decimal usage and MiB per process, without pids.
    Summary,
}

impl JsonLayout {
    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "summary" => JsonLayout::Summary,
            _ => JsonLayout::Bytes,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BytesDocument<'a> {
    total_memory: u64,
    used_memory: u64,
    available_memory: u64,
    page_size: u64,
    page_count: u64,
    memory_usage_percent: Box<RawValue>,
    processes: Vec<BytesProcess<'a>>,
}

#[derive(Serialize)]
struct BytesProcess<'a> {
    pid: u32,
    name: &'a str,
    memory: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDocument<'a> {
    total_memory: Box<RawValue>,
    used_memory: Box<RawValue>,
    available_memory: Box<RawValue>,
    memory_usage: Box<RawValue>,
    processes: Vec<SummaryProcess<'a>>,
}

#[derive(Serialize)]
struct SummaryProcess<'a> {
    name: &'a str,
    memory: Box<RawValue>,
}

fn fixed(value: f64, decimals: usize) -> serde_json::Result<Box<RawValue>> {
    RawValue::from_string(format!("{value:.decimals$}"))
}

pub fn to_json(snapshot: &Snapshot, layout: JsonLayout) -> serde_json::Result<Vec<u8>> {
    match layout {
        JsonLayout::Bytes => serde_json::to_vec(&bytes_document(snapshot)?),
        JsonLayout::Summary => serde_json::to_vec(&summary_document(snapshot)?),
    }
}

fn bytes_document(snapshot: &Snapshot) -> serde_json::Result<BytesDocument<'_>> {
    Ok(BytesDocument {
        total_memory: snapshot.total_physical_bytes(),
        used_memory: snapshot.used_physical_bytes(),
        available_memory: snapshot.available_physical_bytes(),
        page_size: snapshot.page_size_bytes(),
        page_count: snapshot.page_count(),
        memory_usage_percent: fixed(snapshot.usage_percent(), 2)?,
        processes: snapshot
            .processes()
            .iter()
            .map(|p| BytesProcess {
                pid: p.pid,
                name: &p.name,
                memory: p.working_set_bytes,
            })
            .collect(),
    })
}

fn summary_document(snapshot: &Snapshot) -> serde_json::Result<SummaryDocument<'_>> {
    let processes = snapshot
        .processes()
        .iter()
        .map(|p| {
            Ok(SummaryProcess {
                name: &p.name,
                memory: fixed(mib(p.working_set_bytes), 1)?,
            })
        })
        .collect::<serde_json::Result<Vec<_>>>()?;

    Ok(SummaryDocument {
        total_memory: fixed(gib(snapshot.total_physical_bytes()), 2)?,
        used_memory: fixed(gib(snapshot.used_physical_bytes()), 2)?,
        available_memory: fixed(gib(snapshot.available_physical_bytes()), 2)?,
        memory_usage: fixed(snapshot.usage_percent(), 1)?,
        processes,
    })
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use serde_json::Value;

    use super::*;
    use crate::system::snapshot::{MemoryTotals, ProcessSample};

    const GIB_BYTES: u64 = 1024 * 1024 * 1024;

    fn encoded(snapshot: &Snapshot, layout: JsonLayout) -> String {
        String::from_utf8(to_json(snapshot, layout).unwrap()).unwrap()
    }

    fn half_used(processes: Vec<ProcessSample>) -> Snapshot {
        Snapshot::new(
            MemoryTotals {
                total_bytes: 16 * GIB_BYTES,
                available_bytes: 8 * GIB_BYTES,
                page_size_bytes: 4096,
            },
            processes,
        )
    }

    #[test]
    fn bytes_layout_wire_format() {
        let snap = half_used(vec![ProcessSample {
            pid: 4,
            name: "sy\"s\\x".to_string(),
            working_set_bytes: 104_857_600,
        }]);
        let text = encoded(&snap, JsonLayout::Bytes);
        assert_snapshot!(text, @r#"{"totalMemory":17179869184,"usedMemory":8589934592,"availableMemory":8589934592,"pageSize":4096,"pageCount":2097152,"memoryUsagePercent":50.00,"processes":[{"pid":4,"name":"sy\"s\\x","memory":104857600}]}"#);
    }

    #[test]
    fn summary_layout_wire_format() {
        let snap = half_used(vec![ProcessSample {
            pid: 9,
            name: "db".to_string(),
            working_set_bytes: 3 * 1024 * 1024 / 2,
        }]);
        let text = encoded(&snap, JsonLayout::Summary);
        assert_snapshot!(text, @r#"{"totalMemory":16.00,"usedMemory":8.00,"availableMemory":8.00,"memoryUsage":50.0,"processes":[{"name":"db","memory":1.5}]}"#);
    }

    #[test]
    fn empty_process_list_is_an_empty_array() {
        let bytes = to_json(&half_used(Vec::new()), JsonLayout::Bytes).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["processes"], Value::Array(Vec::new()));
        assert!(String::from_utf8(bytes).unwrap().ends_with("\"processes\":[]}"));
    }

    #[test]
    fn control_characters_are_escaped() {
        let snap = half_used(vec![ProcessSample {
            pid: 1,
            name: "tab\there\nnew\u{1}".to_string(),
            working_set_bytes: 1,
        }]);
        let text = encoded(&snap, JsonLayout::Bytes);
        assert!(text.contains(r#""tab\there\nnew\u0001""#));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["processes"][0]["name"], "tab\there\nnew\u{1}");
    }

    #[test]
    fn zeroed_snapshot_still_encodes() {
        let text = encoded(&Snapshot::empty(), JsonLayout::Bytes);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["totalMemory"], 0);
        assert_eq!(value["memoryUsagePercent"].as_f64(), Some(0.0));
    }

    #[test]
    fn layout_from_config_string() {
        assert_eq!(JsonLayout::from_str_config("Summary"), JsonLayout::Summary);
        assert_eq!(JsonLayout::from_str_config("bytes"), JsonLayout::Bytes);
        assert_eq!(JsonLayout::from_str_config("whatever"), JsonLayout::Bytes);
    }
}
