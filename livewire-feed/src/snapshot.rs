//! Telemetry snapshot types and normalization
//!
//! Both feed transports end up here. The push stream sends batches already
//! in the nested [`SnapshotBatch`] shape; the pull call returns a flat
//! record per node, which [`SnapshotBatch::from_pull`] maps onto the same
//! shape so consumers never see the difference.
//!
//! Flat record fields and where they land:
//!
//! | pull field | snapshot field |
//! |---|---|
//! | `cpu` | `cpu.usage` |
//! | `ram`, `swap`, `disk` | `ram.used`, `swap.used`, `disk.used` |
//! | `load`, `load5`, `load15` | `load.load1`, `load.load5`, `load.load15` |
//! | `net_out`, `net_in` | `network.up`, `network.down` |
//! | `net_total_up`, `net_total_down` | `network.totalUp`, `network.totalDown` |
//! | `connections`, `connections_udp` | `connections.tcp`, `connections.udp` |
//! | `gpu` | `gpu.average_usage` |
//! | `uptime`, `process` | `uptime`, `process` |
//! | `time` | `updated_at` |

use chrono::{SecondsFormat, Utc};
use livewire_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Status string of a healthy batch
pub const STATUS_OK: &str = "ok";

/// CPU usage in percent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuUsage {
    pub usage: f64,
}

/// Bytes in use
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub used: f64,
}

/// Load averages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadAverage {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Network rates (bytes/s) and totals (bytes)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkStats {
    pub up: f64,
    pub down: f64,
    pub total_up: f64,
    pub total_down: f64,
}

/// Open connection counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connections {
    pub tcp: u64,
    pub udp: u64,
}

/// GPU summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuUsage {
    pub count: u32,
    pub average_usage: f64,
    pub detailed_info: Vec<Value>,
}

/// Latest metrics of one node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSnapshot {
    pub cpu: CpuUsage,
    pub ram: Usage,
    pub swap: Usage,
    pub load: LoadAverage,
    pub disk: Usage,
    pub network: NetworkStats,
    pub connections: Connections,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<GpuUsage>,
    pub uptime: u64,
    pub process: u64,
    pub message: String,
    /// RFC 3339 timestamp of the sample
    pub updated_at: String,
}

/// Online nodes and their snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveData {
    /// Ids of the nodes currently online
    pub online: Vec<String>,
    /// Snapshot per node id
    pub data: HashMap<String, NodeSnapshot>,
}

/// One delivery of the live feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotBatch {
    pub data: LiveData,
    pub status: String,
}

impl SnapshotBatch {
    /// Normalize the result of the latest-status call
    ///
    /// `result` maps node id to a flat record. Missing numbers become 0, a
    /// missing `gpu` stays absent and a missing `time` becomes now. Anything
    /// other than an object is rejected.
    pub fn from_pull(result: &Value) -> Result<Self> {
        let records = result.as_object().ok_or_else(|| {
            Error::InvalidResponse(format!("expected an object of node records, got {}", kind_of(result)))
        })?;

        let empty = Map::new();
        let mut online = Vec::new();
        let mut data = HashMap::with_capacity(records.len());

        for (key, record) in records {
            let record = record.as_object().unwrap_or(&empty);
            if record.get("online").map(truthy).unwrap_or(false) {
                let id = record.get("client").and_then(Value::as_str).unwrap_or(key);
                online.push(id.to_string());
            }
            data.insert(key.clone(), node_from_record(record));
        }

        Ok(Self {
            data: LiveData { online, data },
            status: STATUS_OK.to_string(),
        })
    }

    /// Decode one frame of the push stream
    ///
    /// Missing fields default as in [`from_pull`](Self::from_pull).
    pub fn from_push(text: &str) -> Result<Self> {
        let mut batch: SnapshotBatch = serde_json::from_str(text)?;
        let now = now_rfc3339();
        for node in batch.data.data.values_mut() {
            if node.updated_at.is_empty() {
                node.updated_at = now.clone();
            }
        }
        Ok(batch)
    }

    /// Snapshot of one node
    pub fn node(&self, id: &str) -> Option<&NodeSnapshot> {
        self.data.data.get(id)
    }

    /// Check whether a node is listed as online
    pub fn is_online(&self, id: &str) -> bool {
        self.data.online.iter().any(|online| online == id)
    }
}

fn node_from_record(record: &Map<String, Value>) -> NodeSnapshot {
    let num = |field: &str| record.get(field).and_then(Value::as_f64).unwrap_or(0.0);
    let count = |field: &str| num(field).max(0.0) as u64;

    NodeSnapshot {
        cpu: CpuUsage { usage: num("cpu") },
        ram: Usage { used: num("ram") },
        swap: Usage { used: num("swap") },
        load: LoadAverage {
            load1: num("load"),
            load5: num("load5"),
            load15: num("load15"),
        },
        disk: Usage { used: num("disk") },
        network: NetworkStats {
            up: num("net_out"),
            down: num("net_in"),
            total_up: num("net_total_up"),
            total_down: num("net_total_down"),
        },
        connections: Connections {
            tcp: count("connections"),
            udp: count("connections_udp"),
        },
        gpu: record.get("gpu").filter(|v| !v.is_null()).map(|gpu| GpuUsage {
            count: 0,
            average_usage: gpu.as_f64().unwrap_or(0.0),
            detailed_info: Vec::new(),
        }),
        uptime: count("uptime"),
        process: count("process"),
        message: String::new(),
        updated_at: record
            .get("time")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(now_rfc3339),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
