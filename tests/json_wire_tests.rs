use memtrack::json::{JsonLayout, to_json};
use memtrack::system::filter::FilterPolicy;
use memtrack::system::snapshot::{MemoryTotals, ProcessSample, Snapshot};
use proptest::prelude::*;
use serde_json::Value;

fn arb_process() -> impl Strategy<Value = ProcessSample> {
    (any::<u32>(), any::<String>(), any::<u64>()).prop_map(|(pid, name, working_set_bytes)| {
        ProcessSample {
            pid,
            name,
            working_set_bytes,
        }
    })
}

fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    (
        any::<u64>(),
        any::<u64>(),
        prop_oneof![Just(0u64), Just(4096u64), Just(16384u64)],
        prop::collection::vec(arb_process(), 0..40),
    )
        .prop_map(|(total, available, page, processes)| {
            Snapshot::new(
                MemoryTotals {
                    total_bytes: total,
                    available_bytes: available,
                    page_size_bytes: page,
                },
                processes,
            )
        })
}

proptest! {
    #[test]
    fn usage_stays_in_range(snapshot in arb_snapshot()) {
        let pct = snapshot.usage_percent();
        prop_assert!((0.0..=100.0).contains(&pct), "usage {}", pct);
        prop_assert_eq!(
            snapshot.used_physical_bytes(),
            snapshot.total_physical_bytes() - snapshot.available_physical_bytes()
        );
    }

    #[test]
    fn encoded_document_parses_back(snapshot in arb_snapshot()) {
        let bytes = to_json(&snapshot, JsonLayout::Bytes).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        prop_assert_eq!(value["totalMemory"].as_u64(), Some(snapshot.total_physical_bytes()));
        prop_assert_eq!(value["availableMemory"].as_u64(), Some(snapshot.available_physical_bytes()));
        prop_assert_eq!(value["usedMemory"].as_u64(), Some(snapshot.used_physical_bytes()));
        prop_assert_eq!(value["pageSize"].as_u64(), Some(snapshot.page_size_bytes()));
        prop_assert_eq!(value["pageCount"].as_u64(), Some(snapshot.page_count()));

        let pct = value["memoryUsagePercent"].as_f64().unwrap();
        prop_assert!((pct - snapshot.usage_percent()).abs() < 0.0051);

        let listed = value["processes"].as_array().unwrap();
        prop_assert_eq!(listed.len(), snapshot.processes().len());
        for (entry, process) in listed.iter().zip(snapshot.processes()) {
            prop_assert_eq!(entry["pid"].as_u64(), Some(u64::from(process.pid)));
            prop_assert_eq!(entry["name"].as_str(), Some(process.name.as_str()));
            prop_assert_eq!(entry["memory"].as_u64(), Some(process.working_set_bytes));
        }
    }

    #[test]
    fn summary_layout_is_valid_json(snapshot in arb_snapshot()) {
        let bytes = to_json(&snapshot, JsonLayout::Summary).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        let listed = value["processes"].as_array().unwrap();
        prop_assert_eq!(listed.len(), snapshot.processes().len());
        prop_assert!(listed.iter().all(|p| p.get("pid").is_none()));
    }

    #[test]
    fn filter_respects_cap_and_threshold(
        processes in prop::collection::vec(arb_process(), 0..200),
        cap in 0usize..50,
        threshold in prop::option::of(any::<u64>()),
    ) {
        let policy = FilterPolicy { min_working_set_bytes: threshold, max_processes: cap };
        let kept = policy.apply(processes.clone());
        prop_assert!(kept.len() <= cap);
        if let Some(limit) = threshold {
            prop_assert!(kept.iter().all(|p| p.working_set_bytes > limit));
        }
        // retained entries keep their relative input order
        let mut cursor = processes.iter();
        for p in &kept {
            prop_assert!(cursor.any(|q| q == p));
        }
    }
}

#[test]
fn quoted_process_name_yields_valid_json() {
    let snapshot = Snapshot::new(
        MemoryTotals {
            total_bytes: 1024,
            available_bytes: 512,
            page_size_bytes: 4096,
        },
        vec![ProcessSample {
            pid: 1,
            name: "evil\",\"pid\":0,\"x\":\"".to_string(),
            working_set_bytes: 10,
        }],
    );
    let bytes = to_json(&snapshot, JsonLayout::Bytes).unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["processes"][0]["pid"], 1);
    assert_eq!(value["processes"][0]["name"], "evil\",\"pid\":0,\"x\":\"");
}

#[test]
fn large_process_lists_are_not_truncated() {
    let processes: Vec<ProcessSample> = (0..5000)
        .map(|pid| ProcessSample {
            pid,
            name: format!("worker-{pid}-with-a-long-executable-name.exe"),
            working_set_bytes: u64::from(pid) * 4096,
        })
        .collect();
    let snapshot = Snapshot::new(
        MemoryTotals {
            total_bytes: 1 << 34,
            available_bytes: 1 << 33,
            page_size_bytes: 4096,
        },
        processes,
    );
    let bytes = to_json(&snapshot, JsonLayout::Bytes).unwrap();
    assert!(bytes.len() > 8192);
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["processes"].as_array().unwrap().len(), 5000);
}
