// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Property checks of DNS reconciliation against the simulated platform.

mod common;

use common::{memory_session, NETWORK};
use libvirt_aws::backend::Backend;
use libvirt_aws::dns::{DnsRecords, RecordQuery, RecordType};
use libvirt_aws::resources::{FromXml, Network};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

const NAMES: [&str; 6] = [
    "a.local-1.internal.",
    "b.local-1.internal.",
    "c.local-1.internal.",
    "d.local-1.internal.",
    "e.local-1.internal.",
    "f.local-1.internal.",
];

const DELEGATION: &str = "sub.local-1.internal.";

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn address() -> impl Strategy<Value = String> {
    (2u8..=7).prop_map(|octet| format!("10.11.12.{octet}"))
}

/// A and TXT records on the first four names, NS at the delegation point.
fn plain_records() -> impl Strategy<Value = DnsRecords> {
    (
        prop::collection::btree_map(0usize..4, prop::collection::btree_set(address(), 1..3), 0..4),
        prop::collection::btree_map(
            0usize..4,
            prop::collection::btree_set("[a-z0-9]{1,8}", 1..3),
            0..3,
        ),
        prop::collection::btree_set("ns[1-3]\\.example\\.", 0..3),
    )
        .prop_map(|(addresses, texts, servers)| {
            let mut records = DnsRecords::new();
            extend(&mut records, RecordType::A, addresses);
            extend(&mut records, RecordType::Txt, texts);
            for server in servers {
                records.insert(RecordType::Ns, DELEGATION, server);
            }
            records
        })
}

/// Plain records plus CNAMEs on the last two names pointing at the first four.
fn all_records() -> impl Strategy<Value = DnsRecords> {
    (
        plain_records(),
        prop::collection::btree_map(4usize..6, 0usize..4, 0..3),
    )
        .prop_map(|(mut records, aliases)| {
            for (alias, target) in aliases {
                records.insert(RecordType::Cname, NAMES[alias], NAMES[target]);
            }
            records
        })
}

fn extend(records: &mut DnsRecords, record_type: RecordType, sets: BTreeMap<usize, BTreeSet<String>>) {
    for (name, values) in sets {
        for value in values {
            records.insert(record_type.clone(), NAMES[name], value);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_applied_records_read_back_exactly(desired in all_records()) {
        let read = block_on(async {
            let (_backend, session) = memory_session();
            session.apply_dns_records(NETWORK, &desired).await.unwrap();
            session.get_dns_records(NETWORK, &RecordQuery::new()).await.unwrap()
        });

        prop_assert_eq!(read, desired);
    }

    #[test]
    fn test_reapplying_changes_nothing(desired in all_records()) {
        let (again, own_state) = block_on(async {
            let (_backend, session) = memory_session();
            session.apply_dns_records(NETWORK, &desired).await.unwrap();
            let current = session.get_dns_records(NETWORK, &RecordQuery::new()).await.unwrap();
            (
                session.get_dns_diff(NETWORK, &desired).await.unwrap(),
                session.get_dns_diff(NETWORK, &current).await.unwrap(),
            )
        });

        prop_assert!(again.is_empty(), "diff against desired: {:?}", again);
        prop_assert!(own_state.is_empty(), "diff against own state: {:?}", own_state);
    }

    #[test]
    fn test_any_state_reconciles_to_any_other(
        first in plain_records(),
        second in plain_records(),
    ) {
        let read = block_on(async {
            let (_backend, session) = memory_session();
            session.apply_dns_records(NETWORK, &first).await.unwrap();
            session.apply_dns_records(NETWORK, &second).await.unwrap();
            session.get_dns_records(NETWORK, &RecordQuery::new()).await.unwrap()
        });

        prop_assert_eq!(read, second);
    }

    #[test]
    fn test_shared_address_merges_in_any_order(
        names in Just(NAMES.to_vec()).prop_shuffle(),
        count in 1usize..=6,
    ) {
        let names = &names[..count];
        let network = block_on(async {
            let (backend, session) = memory_session();
            let mut desired = DnsRecords::new();
            for name in names {
                desired.insert(RecordType::A, *name, "10.11.12.50");
                session.apply_dns_records(NETWORK, &desired).await.unwrap();
            }
            let xml = backend.network_xml(NETWORK).await.unwrap();
            Network::from_xml(&xml).unwrap()
        });

        let stored = network.records();
        prop_assert_eq!(stored.len(), count);
        for name in names {
            let expected: BTreeSet<String> = ["10.11.12.50".to_string()].into();
            prop_assert_eq!(stored.get(&RecordType::A, name), Some(&expected));
        }
    }
}
