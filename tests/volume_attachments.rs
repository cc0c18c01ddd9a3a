// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Volume listing and attachment discovery against the simulated platform.

mod common;

use common::{memory_backend, POOL};
use libvirt_aws::errors::{Error, LookupError};
use libvirt_aws::session::Session;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const BASE_XML: &str = "<volume type='file'><name>base.qcow2</name>\
    <key>/var/lib/libvirt/images/base.qcow2</key><capacity unit='G'>2</capacity>\
    <target><path>/var/lib/libvirt/images/base.qcow2</path></target></volume>";

const DATA_XML: &str = "<volume type='file'><name>data.qcow2</name>\
    <key>/var/lib/libvirt/images/data.qcow2</key><capacity unit='M'>512</capacity>\
    <target><path>/var/lib/libvirt/images/data.qcow2</path></target>\
    <backingStore><path>/var/lib/libvirt/images/base.qcow2</path></backingStore></volume>";

fn web_xml(disks: &str) -> String {
    format!(
        "<domain type='kvm'><name>web-1</name>\
         <uuid>2d9e4a3c-0000-4000-8000-000000000010</uuid>\
         <devices>{disks}</devices></domain>"
    )
}

const DATA_DISK: &str = "<disk type='volume' device='disk'>\
    <source pool='default' volume='data.qcow2'/><target dev='vdb' bus='virtio'/></disk>";

const FILE_DISK: &str = "<disk type='file' device='disk'>\
    <source file='/var/lib/libvirt/images/data.qcow2'/><target dev='vdc'/></disk>";

fn session_with(backend: libvirt_aws::backend::MemoryBackend) -> (Arc<libvirt_aws::backend::MemoryBackend>, Session) {
    let backend = Arc::new(backend);
    (backend.clone(), Session::new(backend))
}

#[tokio::test]
async fn test_volumes_listed_with_sizes() {
    let (_backend, session) = session_with(
        memory_backend()
            .with_volume(POOL, BASE_XML)
            .unwrap()
            .with_volume(POOL, DATA_XML)
            .unwrap(),
    );

    let volumes = session.get_all_volumes(POOL).await.unwrap();

    let names: Vec<&str> = volumes.iter().map(|volume| volume.name.as_str()).collect();
    assert_eq!(names, vec!["base.qcow2", "data.qcow2"]);
    assert_eq!(volumes[1].capacity, 512 * 1024 * 1024);
    assert_eq!(
        volumes[1].backing_store.as_deref(),
        Some("/var/lib/libvirt/images/base.qcow2")
    );
}

#[tokio::test]
async fn test_attachment_follows_domain_redefinition() {
    let (backend, session) = session_with(
        memory_backend()
            .with_volume(POOL, DATA_XML)
            .unwrap()
            .with_domain(&web_xml(FILE_DISK))
            .unwrap(),
    );

    // File-backed disks are not volume attachments
    assert!(session
        .get_vol_attachments(POOL, "data.qcow2")
        .await
        .unwrap()
        .is_empty());

    backend
        .define_domain(&web_xml(&format!("{FILE_DISK}{DATA_DISK}")))
        .await
        .unwrap();

    let attachments = session
        .get_vol_attachments(POOL, "data.qcow2")
        .await
        .unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].domain, "web-1");
    assert_eq!(attachments[0].pool, POOL);
    assert_eq!(attachments[0].volume, "data.qcow2");
    assert_eq!(attachments[0].device, "vdb");
    assert_eq!(session.caches().domains.len(), 2);
}

#[tokio::test]
async fn test_attachments_of_missing_volume() {
    let (_backend, session) = session_with(memory_backend());

    let err = session
        .get_vol_attachments(POOL, "missing.qcow2")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Lookup(LookupError::VolumeNotFound { .. })
    ));
    assert!(err.is_not_found());
}
