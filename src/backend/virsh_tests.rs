// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for virsh output parsing.

#[cfg(test)]
mod tests {
    use crate::backend::virsh::{parse_info, parse_names, parse_volume_list};
    use crate::backend::VirshBackend;
    use crate::errors::{BackendError, Error};

    #[test]
    fn test_parse_net_info() {
        let output = "Name:           default\n\
                      UUID:           9a05da11-e96b-47f3-8253-a3a482e445f5\n\
                      Active:         yes\n\
                      Persistent:     yes\n\
                      Autostart:      yes\n\
                      Bridge:         virbr0\n";

        let object = parse_info("net-info", output).unwrap();

        assert_eq!(object.name, "default");
        assert_eq!(object.uuid, "9a05da11-e96b-47f3-8253-a3a482e445f5");
    }

    #[test]
    fn test_parse_info_requires_uuid() {
        assert!(matches!(
            parse_info("pool-info", "Name: default\n"),
            Err(Error::Backend(BackendError::InvalidOutput { .. }))
        ));
    }

    #[test]
    fn test_parse_names_skips_blank_lines() {
        assert_eq!(parse_names("web-1\n\nweb-2\n  \n"), vec!["web-1", "web-2"]);
    }

    #[test]
    fn test_parse_volume_list() {
        let output = " Name          Path\n\
                      ---------------------------------------------\n\
                      base.qcow2    /var/lib/libvirt/images/base.qcow2\n\
                      web-1.qcow2   /var/lib/libvirt/images/web-1.qcow2\n";

        assert_eq!(parse_volume_list(output), vec!["base.qcow2", "web-1.qcow2"]);
    }

    #[test]
    fn test_builder() {
        let backend = VirshBackend::new("qemu:///session").with_transient_updates(true);

        assert_eq!(backend.uri(), "qemu:///session");
    }
}
