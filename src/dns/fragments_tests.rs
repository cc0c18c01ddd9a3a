// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for update fragments.

#[cfg(test)]
mod tests {
    use crate::dns::fragments::srv_entry;
    use crate::dns::{Fragment, HostEntry, NetworkSection, RecordType, SrvEntry, TxtEntry};
    use crate::errors::{Error, RecordError};
    use std::collections::BTreeSet;

    #[test]
    fn test_section_names() {
        assert_eq!(NetworkSection::DnsHost.as_str(), "dns-host");
        assert_eq!(NetworkSection::DnsTxt.as_str(), "dns-txt");
        assert_eq!(NetworkSection::DnsSrv.to_string(), "dns-srv");
    }

    #[test]
    fn test_host_fragment_without_hostnames() {
        let fragment = Fragment::host("192.0.2.1".parse().unwrap(), &[]).unwrap();

        assert_eq!(fragment.section, NetworkSection::DnsHost);
        assert_eq!(fragment.xml, r#"<host ip="192.0.2.1"/>"#);
    }

    #[test]
    fn test_host_fragment_lists_hostnames() {
        let hostnames = vec!["a.internal.".to_string(), "b.internal.".to_string()];
        let fragment = Fragment::host("192.0.2.1".parse().unwrap(), &hostnames).unwrap();

        assert_eq!(
            fragment.xml,
            r#"<host ip="192.0.2.1"><hostname>a.internal.</hostname><hostname>b.internal.</hostname></host>"#
        );
        let parsed: HostEntry = quick_xml::de::from_str(&fragment.xml).unwrap();
        assert_eq!(parsed.hostnames, hostnames);
    }

    #[test]
    fn test_txt_fragment() {
        let fragment = Fragment::txt("test.internal.", "hello").unwrap();

        assert_eq!(fragment.section, NetworkSection::DnsTxt);
        assert_eq!(fragment.xml, r#"<txt name="test.internal." value="hello"/>"#);
    }

    #[test]
    fn test_stored_entries_keep_their_attributes() {
        let txt = Fragment::txt_entry(&TxtEntry {
            name: "example".to_string(),
            value: "example value".to_string(),
        })
        .unwrap();
        assert_eq!(txt.xml, r#"<txt name="example" value="example value"/>"#);

        let srv = Fragment::srv_entry(&SrvEntry {
            service: "ldap".to_string(),
            protocol: "tcp".to_string(),
            domain: None,
            priority: None,
            weight: None,
            port: Some("389".to_string()),
            target: None,
        })
        .unwrap();
        assert_eq!(srv.section, NetworkSection::DnsSrv);
        assert_eq!(srv.xml, r#"<srv service="ldap" protocol="tcp" port="389"/>"#);
    }

    #[test]
    fn test_synthetic_cname_fragment_round_trips_quotes() {
        let targets: BTreeSet<String> = ["test1.internal.".to_string()].into();
        let fragment = Fragment::synthetic(&RecordType::Cname, "www.internal", &targets).unwrap();

        let parsed: TxtEntry = quick_xml::de::from_str(&fragment.xml).unwrap();
        assert_eq!(parsed.name, "@@cname.www.internal.");
        assert_eq!(parsed.value, "\"test1.internal.\"");
    }

    #[test]
    fn test_synthetic_fragment_rejects_native_types() {
        let err = Fragment::synthetic(&RecordType::Txt, "www.internal.", &BTreeSet::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Record(RecordError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_srv_fragment_with_domain() {
        let fragment = Fragment::srv("_sip._tcp.local-1.internal.", "10 5 5060 sip.internal.").unwrap();

        assert_eq!(fragment.section, NetworkSection::DnsSrv);
        assert_eq!(
            fragment.xml,
            r#"<srv service="sip" protocol="tcp" domain="local-1.internal." priority="10" weight="5" port="5060" target="sip.internal."/>"#
        );
    }

    #[test]
    fn test_srv_entry_without_domain() {
        let entry = srv_entry("_ldap._tcp.", "0 0 389 .").unwrap();

        assert_eq!(entry.service, "ldap");
        assert_eq!(entry.protocol, "tcp");
        assert_eq!(entry.domain, None);
        assert_eq!(entry.port.as_deref(), Some("389"));
        assert_eq!(entry.target.as_deref(), Some("."));
    }

    #[test]
    fn test_srv_entry_rejects_bad_name() {
        assert!(matches!(
            srv_entry("ldap._tcp.", "0 0 389 ."),
            Err(RecordError::InvalidSrvRecord { .. })
        ));
        assert!(matches!(
            srv_entry("_ldap.", "0 0 389 ."),
            Err(RecordError::InvalidSrvRecord { .. })
        ));
    }

    #[test]
    fn test_srv_entry_rejects_bad_value() {
        assert!(matches!(
            srv_entry("_ldap._tcp.", "0 0 389"),
            Err(RecordError::InvalidSrvRecord { .. })
        ));
        assert!(matches!(
            srv_entry("_ldap._tcp.", "0 0 99999 ."),
            Err(RecordError::InvalidSrvRecord { .. })
        ));
    }
}
