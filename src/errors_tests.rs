// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for error types.

#[cfg(test)]
mod tests {
    use crate::errors::*;

    #[test]
    fn test_volume_not_found_error() {
        let error = LookupError::VolumeNotFound {
            pool: "default".to_string(),
            volume: "vol-1".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Volume 'vol-1' does not exist in pool 'default'"
        );
    }

    #[test]
    fn test_no_dhcp_range_error() {
        let error = ConfigError::NoDhcpRange {
            network: "default".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Network 'default' does not define a DHCP range"
        );
    }

    #[test]
    fn test_unsupported_type_error() {
        let error = RecordError::UnsupportedType {
            record_type: "MX".to_string(),
            name: "mail.example.com.".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Unsupported resource record type 'MX' for 'mail.example.com.'"
        );
    }

    #[test]
    fn test_cyclic_alias_error() {
        let error = RecordError::CyclicAlias {
            name: "a.example.com.".to_string(),
            chain: "a.example.com. -> b.example.com. -> a.example.com.".to_string(),
        };

        assert!(error.to_string().contains("is cyclic"));
        assert!(error.to_string().contains("b.example.com."));
    }

    #[test]
    fn test_from_conversions() {
        let error: Error = LookupError::NetworkNotFound {
            network: "net".to_string(),
        }
        .into();
        assert!(matches!(error, Error::Lookup(_)));
        assert!(error.is_not_found());

        let error: Error = XmlError::Write {
            reason: "boom".to_string(),
        }
        .into();
        assert!(matches!(error, Error::Xml(_)));
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_transparent_display() {
        let error: Error = ConfigError::NoDnsDomain {
            network: "default".to_string(),
        }
        .into();

        assert_eq!(
            error.to_string(),
            "Network 'default' does not define a DNS domain"
        );
    }

    #[test]
    fn test_transient_errors() {
        let unavailable: Error = BackendError::Unavailable {
            reason: "connection refused".to_string(),
        }
        .into();
        let failed: Error = BackendError::CommandFailed {
            command: "virsh net-dumpxml default".to_string(),
            code: Some(1),
            stderr: "error".to_string(),
        }
        .into();

        assert!(unavailable.is_transient());
        assert!(failed.is_transient());
    }

    #[test]
    fn test_permanent_errors() {
        let errors: Vec<Error> = vec![
            LookupError::PoolNotFound {
                pool: "p".to_string(),
            }
            .into(),
            ConfigError::NoIpBlock {
                network: "n".to_string(),
            }
            .into(),
            RecordError::MultiValuedCname {
                name: "x.".to_string(),
                count: 2,
            }
            .into(),
            BackendError::UpdateRejected {
                network: "n".to_string(),
                section: "dns-host".to_string(),
                reason: "duplicate".to_string(),
            }
            .into(),
        ];

        for error in errors {
            assert!(!error.is_transient(), "{error} should not be transient");
        }
    }

    #[test]
    fn test_status_reasons() {
        let cases: Vec<(Error, &str)> = vec![
            (
                RecordError::UnsupportedType {
                    record_type: "MX".to_string(),
                    name: "x.".to_string(),
                }
                .into(),
                "UnsupportedRecordType",
            ),
            (
                ConfigError::NotIpv4 {
                    network: "n".to_string(),
                    family: "ipv6".to_string(),
                }
                .into(),
                "NotIpv4",
            ),
            (
                XmlError::Parse {
                    kind: "volume",
                    reason: "eof".to_string(),
                }
                .into(),
                "XmlParseFailed",
            ),
            (
                BackendError::Unavailable {
                    reason: "down".to_string(),
                }
                .into(),
                "BackendUnavailable",
            ),
        ];

        for (error, reason) in cases {
            assert_eq!(error.status_reason(), reason);
        }
    }
}
