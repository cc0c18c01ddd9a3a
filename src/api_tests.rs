// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for the HTTP handlers.

#[cfg(test)]
mod tests {
    use crate::api::{
        healthz, list_records, replace_records, ApiError, AppState, RecordsParams,
        ReplaceRecordsRequest,
    };
    use crate::backend::MemoryBackend;
    use crate::dns::{DnsRecords, RecordType};
    use crate::errors::{BackendError, ConfigError, Error, LookupError, RecordError, XmlError};
    use crate::session::Session;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::Json;
    use std::sync::Arc;

    const NETWORK_XML: &str = "<network><name>default</name>\
        <uuid>9a05da11-e96b-47f3-8253-a3a482e445f5</uuid>\
        <domain name='local-1.internal'/></network>";

    fn state() -> AppState {
        let backend = MemoryBackend::new().with_network(NETWORK_XML).unwrap();
        AppState {
            session: Arc::new(Session::new(Arc::new(backend))),
            network: "default".to_string(),
        }
    }

    #[tokio::test]
    async fn test_healthz() {
        assert_eq!(healthz().await, "ok");
    }

    #[test]
    fn test_params_to_query() {
        let params = RecordsParams {
            zone: Some("local-1.internal".to_string()),
            exclude_zone: Some("a.local-1.internal., b.local-1.internal".to_string()),
            include_soa_ns: true,
            include_eager_cname: false,
        };

        let query = params.to_query();

        assert_eq!(query.zone.as_deref(), Some("local-1.internal."));
        assert_eq!(
            query.exclude_zones,
            vec!["a.local-1.internal.", "b.local-1.internal."]
        );
        assert!(query.include_soa_ns);
        assert!(!query.include_eager_cname);
    }

    #[tokio::test]
    async fn test_post_then_get_records() {
        let state = state();
        let mut records = DnsRecords::new();
        records.insert(RecordType::A, "test1.local-1.internal.", "10.0.0.5");

        let Json(response) = replace_records(
            State(state.clone()),
            Json(ReplaceRecordsRequest {
                zone: Some("local-1.internal.".to_string()),
                records: records.clone(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.change.status, "INSYNC");
        assert_eq!(response.records, records);

        let Json(listed) = list_records(
            State(state),
            Query(RecordsParams {
                include_soa_ns: true,
                ..RecordsParams::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.get(&RecordType::Soa, "local-1.internal.").is_some());
    }

    #[tokio::test]
    async fn test_unknown_network_is_not_found() {
        let mut state = state();
        state.network = "missing".to_string();

        let err = list_records(State(state), Query(RecordsParams::default()))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                Error::from(RecordError::UnsupportedType {
                    record_type: "MX".to_string(),
                    name: "x.".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::from(ConfigError::NoDnsDomain {
                    network: "n".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::from(LookupError::DomainNotFound {
                    domain: "d".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                Error::from(BackendError::Unavailable {
                    reason: "down".to_string(),
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::from(BackendError::UpdateRejected {
                    network: "n".to_string(),
                    section: "dns-host".to_string(),
                    reason: "dup".to_string(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                Error::from(XmlError::Write {
                    reason: "x".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError(error).status_code(), status);
        }
    }
}
