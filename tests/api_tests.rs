//! HTTP tests for entity routes, search and report downloads
//!
//! Every test starts a local mock server and points a client at it, so the
//! exact routes, bodies and status handling are observable.

use hospital_admin::{ApiError, Client, ClientConfig, ReportDelivery, ReportKind, ReportOutcome};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

async fn client_for(server: &MockServer) -> Client {
    Client::new(ClientConfig::new(server.uri())).unwrap()
}

fn patient_json(id: &str, file_number: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "inputnamear": "سارة",
        "inputidentity": "1029384756",
        "inputdatefrom": "2024-05-01",
        "inputdateto": "2024-05-02",
        "inputtimefrom": "08:00",
        "inputtimeto": "14:00",
        "inputemployer": "وزارة الصحة",
        "inputrelation": "daughter",
        "inputvisittype": "outpatient",
        "nationalityId": "n1",
        "doctorId": "d1",
        "hospitalId": "h1",
        "inputdaynum": "2",
        "inputgsl": file_number
    })
}

/// Test suite for entity CRUD routes
#[cfg(test)]
mod entity_tests {
    use super::*;
    use hospital_admin::{DoctorDraft, NationalityPatch};

    /// Test listing patients
    #[tokio::test]
    async fn test_list_patients() {
        // Arrange: Server returning two patients
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manger_data/patients"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([patient_json("p1", "000001"), patient_json("p2", "000002")])),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        // Act
        let patients = client.patients().list().await.unwrap();

        // Assert
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[1].id, "p2");
    }

    /// Test the most-recent listing route
    #[tokio::test]
    async fn test_recent_patients() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manger_data/user20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([patient_json("p9", "123456")])))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let recent = client.patients().recent().await.unwrap();

        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].file_number, "123456");
    }

    /// Test fetching one nationality by id
    #[tokio::test]
    async fn test_get_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manger_data/nationalities/n7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "n7",
                "input_national_ar": "سعودي",
                "input_national_en": "Saudi"
            })))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let nationality = client.nationalities().get_by_id("n7").await.unwrap();

        assert_eq!(nationality.name_en, "Saudi");
    }

    /// Test that create posts the wire field names
    #[tokio::test]
    async fn test_create_doctor() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/manger_data/doctors"))
            .and(body_partial_json(json!({
                "input_doctor_name_En": "Dr. Ali",
                "input_doctor_num": "11"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "_id": "d5",
                "input_doctor_name_ar": "د. علي",
                "input_doctor_name_En": "Dr. Ali",
                "input_doctor_num": "11"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        let draft = DoctorDraft {
            name_ar: "د. علي".to_string(),
            name_en: "Dr. Ali".to_string(),
            specialization_ar: "عظام".to_string(),
            specialization_en: "Orthopedics".to_string(),
            link_code: "11".to_string(),
        };

        // Act
        let created = client.doctors().create(&draft).await.unwrap();

        // Assert
        assert_eq!(created.id, "d5");
        assert_eq!(created.link_code, "11");
    }

    /// Test a partial update
    #[tokio::test]
    async fn test_update_nationality() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/manger_data/nationalities/n1"))
            .and(body_partial_json(json!({"input_national_en": "Egyptian"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "n1",
                "input_national_ar": "مصري",
                "input_national_en": "Egyptian"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        let patch = NationalityPatch {
            name_en: Some("Egyptian".to_string()),
            ..Default::default()
        };

        let updated = client.nationalities().update("n1", &patch).await.unwrap();

        assert_eq!(updated.name_ar, "مصري");
    }

    /// Test delete acknowledgements
    #[tokio::test]
    async fn test_delete_acknowledgements() {
        // Arrange: An explicit acknowledgement and an empty body
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/manger_data/hospitals/h1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/manger_data/hospitals/h2"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        // Act
        let refused = client.hospitals().delete("h1").await.unwrap();
        let accepted = client.hospitals().delete("h2").await.unwrap();

        // Assert
        assert!(!refused.success);
        assert!(accepted.success);
    }

    /// Test that a failing status becomes RequestFailed
    #[tokio::test]
    async fn test_delete_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/manger_data/patients/p1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let result = client.patients().delete("p1").await;

        assert!(matches!(result, Err(ApiError::RequestFailed { status: 500 })));
    }

    /// Test that a malformed body becomes a parse error
    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manger_data/doctors"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let result = client.doctors().list().await;

        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    /// Test an unreachable server
    #[tokio::test]
    async fn test_network_failure() {
        // Arrange: Start and drop a server so its port is closed
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };
        let client = Client::new(ClientConfig::new(uri)).unwrap();

        // Act
        let result = client.nationalities().list().await;

        // Assert
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}

/// Test suite for search and file number allocation
#[cfg(test)]
mod search_tests {
    use super::*;

    /// Echoes back a patient holding the requested file number
    struct EveryNumberTaken;

    impl Respond for EveryNumberTaken {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let candidate = request
                .url
                .path_segments()
                .and_then(|s| s.last())
                .unwrap_or_default()
                .to_string();
            ResponseTemplate::new(200).set_body_json(json!({"users": [patient_json("px", &candidate)]}))
        }
    }

    /// Test a search with results
    #[tokio::test]
    async fn test_search_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manger_data/findgsl/1029384756"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"users": [patient_json("p1", "000010")]})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let found = client.patients().search(" 1029384756 ").await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "p1");
    }

    /// Test that empty and missing result arrays are both empty
    #[tokio::test]
    async fn test_search_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manger_data/findgsl/none"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": []})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/manger_data/findgsl/missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        assert!(client.patients().search("none").await.unwrap().is_empty());
        assert!(client.patients().search("missing").await.unwrap().is_empty());
    }

    /// Test that a free file number is taken on the first lookup
    #[tokio::test]
    async fn test_allocate_file_number() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/manger_data/findgsl/\d{6}$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": []})))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let number = client.patients().allocate_file_number().await.unwrap();

        assert_eq!(number.len(), 6);
    }

    /// Test that allocation gives up after the configured attempts
    #[tokio::test]
    async fn test_allocate_file_number_exhausted() {
        // Arrange: Every lookup reports a collision
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/manger_data/findgsl/\d{6}$"))
            .respond_with(EveryNumberTaken)
            .expect(3)
            .mount(&server)
            .await;
        let config = ClientConfig::new(server.uri()).with_file_number_attempts(3);
        let client = Client::new(config).unwrap();

        // Act
        let result = client.patients().allocate_file_number().await;

        // Assert
        assert!(matches!(result, Err(ApiError::FileNumberExhausted(3))));
    }
}

/// Test suite for report downloads
#[cfg(test)]
mod report_tests {
    use super::*;

    fn pdf_body(len: usize) -> Vec<u8> {
        let mut body = b"%PDF-1.4\n".to_vec();
        body.resize(len, b'x');
        body
    }

    /// Test a report with filename and content type headers
    #[tokio::test]
    async fn test_download_report_headers() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/model_sikleaves_visit/sickleavecreate/p1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(pdf_body(4096), "application/pdf")
                    .insert_header("Content-Disposition", "attachment; filename=\"visit-p1.pdf\""),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        let mut ticks = Vec::new();

        // Act
        let report = client
            .patients()
            .download_report("p1", ReportKind::Visit, |p| ticks.push(p))
            .await
            .unwrap();

        // Assert
        assert_eq!(report.filename, "visit-p1.pdf");
        assert_eq!(report.blob.len(), 4096);
        assert_eq!(report.blob.content_type(), "application/pdf");
        assert!(report.blob.bytes().starts_with(b"%PDF"));
        assert_eq!(ticks.last(), Some(&100));
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]), "progress must not go backwards");
    }

    /// Test the fallback filename
    #[tokio::test]
    async fn test_download_report_fallback_filename() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/medical/p2"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(pdf_body(64), "application/pdf"))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let outcome = client
            .patients()
            .generate_report("p2", ReportKind::Medical, ReportDelivery::StreamedDownload, |_| {})
            .await
            .unwrap();

        match outcome {
            ReportOutcome::File(report) => {
                assert_eq!(report.filename, "sickleaves.pdf");
                assert_eq!(report.blob.len(), 64);
            }
            other => panic!("expected a file, got {:?}", other),
        }
    }

    /// Test that a failing status carries its reason
    #[tokio::test]
    async fn test_download_report_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sick/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let result = client
            .patients()
            .download_report("missing", ReportKind::SickLeave, |_| {})
            .await;

        match result {
            Err(ApiError::Http { status, status_text }) => {
                assert_eq!(status, 404);
                assert_eq!(status_text, "Not Found");
            }
            other => panic!("expected an HTTP error, got {:?}", other),
        }
    }

    /// Test that a response without a body is rejected
    #[tokio::test]
    async fn test_download_report_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/model_sikleaves_comp/sickleavecreate/p3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let result = client
            .patients()
            .download_report("p3", ReportKind::Companion, |_| {})
            .await;

        assert!(matches!(result, Err(ApiError::UnsupportedStream(_))));
    }
}
