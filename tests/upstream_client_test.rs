//! HTTP fetcher against a local mock server

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eess_prices::config::MunicipalityId;
use eess_prices::error::FetchErrorKind;
use eess_prices::upstream::{HttpStationSource, StationSource};

fn source_for(server: &MockServer) -> HttpStationSource {
    HttpStationSource::with_base_url(&format!("{}/FiltroMunicipio/", server.uri())).unwrap()
}

fn madrid() -> MunicipalityId {
    MunicipalityId::new(4284).unwrap()
}

#[tokio::test]
async fn fetch_returns_decoded_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/FiltroMunicipio/4284"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Fecha": "18/10/2026 10:00:00",
            "ListaEESSPrecio": [{"Rótulo": "A", "Precio Gasolina 95 E5": "1,459"}],
            "ResultadoConsulta": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = source_for(&server).fetch(madrid()).await.unwrap();
    assert_eq!(doc["ListaEESSPrecio"][0]["Rótulo"], "A");
}

#[tokio::test]
async fn fetch_maps_server_error_to_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/FiltroMunicipio/4284"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = source_for(&server).fetch(madrid()).await.unwrap_err();
    assert_eq!(err.fetch_kind(), Some(FetchErrorKind::HttpStatus));
    assert!(err.to_string().contains("HTTP 500"));
    assert!(err.to_string().contains("/FiltroMunicipio/4284"));
}

#[tokio::test]
async fn fetch_maps_invalid_json_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/FiltroMunicipio/4284"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>mantenimiento</html>"))
        .mount(&server)
        .await;

    let err = source_for(&server).fetch(madrid()).await.unwrap_err();
    assert_eq!(err.fetch_kind(), Some(FetchErrorKind::Decode));
}

#[tokio::test]
async fn fetch_tolerates_byte_order_mark() {
    let server = MockServer::start().await;
    let mut body = b"\xEF\xBB\xBF".to_vec();
    body.extend_from_slice(br#"{"ListaEESSPrecio": []}"#);
    Mock::given(method("GET"))
        .and(path("/FiltroMunicipio/4284"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    let doc = source_for(&server).fetch(madrid()).await.unwrap();
    assert!(doc["ListaEESSPrecio"].as_array().unwrap().is_empty());
}
