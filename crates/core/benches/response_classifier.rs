use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use oidcflow_core::response::flatten_json_body;
use oidcflow_core::{ClassifyContext, ProtocolState, ResponseClassifier};

fn token_response_body() -> String {
    let id_token = format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
        URL_SAFE_NO_PAD.encode(
            r#"{"tid":"tenant-a","oid":"object-1","upn":"alice@contoso.com","iat":1700000000,"exp":1700003600}"#
        )
    );
    serde_json::json!({
        "access_token": "A".repeat(1200),
        "refresh_token": "R".repeat(600),
        "expires_in": "3599",
        "ext_expires_in": "7199",
        "resource": "https://graph.example.com",
        "id_token": id_token,
        "foci": "1"
    })
    .to_string()
}

fn bench_classify(c: &mut Criterion) {
    let classifier = ResponseClassifier::default();
    let body = token_response_body();
    let params: HashMap<String, String> = flatten_json_body(&body).unwrap();
    let ctx = ClassifyContext::now(None);

    c.bench_function("flatten_json_body", |b| {
        b.iter(|| flatten_json_body(black_box(&body)).unwrap());
    });

    c.bench_function("classify_access_token_response", |b| {
        b.iter(|| classifier.classify(black_box(&params), &ctx));
    });
}

fn bench_state(c: &mut Criterion) {
    let state = ProtocolState::new("https://login.example.com/common", "https://graph.example.com");
    let encoded = state.encode();

    c.bench_function("protocol_state_decode", |b| {
        b.iter(|| ProtocolState::decode(black_box(&encoded)).unwrap());
    });
}

criterion_group!(benches, bench_classify, bench_state);
criterion_main!(benches);
