mod common;

use chroma_client::{Embedder, Error, OpenAiEmbedder};
use common::blocking;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn embeddings_fixture() -> serde_json::Value {
    json!({
        "object": "list",
        "data": [
            {
                "object": "embedding",
                "embedding": [0.0023064255, -0.009327292, -0.0028842222],
                "index": 0
            },
            {
                "object": "embedding",
                "embedding": [1.0023064255, 2.009327292, 3.0028842222],
                "index": 1
            }
        ],
        "model": "text-embedding-ada-002",
        "usage": {"prompt_tokens": 8, "total_tokens": 8}
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn embeds_documents_in_one_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "text-embedding-ada-002",
            "input": ["foo", "bar"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(embeddings_fixture()))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::with_endpoint(&server.uri(), "sk-test");
    let vectors = blocking(move || embedder.embed_documents(&["foo", "bar"]))
        .await
        .unwrap();

    assert_eq!(vectors.len(), 2);
    assert!(vectors.iter().all(|v| v.len() == 3));
    assert!(vectors[1][0] >= 1.0);
    assert!(vectors[1][1] >= 2.0);
    assert!(vectors[1][2] >= 3.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_query_takes_first_vector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({"input": ["foo"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(embeddings_fixture()))
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::with_endpoint(&server.uri(), "sk-test");
    let vector = blocking(move || embedder.embed_query("foo")).await.unwrap();
    assert_eq!(vector.len(), 3);
    assert!(vector[0] < 0.01);
}

#[tokio::test(flavor = "multi_thread")]
async fn custom_model_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({"model": "text-embedding-3-small"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(embeddings_fixture()))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::with_endpoint(&server.uri(), "sk-test")
        .with_model("text-embedding-3-small");
    blocking(move || embedder.embed_query("foo")).await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_error_status_fails_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "Incorrect API key provided"}})),
        )
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::with_endpoint(&server.uri(), "bad");
    let err = blocking(move || embedder.embed_documents(&["foo"]))
        .await
        .unwrap_err();
    match err {
        Error::Embedding(message) => {
            assert!(message.contains("401"));
            assert!(message.contains("Incorrect API key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_results_fail_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "model": "text-embedding-ada-002",
            "usage": {"prompt_tokens": 0, "total_tokens": 0}
        })))
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::with_endpoint(&server.uri(), "sk-test");
    let err = blocking(move || embedder.embed_documents(&["foo"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_response_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"data\": 12}"))
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::with_endpoint(&server.uri(), "sk-test");
    let err = blocking(move || embedder.embed_documents(&["foo"]))
        .await
        .unwrap_err();
    match err {
        Error::Decode { message, .. } => assert!(message.contains("{\"data\": 12}")),
        other => panic!("unexpected error: {other:?}"),
    }
}
