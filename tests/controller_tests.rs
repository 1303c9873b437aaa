mod common;

use serde_json::{json, Value};
use vetted::request::Method;

use common::{registry, request, server};

fn body(response: &vetted::response::Response<String>) -> Value {
    serde_json::from_str(response.body()).unwrap()
}

#[tokio::test]
async fn test_list_without_query() {
    let server = server(&registry());

    let response = server
        .dispatch(request(Method::GET, "/power-rangers", ""))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(body(&response).as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_list_coerces_single_and_repeated_query_values() {
    let server = server(&registry());

    let single = server
        .dispatch(request(Method::GET, "/power-rangers/?seasons=4", ""))
        .await;
    let repeated = server
        .dispatch(request(Method::GET, "/power-rangers?seasons=1&seasons=3", ""))
        .await;

    assert_eq!(single.status(), 200);
    assert_eq!(body(&single)[0]["name"], "Tommy");
    assert_eq!(body(&single).as_array().unwrap().len(), 1);

    assert_eq!(repeated.status(), 200);
    assert_eq!(body(&repeated)[0]["name"], "Kimberly");
    assert_eq!(body(&repeated).as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_rejects_invalid_query() {
    let server = server(&registry());

    let response = server
        .dispatch(request(Method::GET, "/power-rangers?seasons=one&seasons=0", ""))
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(
        body(&response)["issues"],
        json!([
            { "path": ["query", "seasons", 0], "message": "Expected number, received string" },
            { "path": ["query", "seasons", 1], "message": "Number must be greater than or equal to 1" },
        ])
    );
}

#[tokio::test]
async fn test_get_by_id_coerces_path_param() {
    let server = server(&registry());

    let response = server
        .dispatch(request(Method::GET, "/power-rangers/2", ""))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(body(&response)["name"], "Kimberly");
}

#[tokio::test]
async fn test_get_by_id_rejects_non_numeric_id() {
    let server = server(&registry());

    let response = server
        .dispatch(request(Method::GET, "/power-rangers/red", ""))
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(body(&response)["message"], "Request validation failed");
    assert_eq!(body(&response)["issues"][0]["path"], json!(["params", "id"]));
}

#[tokio::test]
async fn test_whole_float_ids_reach_integer_handlers() {
    let server = server(&registry());

    for uri in ["/power-rangers/1.0", "/power-rangers/1e0", "/power-rangers/%31"] {
        let response = server.dispatch(request(Method::GET, uri, "")).await;

        assert_eq!(response.status(), 200, "{uri}");
        assert_eq!(body(&response)["name"], "Jason", "{uri}");
    }

    let seasons = server
        .dispatch(request(Method::GET, "/power-rangers?seasons=4.0", ""))
        .await;
    assert_eq!(seasons.status(), 200);
    assert_eq!(body(&seasons)[0]["name"], "Tommy");
}

#[tokio::test]
async fn test_out_of_range_id_is_rejected() {
    let server = server(&registry());

    let response = server
        .dispatch(request(Method::GET, "/power-rangers/18446744073709551616", ""))
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(
        body(&response)["issues"],
        json!([{ "path": ["params", "id"], "message": "Integer is out of range" }])
    );
}

#[tokio::test]
async fn test_undecodable_path_segment_is_rejected() {
    let server = server(&registry());

    let response = server
        .dispatch(request(Method::GET, "/power-rangers/%FF", ""))
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(response.headers()["content-type"], "application/json");
}

#[tokio::test]
async fn test_handler_errors_pass_through() {
    let server = server(&registry());

    let response = server
        .dispatch(request(Method::GET, "/power-rangers/99", ""))
        .await;

    assert_eq!(response.status(), 404);
    assert_eq!(body(&response)["message"], "Ranger 99 not found");
}

#[tokio::test]
async fn test_create_answers_created_and_strips_unknown_keys() {
    let server = server(&registry());

    let response = server
        .dispatch(request(
            Method::POST,
            "/power-rangers",
            r#"{"name":"Billy","color":"blue","zord":"triceratops"}"#,
        ))
        .await;

    assert_eq!(response.status(), 201);
    assert_eq!(
        body(&response),
        json!({ "id": 4, "name": "Billy", "color": "blue", "seasons": [] })
    );
}

#[tokio::test]
async fn test_create_rejects_invalid_body() {
    let server = server(&registry());

    let missing = server
        .dispatch(request(Method::POST, "/power-rangers", r#"{"color":"gold"}"#))
        .await;
    let empty = server
        .dispatch(request(Method::POST, "/power-rangers", ""))
        .await;
    let malformed = server
        .dispatch(request(Method::POST, "/power-rangers", "{name"))
        .await;

    assert_eq!(missing.status(), 400);
    assert_eq!(
        body(&missing)["issues"],
        json!([
            { "path": ["body", "name"], "message": "Required" },
            {
                "path": ["body", "color"],
                "message": "Invalid enum value. Expected 'red' | 'pink' | 'green' | 'blue', received 'gold'"
            },
        ])
    );

    assert_eq!(empty.status(), 400);
    assert_eq!(
        body(&empty)["issues"][0]["message"],
        "Expected object, received null"
    );

    assert_eq!(malformed.status(), 400);
}

#[tokio::test]
async fn test_mismatched_response_is_still_sent() {
    let server = server(&registry());

    let response = server
        .dispatch(request(Method::DELETE, "/power-rangers/1", ""))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(body(&response), json!({ "retired": "yes" }));
}

#[tokio::test]
async fn test_unknown_route_and_method() {
    let server = server(&registry());

    let unknown = server
        .dispatch(request(Method::GET, "/villains", ""))
        .await;
    let wrong_method = server
        .dispatch(request(Method::PUT, "/power-rangers/1", ""))
        .await;

    assert_eq!(unknown.status(), 404);
    assert_eq!(wrong_method.status(), 404);
}
