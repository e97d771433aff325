//! Verify request building and response interpretation against the JSON
//! fixtures in `test-vectors/`.
//!
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences.

use std::sync::Arc;

use serde_json::Value;
use tasks_core::{
    Endpoint, HttpMethod, HttpResponse, RequestDescriptor, StaticToken, TaskClient,
};

const BASE_URL: &str = "http://localhost:8080";

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_endpoint(s: &str) -> Endpoint {
    Endpoint::ALL
        .into_iter()
        .find(|e| format!("{e:?}") == s)
        .unwrap_or_else(|| panic!("unknown endpoint: {s}"))
}

fn descriptor(operation: &str, args: &[&str]) -> RequestDescriptor {
    match (operation, args) {
        ("sign_up", [name, password]) => RequestDescriptor::sign_up(name, password).unwrap(),
        ("login", [name, password]) => RequestDescriptor::login(name, password).unwrap(),
        ("get_me", []) => RequestDescriptor::get_me(),
        ("rename_me", [name]) => RequestDescriptor::rename_me(name).unwrap(),
        ("change_my_password", [old, new]) => {
            RequestDescriptor::change_my_password(old, new).unwrap()
        }
        ("delete_me", []) => RequestDescriptor::delete_me(),
        ("create_new_task", [title, description]) => {
            RequestDescriptor::create_new_task(title, description).unwrap()
        }
        ("switch_task_status", [id]) => RequestDescriptor::switch_task_status(id),
        ("change_task_description", [id, description]) => {
            RequestDescriptor::change_task_description(id, description).unwrap()
        }
        ("change_user_password_admin", [id, old, new]) => {
            RequestDescriptor::change_user_password_admin(id, old, new).unwrap()
        }
        ("update_user_role_admin", [id]) => RequestDescriptor::update_user_role_admin(id),
        ("delete_task_admin", [id]) => RequestDescriptor::delete_task_admin(id),
        ("create_new_task_admin", [id, title, description]) => {
            RequestDescriptor::create_new_task_admin(id, title, description).unwrap()
        }
        (other, _) => panic!("unknown operation or arity: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let token = vectors["token"].as_str().unwrap();
    let c = TaskClient::new(BASE_URL, Arc::new(StaticToken::new(token)));

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let args: Vec<&str> = case["args"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a.as_str().unwrap())
            .collect();
        let expected_req = &case["expected_request"];

        let operation = case["operation"].as_str().unwrap();
        let req = c.build_request(&descriptor(operation, &args)).unwrap();
        let method = parse_method(expected_req["method"].as_str().unwrap());
        assert_eq!(req.method, method, "{name}: method");
        let path = format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap());
        assert_eq!(req.path, path, "{name}: path");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let key = h[0].as_str().unwrap().to_string();
                let value = h[1].as_str().unwrap().to_string();
                (key, value)
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        match req.body.as_deref() {
            Some(body) => {
                let req_body: Value = serde_json::from_str(body).unwrap();
                assert_eq!(req_body, expected_req["body"], "{name}: body");
            }
            None => assert!(expected_req["body"].is_null(), "{name}: missing body"),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = TaskClient::anonymous(BASE_URL);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let endpoint = parse_endpoint(case["endpoint"].as_str().unwrap());

        let sim = &case["simulated_response"];
        let status = sim["status"].as_u64().unwrap() as u16;
        let response = HttpResponse {
            status,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let result = c.parse_response(endpoint, response);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            let expected = expected_error.as_str().unwrap();
            assert_eq!(err.message(), expected, "{name}: message");
            assert_eq!(err.status(), Some(status), "{name}: status");
        } else {
            let value = result.unwrap();
            let expected = &case["expected_result"];
            if expected.is_null() {
                assert!(value.is_none(), "{name}: body should be discarded");
            } else {
                assert_eq!(value.as_ref(), Some(expected), "{name}: parsed result");
            }
        }
    }
}
