//! Session lifecycle test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the core client over
//! real HTTP using ureq as a blocking host. Validates that request building
//! (paths, bearer header, bodies) and response interpretation (payloads,
//! discarded bodies, error mapping) agree with an actual server.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tasks_core::{
    Acknowledgement, ApiError, HttpMethod, HttpRequest, HttpResponse, LoginResponse,
    MemoryTokenStore, RequestDescriptor, Task, TaskClient, User,
};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match req.method {
        HttpMethod::Get | HttpMethod::Delete => {
            let mut builder = if req.method == HttpMethod::Get {
                agent.get(&req.path)
            } else {
                agent.delete(&req.path)
            };
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder.call()
        }
        HttpMethod::Post | HttpMethod::Patch => {
            let mut builder = if req.method == HttpMethod::Post {
                agent.post(&req.path)
            } else {
                agent.patch(&req.path)
            };
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            match req.body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse {
        status,
        headers: Vec::new(),
        body,
    }
}

/// Build, execute and interpret one call.
fn call(client: &TaskClient, descriptor: RequestDescriptor) -> Result<Option<Value>, ApiError> {
    let req = client.build_request(&descriptor)?;
    client.parse_response(descriptor.endpoint, execute(req))
}

/// Like `call`, decoding the payload into `T`.
fn call_as<T: DeserializeOwned>(
    client: &TaskClient,
    descriptor: RequestDescriptor,
) -> Result<T, ApiError> {
    let req = client.build_request(&descriptor)?;
    client.parse_response_as(descriptor.endpoint, execute(req))
}

fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            let app = mock_server::app_with_admin("root", "root-password");
            mock_server::run(listener, app).await
        })
        .unwrap();
    });

    addr
}

#[test]
fn session_lifecycle() {
    // Step 1: start mock server on a random port.
    let addr = start_server();
    let tokens = Arc::new(MemoryTokenStore::new());
    let client = TaskClient::new(&format!("http://{addr}"), tokens.clone());

    // Step 2: no token yet, so the authenticated call is rejected.
    let err = call(&client, RequestDescriptor::get_me()).unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.message(), "invalid token");

    // Step 3: sign up discards its body.
    let sign_up = RequestDescriptor::sign_up("alice", "secret-pw").unwrap();
    assert!(call(&client, sign_up).unwrap().is_none());

    // Step 4: wrong password, the server message wins.
    let login = RequestDescriptor::login("alice", "wrong-pw").unwrap();
    let err = call(&client, login).unwrap_err();
    assert_eq!(err.message(), "bad credentials");

    // Step 5: login and keep the token.
    let login = RequestDescriptor::login("alice", "secret-pw").unwrap();
    let login: LoginResponse = call_as(&client, login).unwrap();
    tokens.set(login.token);

    // Step 6: profile.
    let me: User = call_as(&client, RequestDescriptor::get_me()).unwrap();
    assert_eq!(me.name, "alice");
    assert_eq!(me.role, "user");

    // Step 7: create a task.
    let create = RequestDescriptor::create_new_task("buy milk", "2% milk").unwrap();
    let created: Task = call_as(&client, create).unwrap();
    assert_eq!(created.title, "buy milk");
    assert_eq!(created.user_id, me.id);

    // Step 8: switch and retitle.
    let switch = RequestDescriptor::switch_task_status(created.id);
    let switched: Task = call_as(&client, switch).unwrap();
    assert!(switched.is_completed);

    let retitle = RequestDescriptor::change_task_title(created.id, "").unwrap();
    let err = call(&client, retitle).unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.message(), "title must be not empty");

    // Step 9: list holds the one task.
    let tasks: Vec<Task> = call_as(&client, RequestDescriptor::get_my_tasks()).unwrap();
    assert_eq!(tasks.len(), 1);

    // Step 10: admin endpoints are off limits.
    let err = call(&client, RequestDescriptor::get_all_users_admin()).unwrap_err();
    assert_eq!(err.message(), "insufficient permissions");

    // Step 11: delete, then delete again.
    let delete = RequestDescriptor::delete_task(created.id);
    let ack: Acknowledgement = call_as(&client, delete).unwrap();
    assert_eq!(ack.id, created.id);

    let err = call(&client, RequestDescriptor::delete_task(created.id)).unwrap_err();
    assert_eq!(err.message(), "resource not found");

    // Step 12: a non-numeric id is rejected with the server's message.
    let err = call(&client, RequestDescriptor::delete_task("t1")).unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.message().starts_with("malformed id"));
}

#[test]
fn admin_creation_discards_body() {
    let addr = start_server();
    let tokens = Arc::new(MemoryTokenStore::new());
    let client = TaskClient::new(&format!("http://{addr}"), tokens.clone());

    let login = RequestDescriptor::login("root", "root-password").unwrap();
    let login: LoginResponse = call_as(&client, login).unwrap();
    tokens.set(login.token);

    let create = RequestDescriptor::create_new_user_admin("dave", "dave-password").unwrap();
    assert!(call(&client, create).unwrap().is_none());

    let users: Vec<User> = call_as(&client, RequestDescriptor::get_all_users_admin()).unwrap();
    assert!(users.iter().any(|u| u.name == "dave" && u.role == "user"));
}
