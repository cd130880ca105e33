//! Full CRUD lifecycle against a live server.
//!
//! # Design
//! Starts the server on a random port, then exercises every endpoint over
//! real HTTP using ureq, checking status codes and JSON bodies end-to-end.

use todo_server::config::Config;
use todo_server::AppState;

struct Reply {
    status: u16,
    body: String,
}

impl Reply {
    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`.
fn execute(method: &str, url: &str, body: Option<&str>) -> Reply {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (method, body) {
        ("GET", _) => agent.get(url).call(),
        ("DELETE", _) => agent.delete(url).call(),
        ("POST", Some(body)) => agent
            .post(url)
            .content_type("application/json")
            .send(body.as_bytes()),
        ("PUT", Some(body)) => agent
            .put(url)
            .content_type("application/json")
            .send(body.as_bytes()),
        (other, _) => panic!("unsupported request: {other}"),
    }
    .expect("HTTP transport error");

    Reply {
        status: response.status().as_u16(),
        body: response.body_mut().read_to_string().unwrap_or_default(),
    }
}

#[test]
fn crud_lifecycle() {
    // Step 1: start the server, seeded with five items, on a random port.
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let config = Config {
        seed_sample_data: true,
        ..Config::default()
    };
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            todo_server::run(listener, AppState::from_config(&config)).await
        })
        .unwrap();
    });

    let base = format!("http://{addr}/api/todo");

    // Step 2: list the seeded items.
    let reply = execute("GET", &base, None);
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json().as_array().unwrap().len(), 5);

    // Step 3: create; the id follows the current maximum.
    let reply = execute("POST", &base, Some(r#"{"name":"New Task"}"#));
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json()["id"], 6);

    // Step 4: duplicate name is a validation problem.
    let reply = execute("POST", &base, Some(r#"{"name":"New Task"}"#));
    assert_eq!(reply.status, 400);
    assert_eq!(
        reply.json()["errors"]["name"][0],
        "The specified name already exists."
    );

    // Step 5: fetch the new item.
    let reply = execute("GET", &format!("{base}/6"), None);
    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.json(),
        serde_json::json!({"id": 6, "name": "New Task", "completed": false})
    );

    // Step 6: complete it.
    let reply = execute(
        "PUT",
        &format!("{base}/6"),
        Some(r#"{"id":6,"name":"New Task","completed":true}"#),
    );
    assert_eq!(reply.status, 204);

    let reply = execute("GET", &format!("{base}/6"), None);
    assert_eq!(reply.json()["completed"], true);

    // Step 7: delete, then confirm it is gone.
    let reply = execute("DELETE", &format!("{base}/6"), None);
    assert_eq!(reply.status, 204);

    let reply = execute("GET", &format!("{base}/6"), None);
    assert_eq!(reply.status, 404);

    // Step 8: deleting again is NotFound.
    let reply = execute("DELETE", &format!("{base}/6"), None);
    assert_eq!(reply.status, 404);
    assert_eq!(
        reply.json()["detail"],
        "Entity \"ToDoItem\" (6) was not found."
    );
}
