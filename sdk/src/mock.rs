//! In-memory stand-in for the storage server, used by the session tests.
//!
//! Requests are serialized to JSON and dispatched on the endpoint path, so
//! the sessions exercise the same serde surface they use against the real
//! server. The mock enforces the protocol rules the real server enforces:
//! chunk indexes must be contiguous and the upload password must match the
//! assigned one.

use {
    crate::transport::Transport,
    anyhow::{bail, Result},
    forsla_protocol::{endpoints::RequestToResponse, Envelope, FileId},
    serde::{de::DeserializeOwned, Serialize},
    serde_json::{json, Value},
    std::{collections::HashMap, sync::Mutex},
};

const UPLOAD_PASSWORD: &str = "mock-upload-password";

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub metadata: Envelope,
    pub chunks: Vec<Envelope>,
    pub finish_flags: Vec<bool>,
    pub delete_password: Option<String>,
    pub finished: bool,
}

#[derive(Debug, Default)]
struct State {
    files: HashMap<String, StoredFile>,
    requests: Vec<&'static str>,
}

#[derive(Debug)]
pub struct MockServer {
    max_filesize: u64,
    state: Mutex<State>,
}

impl MockServer {
    pub fn new(max_filesize: u64) -> Self {
        Self {
            max_filesize,
            state: Mutex::new(State::default()),
        }
    }

    /// Endpoint paths in the order they were called.
    pub fn requests(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn file(&self, file_id: &FileId) -> Option<StoredFile> {
        self.state.lock().unwrap().files.get(&file_id.0).cloned()
    }

    /// Seeds a file directly, bypassing the upload path.
    pub fn insert_file(&self, file_id: &str, file: StoredFile) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(file_id.to_owned(), file);
    }

    fn envelope(value: &Value) -> Envelope {
        Envelope(value.as_str().expect("expected envelope string").to_owned())
    }

    fn handle(&self, path: &'static str, body: &Value) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(path);
        match path {
            "/api/serverinfo" => Ok(json!({ "max_filesize": self.max_filesize })),
            "/api/exists" => {
                let file_id = body["file_id"].as_str().unwrap();
                let reply = match state.files.get(file_id) {
                    Some(file) => json!({
                        "exists": true,
                        "finished": file.finished,
                        "chunks": file.chunks.len(),
                    }),
                    None => json!({ "exists": false, "finished": false, "chunks": 0 }),
                };
                Ok(reply)
            }
            "/api/ip" => Ok(json!({ "upload_ip": "192.0.2.17" })),
            "/api/upload" => {
                let finish = body["finish"].as_bool().unwrap();
                let file_id = format!("file{}", state.files.len());
                state.files.insert(
                    file_id.clone(),
                    StoredFile {
                        metadata: Self::envelope(&body["metadata"]),
                        chunks: vec![Self::envelope(&body["chunk"])],
                        finish_flags: vec![finish],
                        delete_password: body["delete_password"]
                            .as_str()
                            .map(str::to_owned),
                        finished: finish,
                    },
                );
                let upload_password = (!finish).then_some(UPLOAD_PASSWORD);
                Ok(json!({ "file_id": file_id, "upload_password": upload_password }))
            }
            "/api/upload-chunk" => {
                if body["upload_password"].as_str() != Some(UPLOAD_PASSWORD) {
                    bail!("wrong upload password");
                }
                let file_id = body["file_id"].as_str().unwrap();
                let Some(file) = state.files.get_mut(file_id) else {
                    bail!("unknown file id: {file_id}");
                };
                if file.finished {
                    bail!("upload already finished");
                }
                let index = body["index"].as_u64().unwrap();
                if index != file.chunks.len() as u64 {
                    bail!("chunk {index} out of order, expected {}", file.chunks.len());
                }
                let finish = body["finish"].as_bool().unwrap();
                file.chunks.push(Self::envelope(&body["chunk"]));
                file.finish_flags.push(finish);
                file.finished = finish;
                Ok(Value::Null)
            }
            "/api/metadata" => {
                let file_id = body["file_id"].as_str().unwrap();
                let Some(file) = state.files.get(file_id) else {
                    bail!("unknown file id: {file_id}");
                };
                Ok(Value::String(file.metadata.as_str().to_owned()))
            }
            "/api/file-chunk" => {
                let file_id = body["file_id"].as_str().unwrap();
                let Some(file) = state.files.get(file_id) else {
                    bail!("unknown file id: {file_id}");
                };
                let index = usize::try_from(body["index"].as_u64().unwrap()).unwrap();
                let Some(chunk) = file.chunks.get(index) else {
                    bail!("chunk {index} out of range");
                };
                Ok(Value::String(chunk.as_str().to_owned()))
            }
            other => bail!("unexpected request to {other}"),
        }
    }
}

impl Transport for MockServer {
    async fn request<R>(&self, request: &R) -> Result<R::Response>
    where
        R: RequestToResponse + Serialize + Sync,
        R::Response: DeserializeOwned,
    {
        let body = serde_json::to_value(request)?;
        let reply = self.handle(R::PATH, &body)?;
        Ok(serde_json::from_value(reply)?)
    }
}
