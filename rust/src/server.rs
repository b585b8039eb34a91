use anyhow::{anyhow, Context, Result};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;

use crate::export::project_to_rows;
use crate::field_model::{FieldId, FieldModel};
use crate::form::{copy_all_text, form_sections, resolved_value, FieldValue};
use crate::gemini::{GeminiClient, ImagePart};
use crate::generation_store::GenerationStore;
use crate::main_ui_html::build_main_ui_html;
use crate::pptx;
use crate::rule_engine::{generate_form_output, FormOutput};
use crate::spreadsheet::{export_file_name, upload_to_drive, write_workbook, XLSX_MIME};

pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// 現在編集中のフォーム。生成出力と編集状態をひとまとめに持つ。
/// 元の解析結果は履歴ストア側に保存されている。
pub struct FormSession {
    pub generation_id: String,
    pub product_model: String,
    pub output: FormOutput,
    pub fields: FieldModel,
}

pub struct AppState {
    pub generations: Mutex<GenerationStore>,
    pub session: Mutex<Option<FormSession>>,
    pub gemini: GeminiClient,
    pub http: reqwest::Client,
    pub server_port: AtomicU16,
}

type ApiResponse = (StatusCode, Json<Value>);

impl AppState {
    pub fn new(generations: GenerationStore, gemini: GeminiClient) -> Self {
        Self {
            generations: Mutex::new(generations),
            session: Mutex::new(None),
            gemini,
            http: reqwest::Client::new(),
            server_port: AtomicU16::new(0),
        }
    }
}

pub struct AppServer {
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl AppServer {
    pub fn start(state: Arc<AppState>, preferred_port: u16) -> Result<Self> {
        let listener = bind_listener(preferred_port)?;
        let port = listener
            .local_addr()
            .context("failed to inspect server local address")?
            .port();
        listener
            .set_nonblocking(true)
            .context("failed to set listener non-blocking")?;

        state.server_port.store(port, Ordering::Relaxed);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let thread_handle = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();
            let Ok(runtime) = runtime else {
                return;
            };

            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(_) => return,
                };

                let app = build_router(state);
                let server = axum::serve(listener, app).with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                });
                let _ = server.await;
            });
        });

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
            thread_handle: Some(thread_handle),
        })
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    /// サーバースレッドが終わるまでブロックする（通常はCtrl-Cまで）。
    pub fn wait(mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for AppServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Serialize)]
struct SectionSnapshot {
    id: FieldId,
    number: &'static str,
    label: &'static str,
    editable: bool,
    multiline: bool,
    multi_option: bool,
    // 複数案フィールドのみ: 各案の現在値（編集適用済み）
    options: Vec<String>,
    selected: usize,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SelectVariantReq {
    field: FieldId,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct EditFieldReq {
    field: FieldId,
    index: Option<usize>,
    value: String,
}

#[derive(Debug, Deserialize)]
struct HistoryIdReq {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DriveExportReq {
    access_token: String,
}

fn build_router(state: Arc<AppState>) -> Router {
    let port = state.server_port.load(Ordering::Relaxed);
    let local_origin = HeaderValue::from_str(&format!("http://127.0.0.1:{port}"))
        .expect("127.0.0.1 origin should be valid");
    let localhost_origin = HeaderValue::from_str(&format!("http://localhost:{port}"))
        .expect("localhost origin should be valid");

    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("null"),
            local_origin,
            localhost_origin,
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(get_main_page))
        .route("/ping", get(get_ping))
        .route("/api/analyze", post(post_analyze))
        .route("/api/form", get(get_form))
        .route("/api/form/select", post(post_form_select))
        .route("/api/form/edit", post(post_form_edit))
        .route("/api/form/copy-text", get(get_form_copy_text))
        .route("/api/history", get(get_history))
        .route("/api/history/load", post(post_history_load))
        .route("/api/history/delete", post(post_history_delete))
        .route("/api/export", get(get_export))
        .route("/api/export/drive", post(post_export_drive))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 200_000))
        .layer(cors)
        .with_state(state)
}

async fn get_main_page() -> Html<String> {
    Html(build_main_ui_html())
}

async fn get_ping() -> ApiResponse {
    ok_json(json!({}))
}

async fn post_analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResponse {
    let mut file_name = String::from("upload.bin");
    let mut file_mime = String::new();
    let mut file_data = Vec::new();
    let mut product_model = String::new();
    let mut main_selling_point = String::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let field_name = field.name().unwrap_or_default().to_string();
                match field_name.as_str() {
                    "file" => {
                        file_name = field
                            .file_name()
                            .map(ToOwned::to_owned)
                            .unwrap_or_else(|| "upload.bin".to_string());
                        file_mime = field
                            .content_type()
                            .map(ToOwned::to_owned)
                            .unwrap_or_default();
                        match field.bytes().await {
                            Ok(bytes) => file_data = bytes.to_vec(),
                            Err(_) => return err_json(StatusCode::BAD_REQUEST, "invalid file"),
                        }
                    }
                    "product_model" => match field.text().await {
                        Ok(value) => product_model = value.trim().to_string(),
                        Err(_) => {
                            return err_json(StatusCode::BAD_REQUEST, "invalid product_model")
                        }
                    },
                    "main_selling_point" => match field.text().await {
                        Ok(value) => main_selling_point = value.trim().to_string(),
                        Err(_) => {
                            return err_json(StatusCode::BAD_REQUEST, "invalid main_selling_point")
                        }
                    },
                    _ => {}
                }
            }
            Ok(None) => break,
            Err(_) => return err_json(StatusCode::BAD_REQUEST, "invalid multipart request"),
        }
    }

    if file_data.is_empty() {
        return err_json(StatusCode::BAD_REQUEST, "ファイルが必要です");
    }
    if file_data.len() > MAX_UPLOAD_BYTES {
        return err_json(StatusCode::BAD_REQUEST, "ファイルサイズが20MBを超えています");
    }

    let images = match build_image_parts(&file_name, &file_mime, file_data) {
        Ok(images) => images,
        Err(err) => return err_json(StatusCode::BAD_REQUEST, &err.to_string()),
    };

    let hint = if main_selling_point.is_empty() {
        None
    } else {
        Some(main_selling_point.as_str())
    };
    let analysis = match state.gemini.analyze_images(&images, hint).await {
        Ok(analysis) => analysis,
        Err(err) => {
            return err_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("解析に失敗しました: {err}"),
            )
        }
    };

    let output = generate_form_output(&analysis);
    let model_for_history = if product_model.is_empty() {
        analysis.product.model.clone()
    } else {
        product_model
    };

    let generation_id = {
        let mut generations = match state.generations.lock() {
            Ok(guard) => guard,
            Err(_) => {
                return err_json(StatusCode::INTERNAL_SERVER_ERROR, "generation store lock error")
            }
        };
        match generations.append(&model_for_history, &analysis) {
            Ok(entry) => entry.id,
            // 履歴保存に失敗しても解析結果は返す
            Err(_) => String::new(),
        }
    };

    let new_session = FormSession {
        generation_id,
        product_model: model_for_history,
        output,
        fields: FieldModel::new(),
    };
    let snapshot = build_session_snapshot(&new_session);

    {
        let mut session = match state.session.lock() {
            Ok(guard) => guard,
            Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "session lock error"),
        };
        *session = Some(new_session);
    }

    ok_json(snapshot)
}

async fn get_form(State(state): State<Arc<AppState>>) -> ApiResponse {
    let session = match state.session.lock() {
        Ok(guard) => guard,
        Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "session lock error"),
    };

    match session.as_ref() {
        Some(current) => ok_json(build_session_snapshot(current)),
        None => ok_json(json!({ "session": Value::Null })),
    }
}

async fn post_form_select(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SelectVariantReq>,
) -> ApiResponse {
    if payload.index > 2 {
        return err_json(StatusCode::BAD_REQUEST, "案番号は0〜2で指定してください");
    }

    let mut session = match state.session.lock() {
        Ok(guard) => guard,
        Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "session lock error"),
    };
    let Some(current) = session.as_mut() else {
        return err_json(StatusCode::NOT_FOUND, "フォームが生成されていません");
    };

    current.fields.select_variant(payload.field, payload.index);
    ok_json(build_session_snapshot(current))
}

async fn post_form_edit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EditFieldReq>,
) -> ApiResponse {
    if matches!(payload.index, Some(index) if index > 2) {
        return err_json(StatusCode::BAD_REQUEST, "案番号は0〜2で指定してください");
    }

    let mut session = match state.session.lock() {
        Ok(guard) => guard,
        Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "session lock error"),
    };
    let Some(current) = session.as_mut() else {
        return err_json(StatusCode::NOT_FOUND, "フォームが生成されていません");
    };

    current
        .fields
        .set_value(payload.field, payload.index, payload.value);
    ok_json(build_session_snapshot(current))
}

async fn get_form_copy_text(State(state): State<Arc<AppState>>) -> ApiResponse {
    let session = match state.session.lock() {
        Ok(guard) => guard,
        Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "session lock error"),
    };
    let Some(current) = session.as_ref() else {
        return err_json(StatusCode::NOT_FOUND, "フォームが生成されていません");
    };

    ok_json(json!({ "text": copy_all_text(&current.output, &current.fields) }))
}

async fn get_history(State(state): State<Arc<AppState>>) -> ApiResponse {
    let generations = match state.generations.lock() {
        Ok(guard) => guard,
        Err(_) => {
            return err_json(StatusCode::INTERNAL_SERVER_ERROR, "generation store lock error")
        }
    };

    match generations.list() {
        Ok(entries) => {
            let history: Vec<Value> = entries
                .iter()
                .map(|entry| {
                    json!({
                        "id": entry.id,
                        "product_model": entry.product_model,
                        "created_at": entry.created_at,
                    })
                })
                .collect();
            ok_json(json!({ "history": history }))
        }
        Err(err) => err_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("履歴の取得に失敗しました: {err}"),
        ),
    }
}

async fn post_history_load(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<HistoryIdReq>,
) -> ApiResponse {
    let entry = {
        let generations = match state.generations.lock() {
            Ok(guard) => guard,
            Err(_) => {
                return err_json(StatusCode::INTERNAL_SERVER_ERROR, "generation store lock error")
            }
        };
        match generations.find(&payload.id) {
            Ok(Some(entry)) => entry,
            Ok(None) => return err_json(StatusCode::NOT_FOUND, "履歴が見つかりません"),
            Err(err) => {
                return err_json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("履歴の取得に失敗しました: {err}"),
                )
            }
        }
    };

    let output = generate_form_output(&entry.analysis_result);
    let new_session = FormSession {
        generation_id: entry.id,
        product_model: entry.product_model,
        output,
        fields: FieldModel::new(),
    };
    let snapshot = build_session_snapshot(&new_session);

    let mut session = match state.session.lock() {
        Ok(guard) => guard,
        Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "session lock error"),
    };
    *session = Some(new_session);
    ok_json(snapshot)
}

async fn post_history_delete(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<HistoryIdReq>,
) -> ApiResponse {
    let mut generations = match state.generations.lock() {
        Ok(guard) => guard,
        Err(_) => {
            return err_json(StatusCode::INTERNAL_SERVER_ERROR, "generation store lock error")
        }
    };

    match generations.delete(&payload.id) {
        Ok(true) => ok_json(json!({})),
        Ok(false) => err_json(StatusCode::NOT_FOUND, "履歴が見つかりません"),
        Err(err) => err_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("削除に失敗しました: {err}"),
        ),
    }
}

async fn get_export(State(state): State<Arc<AppState>>) -> axum::response::Response {
    let (bytes, file_name) = {
        let session = match state.session.lock() {
            Ok(guard) => guard,
            Err(_) => {
                return err_json(StatusCode::INTERNAL_SERVER_ERROR, "session lock error")
                    .into_response()
            }
        };
        let Some(current) = session.as_ref() else {
            return err_json(StatusCode::NOT_FOUND, "フォームが生成されていません").into_response();
        };

        let rows = project_to_rows(&current.output, &current.fields);
        let bytes = match write_workbook(&rows) {
            Ok(bytes) => bytes,
            Err(err) => {
                return err_json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("エクスポートに失敗しました: {err}"),
                )
                .into_response()
            }
        };
        let model = current
            .fields
            .value_or(FieldId::Model, None, &current.output.model)
            .to_string();
        (bytes, export_file_name(&model))
    };

    let disposition = format!(
        "attachment; filename=\"export.xlsx\"; filename*=UTF-8''{}",
        urlencoding::encode(&file_name)
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

async fn post_export_drive(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DriveExportReq>,
) -> ApiResponse {
    let access_token = payload.access_token.trim().to_string();
    if access_token.is_empty() {
        return err_json(
            StatusCode::UNAUTHORIZED,
            "Google認証トークンが必要です。Googleアカウントでログインしてください。",
        );
    }

    let (bytes, file_name) = {
        let session = match state.session.lock() {
            Ok(guard) => guard,
            Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "session lock error"),
        };
        let Some(current) = session.as_ref() else {
            return err_json(StatusCode::NOT_FOUND, "フォームが生成されていません");
        };

        let rows = project_to_rows(&current.output, &current.fields);
        let bytes = match write_workbook(&rows) {
            Ok(bytes) => bytes,
            Err(err) => {
                return err_json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("エクスポートに失敗しました: {err}"),
                )
            }
        };
        let model = current
            .fields
            .value_or(FieldId::Model, None, &current.output.model)
            .to_string();
        (bytes, export_file_name(&model))
    };

    match upload_to_drive(&state.http, bytes, &file_name, &access_token).await {
        Ok(uploaded) => ok_json(json!({
            "file_id": uploaded.id,
            "file_name": uploaded.name,
            "web_view_link": uploaded.web_view_link,
        })),
        Err(err) => {
            let message = err.to_string();
            let status = if message.contains("トークンが無効") {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            err_json(status, &message)
        }
    }
}

/// アップロードされたファイルを解析用の画像列に変換する。
/// PPTXはスライド内の画像を抽出し、それ以外は1枚の画像として扱う。
fn build_image_parts(file_name: &str, mime: &str, data: Vec<u8>) -> Result<Vec<ImagePart>> {
    let lower_name = file_name.to_ascii_lowercase();
    if mime == pptx::PPTX_MIME || lower_name.ends_with(".pptx") {
        return pptx::extract_images(&data);
    }

    let mime_type = if !mime.is_empty() {
        mime.to_string()
    } else if lower_name.ends_with(".png") {
        "image/png".to_string()
    } else if lower_name.ends_with(".jpg") || lower_name.ends_with(".jpeg") {
        "image/jpeg".to_string()
    } else if lower_name.ends_with(".webp") {
        "image/webp".to_string()
    } else if lower_name.ends_with(".pdf") {
        "application/pdf".to_string()
    } else {
        return Err(anyhow!("未対応のファイル形式です: {file_name}"));
    };

    Ok(vec![ImagePart {
        mime_type,
        data,
    }])
}

fn build_session_snapshot(session: &FormSession) -> Value {
    let sections: Vec<SectionSnapshot> = form_sections(&session.output)
        .iter()
        .map(|section| {
            let (options, selected) = match &section.value {
                FieldValue::Variants(variants) => {
                    let options = variants
                        .iter()
                        .enumerate()
                        .map(|(i, option)| {
                            session
                                .fields
                                .value_or(section.id, Some(i), option)
                                .to_string()
                        })
                        .collect();
                    (options, session.fields.selected_variant(section.id))
                }
                FieldValue::Single(_) => (Vec::new(), 0),
            };

            SectionSnapshot {
                id: section.id,
                number: section.number,
                label: section.label,
                editable: section.editable,
                multiline: section.multiline,
                multi_option: section.is_multi_option(),
                options,
                selected,
                value: resolved_value(section, &session.fields),
            }
        })
        .collect();

    json!({
        "session": {
            "generation_id": session.generation_id,
            "product_model": session.product_model,
            "sections": sections,
        }
    })
}

fn ok_json(payload: Value) -> ApiResponse {
    let mut body = serde_json::Map::new();
    body.insert("ok".to_string(), Value::Bool(true));

    if let Some(obj) = payload.as_object() {
        for (key, value) in obj {
            body.insert(key.clone(), value.clone());
        }
    } else if !payload.is_null() {
        body.insert("data".to_string(), payload);
    }

    (StatusCode::OK, Json(Value::Object(body)))
}

fn err_json(status: StatusCode, message: &str) -> ApiResponse {
    (
        status,
        Json(json!({
            "ok": false,
            "error": message,
        })),
    )
}

fn bind_listener(preferred_port: u16) -> Result<TcpListener> {
    for offset in 0..200u16 {
        let port = preferred_port.saturating_add(offset);
        if port == 0 {
            continue;
        }

        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            return Ok(listener);
        }
    }

    Err(anyhow!("failed to bind server port"))
}

#[cfg(test)]
mod tests {
    use super::{build_image_parts, build_session_snapshot, FormSession};
    use crate::analysis::sample_analysis;
    use crate::field_model::{FieldId, FieldModel};
    use crate::rule_engine::generate_form_output;

    fn fixture_session() -> FormSession {
        let output = generate_form_output(&sample_analysis());
        FormSession {
            generation_id: "20250307_120000_0001".to_string(),
            product_model: "A2693".to_string(),
            output,
            fields: FieldModel::new(),
        }
    }

    #[test]
    fn snapshot_exposes_sections_with_variant_state() {
        let mut session = fixture_session();
        session.fields.select_variant(FieldId::CatchCopy, 1);
        session
            .fields
            .set_value(FieldId::CatchCopy, Some(1), "編集済み".to_string());

        let snapshot = build_session_snapshot(&session);
        let sections = snapshot["session"]["sections"]
            .as_array()
            .expect("sections array");
        assert_eq!(sections.len(), 28);

        let catch = sections
            .iter()
            .find(|s| s["id"] == "catchCopy")
            .expect("catch copy section");
        assert_eq!(catch["multi_option"], true);
        assert_eq!(catch["selected"], 1);
        assert_eq!(catch["value"], "編集済み");
        assert_eq!(catch["options"][1], "編集済み");
        assert_eq!(catch["options"][0], "キャッチA");
    }

    #[test]
    fn single_image_uploads_pass_through() {
        let parts =
            build_image_parts("product.png", "image/png", b"bytes".to_vec()).expect("parts");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].mime_type, "image/png");
    }

    #[test]
    fn unsupported_uploads_are_rejected() {
        let err = build_image_parts("notes.txt", "", b"bytes".to_vec()).expect_err("reject");
        assert!(err.to_string().contains("未対応のファイル形式"));
    }
}
