use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use rust_xlsxwriter::Workbook;
use serde::Deserialize;

use crate::export::ExportRow;

pub const XLSX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME: &str = "CRF出力";
const COLUMN_WIDTHS: [f64; 4] = [5.0, 25.0, 50.0, 80.0];
const DRIVE_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id,name,webViewLink";

/// エクスポート行をxlsxワークブックに書き出す。
pub fn write_workbook(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    for (column, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(column as u16, *width)?;
    }

    worksheet.write_string(0, 0, "No")?;
    worksheet.write_string(0, 1, "パーツ名")?;
    worksheet.write_string(0, 2, "デフォルト")?;
    worksheet.write_string(0, 3, "今回指示")?;

    for (i, row) in rows.iter().enumerate() {
        let excel_row = (i + 1) as u32;
        worksheet.write_string(excel_row, 0, &row.no)?;
        worksheet.write_string(excel_row, 1, &row.part_name)?;
        worksheet.write_string(excel_row, 2, &row.default_text)?;
        worksheet.write_string(excel_row, 3, &row.instruction)?;
    }

    workbook
        .save_to_buffer()
        .context("xlsxの生成に失敗しました")
}

pub fn export_file_name(model: &str) -> String {
    export_file_name_on(model, Local::now().date_naive())
}

fn export_file_name_on(model: &str, date: NaiveDate) -> String {
    let model = if model.trim().is_empty() {
        "製品"
    } else {
        model.trim()
    };
    format!("CRF出力_{}_{}.xlsx", model, date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "webViewLink", default)]
    pub web_view_link: String,
}

/// Google Drive v3のmultipartアップロード。アクセストークンは呼び出し側
/// （ブラウザのOAuthフロー）が取得して渡す。
pub async fn upload_to_drive(
    http: &reqwest::Client,
    xlsx_bytes: Vec<u8>,
    file_name: &str,
    access_token: &str,
) -> Result<DriveFile> {
    let boundary = "crf_form_generator_boundary";
    let metadata = serde_json::json!({
        "name": file_name,
        "mimeType": XLSX_MIME,
    });

    let mut body: Vec<u8> = Vec::with_capacity(xlsx_bytes.len() + 1024);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{}\r\n",
            metadata
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: {XLSX_MIME}\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(&xlsx_bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let response = http
        .post(DRIVE_UPLOAD_URL)
        .bearer_auth(access_token)
        .header(
            reqwest::header::CONTENT_TYPE,
            format!("multipart/related; boundary={boundary}"),
        )
        .body(body)
        .send()
        .await
        .context("Googleドライブへのアップロードに失敗しました")?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(anyhow!(
            "Google認証トークンが無効です。再度ログインしてください。"
        ));
    }
    if !status.is_success() {
        let detail: serde_json::Value = response.json().await.unwrap_or_default();
        let message = detail["error"]["message"]
            .as_str()
            .unwrap_or("unknown error");
        return Err(anyhow!("Googleドライブへのアップロードに失敗しました ({status}): {message}"));
    }

    response
        .json()
        .await
        .context("Googleドライブの応答を読み取れませんでした")
}

#[cfg(test)]
mod tests {
    use super::{export_file_name_on, write_workbook};
    use crate::analysis::sample_analysis;
    use crate::export::project_to_rows;
    use crate::field_model::FieldModel;
    use crate::rule_engine::generate_form_output;
    use chrono::NaiveDate;

    #[test]
    fn file_name_uses_model_and_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).expect("date");
        assert_eq!(export_file_name_on("A2693", date), "CRF出力_A2693_2025-03-07.xlsx");
        assert_eq!(export_file_name_on("  ", date), "CRF出力_製品_2025-03-07.xlsx");
    }

    #[test]
    fn workbook_is_generated_from_projected_rows() {
        let output = generate_form_output(&sample_analysis());
        let rows = project_to_rows(&output, &FieldModel::new());

        let bytes = write_workbook(&rows).expect("write workbook");
        // xlsxはzipコンテナ（PKヘッダ）で始まる
        assert_eq!(&bytes[..2], b"PK");
    }
}
