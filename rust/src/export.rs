use serde::Serialize;

use crate::field_model::{FieldId, FieldModel};
use crate::form::{EMPTY_PLACEHOLDER, SALES_POINT_PREFIX, SALES_POINT_TITLE_ONLY_PREFIX};
use crate::legal_texts;
use crate::rule_engine::FormOutput;

/// エクスポート表の1行。Noが空の行（セールスポイント1つ目・3つ目）は
/// 指示書テンプレート上そのまま番号なしで出力する。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub no: String,
    pub part_name: String,
    pub default_text: String,
    pub instruction: String,
}

impl ExportRow {
    fn new(no: &str, part_name: &str, default_text: &str, instruction: String) -> Self {
        Self {
            no: no.to_string(),
            part_name: part_name.to_string(),
            default_text: default_text.to_string(),
            instruction,
        }
    }
}

/// セールスポイント1つ目の行に入れる固定のアイコン指示。
const SALES_POINT1_ICON_NOTE: &str =
    "アイコン: 左図のイメージ(スマホのバッテリーの劣化を防いでいる様子を伝えたい)";

/// 編集・案選択を反映したフォームを、指示書テンプレートの固定17+2行に
/// 展開する。フィールドモデルのスナップショットに対して純関数。
pub fn project_to_rows(output: &FormOutput, fields: &FieldModel) -> Vec<ExportRow> {
    let single = |field: FieldId, default: &str| -> String {
        fields.value_or(field, None, default).to_string()
    };
    let variant = |field: FieldId, options: &[String]| -> String {
        let selected = fields.selected_variant(field);
        let default = options.get(selected).map(String::as_str).unwrap_or_default();
        fields.value_or(field, Some(selected), default).to_string()
    };

    let (sp1_title, sp1_description) = resolve_sales_point1(output, fields);
    let sp2_title = resolve_title_only(output, fields, FieldId::SalesPoint2);
    let sp3_title = resolve_title_only(output, fields, FieldId::SalesPoint3);

    let icon_point1 = single(FieldId::IconPoint1, &output.icon_point1);
    let others_value = single(
        FieldId::Others,
        if output.others.is_empty() {
            EMPTY_PLACEHOLDER
        } else {
            &output.others
        },
    );
    let certification_value = single(
        FieldId::Certification,
        if output.certification.is_empty() {
            EMPTY_PLACEHOLDER
        } else {
            &output.certification
        },
    );

    let customer_support_default = format!(
        "※デザインは固定です。\nCorporateロゴ+会社名\n{}",
        legal_texts::CUSTOMER_SUPPORT
    );
    let trademark_default = "※1行目と最後行は固定です。\n※2行目は必ず自社商標が入ります。\n© Anker Japan Co., Limited. All rights reserved.\n- 自社商標<右欄に記入>\n- 特別に記載すべき他社商標<右欄に記入>\n- その他会社名、各製品名は、一般に各社の商標または登録商標です。";

    vec![
        ExportRow::new(
            "1",
            "ロゴ+タグライン",
            "Ankerロゴ+ No.1 Claim",
            single(FieldId::LogoTagline, &output.logo_tagline),
        ),
        ExportRow::new(
            "2",
            "アイコン付きセールスポイント",
            "-",
            format!(
                "※優先順位が高いものから記載(文字のみ)\n1. {}\n2. {}\n3. {}",
                icon_point1,
                single(FieldId::IconPoint2, &output.icon_point2),
                single(FieldId::IconPoint3, &output.icon_point3),
            ),
        ),
        ExportRow::new(
            "3",
            "カテゴリ & 製品名",
            "-",
            format!(
                "カテゴリ: {}\n製品名: {}",
                single(FieldId::Category, &output.category),
                single(FieldId::ProductName, &output.product_name),
            ),
        ),
        ExportRow::new(
            "4",
            "キャッチコピー",
            "-",
            format!(
                "※表記ルールを確認した上で記載\n太字コピー: {}\n細文字コピー: {}",
                variant(FieldId::CatchCopy, &output.catch_copy),
                variant(FieldId::SubCopy, &output.sub_copy),
            ),
        ),
        ExportRow::new(
            "5",
            "使用上の注意",
            legal_texts::usage_notes::CABLE_EXCLUDED,
            single(FieldId::UsageNotes, &output.usage_notes),
        ),
        ExportRow::new("6", "その他", "-", others_value),
        ExportRow::new(
            "7",
            "製品コピー",
            "-",
            format!("コピー: {}", variant(FieldId::ProductCopy, &output.product_copy)),
        ),
        ExportRow::new(
            "",
            "セールスポイント (1つ目)",
            "-",
            format!(
                "キャッチ: {sp1_title}\n補足説明: {sp1_description}\n{SALES_POINT1_ICON_NOTE}"
            ),
        ),
        ExportRow::new(
            "8",
            "セールスポイント (2つ目)",
            "-",
            format!("キャッチのみ: {sp2_title}\nアイコン: {icon_point1}"),
        ),
        ExportRow::new(
            "",
            "セールスポイント (3つ目)",
            "-",
            format!("キャッチのみ: {sp3_title}\nアイコン: GaN搭載"),
        ),
        ExportRow::new(
            "9",
            "安全設計",
            "-",
            single(FieldId::SafetyDesign, &output.safety_design),
        ),
        ExportRow::new(
            "10",
            "製品保証",
            "-",
            single(FieldId::WarrantyShort, &output.warranty_short),
        ),
        ExportRow::new(
            "11",
            "入力/出力/サイズ/パッケージ内容",
            "-",
            format!(
                "入力: {}\n出力: {}\nサイズ: {}\n重量: {}\nパッケージ内容: {}",
                single(FieldId::Input, &output.input),
                single(FieldId::Output, &output.output),
                single(FieldId::Size, &output.size),
                single(FieldId::Weight, &output.weight),
                single(FieldId::PackageContents, &output.package_contents),
            ),
        ),
        ExportRow::new(
            "12",
            "No.1注釈",
            "-",
            single(FieldId::Annotations, &output.annotations),
        ),
        ExportRow::new(
            "13",
            "紙プラマーク",
            "-",
            single(FieldId::PaperPlasticMark, &output.paper_plastic_mark),
        ),
        ExportRow::new("14", "認証", "-", certification_value),
        ExportRow::new(
            "15",
            "カスタマーサポート",
            &customer_support_default,
            single(FieldId::CustomerSupport, &output.customer_support),
        ),
        ExportRow::new("16", "Model", "Axxxx", single(FieldId::Model, &output.model)),
        ExportRow::new(
            "17",
            "商標",
            trademark_default,
            single(FieldId::Trademark, &output.trademark),
        ),
    ]
}

/// セールスポイント1の見出しと補足説明。未編集なら生成値をそのまま使い、
/// 合成表示文字列を経由しない。編集済みの場合のみ表示形式から復元する。
fn resolve_sales_point1(output: &FormOutput, fields: &FieldModel) -> (String, String) {
    let selected = fields.selected_variant(FieldId::SalesPoint1);
    if let Some(edited) = fields.edited(FieldId::SalesPoint1, Some(selected)) {
        return split_composed_sales_point(edited);
    }

    let title = output
        .sales_point1
        .title
        .get(selected)
        .cloned()
        .unwrap_or_default();
    let description = output
        .sales_point1
        .description
        .as_ref()
        .and_then(|d| d.get(selected))
        .cloned()
        .unwrap_or_default();
    (title, description)
}

fn resolve_title_only(output: &FormOutput, fields: &FieldModel, field: FieldId) -> String {
    let point = match field {
        FieldId::SalesPoint2 => &output.sales_point2,
        _ => &output.sales_point3,
    };
    let selected = fields.selected_variant(field);
    if let Some(edited) = fields.edited(field, Some(selected)) {
        return edited
            .strip_prefix(SALES_POINT_TITLE_ONLY_PREFIX)
            .unwrap_or(edited)
            .to_string();
    }
    point.title.get(selected).cloned().unwrap_or_default()
}

/// 編集済みの合成表示文字列を見出しと補足説明に分解する。
/// 「キャッチ：」の接頭辞が編集で失われていても、1行目を見出し、
/// 残りを補足説明として扱う。
fn split_composed_sales_point(text: &str) -> (String, String) {
    let stripped = text.strip_prefix(SALES_POINT_PREFIX).unwrap_or(text);
    match stripped.split_once('\n') {
        Some((title, description)) => (title.to_string(), description.to_string()),
        None => (stripped.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::project_to_rows;
    use crate::analysis::sample_analysis;
    use crate::field_model::{FieldId, FieldModel};
    use crate::rule_engine::generate_form_output;

    #[test]
    fn projects_fixed_row_layout() {
        let output = generate_form_output(&sample_analysis());
        let rows = project_to_rows(&output, &FieldModel::new());

        assert_eq!(rows.len(), 19);
        let numbers: Vec<&str> = rows.iter().map(|r| r.no.as_str()).collect();
        assert_eq!(
            numbers,
            vec![
                "1", "2", "3", "4", "5", "6", "7", "", "8", "", "9", "10", "11", "12", "13",
                "14", "15", "16", "17",
            ]
        );
        assert_eq!(rows[7].part_name, "セールスポイント (1つ目)");
        assert_eq!(rows[9].part_name, "セールスポイント (3つ目)");
    }

    #[test]
    fn category_and_product_name_row_matches_template() {
        let output = generate_form_output(&sample_analysis());
        let rows = project_to_rows(&output, &FieldModel::new());

        let row = rows.iter().find(|r| r.no == "3").expect("row 3");
        assert_eq!(row.part_name, "カテゴリ & 製品名");
        assert_eq!(
            row.instruction,
            "カテゴリ: USB急速充電器\n製品名: Anker Nano Charger"
        );
    }

    #[test]
    fn catch_and_sub_copy_fold_into_one_row_with_selected_variants() {
        let output = generate_form_output(&sample_analysis());
        let mut fields = FieldModel::new();
        fields.select_variant(FieldId::CatchCopy, 2);
        fields.set_value(FieldId::SubCopy, Some(0), "編集済みサブ".to_string());

        let rows = project_to_rows(&output, &fields);
        let row = rows.iter().find(|r| r.no == "4").expect("row 4");
        assert_eq!(
            row.instruction,
            "※表記ルールを確認した上で記載\n太字コピー: キャッチC\n細文字コピー: 編集済みサブ"
        );
    }

    #[test]
    fn unedited_sales_point_uses_separate_title_and_description() {
        let output = generate_form_output(&sample_analysis());
        let mut fields = FieldModel::new();
        fields.select_variant(FieldId::SalesPoint1, 1);

        let rows = project_to_rows(&output, &fields);
        let row = &rows[7];
        assert!(row.instruction.starts_with("キャッチ: 見出し1-B\n補足説明: 補足1-B\n"));
    }

    #[test]
    fn edited_sales_point_is_resplit_from_display_string() {
        let output = generate_form_output(&sample_analysis());
        let mut fields = FieldModel::new();
        fields.set_value(
            FieldId::SalesPoint1,
            Some(0),
            "キャッチ：編集した見出し\n編集した補足".to_string(),
        );

        let rows = project_to_rows(&output, &fields);
        assert!(rows[7]
            .instruction
            .starts_with("キャッチ: 編集した見出し\n補足説明: 編集した補足\n"));
    }

    #[test]
    fn edited_sales_point_without_prefix_falls_back_to_first_line() {
        let output = generate_form_output(&sample_analysis());
        let mut fields = FieldModel::new();
        fields.set_value(FieldId::SalesPoint1, Some(0), "接頭辞なし見出しだけ".to_string());

        let rows = project_to_rows(&output, &fields);
        assert!(rows[7]
            .instruction
            .starts_with("キャッチ: 接頭辞なし見出しだけ\n補足説明: \n"));
    }

    #[test]
    fn title_only_sales_points_strip_edit_prefix() {
        let output = generate_form_output(&sample_analysis());
        let mut fields = FieldModel::new();
        fields.set_value(
            FieldId::SalesPoint2,
            Some(0),
            "キャッチのみ：編集した見出し2".to_string(),
        );

        let rows = project_to_rows(&output, &fields);
        let row = rows.iter().find(|r| r.no == "8").expect("row 8");
        assert_eq!(
            row.instruction,
            "キャッチのみ: 編集した見出し2\nアイコン: 最大45W"
        );

        // 3つ目は番号なし行のまま、固定のGaNアイコン指示を持つ
        assert_eq!(rows[9].instruction, "キャッチのみ: 見出し3-A\nアイコン: GaN搭載");
    }

    #[test]
    fn empty_certification_exports_placeholder() {
        let mut analysis = sample_analysis();
        analysis.flags.certification.clear();
        let output = generate_form_output(&analysis);

        let rows = project_to_rows(&output, &FieldModel::new());
        let row = rows.iter().find(|r| r.no == "14").expect("row 14");
        assert_eq!(row.instruction, "（なし）");
    }
}
