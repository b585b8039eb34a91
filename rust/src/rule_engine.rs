use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::legal_texts::{self, WarrantyMonths};

pub const UNKNOWN_VALUE: &str = "不明";

/// CRF出力フォームの27項目。編集可否・複数案の区別はフォームスキーマ
/// （form.rs）が持ち、ここは生成値のみを持つ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormOutput {
    // 0. ロゴ＋タグライン（固定）
    pub logo_tagline: String,
    // 1-3. アイコン付きセールスポイント
    pub icon_point1: String,
    pub icon_point2: String,
    pub icon_point3: String,
    // 4. カテゴリ / 5. 製品名
    pub category: String,
    pub product_name: String,
    // 6. キャッチコピー / 7. サブコピー（各3案）
    pub catch_copy: Vec<String>,
    pub sub_copy: Vec<String>,
    // 8. 使用上の注意（ケーブル同梱フラグで分岐）
    pub usage_notes: String,
    // 9. 製品コピー（3案）
    pub product_copy: Vec<String>,
    // 10-12. セールスポイント（見出し3案、1のみ補足説明3案）
    pub sales_point1: SalesPoint,
    pub sales_point2: SalesPoint,
    pub sales_point3: SalesPoint,
    // 13. 安全設計（固定）
    pub safety_design: String,
    // 14. 製品保証（簡易版）
    pub warranty_short: String,
    // 15. その他（生成後にユーザーが記入する欄。常に空で初期化）
    pub others: String,
    // 16-19. スペック
    pub input: String,
    pub output: String,
    pub size: String,
    pub weight: String,
    pub package_contents: String,
    // 20. No.1注釈 + その他注釈
    pub annotations: String,
    // 21. 紙プラマーク
    pub paper_plastic_mark: String,
    // 22. 認証
    pub certification: String,
    // 23. カスタマーサポート（固定）
    pub customer_support: String,
    // 24. 製品保証（詳細版）
    pub warranty_full: String,
    // 25. モデル
    pub model: String,
    // 26. 商標（フラグで構成が変わる）
    pub trademark: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesPoint {
    pub title: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<String>>,
}

/// AIの解析結果からCRF出力を生成するルールエンジン。純関数で、
/// 同じ入力からは常に同じ出力を返す。
pub fn generate_form_output(analysis: &AnalysisResult) -> FormOutput {
    let flags = &analysis.flags;

    // 商標文言。句の並び順は固定で、targetsの入力順には依存しない。
    let mut trademark_parts = vec![legal_texts::trademark::BASE];
    if flags.targets.iter().any(|t| t == "Apple") {
        trademark_parts.push(legal_texts::trademark::APPLE);
    }
    if flags.targets.iter().any(|t| t == "Android") {
        trademark_parts.push(legal_texts::trademark::ANDROID);
    }
    if flags.targets.iter().any(|t| t == "Windows") {
        trademark_parts.push(legal_texts::trademark::WINDOWS);
    }
    if flags.has_active_shield {
        trademark_parts.push(legal_texts::trademark::ACTIVE_SHIELD);
    }
    if flags.has_bluetooth {
        trademark_parts.push(legal_texts::trademark::BLUETOOTH);
    }
    trademark_parts.push(legal_texts::trademark::FOOTER);

    // 認証文言。テーブルにないコードは黙って読み飛ばす。
    let certification_texts: Vec<&str> = flags
        .certification
        .iter()
        .filter_map(|code| legal_texts::certification_text(code))
        .collect();

    // No.1注釈はテーブルの固定文言が先頭。その後にAI生成の注釈を続ける。
    let mut annotation_parts = vec![legal_texts::NO1_ANNOTATION.to_string()];
    annotation_parts.extend(analysis.annotations.other_annotations.iter().cloned());

    let warranty = if analysis.others.warranty_months == 18 {
        WarrantyMonths::M18
    } else {
        WarrantyMonths::M24
    };

    FormOutput {
        logo_tagline: legal_texts::LOGO_TAGLINE.to_string(),
        icon_point1: analysis.icon_points.point1.clone(),
        icon_point2: analysis.icon_points.point2.clone(),
        icon_point3: analysis.icon_points.point3.clone(),
        category: analysis.product.category.clone(),
        product_name: analysis.product.name.clone(),
        catch_copy: analysis.creative.catch_copy.clone(),
        sub_copy: analysis.creative.sub_copy.clone(),
        usage_notes: if flags.is_cable_included {
            legal_texts::usage_notes::CABLE_INCLUDED.to_string()
        } else {
            legal_texts::usage_notes::CABLE_EXCLUDED.to_string()
        },
        product_copy: analysis.creative.product_copy.clone(),
        sales_point1: SalesPoint {
            title: analysis.sales_points.point1.title.clone(),
            description: Some(analysis.sales_points.point1.description.clone()),
        },
        sales_point2: SalesPoint {
            title: analysis.sales_points.point2.title.clone(),
            description: None,
        },
        sales_point3: SalesPoint {
            title: analysis.sales_points.point3.title.clone(),
            description: None,
        },
        safety_design: legal_texts::SAFETY_DESIGN.to_string(),
        warranty_short: legal_texts::warranty_short(warranty).to_string(),
        others: String::new(),
        input: analysis.specs.input.clone(),
        output: analysis.specs.output.clone(),
        size: analysis.specs.size.clone(),
        weight: analysis
            .specs
            .weight
            .clone()
            .filter(|w| !w.is_empty())
            .unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
        package_contents: analysis.specs.package_contents.clone(),
        annotations: annotation_parts.join("\n\n"),
        paper_plastic_mark: analysis.others.paper_plastic_mark.clone(),
        certification: certification_texts.join("\n"),
        customer_support: legal_texts::CUSTOMER_SUPPORT.to_string(),
        warranty_full: legal_texts::warranty_full(warranty).to_string(),
        model: analysis.product.model.clone(),
        trademark: trademark_parts.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::generate_form_output;
    use crate::analysis::sample_analysis;
    use crate::legal_texts;

    #[test]
    fn deterministic_for_same_input() {
        let analysis = sample_analysis();
        let first = generate_form_output(&analysis);
        let second = generate_form_output(&analysis);
        assert_eq!(first, second);
    }

    #[test]
    fn trademark_order_ignores_input_order_of_targets() {
        let mut analysis = sample_analysis();
        analysis.flags.targets = vec!["Windows".to_string(), "Apple".to_string()];
        analysis.flags.has_bluetooth = true;
        analysis.flags.has_active_shield = false;

        let output = generate_form_output(&analysis);
        let expected = [
            legal_texts::trademark::BASE,
            legal_texts::trademark::APPLE,
            legal_texts::trademark::WINDOWS,
            legal_texts::trademark::BLUETOOTH,
            legal_texts::trademark::FOOTER,
        ]
        .join("\n");
        assert_eq!(output.trademark, expected);

        // 逆順で与えても同じ並びになる
        analysis.flags.targets = vec!["Apple".to_string(), "Windows".to_string()];
        assert_eq!(generate_form_output(&analysis).trademark, expected);
    }

    #[test]
    fn unknown_certification_codes_are_dropped() {
        let mut analysis = sample_analysis();
        analysis.flags.certification = vec!["PSE".to_string(), "UNKNOWN_CODE".to_string()];

        let output = generate_form_output(&analysis);
        assert_eq!(
            output.certification,
            legal_texts::certification_text("PSE").expect("PSE entry")
        );
    }

    #[test]
    fn certification_joins_known_codes_with_newline() {
        let mut analysis = sample_analysis();
        analysis.flags.certification = vec!["PSE".to_string(), "Qi".to_string()];

        let output = generate_form_output(&analysis);
        let expected = format!(
            "{}\n{}",
            legal_texts::certification_text("PSE").expect("PSE entry"),
            legal_texts::certification_text("Qi").expect("Qi entry"),
        );
        assert_eq!(output.certification, expected);
    }

    #[test]
    fn usage_notes_branch_on_cable_flag() {
        let mut analysis = sample_analysis();

        analysis.flags.is_cable_included = true;
        let with_cable = generate_form_output(&analysis);
        assert_eq!(with_cable.usage_notes, legal_texts::usage_notes::CABLE_INCLUDED);

        analysis.flags.is_cable_included = false;
        let without_cable = generate_form_output(&analysis);
        assert_eq!(without_cable.usage_notes, legal_texts::usage_notes::CABLE_EXCLUDED);
    }

    #[test]
    fn warranty_defaults_to_24_months_unless_exactly_18() {
        let mut analysis = sample_analysis();

        for months in [0, 12, 24, 30, -1] {
            analysis.others.warranty_months = months;
            let output = generate_form_output(&analysis);
            assert_eq!(
                output.warranty_short,
                legal_texts::warranty_short(legal_texts::WarrantyMonths::M24),
                "months={months}"
            );
            assert_eq!(
                output.warranty_full,
                legal_texts::warranty_full(legal_texts::WarrantyMonths::M24),
                "months={months}"
            );
        }

        analysis.others.warranty_months = 18;
        let output = generate_form_output(&analysis);
        assert_eq!(
            output.warranty_short,
            legal_texts::warranty_short(legal_texts::WarrantyMonths::M18)
        );
        assert_eq!(
            output.warranty_full,
            legal_texts::warranty_full(legal_texts::WarrantyMonths::M18)
        );
    }

    #[test]
    fn annotations_start_with_table_text_then_double_newline_blocks() {
        let mut analysis = sample_analysis();
        analysis.annotations.other_annotations =
            vec!["※2：注釈その2".to_string(), "※3：注釈その3".to_string()];

        let output = generate_form_output(&analysis);
        let expected = format!(
            "{}\n\n※2：注釈その2\n\n※3：注釈その3",
            legal_texts::NO1_ANNOTATION
        );
        assert_eq!(output.annotations, expected);
    }

    #[test]
    fn others_field_starts_empty_and_missing_weight_becomes_unknown() {
        let mut analysis = sample_analysis();
        analysis.specs.weight = None;

        let output = generate_form_output(&analysis);
        assert_eq!(output.others, "");
        assert_eq!(output.weight, super::UNKNOWN_VALUE);
    }
}
