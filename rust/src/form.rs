use serde::Serialize;

use crate::field_model::{FieldId, FieldModel};
use crate::rule_engine::{FormOutput, SalesPoint};

pub const SALES_POINT_PREFIX: &str = "キャッチ：";
pub const SALES_POINT_TITLE_ONLY_PREFIX: &str = "キャッチのみ：";
pub const EMPTY_PLACEHOLDER: &str = "（なし）";

/// フォーム1項目分の表示値。複数案フィールドは3案を順序固定で持つ。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Variants(Vec<String>),
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSection {
    pub id: FieldId,
    pub number: &'static str,
    pub label: &'static str,
    pub value: FieldValue,
    pub editable: bool,
    pub multiline: bool,
}

impl FormSection {
    pub fn is_multi_option(&self) -> bool {
        matches!(self.value, FieldValue::Variants(_))
    }
}

/// セールスポイントの3案を画面表示用の1文字列に合成する。
/// 補足説明付き（ポイント1）は「キャッチ：見出し\n補足」、それ以外は
/// 「キャッチのみ：見出し」の形式。
pub fn compose_sales_point_variants(point: &SalesPoint) -> Vec<String> {
    match &point.description {
        Some(descriptions) => point
            .title
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let description = descriptions.get(i).map(String::as_str).unwrap_or_default();
                format!("{SALES_POINT_PREFIX}{title}\n{description}")
            })
            .collect(),
        None => point
            .title
            .iter()
            .map(|title| format!("{SALES_POINT_TITLE_ONLY_PREFIX}{title}"))
            .collect(),
    }
}

/// CRFフォームの27項目を画面表示順で返す。番号・ラベル・編集可否は
/// パッケージ指示書のテンプレートに合わせて固定。
pub fn form_sections(output: &FormOutput) -> Vec<FormSection> {
    fn single(
        id: FieldId,
        number: &'static str,
        label: &'static str,
        value: &str,
        editable: bool,
        multiline: bool,
    ) -> FormSection {
        FormSection {
            id,
            number,
            label,
            value: FieldValue::Single(value.to_string()),
            editable,
            multiline,
        }
    }

    fn variants(
        id: FieldId,
        number: &'static str,
        label: &'static str,
        value: Vec<String>,
        multiline: bool,
    ) -> FormSection {
        FormSection {
            id,
            number,
            label,
            value: FieldValue::Variants(value),
            editable: true,
            multiline,
        }
    }

    let others_display = if output.others.is_empty() {
        EMPTY_PLACEHOLDER
    } else {
        output.others.as_str()
    };
    let certification_display = if output.certification.is_empty() {
        EMPTY_PLACEHOLDER
    } else {
        output.certification.as_str()
    };

    vec![
        single(FieldId::LogoTagline, "0", "ロゴ＋タグライン", &output.logo_tagline, false, false),
        single(FieldId::IconPoint1, "1", "アイコン付きセールスポイント①", &output.icon_point1, true, false),
        single(FieldId::IconPoint2, "2", "アイコン付きセールスポイント②", &output.icon_point2, true, false),
        single(FieldId::IconPoint3, "3", "アイコン付きセールスポイント③", &output.icon_point3, true, false),
        single(FieldId::Category, "4", "カテゴリ", &output.category, true, false),
        single(FieldId::ProductName, "5", "製品名", &output.product_name, true, false),
        variants(FieldId::CatchCopy, "6", "キャッチコピー", output.catch_copy.clone(), false),
        variants(FieldId::SubCopy, "7", "サブコピー", output.sub_copy.clone(), false),
        single(FieldId::UsageNotes, "8", "使用上の注意", &output.usage_notes, false, true),
        variants(FieldId::ProductCopy, "9", "製品コピー", output.product_copy.clone(), false),
        variants(
            FieldId::SalesPoint1,
            "10",
            "セールスポイント1",
            compose_sales_point_variants(&output.sales_point1),
            true,
        ),
        variants(
            FieldId::SalesPoint2,
            "11",
            "セールスポイント2",
            compose_sales_point_variants(&output.sales_point2),
            true,
        ),
        variants(
            FieldId::SalesPoint3,
            "12",
            "セールスポイント3",
            compose_sales_point_variants(&output.sales_point3),
            true,
        ),
        single(FieldId::SafetyDesign, "13", "安全設計", &output.safety_design, false, true),
        single(FieldId::WarrantyShort, "14", "製品保証", &output.warranty_short, false, true),
        single(FieldId::Others, "15", "その他", others_display, true, false),
        single(FieldId::Input, "16", "入力", &output.input, true, false),
        single(FieldId::Output, "17", "出力", &output.output, true, true),
        single(FieldId::Size, "18", "サイズ", &output.size, true, false),
        single(FieldId::Weight, "18-2", "重量", &output.weight, true, false),
        single(FieldId::PackageContents, "19", "パッケージ内容", &output.package_contents, true, false),
        single(FieldId::Annotations, "20", "No.1注釈 + その他注釈", &output.annotations, false, true),
        single(FieldId::PaperPlasticMark, "21", "紙プラマーク", &output.paper_plastic_mark, true, false),
        single(FieldId::Certification, "22", "認証", certification_display, false, false),
        single(FieldId::CustomerSupport, "23", "カスタマーサポート", &output.customer_support, false, true),
        single(FieldId::WarrantyFull, "24", "製品保証（詳細）", &output.warranty_full, false, true),
        single(FieldId::Model, "25", "モデル", &output.model, false, false),
        single(FieldId::Trademark, "26", "商標", &output.trademark, false, true),
    ]
}

/// 編集・案選択を反映した、項目の現在の表示値。
pub fn resolved_value(section: &FormSection, fields: &FieldModel) -> String {
    match &section.value {
        FieldValue::Single(value) => fields.value_or(section.id, None, value).to_string(),
        FieldValue::Variants(options) => {
            let selected = fields.selected_variant(section.id);
            let default = options.get(selected).map(String::as_str).unwrap_or_default();
            fields.value_or(section.id, Some(selected), default).to_string()
        }
    }
}

/// 全項目を「番号. ラベル + 現在値」の形でつないだコピー用テキスト。
pub fn copy_all_text(output: &FormOutput, fields: &FieldModel) -> String {
    form_sections(output)
        .iter()
        .map(|section| {
            format!(
                "{}. {}\n{}",
                section.number,
                section.label,
                resolved_value(section, fields)
            )
        })
        .collect::<Vec<String>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::{compose_sales_point_variants, copy_all_text, form_sections, resolved_value, FieldValue};
    use crate::analysis::sample_analysis;
    use crate::field_model::{FieldId, FieldModel};
    use crate::rule_engine::{generate_form_output, SalesPoint};

    #[test]
    fn has_28_sections_in_template_order() {
        let output = generate_form_output(&sample_analysis());
        let sections = form_sections(&output);
        assert_eq!(sections.len(), 28);
        assert_eq!(sections[0].number, "0");
        assert_eq!(sections[19].number, "18-2");
        assert_eq!(sections.last().expect("last").label, "商標");

        let multi_option: Vec<&str> = sections
            .iter()
            .filter(|s| s.is_multi_option())
            .map(|s| s.label)
            .collect();
        assert_eq!(
            multi_option,
            vec![
                "キャッチコピー",
                "サブコピー",
                "製品コピー",
                "セールスポイント1",
                "セールスポイント2",
                "セールスポイント3",
            ]
        );
    }

    #[test]
    fn fixed_sections_are_not_editable() {
        let output = generate_form_output(&sample_analysis());
        for section in form_sections(&output) {
            let fixed = matches!(
                section.id,
                FieldId::LogoTagline
                    | FieldId::UsageNotes
                    | FieldId::SafetyDesign
                    | FieldId::WarrantyShort
                    | FieldId::Annotations
                    | FieldId::Certification
                    | FieldId::CustomerSupport
                    | FieldId::WarrantyFull
                    | FieldId::Model
                    | FieldId::Trademark
            );
            assert_eq!(section.editable, !fixed, "{:?}", section.id);
        }
    }

    #[test]
    fn sales_point_variants_compose_with_fixed_prefixes() {
        let with_description = SalesPoint {
            title: vec!["小型設計".to_string()],
            description: Some(vec!["世界最小クラスを実現".to_string()]),
        };
        assert_eq!(
            compose_sales_point_variants(&with_description),
            vec!["キャッチ：小型設計\n世界最小クラスを実現".to_string()]
        );

        let title_only = SalesPoint {
            title: vec!["最大45W出力".to_string()],
            description: None,
        };
        assert_eq!(
            compose_sales_point_variants(&title_only),
            vec!["キャッチのみ：最大45W出力".to_string()]
        );
    }

    #[test]
    fn resolved_value_follows_selection_and_edits() {
        let output = generate_form_output(&sample_analysis());
        let sections = form_sections(&output);
        let catch = sections
            .iter()
            .find(|s| s.id == FieldId::CatchCopy)
            .expect("catch copy section");

        let mut fields = FieldModel::new();
        let FieldValue::Variants(options) = &catch.value else {
            panic!("catch copy should be multi-option");
        };
        assert_eq!(resolved_value(catch, &fields), options[0]);

        fields.select_variant(FieldId::CatchCopy, 1);
        assert_eq!(resolved_value(catch, &fields), options[1]);

        fields.set_value(FieldId::CatchCopy, Some(1), "上書きB案".to_string());
        assert_eq!(resolved_value(catch, &fields), "上書きB案");

        fields.select_variant(FieldId::CatchCopy, 0);
        assert_eq!(resolved_value(catch, &fields), options[0]);
    }

    #[test]
    fn copy_all_text_joins_numbered_blocks() {
        let output = generate_form_output(&sample_analysis());
        let fields = FieldModel::new();
        let text = copy_all_text(&output, &fields);

        assert!(text.starts_with("0. ロゴ＋タグライン\n"));
        assert!(text.contains("\n\n---\n\n4. カテゴリ\nUSB急速充電器"));
        assert!(text.contains("15. その他\n（なし）"));
    }
}
