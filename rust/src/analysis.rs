use serde::{Deserialize, Serialize};

/// AIが画像から抽出・生成する解析結果。ワイヤ形式はGeminiに指示している
/// JSONスキーマと一致させる（トップレベルはcamelCase、flags内はsnake_case）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub flags: Flags,
    pub product: Product,
    #[serde(rename = "iconPoints")]
    pub icon_points: IconPoints,
    pub creative: Creative,
    #[serde(rename = "salesPoints")]
    pub sales_points: SalesPoints,
    pub specs: Specs,
    pub annotations: Annotations,
    pub others: Others,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flags {
    #[serde(default)]
    pub is_cable_included: bool,
    #[serde(default)]
    pub has_active_shield: bool,
    #[serde(default)]
    pub has_bluetooth: bool,
    #[serde(default)]
    pub has_display: bool,
    #[serde(default)]
    pub has_pps: bool,
    #[serde(default)]
    pub has_gan: bool,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub certification: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub category: String,
    pub name: String,
    pub model: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconPoints {
    pub point1: String,
    pub point2: String,
    pub point3: String,
}

/// クリエイティブ文言。各フィールドは3案（A/B/C案）を順序固定で持つ。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Creative {
    #[serde(rename = "catchCopy")]
    pub catch_copy: Vec<String>,
    #[serde(rename = "subCopy")]
    pub sub_copy: Vec<String>,
    #[serde(rename = "productCopy")]
    pub product_copy: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesPoints {
    pub point1: SalesPointDetail,
    pub point2: SalesPointTitles,
    pub point3: SalesPointTitles,
}

/// セールスポイント1のみ見出しと補足説明の両方を持つ。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesPointDetail {
    pub title: Vec<String>,
    pub description: Vec<String>,
}

/// セールスポイント2・3は見出しのみ。補足説明が来ても読み飛ばす。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesPointTitles {
    pub title: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specs {
    pub input: String,
    pub output: String,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(rename = "packageContents")]
    pub package_contents: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(rename = "no1Annotation", default)]
    pub no1_annotation: String,
    #[serde(rename = "otherAnnotations", default)]
    pub other_annotations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Others {
    #[serde(rename = "paperPlasticMark", default)]
    pub paper_plastic_mark: String,
    // 18か24以外の値（欠落含む）はルールエンジン側で24に倒す
    #[serde(rename = "warrantyMonths", default)]
    pub warranty_months: i64,
}

/// 生成履歴1件。解析結果をそのまま保存し、再表示時にルールエンジンへ通す。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub id: String,
    pub product_model: String,
    pub analysis_result: AnalysisResult,
    pub created_at: String,
}

#[cfg(test)]
pub fn sample_analysis() -> AnalysisResult {
    fn three(prefix: &str) -> Vec<String> {
        (0..3).map(|i| format!("{prefix}{}", ["A", "B", "C"][i])).collect()
    }

    AnalysisResult {
        flags: Flags {
            is_cable_included: false,
            has_active_shield: true,
            has_bluetooth: false,
            has_display: false,
            has_pps: true,
            has_gan: true,
            targets: vec!["Apple".to_string()],
            certification: vec!["PSE".to_string()],
        },
        product: Product {
            category: "USB急速充電器".to_string(),
            name: "Anker Nano Charger".to_string(),
            model: "A2693".to_string(),
        },
        icon_points: IconPoints {
            point1: "最大45W".to_string(),
            point2: "PC・タブレット・スマホ".to_string(),
            point3: "USB-C × 1".to_string(),
        },
        creative: Creative {
            catch_copy: three("キャッチ"),
            sub_copy: three("サブ"),
            product_copy: three("製品コピー"),
        },
        sales_points: SalesPoints {
            point1: SalesPointDetail {
                title: three("見出し1-"),
                description: three("補足1-"),
            },
            point2: SalesPointTitles {
                title: three("見出し2-"),
                description: None,
            },
            point3: SalesPointTitles {
                title: three("見出し3-"),
                description: None,
            },
        },
        specs: Specs {
            input: "100-240V~, 1.2A, 50/60Hz".to_string(),
            output: "5V⎓3A / 9V⎓3A / 15V⎓3A / 20V⎓2.25A (最大45W)".to_string(),
            size: "約43 × 36 × 35mm".to_string(),
            weight: Some("約68g".to_string()),
            package_contents: "製品本体、取扱説明書".to_string(),
        },
        annotations: Annotations {
            no1_annotation: String::new(),
            other_annotations: vec![
                "※2：最大45W以上の出力に対応かつ、USB-Cポートを1つ以上搭載している充電器において。2024年12月時点 / Anker調べ".to_string(),
            ],
        },
        others: Others {
            paper_plastic_mark: "紙：外箱・トレー・包み紙".to_string(),
            warranty_months: 24,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::AnalysisResult;

    #[test]
    fn parses_wire_format_with_missing_optionals() {
        let raw = r#"{
            "flags": {
                "is_cable_included": true,
                "has_active_shield": false,
                "has_bluetooth": false,
                "has_display": false,
                "has_pps": false,
                "has_gan": true,
                "targets": ["Apple", "Windows"],
                "certification": ["PSE"]
            },
            "product": {"category": "USB急速充電器", "name": "Anker Nano", "model": "A2693"},
            "iconPoints": {"point1": "最大45W", "point2": "PC・スマホ", "point3": "USB-C × 1"},
            "creative": {"catchCopy": ["a", "b", "c"], "subCopy": ["a", "b", "c"], "productCopy": ["a", "b", "c"]},
            "salesPoints": {
                "point1": {"title": ["t1", "t2", "t3"], "description": ["d1", "d2", "d3"]},
                "point2": {"title": ["t1", "t2", "t3"]},
                "point3": {"title": ["t1", "t2", "t3"]}
            },
            "specs": {"input": "不明", "output": "不明", "size": "不明", "packageContents": "製品本体"},
            "annotations": {"no1Annotation": "", "otherAnnotations": []},
            "others": {"paperPlasticMark": "紙：外箱"}
        }"#;

        let parsed: AnalysisResult = serde_json::from_str(raw).expect("parse analysis");
        assert!(parsed.flags.is_cable_included);
        assert_eq!(parsed.product.model, "A2693");
        assert_eq!(parsed.specs.weight, None);
        assert!(parsed.sales_points.point2.description.is_none());
        // warrantyMonthsの欠落は0として読み、ルールエンジンで24に倒す
        assert_eq!(parsed.others.warranty_months, 0);
    }

    #[test]
    fn serializes_back_to_camel_case_keys() {
        let analysis = super::sample_analysis();
        let value = serde_json::to_value(&analysis).expect("to value");
        assert!(value.get("iconPoints").is_some());
        assert!(value.get("salesPoints").is_some());
        assert!(value["creative"].get("catchCopy").is_some());
        assert!(value["others"].get("warrantyMonths").is_some());
        assert!(value["specs"].get("packageContents").is_some());
    }
}
