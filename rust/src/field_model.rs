use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// フォーム27項目の識別子。番号・ラベル等の表示属性はform.rsのスキーマが持つ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    LogoTagline,
    IconPoint1,
    IconPoint2,
    IconPoint3,
    Category,
    ProductName,
    CatchCopy,
    SubCopy,
    UsageNotes,
    ProductCopy,
    SalesPoint1,
    SalesPoint2,
    SalesPoint3,
    SafetyDesign,
    WarrantyShort,
    Others,
    Input,
    Output,
    Size,
    Weight,
    PackageContents,
    Annotations,
    PaperPlasticMark,
    Certification,
    CustomerSupport,
    WarrantyFull,
    Model,
    Trademark,
}

/// ユーザー編集の状態。生成値そのものは持たず、上書きと案選択だけを追跡する。
///
/// 編集は `(フィールド, 案番号)` 単位でキーされる。案iへの編集が案jに
/// 波及することはなく、案を切り替えても他の案への編集は失われない。
#[derive(Debug, Clone, Default)]
pub struct FieldModel {
    selected: HashMap<FieldId, usize>,
    edits: HashMap<(FieldId, Option<usize>), String>,
}

impl FieldModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定キーに編集があればそれを、なければ生成値defaultを返す。
    pub fn value_or<'a>(&'a self, field: FieldId, index: Option<usize>, default: &'a str) -> &'a str {
        self.edits
            .get(&(field, index))
            .map(String::as_str)
            .unwrap_or(default)
    }

    pub fn edited(&self, field: FieldId, index: Option<usize>) -> Option<&str> {
        self.edits.get(&(field, index)).map(String::as_str)
    }

    /// 無条件の上書き。空文字列も「意図的に空にした」編集として保存する。
    pub fn set_value(&mut self, field: FieldId, index: Option<usize>, value: String) {
        self.edits.insert((field, index), value);
    }

    pub fn select_variant(&mut self, field: FieldId, index: usize) {
        self.selected.insert(field, index);
    }

    /// 選択中の案番号。未選択ならA案（0）。
    pub fn selected_variant(&self, field: FieldId) -> usize {
        self.selected.get(&field).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldId, FieldModel};

    #[test]
    fn returns_default_until_edited() {
        let mut model = FieldModel::new();
        assert_eq!(model.value_or(FieldId::Category, None, "USB急速充電器"), "USB急速充電器");

        model.set_value(FieldId::Category, None, "モバイルバッテリー".to_string());
        assert_eq!(model.value_or(FieldId::Category, None, "USB急速充電器"), "モバイルバッテリー");
    }

    #[test]
    fn edits_are_isolated_per_variant() {
        let mut model = FieldModel::new();
        model.set_value(FieldId::CatchCopy, Some(0), "X".to_string());
        model.set_value(FieldId::CatchCopy, Some(1), "Y".to_string());

        model.select_variant(FieldId::CatchCopy, 0);
        assert_eq!(model.value_or(FieldId::CatchCopy, Some(0), "a"), "X");

        model.select_variant(FieldId::CatchCopy, 1);
        assert_eq!(model.value_or(FieldId::CatchCopy, Some(1), "b"), "Y");

        // 案の切り替えでは編集は消えない
        assert_eq!(model.value_or(FieldId::CatchCopy, Some(0), "a"), "X");
        assert_eq!(model.value_or(FieldId::CatchCopy, Some(2), "c"), "c");
    }

    #[test]
    fn variant_selection_defaults_to_first() {
        let mut model = FieldModel::new();
        assert_eq!(model.selected_variant(FieldId::SubCopy), 0);

        model.select_variant(FieldId::SubCopy, 2);
        assert_eq!(model.selected_variant(FieldId::SubCopy), 2);
        // 選択は編集状態に触れない
        assert_eq!(model.value_or(FieldId::SubCopy, Some(2), "default"), "default");
    }

    #[test]
    fn empty_string_is_an_intentional_blank() {
        let mut model = FieldModel::new();
        model.set_value(FieldId::Others, None, String::new());
        assert_eq!(model.value_or(FieldId::Others, None, "（なし）"), "");
    }
}
