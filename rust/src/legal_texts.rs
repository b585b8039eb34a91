//! 法定・定型文言テーブル。ルールエンジンが参照する固定文字列のみを持つ。
//! 文言はパッケージ表記ルールで固定されており、ユーザー編集の対象外。

/// 保証月数。18ヶ月（会員登録で延長）か24ヶ月のどちらか。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarrantyMonths {
    M18,
    M24,
}

pub const LOGO_TAGLINE: &str = "Ankerロゴ + モバイルチャージングブランド 世界販売台数No.1※1";

pub const NO1_ANNOTATION: &str = "※1：モバイルチャージングブランドにおける世界累計販売台数（2013年1月〜2023年12月）。Anker調べ。";

pub const SAFETY_DESIGN: &str = "Anker独自の多重保護システム「MultiProtect」\n過電流保護、過電圧保護、温度管理などの安全機能を搭載しています。";

pub const CUSTOMER_SUPPORT: &str = "万が一製品に不具合等がございましたら、弊社カスタマーサポートまでお問い合わせください。\n03-4455-7823 | 平日9:00-17:00 / 年末年始を除く\nsupport@anker.com\nAnker Japan 公式オンラインストア: https://www.ankerjapan.com";

pub mod trademark {
    pub const BASE: &str = "© Anker Japan Co., Limited. All rights reserved.\nAnker、Anker Nanoは、Anker Innovations Limitedまたはその関連会社の商標または登録商標です。";
    pub const APPLE: &str = "Apple、Appleのロゴ、iPhone、iPad、MacBook、MacBook Airは、米国および他の国々で登録されたApple Inc.の商標です。";
    pub const ANDROID: &str = "Android、Google PixelはGoogle LLCの商標です。";
    pub const WINDOWS: &str = "Windowsは、米国Microsoft Corporationの米国およびその他の国における登録商標または商標です。";
    pub const ACTIVE_SHIELD: &str = "Active Shieldは、Anker Innovations Limitedまたはその関連会社の商標です。";
    pub const BLUETOOTH: &str = "Bluetooth®のワードマークおよびロゴは、Bluetooth SIG, Inc.が所有する登録商標であり、Anker Innovations Limitedはこれらのマークをライセンスに基づいて使用しています。";
    pub const FOOTER: &str = "その他会社名、各製品名は、一般に各社の商標または登録商標です。";
}

pub mod usage_notes {
    pub const CABLE_INCLUDED: &str = "最適なご使用のために:\n・付属のケーブル、またはAnker製のケーブルをご使用ください。\n・Apple / Android™ スマートフォンやタブレット端末、その他の機器に対応しています。";
    pub const CABLE_EXCLUDED: &str = "最適なご使用のために:\n・Anker製のケーブル、お使いの機器の純正ケーブル、または第三者の認証を受けたケーブル (MFiなど)をご使用ください。\n・Apple / Android™ スマートフォンやタブレット端末、その他の機器に対応しています。";
}

/// 認証コードに対応する定型文。未知のコードは None（黙って読み飛ばす）。
pub fn certification_text(code: &str) -> Option<&'static str> {
    match code {
        "PSE" => Some("電気用品安全法の技術基準に適合（PSEマーク取得済み）"),
        "MFi" => Some("Apple社のMFi認証（Made for iPhone / iPad）を取得しています。"),
        "Qi" => Some("ワイヤレスパワーコンソーシアム（WPC）のQi認証を取得しています。"),
        _ => None,
    }
}

pub fn warranty_short(months: WarrantyMonths) -> &'static str {
    match months {
        WarrantyMonths::M18 => "最大24ヶ月保証\nご購入日から18ヶ月の製品保証（Anker会員登録で最大24ヶ月に延長）",
        WarrantyMonths::M24 => "24ヶ月保証\nご購入日から24ヶ月の製品保証",
    }
}

pub fn warranty_full(months: WarrantyMonths) -> &'static str {
    match months {
        WarrantyMonths::M18 => "製品保証：ご購入日から18ヶ月（Anker会員登録で最大24ヶ月に延長）\n万が一、保証期間内に正常なご使用状態で故障した場合は、新品への交換等の対応をさせていただきます。詳細は同梱の保証書をご確認ください。",
        WarrantyMonths::M24 => "製品保証：ご購入日から24ヶ月\n万が一、保証期間内に正常なご使用状態で故障した場合は、新品への交換等の対応をさせていただきます。詳細は同梱の保証書をご確認ください。",
    }
}
